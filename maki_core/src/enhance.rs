//! インクルード解決後の小さな DOM 書き換え
//!
//! - `id="year"` の要素 → 現在の西暦（例: `2026`）
//! - `id="last-updated"` の要素 → 現在のローカル日付（既定の書式は `%-m/%-d/%Y`、例: `10/19/2026`）
//!
//! どちらも要素がなければ何もしません。フッターなどインクルードで差し込まれる部品の中に
//! 置かれることが多いので、必ずインクルード解決が終わってから呼びます。
//! 時刻は引数で受け取るので、テストでは固定の日時を渡せます。

use crate::constants::DEFAULT_DATE_FORMAT;
use crate::constants::LAST_UPDATED_ELEMENT_ID;
use crate::constants::YEAR_ELEMENT_ID;
use crate::renderer::dom::api::get_element_by_id;
use crate::renderer::dom::api::set_text_content;
use crate::renderer::dom::node::Node;
use chrono::DateTime;
use chrono::Datelike;
use chrono::Local;
use std::cell::RefCell;
use std::fmt::Write;
use std::rc::Rc;
use tracing::warn;

/// `#year` と `#last-updated` を埋める。書き換えた要素の数を返す
pub fn apply_common_enhancements(
    document: &Rc<RefCell<Node>>,
    now: DateTime<Local>,
    date_format: &str,
) -> usize {
    let mut applied = 0;

    if let Some(year) = get_element_by_id(document, YEAR_ELEMENT_ID) {
        set_text_content(&year, &now.year().to_string());
        applied += 1;
    }

    if let Some(last_updated) = get_element_by_id(document, LAST_UPDATED_ELEMENT_ID) {
        set_text_content(&last_updated, &format_date(now, date_format));
        applied += 1;
    }

    applied
}

/// `date_format` で日付を書く。書式が壊れていたら既定の書式に戻す
pub fn format_date(now: DateTime<Local>, date_format: &str) -> String {
    let mut result = String::new();
    if write!(result, "{}", now.format(date_format)).is_ok() {
        return result;
    }

    warn!(format = %date_format, "invalid date format, using the default");
    now.format(DEFAULT_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::dom::api::text_content;
    use crate::renderer::dom::serialize::inner_html;
    use crate::renderer::html::parser::HtmlParser;
    use crate::renderer::html::token::HtmlTokenizer;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn document_of(html: &str) -> Rc<RefCell<Node>> {
        HtmlParser::new(HtmlTokenizer::new(html.to_string()))
            .construct_tree()
            .document()
    }

    fn fixed_now() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 3, 7, 12, 0, 0)
            .single()
            .expect("failed to build a fixed local time")
    }

    #[test]
    fn test_fills_year_and_last_updated() {
        let document = document_of(
            "<footer>&copy; <span id=\"year\">1999</span> <i id=\"last-updated\"></i></footer>",
        );

        assert_eq!(
            apply_common_enhancements(&document, fixed_now(), DEFAULT_DATE_FORMAT),
            2
        );
        let year = get_element_by_id(&document, "year").expect("failed to find #year");
        assert_eq!(text_content(&year), "2026");
        let updated =
            get_element_by_id(&document, "last-updated").expect("failed to find #last-updated");
        assert_eq!(text_content(&updated), "3/7/2026");
    }

    #[test]
    fn test_missing_elements_are_a_no_op() {
        let document = document_of("<p>no footer here</p>");
        let before = inner_html(&document);

        assert_eq!(
            apply_common_enhancements(&document, fixed_now(), DEFAULT_DATE_FORMAT),
            0
        );
        assert_eq!(inner_html(&document), before);
    }

    #[test]
    fn test_custom_date_format() {
        let document = document_of("<span id=\"last-updated\"></span>");
        apply_common_enhancements(&document, fixed_now(), "%Y-%m-%d");
        assert_eq!(inner_html(&document), "<span id=\"last-updated\">2026-03-07</span>");
    }

    #[test]
    fn test_invalid_date_format_falls_back() {
        assert_eq!(format_date(fixed_now(), "%Q"), "3/7/2026");
    }
}
