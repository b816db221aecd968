//! DOM → HTML 文字列（`innerHTML` / `outerHTML` の読み取り）
//!
//! https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments
//!
//! - Text は `& < >` と NBSP をエスケープします。ただし `<script>` / `<style>` の中身はそのまま。
//! - 属性値は必ずダブルクォートで囲み、`& "` と NBSP をエスケープします。
//! - 空要素（`<br>` など）は終了タグを書きません。
//! - Comment は `<!--中身-->`、DocumentType は `<!DOCTYPE 名前>`。
//!
//! 例
//! ```text
//! Element(div) → Element(span) → Text("X")   ⇒  inner_html(div) == "<span>X</span>"
//! Element(div) → Comment(" include error: b.html ")
//!                                            ⇒  inner_html(div) == "<!-- include error: b.html -->"
//! ```

use crate::renderer::dom::api::children;
use crate::renderer::dom::node::Node;
use crate::renderer::dom::node::NodeKind;
use std::cell::RefCell;
use std::rc::Rc;

/// `node` の子を HTML にする
pub fn inner_html(node: &Rc<RefCell<Node>>) -> String {
    let mut result = String::new();
    let raw_text = node
        .borrow()
        .get_element()
        .map(|e| e.is_raw_text())
        .unwrap_or(false);
    for child in children(node) {
        serialize_node(&child, raw_text, &mut result);
    }
    result
}

/// `node` 自身を含めて HTML にする（Document の場合は inner_html と同じ）
pub fn outer_html(node: &Rc<RefCell<Node>>) -> String {
    let mut result = String::new();
    serialize_node(node, false, &mut result);
    result
}

fn serialize_node(node: &Rc<RefCell<Node>>, in_raw_text: bool, result: &mut String) {
    let kind = node.borrow().kind();
    match kind {
        NodeKind::Document => result.push_str(&inner_html(node)),
        NodeKind::DocumentType(name) => {
            result.push_str("<!DOCTYPE ");
            result.push_str(&name);
            result.push('>');
        }
        NodeKind::Comment(data) => {
            result.push_str("<!--");
            result.push_str(&data);
            result.push_str("-->");
        }
        NodeKind::Text(s) => {
            if in_raw_text {
                result.push_str(&s);
            } else {
                escape_into(&s, false, result);
            }
        }
        NodeKind::Element(e) => {
            result.push('<');
            result.push_str(e.tag_name());
            for attr in e.attributes() {
                result.push(' ');
                result.push_str(attr.name());
                result.push_str("=\"");
                escape_into(attr.value(), true, result);
                result.push('"');
            }
            result.push('>');

            if e.is_void() {
                return;
            }

            result.push_str(&inner_html(node));
            result.push_str("</");
            result.push_str(e.tag_name());
            result.push('>');
        }
    }
}

// https://html.spec.whatwg.org/multipage/parsing.html#escapingString
fn escape_into(s: &str, attribute_mode: bool, result: &mut String) {
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            '"' if attribute_mode => result.push_str("&quot;"),
            '<' if !attribute_mode => result.push_str("&lt;"),
            '>' if !attribute_mode => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::html::parser::HtmlParser;
    use crate::renderer::html::token::HtmlTokenizer;
    use pretty_assertions::assert_eq;

    fn round_trip(html: &str) -> String {
        let window = HtmlParser::new(HtmlTokenizer::new(html.to_string())).construct_tree();
        inner_html(&window.document())
    }

    #[test]
    fn test_round_trip_fragments() {
        for html in [
            "<span>X</span>",
            "<div><!-- include error: b.html --></div>",
            "<!DOCTYPE html>\n<html><head><title>t</title></head><body></body></html>\n",
            "<nav class=\"top\">\n  <a href=\"/\">Home</a>\n  <br>\n</nav>",
            "<p>a &amp; b &lt;c&gt;&nbsp;</p>",
            "<script>if (a < b && c) { x = \"</p>\"; }</script>",
            "<img src=\"a.png\" alt=\"say &quot;hi&quot;\">",
        ] {
            assert_eq!(html, round_trip(html));
        }
    }

    #[test]
    fn test_normalizes_like_a_browser() {
        assert_eq!(
            "<div id=\"a\" hidden=\"\"></div>",
            round_trip("<DIV id='a' hidden></DIV>")
        );
        assert_eq!("<x-icon></x-icon>", round_trip("<x-icon/>"));
    }

    #[test]
    fn test_outer_html() {
        let window =
            HtmlParser::new(HtmlTokenizer::new("<div><b>x</b></div>".to_string())).construct_tree();
        let div = children(&window.document()).remove(0);
        assert_eq!(outer_html(&div), "<div><b>x</b></div>");
        assert_eq!(inner_html(&div), "<b>x</b>");
    }
}
