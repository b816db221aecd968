//! Page - 1つの HTML 文書と、その起動処理（インクルード解決 → 補助書き換え → 完了通知）
//!
//! 実ブラウザでの位置づけ
//! - ネットワーク層から受け取った HTML 文字列を DOM（`Window`/`Document`）にするのが `receive_response`。
//! - 文書の解析が終わったら（`DOMContentLoaded`）インクルードを解決し、
//!   `#year` / `#last-updated` を埋め、最後に `includes:ready` を配信するのが `load_includes`。
//!
//! イベントの順番
//! ```text
//! receive_response:  readyState loading → interactive  (DOMContentLoaded)
//! load_includes:     resolve_all（0 個になるまで） → enhance
//!                    readyState complete (load) → includes:ready（1回だけ）
//! ```
//!
//! `load_includes` は `receive_response` より先に呼んでも構いません。
//! その場合は `DOMContentLoaded` まで待ってから始まります。

use crate::constants::DEFAULT_DATE_FORMAT;
use crate::constants::DOM_CONTENT_LOADED_EVENT;
use crate::constants::INCLUDES_READY_EVENT;
use crate::enhance::apply_common_enhancements;
use crate::include::Fetch;
use crate::include::IncludeResolver;
use crate::renderer::dom::api::remove_children;
use crate::renderer::dom::event::Event;
use crate::renderer::dom::node::DocumentReadyState;
use crate::renderer::dom::node::Window;
use crate::renderer::dom::serialize::inner_html;
use crate::renderer::html::parser::HtmlParser;
use crate::renderer::html::token::HtmlTokenizer;
use crate::utils::convert_dom_to_string;
use chrono::DateTime;
use chrono::Local;
use futures::channel::oneshot;
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;
use tracing::info;
use tracing::trace;

#[derive(Debug)]
pub struct Page {
    window: Rc<Window>,
    date_format: String,
    includes_ready: Cell<bool>,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    // 空のページ。`receive_response` を呼ぶまで readyState は loading のまま。
    pub fn new() -> Self {
        Self {
            window: Window::new(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            includes_ready: Cell::new(false),
        }
    }

    /// `#last-updated` に使う日付の書式（chrono の strftime 形式）
    pub fn with_date_format(mut self, date_format: &str) -> Self {
        self.date_format = date_format.to_string();
        self
    }

    pub fn window(&self) -> Rc<Window> {
        self.window.clone()
    }

    /// HTML 文字列を解析して DOM を作り直す
    ///
    /// 以前の中身は捨て、readyState を loading に戻してから解析します。
    /// 解析が終わると interactive になり、待っている `load_includes` が動き出します。
    pub fn receive_response(&self, html: String) {
        remove_children(&self.window.document());
        self.includes_ready.set(false);
        self.window.set_ready_state(DocumentReadyState::Loading);

        HtmlParser::new(HtmlTokenizer::new(html)).construct_tree_into(&self.window);

        trace!(
            dom = %convert_dom_to_string(&Some(self.window.document())),
            "parsed document"
        );
    }

    /// 起動処理を実行し、マーカーが見つかったパスの数を返す
    pub async fn load_includes<F: Fetch>(&self, resolver: &IncludeResolver<F>) -> usize {
        self.load_includes_with_clock(resolver, Local::now).await
    }

    /// `load_includes` と同じ。補助書き換えに使う「現在時刻」を差し替えられる
    pub async fn load_includes_with_clock<F, C>(
        &self,
        resolver: &IncludeResolver<F>,
        clock: C,
    ) -> usize
    where
        F: Fetch,
        C: FnOnce() -> DateTime<Local>,
    {
        self.dom_content_loaded().await;

        let document = self.window.document();
        let passes = resolver.resolve_all(&document).await;
        let applied = apply_common_enhancements(&document, clock(), &self.date_format);
        debug!(passes, enhanced = applied, "includes resolved");
        trace!(dom = %convert_dom_to_string(&Some(document)), "resolved document");

        self.window.set_ready_state(DocumentReadyState::Complete);
        if !self.includes_ready.replace(true) {
            let listeners = self
                .window
                .document_events()
                .dispatch_event(&Event::new(INCLUDES_READY_EVENT));
            info!(passes, listeners, "{} dispatched", INCLUDES_READY_EVENT);
        }

        passes
    }

    /// Document を HTML 文字列にする
    pub fn html(&self) -> String {
        inner_html(&self.window.document())
    }

    // 解析が終わっていればすぐ返る。まだなら DOMContentLoaded を1回だけ待つ。
    async fn dom_content_loaded(&self) {
        if self.window.ready_state() != DocumentReadyState::Loading {
            return;
        }

        let (sender, receiver) = oneshot::channel();
        self.window
            .document_events()
            .add_event_listener_once(DOM_CONTENT_LOADED_EVENT, move |_| {
                let _ = sender.send(());
            });
        let _ = receiver.await;
    }
}
