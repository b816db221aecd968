//! インクルード解決 - `data-include` 付き要素を取得した HTML で置き換える
//!
//! ページ作者はこう書きます:
//! ```html
//! <header data-include="components/navbar.html"></header>
//! ```
//! これを解決すると、`components/navbar.html` の中身が `<header>` の innerHTML になり、
//! `data-include` 属性は消えます。差し込んだ HTML にさらに `data-include` があれば、
//! 次のパスで同じように解決します（入れ子の深さに上限はありません）。
//!
//! パス（pass）の考え方
//! - 1パス = 「その時点でマーカーを持つ要素すべて」のスナップショット。
//! - スナップショット内の要素は同時に取得を始め（1要素1フューチャー）、全部が終わるまで待ちます。
//! - パスの途中で差し込まれた要素は、そのパスでは見ません。次のパスで拾います。
//! - パスは直列。N+1 番目は N 番目が全部終わってから始まります。
//!
//! 失敗の扱い
//! - 取得失敗（通信エラーでも 404 でも同じ）は要素ごとに閉じ込めます。
//!   ログに出して、中身を `<!-- include error: パス -->` のコメント1つにし、マーカーは消します。
//! - 再試行はしません。兄弟要素や後続のパスは止まりません。
//!
//! 注意
//! - 循環するインクルード（a.html が自分自身を含むなど）は検出しません。終わらなくなります。
//! - 値が空の `data-include=""` は何もせずに残すため、これも毎パス数えられて終わらなくなります。

use crate::constants::INCLUDE_ATTRIBUTE;
use crate::constants::INCLUDE_ERROR_PREFIX;
use crate::error::Error;
use crate::renderer::dom::api::append_child;
use crate::renderer::dom::api::query_all_with_attribute;
use crate::renderer::dom::api::remove_children;
use crate::renderer::dom::api::set_inner_html;
use crate::renderer::dom::node::AttributeHost;
use crate::renderer::dom::node::Node;
use crate::renderer::dom::node::NodeKind;
use crate::renderer::dom::node::Window;
use async_trait::async_trait;
use futures::future::join_all;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;
use tracing::error;
use tracing::warn;

/// フラグメントを取得する協力者
///
/// - 実装はキャッシュを使わず、毎回サーバに問い合わせること（`Cache-Control: no-cache` 相当）。
/// - 成功（2xx）なら本文のテキスト、それ以外は `Err` を返します。
/// - DOM は `Rc` で共有しているので、フューチャーはスレッドをまたぎません（`?Send`）。
#[async_trait(?Send)]
pub trait Fetch {
    async fn fetch(&self, path: &str) -> Result<String, Error>;
}

#[async_trait(?Send)]
impl<F: Fetch + ?Sized> Fetch for Rc<F> {
    async fn fetch(&self, path: &str) -> Result<String, Error> {
        (**self).fetch(path).await
    }
}

/// 要素の中身をどう置き換えるか
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// 取得した HTML をそのまま innerHTML にする
    Markup(String),
    /// 中身をこのデータのコメントノード1つにする
    Comment(String),
}

/// 取得結果 → 置き換え内容（純粋関数）
///
/// 失敗の理由（通信かステータスか）は見ません。どちらも同じコメントになります。
pub fn render(path: &str, outcome: Result<String, Error>) -> Replacement {
    match outcome {
        Ok(html) => Replacement::Markup(html),
        Err(_) => Replacement::Comment(format!(" {} {} ", INCLUDE_ERROR_PREFIX, path)),
    }
}

fn apply(node: &Rc<RefCell<Node>>, replacement: Replacement) {
    match replacement {
        Replacement::Markup(html) => set_inner_html(node, &html),
        Replacement::Comment(data) => {
            remove_children(node);
            append_child(node, Rc::new(RefCell::new(Node::new(NodeKind::Comment(data)))));
        }
    }
}

#[derive(Debug)]
pub struct IncludeResolver<F> {
    fetcher: F,
    attribute: String,
}

impl<F: Fetch> IncludeResolver<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            attribute: INCLUDE_ATTRIBUTE.to_string(),
        }
    }

    /// マーカーに使う属性名を変える（既定は `data-include`）
    pub fn with_attribute(mut self, name: &str) -> Self {
        self.attribute = name.to_string();
        self
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// 1パスだけ解決し、スナップショットで見つかったマーカー数を返す
    ///
    /// - 0 個なら何もせず 0 を返します。
    /// - 返り値は「成功した数」ではなく「見つかった数」です。
    pub async fn resolve_once(&self, root: &Rc<RefCell<Node>>) -> usize {
        let nodes = query_all_with_attribute(root, &self.attribute);
        if nodes.is_empty() {
            return 0;
        }

        let count = nodes.len();
        join_all(nodes.into_iter().map(|node| self.resolve_node(node))).await;
        count
    }

    /// マーカーがなくなるまでパスを繰り返し、マーカーが見つかったパスの数を返す
    pub async fn resolve_all(&self, root: &Rc<RefCell<Node>>) -> usize {
        let mut passes = 0;
        loop {
            let count = self.resolve_once(root).await;
            if count == 0 {
                return passes;
            }
            passes += 1;
            debug!(pass = passes, markers = count, "include pass settled");
        }
    }

    /// 文書全体を解決する（`resolve_all(document)` の省略形）
    pub async fn resolve_document(&self, window: &Window) -> usize {
        self.resolve_all(&window.document()).await
    }

    async fn resolve_node(&self, node: Rc<RefCell<Node>>) {
        let path = match node.borrow().get_attribute(&self.attribute) {
            Some(path) if !path.is_empty() => path,
            Some(_) => {
                warn!(attribute = %self.attribute, "skipping include marker with an empty path");
                return;
            }
            None => return,
        };

        let outcome = self.fetcher.fetch(&path).await;
        match &outcome {
            Ok(html) => debug!(path = %path, bytes = html.len(), "included fragment"),
            Err(e) => error!(path = %path, error = %e, "failed to include fragment"),
        }

        apply(&node, render(&path, outcome));
        node.borrow_mut().remove_attribute(&self.attribute);
    }
}
