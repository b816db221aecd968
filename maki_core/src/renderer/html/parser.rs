//! HTML ツリービルダー（トークン列 → DOM）
//!
//! `HtmlTokenizer` が1トークンずつ供給し、「開いている要素のスタック」
//! (stack of open elements) を使って Element / Text / Comment ノードを木に追加していきます。
//!
//! 実ブラウザとの違い
//! - 挿入モード（InHead / InBody …）は持ちません。`<html>`/`<head>`/`<body>` の自動補完もしないので、
//!   DOM はソースに書かれたとおりの形になります。フラグメント（ナビバーなどの断片）を
//!   `innerHTML` として差し込む用途ではこのほうが素直です。
//! - 空白文字も削らず、そのまま Text ノードに残します。
//! - 暗黙の終了タグは `<p>` / `<li>` / `<dd>` / `<dt>` だけ扱います。
//!   `<ul><li>a<li>b</ul>` の2つ目の `<li>` は1つ目を閉じ、ブロック要素の開始タグは開いている `<p>` を閉じます。
//!   それ以外のエラー回復は行わず、対応する開始タグのない終了タグは無視するだけです。
//!
//! 使い方
//! ```ignore
//! let window = HtmlParser::new(HtmlTokenizer::new(html)).construct_tree();
//! // 既存要素の中身として解析（innerHTML の代入）
//! HtmlParser::new(HtmlTokenizer::new(fragment)).parse_fragment(&div);
//! ```

use crate::renderer::dom::api::append_child;
use crate::renderer::dom::node::DocumentReadyState;
use crate::renderer::dom::node::Element;
use crate::renderer::dom::node::Node;
use crate::renderer::dom::node::NodeKind;
use crate::renderer::dom::node::Window;
use crate::renderer::html::attribute::Attribute;
use crate::renderer::html::token::HtmlToken;
use crate::renderer::html::token::HtmlTokenizer;
use std::cell::RefCell;
use std::rc::Rc;

/// 開いている `<p>` を暗黙に閉じる開始タグ
///
/// https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "dialog", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hgroup", "hr", "li", "main", "menu", "nav", "ol", "p", "pre", "section", "summary",
    "table", "ul",
];

/// button scope の境界。これより外側の要素は暗黙に閉じません。
///
/// https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-button-scope
const SCOPE_BOUNDARIES: &[&str] = &[
    "applet", "button", "caption", "html", "marquee", "object", "table", "td", "template", "th",
];

#[derive(Debug, Clone)]
pub struct HtmlParser {
    /// https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements
    stack_of_open_elements: Vec<Rc<RefCell<Node>>>,
    t: HtmlTokenizer,
}

impl HtmlParser {
    pub fn new(t: HtmlTokenizer) -> Self {
        Self {
            stack_of_open_elements: Vec::new(),
            t,
        }
    }

    /// 新しい `Window` を作り、文書全体を解析して返す
    pub fn construct_tree(self) -> Rc<Window> {
        let window = Window::new();
        self.construct_tree_into(&window);
        window
    }

    /// 既存の `Window` の Document に文書を解析する
    ///
    /// 解析が終わったら `readyState` を `interactive` に進め、`DOMContentLoaded` を配信します。
    /// `complete`（`load`）に進めるのは、インクルード解決まで済ませた `Page` の役目です。
    pub fn construct_tree_into(mut self, window: &Rc<Window>) {
        self.build(&window.document());
        window.set_ready_state(DocumentReadyState::Interactive);
    }

    /// `context` の子として断片を解析する（`innerHTML` の代入に相当）
    ///
    /// 既存の子は消しません。置き換えたいときは呼び出し側で先に消します。
    pub fn parse_fragment(mut self, context: &Rc<RefCell<Node>>) {
        self.build(context);
    }

    // stack_of_open_elements に `tag` の要素があるか
    fn contain_in_stack(&self, tag: &str) -> bool {
        self.stack_of_open_elements
            .iter()
            .any(|n| n.borrow().tag_name() == Some(tag))
    }

    // stack_of_open_elements から `tag` の要素が現れるまでノードを取り出し続ける
    fn pop_until(&mut self, tag: &str) {
        assert!(
            self.contain_in_stack(tag),
            "stack doesn't have an element {:?}",
            tag,
        );

        while let Some(current) = self.stack_of_open_elements.pop() {
            if current.borrow().tag_name() == Some(tag) {
                return;
            }
        }
    }

    // スタックの上から探して、`boundaries` より手前にある `tags` のどれかの名前を返す
    fn open_in_scope(&self, tags: &[&str], boundaries: &[&str]) -> Option<String> {
        for node in self.stack_of_open_elements.iter().rev() {
            let node = node.borrow();
            match node.tag_name() {
                Some(t) if tags.contains(&t) => return Some(t.to_string()),
                Some(t) if boundaries.contains(&t) || SCOPE_BOUNDARIES.contains(&t) => {
                    return None
                }
                _ => {}
            }
        }
        None
    }

    /// 開始タグ `tag` によって暗黙に終わる要素を閉じる
    ///
    /// - `<li>` は同じリストの中の開いている `<li>` を閉じます。
    /// - `<dd>` / `<dt>` は同じ `<dl>` の中の開いている `<dd>` / `<dt>` を閉じます。
    /// - ブロック要素は button scope にある `<p>` を閉じます。
    fn close_implied_elements(&mut self, tag: &str) {
        let implied = match tag {
            "li" => self.open_in_scope(&["li"], &["ol", "ul"]),
            "dd" | "dt" => self.open_in_scope(&["dd", "dt"], &["dl"]),
            _ => None,
        };
        if let Some(open) = implied {
            self.pop_until(&open);
        }

        if CLOSES_P.contains(&tag) && self.open_in_scope(&["p"], &[]).is_some() {
            self.pop_until("p");
        }
    }

    // 挿入先（カレントノード）。スタックが空ならルート（Document / コンテキスト要素）。
    fn current_node(&self, root: &Rc<RefCell<Node>>) -> Rc<RefCell<Node>> {
        match self.stack_of_open_elements.last() {
            Some(n) => n.clone(),
            None => root.clone(),
        }
    }

    /// 文字トークンを DOM に反映する
    ///
    /// 直前の子が Text ならそこへ追記し（テキストの連結）、そうでなければ新しい Text ノードを作ります。
    fn insert_char(&mut self, root: &Rc<RefCell<Node>>, c: char) {
        let current = self.current_node(root);

        if let Some(last) = current.borrow().last_child().upgrade() {
            if let NodeKind::Text(ref mut s) = last.borrow_mut().kind {
                s.push(c);
                return;
            }
        }

        append_child(
            &current,
            Rc::new(RefCell::new(Node::new(NodeKind::Text(c.to_string())))),
        );
    }

    fn insert_node(&mut self, root: &Rc<RefCell<Node>>, kind: NodeKind) {
        let current = self.current_node(root);
        append_child(&current, Rc::new(RefCell::new(Node::new(kind))));
    }

    /// 開始タグを DOM に挿入する
    ///
    /// 空要素（`<br>` など）や自己終了タグはスタックに積みません。
    fn insert_element(
        &mut self,
        root: &Rc<RefCell<Node>>,
        tag: &str,
        attributes: Vec<Attribute>,
        self_closing: bool,
    ) {
        self.close_implied_elements(tag);

        let current = self.current_node(root);
        let element = Element::new(tag, attributes);
        let opens = !(self_closing || element.is_void());

        let node = Rc::new(RefCell::new(Node::new(NodeKind::Element(element))));
        append_child(&current, node.clone());

        if opens {
            self.stack_of_open_elements.push(node);
        }
    }

    fn build(&mut self, root: &Rc<RefCell<Node>>) {
        while let Some(token) = self.t.next() {
            match token {
                HtmlToken::Char(c) => self.insert_char(root, c),
                HtmlToken::Comment(data) => self.insert_node(root, NodeKind::Comment(data)),
                HtmlToken::Doctype(name) => {
                    self.insert_node(root, NodeKind::DocumentType(name))
                }
                HtmlToken::StartTag {
                    tag,
                    self_closing,
                    attributes,
                } => self.insert_element(root, &tag, attributes, self_closing),
                HtmlToken::EndTag { tag } => {
                    if self.contain_in_stack(&tag) {
                        self.pop_until(&tag);
                    }
                }
            }
        }
        self.stack_of_open_elements.clear();
    }
}
