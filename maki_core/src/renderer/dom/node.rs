//! DOM ノード（Window/Document/Element/Text/Comment）の最小実装
//!
//! これは“ブラウザの内部表現（DOM: Document Object Model）”のごく小さなモデルです。
//! - HTML をパースすると「ノードの木構造（DOM ツリー）」が作られます。
//! - `Window`（最上位）→`Document`→`Element`/`Text`/`Comment` という階層を `Node` で表現します。
//! - `Element` はタグ名と属性（`attributes: Vec<Attribute>`）を持ちます。タグ名に制限はなく、
//!   `<x-footer>` のような未知の要素も普通の要素として扱います。
//! - 兄弟/親子リンクを持つ「双方向の木」を、`Rc<RefCell<...>>` と `Weak` で実現します。
//!
//! 所有関係
//! - 親 → 最初の子、兄 → 弟 は `Rc`（強参照）。
//! - 子 → 親、弟 → 兄、親 → 最後の子 は `Weak`（弱参照）。循環参照によるリークを防ぎます。
//!
//! 属性の扱い
//! - 属性の読み書きは `AttributeHost` トレイトにまとめています。
//!   インクルード解決は「この名前の属性を読めて、消せるノードか？」だけを問い合わせるので、
//!   要素の種類（div / section / 独自タグ）には依存しません。
//!
//! 例（<div data-include="nav.html"></div>）
//! ```ignore
//! let node = Node::new(NodeKind::Element(Element::new(
//!     "div",
//!     vec![Attribute::with_value("data-include", "nav.html")],
//! )));
//! assert_eq!(node.get_attribute("data-include"), Some("nav.html".to_string()));
//! ```

use crate::constants::DOM_CONTENT_LOADED_EVENT;
use crate::constants::LOAD_EVENT;
use crate::renderer::dom::event::Event;
use crate::renderer::dom::event::EventTarget;
use crate::renderer::html::attribute::Attribute;
use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;
use std::rc::Weak;

/// https://html.spec.whatwg.org/multipage/dom.html#current-document-readiness
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DocumentReadyState {
    Loading,
    Interactive,
    Complete,
}

/// ブラウザの `window` に相当。`Document` ノードと、文書の状態・イベントを持ちます。
#[derive(Debug)]
pub struct Window {
    document: Rc<RefCell<Node>>,
    ready_state: Cell<DocumentReadyState>,
    events: EventTarget,
}

impl Window {
    // 作成直後は空の Document で、状態は Loading（まだパース中）。
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            document: Rc::new(RefCell::new(Node::new(NodeKind::Document))),
            ready_state: Cell::new(DocumentReadyState::Loading),
            events: EventTarget::new(),
        })
    }

    // 実ブラウザ API の `window.document` に相当。
    pub fn document(&self) -> Rc<RefCell<Node>> {
        self.document.clone()
    }

    // `document.readyState` に相当。
    pub fn ready_state(&self) -> DocumentReadyState {
        self.ready_state.get()
    }

    /// 文書の状態を進める
    ///
    /// - `Interactive` になった瞬間に `DOMContentLoaded` を配信します。
    /// - `Complete` になった瞬間に `load` を配信します。
    /// - 同じ状態を再設定してもイベントは配信しません。
    pub fn set_ready_state(&self, state: DocumentReadyState) {
        if self.ready_state.replace(state) == state {
            return;
        }

        match state {
            DocumentReadyState::Interactive => {
                self.events
                    .dispatch_event(&Event::new(DOM_CONTENT_LOADED_EVENT));
            }
            DocumentReadyState::Complete => {
                self.events.dispatch_event(&Event::new(LOAD_EVENT));
            }
            DocumentReadyState::Loading => {}
        }
    }

    // ドキュメントに対するイベントの登録/配信先（`document.addEventListener` 相当）。
    pub fn document_events(&self) -> &EventTarget {
        &self.events
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    parent: Weak<RefCell<Node>>,
    first_child: Option<Rc<RefCell<Node>>>,
    last_child: Weak<RefCell<Node>>,
    previous_sibling: Weak<RefCell<Node>>,
    next_sibling: Option<Rc<RefCell<Node>>>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

// 子と次の兄弟は `Rc` で所有しているので、そのまま落とすと兄弟の数だけ再帰します。
// 所有リンクを外してスタックに積み、ループで解放します。
impl Drop for Node {
    fn drop(&mut self) {
        let mut stack: Vec<Rc<RefCell<Node>>> = Vec::new();
        stack.extend(self.first_child.take());
        stack.extend(self.next_sibling.take());

        while let Some(node) = stack.pop() {
            // まだ他から参照されているノードは、その参照が消えるときに解放されます。
            if let Ok(cell) = Rc::try_unwrap(node) {
                let mut node = cell.into_inner();
                stack.extend(node.first_child.take());
                stack.extend(node.next_sibling.take());
            }
        }
    }
}

impl Node {
    // ノードを新規に作成。リンク（親/兄弟/子）は空で、種別だけを持ちます。
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: Weak::new(),
            first_child: None,
            last_child: Weak::new(),
            previous_sibling: Weak::new(),
            next_sibling: None,
        }
    }

    pub fn set_parent(&mut self, parent: Weak<RefCell<Node>>) {
        self.parent = parent;
    }

    pub fn parent(&self) -> Weak<RefCell<Node>> {
        self.parent.clone()
    }

    pub fn set_first_child(&mut self, first_child: Option<Rc<RefCell<Node>>>) {
        self.first_child = first_child;
    }

    pub fn first_child(&self) -> Option<Rc<RefCell<Node>>> {
        self.first_child.as_ref().cloned()
    }

    pub fn set_last_child(&mut self, last_child: Weak<RefCell<Node>>) {
        self.last_child = last_child;
    }

    pub fn last_child(&self) -> Weak<RefCell<Node>> {
        self.last_child.clone()
    }

    pub fn set_previous_sibling(&mut self, previous_sibling: Weak<RefCell<Node>>) {
        self.previous_sibling = previous_sibling;
    }

    pub fn previous_sibling(&self) -> Weak<RefCell<Node>> {
        self.previous_sibling.clone()
    }

    pub fn set_next_sibling(&mut self, next_sibling: Option<Rc<RefCell<Node>>>) {
        self.next_sibling = next_sibling;
    }

    pub fn next_sibling(&self) -> Option<Rc<RefCell<Node>>> {
        self.next_sibling.as_ref().cloned()
    }

    pub fn kind(&self) -> NodeKind {
        self.kind.clone()
    }

    // Element ノードなら要素情報への参照を返す。それ以外は None。
    pub fn get_element(&self) -> Option<&Element> {
        match self.kind {
            NodeKind::Element(ref e) => Some(e),
            _ => None,
        }
    }

    pub fn get_element_mut(&mut self) -> Option<&mut Element> {
        match self.kind {
            NodeKind::Element(ref mut e) => Some(e),
            _ => None,
        }
    }

    // Element ノードならタグ名（"div" など）を返す。
    pub fn tag_name(&self) -> Option<&str> {
        self.get_element().map(|e| e.tag_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// https://dom.spec.whatwg.org/#interface-document
    Document,
    /// https://dom.spec.whatwg.org/#interface-documenttype
    DocumentType(String),
    /// https://dom.spec.whatwg.org/#interface-element
    Element(Element),
    /// https://dom.spec.whatwg.org/#interface-text
    Text(String),
    /// https://dom.spec.whatwg.org/#interface-comment
    Comment(String),
}

/// 名前付き属性を「読める・書ける・消せる」ノードの能力
///
/// `querySelectorAll("[data-include]")` と `getAttribute` / `removeAttribute` を
/// 要素の型階層から切り離したものです。
pub trait AttributeHost {
    fn get_attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&mut self, name: &str, value: &str);
    /// 属性を消す。消した場合は true。
    fn remove_attribute(&mut self, name: &str) -> bool;

    fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }
}

/// https://dom.spec.whatwg.org/#interface-element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag_name: String,
    attributes: Vec<Attribute>,
}

impl Element {
    // タグ名（小文字化して保持）と属性リストから Element を生成。
    pub fn new(tag_name: &str, attributes: Vec<Attribute>) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            attributes,
        }
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// この要素が持つ全属性（ソース上の順序を保持）
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn id(&self) -> Option<String> {
        self.get_attribute("id")
    }

    /// 子を持てない要素（終了タグを書かない要素）
    /// https://html.spec.whatwg.org/multipage/syntax.html#void-elements
    pub fn is_void(&self) -> bool {
        is_void_element(&self.tag_name)
    }

    /// 中身をタグとして解釈しない要素（`<script>` / `<style>`）
    pub fn is_raw_text(&self) -> bool {
        is_raw_text_element(&self.tag_name)
    }
}

impl AttributeHost for Element {
    // 名前比較は完全一致。属性名はトークナイザで小文字化済みの想定です。
    // 重複属性は想定せず、最初に見つかった 1 件を返します。
    fn get_attribute(&self, name: &str) -> Option<String> {
        self.attributes
            .iter()
            .find(|attr| attr.name() == name)
            .map(|attr| attr.value().to_string())
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|attr| attr.name() == name) {
            Some(attr) => attr.set_value(value),
            None => self.attributes.push(Attribute::with_value(name, value)),
        }
    }

    fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|attr| attr.name() != name);
        self.attributes.len() != before
    }
}

// Document / Text / Comment は属性を持たないので、読み取りは常に None、書き込みは無視。
impl AttributeHost for Node {
    fn get_attribute(&self, name: &str) -> Option<String> {
        self.get_element().and_then(|e| e.get_attribute(name))
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        if let Some(e) = self.get_element_mut() {
            e.set_attribute(name, value);
        }
    }

    fn remove_attribute(&mut self, name: &str) -> bool {
        match self.get_element_mut() {
            Some(e) => e.remove_attribute(name),
            None => false,
        }
    }
}

pub fn is_void_element(tag_name: &str) -> bool {
    matches!(
        tag_name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

pub fn is_raw_text_element(tag_name: &str) -> bool {
    matches!(tag_name, "script" | "style")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use crate::renderer::dom::api::append_child;
    use crate::renderer::dom::api::children;

    #[test]
    fn test_drop_long_sibling_chain() {
        let parent = Rc::new(RefCell::new(Node::new(NodeKind::Document)));
        for _ in 0..200_000 {
            let child = Node::new(NodeKind::Element(Element::new("i", Vec::new())));
            append_child(&parent, Rc::new(RefCell::new(child)));
        }
        assert_eq!(children(&parent).len(), 200_000);
        drop(parent);
    }

    #[test]
    fn test_drop_deep_nesting() {
        let root = Rc::new(RefCell::new(Node::new(NodeKind::Document)));
        let mut current = root.clone();
        for _ in 0..200_000 {
            let child = Rc::new(RefCell::new(Node::new(NodeKind::Element(Element::new(
                "div",
                Vec::new(),
            )))));
            append_child(&current, child.clone());
            current = child;
        }
        drop(current);
        drop(root);
    }

    #[test]
    fn test_drop_keeps_externally_held_child() {
        let parent = Rc::new(RefCell::new(Node::new(NodeKind::Document)));
        let kept = Rc::new(RefCell::new(Node::new(NodeKind::Text("kept".to_string()))));
        append_child(&parent, kept.clone());
        append_child(
            &parent,
            Rc::new(RefCell::new(Node::new(NodeKind::Text("tail".to_string())))),
        );

        drop(parent);
        assert_eq!(kept.borrow().kind(), NodeKind::Text("kept".to_string()));
        assert!(kept.borrow().parent().upgrade().is_none());
    }

    #[test]
    fn test_attribute_host_on_element() {
        let mut e = Element::new(
            "DIV",
            vec![
                Attribute::with_value("id", "nav"),
                Attribute::with_value("data-include", "nav.html"),
            ],
        );
        assert_eq!(e.tag_name(), "div");
        assert!(e.has_attribute("data-include"));
        assert_eq!(e.get_attribute("data-include"), Some("nav.html".to_string()));

        assert!(e.remove_attribute("data-include"));
        assert!(!e.remove_attribute("data-include"));
        assert!(!e.has_attribute("data-include"));
        assert_eq!(e.attributes(), &[Attribute::with_value("id", "nav")]);

        e.set_attribute("id", "footer");
        assert_eq!(e.id(), Some("footer".to_string()));
    }

    #[test]
    fn test_attribute_host_on_non_element() {
        let mut text = Node::new(NodeKind::Text("hi".to_string()));
        assert_eq!(text.get_attribute("data-include"), None);
        text.set_attribute("data-include", "a.html");
        assert!(!text.has_attribute("data-include"));
        assert!(!text.remove_attribute("data-include"));
    }

    #[test]
    fn test_ready_state_events() {
        let window = Window::new();
        let loaded = Rc::new(Cell::new(0));
        let complete = Rc::new(Cell::new(0));

        let l = loaded.clone();
        window
            .document_events()
            .add_event_listener(DOM_CONTENT_LOADED_EVENT, move |_| l.set(l.get() + 1));
        let c = complete.clone();
        window
            .document_events()
            .add_event_listener(LOAD_EVENT, move |_| c.set(c.get() + 1));

        assert_eq!(window.ready_state(), DocumentReadyState::Loading);
        window.set_ready_state(DocumentReadyState::Interactive);
        window.set_ready_state(DocumentReadyState::Interactive);
        window.set_ready_state(DocumentReadyState::Complete);

        assert_eq!(window.ready_state(), DocumentReadyState::Complete);
        assert_eq!(loaded.get(), 1);
        assert_eq!(complete.get(), 1);
    }

    #[test]
    fn test_void_and_raw_text() {
        assert!(Element::new("br", Vec::new()).is_void());
        assert!(!Element::new("div", Vec::new()).is_void());
        assert!(Element::new("script", Vec::new()).is_raw_text());
        assert!(!Element::new("span", Vec::new()).is_raw_text());
    }
}
