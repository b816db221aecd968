//! DOM のユーティリティ API
//!
//! DOM ツリー（`Node`）をたどったり書き換えたりする小さなヘルパー関数群です。
//! 実ブラウザで言うと、次の API のごく限定的な版にあたります。
//! - `parent.appendChild(child)` / `parent.replaceChildren()`
//! - `root.querySelectorAll("[name]")` / `document.getElementById(id)`
//! - `el.innerHTML = html` / `el.textContent = text`
//!
//! 探索順はどれも「自分の子 → その子孫 → 次の兄弟」の深さ優先（= 文書順）です。

use crate::renderer::dom::node::AttributeHost;
use crate::renderer::dom::node::Node;
use crate::renderer::dom::node::NodeKind;
use crate::renderer::html::parser::HtmlParser;
use crate::renderer::html::token::HtmlTokenizer;
use std::cell::RefCell;
use std::rc::Rc;
use std::rc::Weak;

/// `child` を `parent` の最後の子として追加する
///
/// 兄弟リンク（previous/next）と親子リンク（parent/first_child/last_child）をまとめて張ります。
pub fn append_child(parent: &Rc<RefCell<Node>>, child: Rc<RefCell<Node>>) {
    let last = parent.borrow().last_child().upgrade();

    match last {
        Some(last) => {
            last.borrow_mut().set_next_sibling(Some(child.clone()));
            child.borrow_mut().set_previous_sibling(Rc::downgrade(&last));
        }
        None => parent.borrow_mut().set_first_child(Some(child.clone())),
    }

    parent.borrow_mut().set_last_child(Rc::downgrade(&child));
    child.borrow_mut().set_parent(Rc::downgrade(parent));
}

/// 子をすべて取り外す（`replaceChildren()` 相当）
///
/// 取り外した子の親リンクも切っておくので、外側に参照が残っていても元の木には戻れません。
pub fn remove_children(parent: &Rc<RefCell<Node>>) {
    for child in children(parent) {
        let mut child = child.borrow_mut();
        child.set_parent(Weak::new());
        child.set_previous_sibling(Weak::new());
        child.set_next_sibling(None);
    }

    let mut parent = parent.borrow_mut();
    parent.set_first_child(None);
    parent.set_last_child(Weak::new());
}

/// 直下の子を文書順に返す
pub fn children(node: &Rc<RefCell<Node>>) -> Vec<Rc<RefCell<Node>>> {
    let mut result = Vec::new();
    let mut child = node.borrow().first_child();
    while let Some(c) = child {
        child = c.borrow().next_sibling();
        result.push(c);
    }
    result
}

/// `root` の子孫のうち、属性 `name` を持つノードを文書順にすべて集める
///
/// - `root` 自身は含めません（`root.querySelectorAll("[name]")` と同じ）。
/// - 返すのは呼び出し時点のスナップショットです。あとで木が変わっても結果は変わりません。
pub fn query_all_with_attribute(root: &Rc<RefCell<Node>>, name: &str) -> Vec<Rc<RefCell<Node>>> {
    let mut result = Vec::new();
    collect_with_attribute(root, name, &mut result);
    result
}

fn collect_with_attribute(
    node: &Rc<RefCell<Node>>,
    name: &str,
    result: &mut Vec<Rc<RefCell<Node>>>,
) {
    for child in children(node) {
        if child.borrow().has_attribute(name) {
            result.push(child.clone());
        }
        collect_with_attribute(&child, name, result);
    }
}

/// `root` の子孫から `id` 属性が一致する最初の要素を返す
pub fn get_element_by_id(root: &Rc<RefCell<Node>>, id: &str) -> Option<Rc<RefCell<Node>>> {
    for child in children(root) {
        if child.borrow().get_attribute("id").as_deref() == Some(id) {
            return Some(child);
        }
        if let Some(found) = get_element_by_id(&child, id) {
            return Some(found);
        }
    }
    None
}

/// 中身を `html` を解析した結果で丸ごと置き換える（`el.innerHTML = html` 相当）
///
/// - サニタイズもテンプレート展開もしません。受け取った HTML をそのまま解析します。
/// - `<script>` / `<style>` の中身として代入された場合はタグとして解釈せず、1つの Text にします。
pub fn set_inner_html(node: &Rc<RefCell<Node>>, html: &str) {
    remove_children(node);

    let raw_text = node
        .borrow()
        .get_element()
        .map(|e| e.is_raw_text())
        .unwrap_or(false);
    if raw_text {
        if !html.is_empty() {
            append_child(
                node,
                Rc::new(RefCell::new(Node::new(NodeKind::Text(html.to_string())))),
            );
        }
        return;
    }

    HtmlParser::new(HtmlTokenizer::new(html.to_string())).parse_fragment(node);
}

/// 中身を1つの Text ノードに置き換える（`el.textContent = text` 相当）
pub fn set_text_content(node: &Rc<RefCell<Node>>, text: &str) {
    remove_children(node);
    if !text.is_empty() {
        append_child(
            node,
            Rc::new(RefCell::new(Node::new(NodeKind::Text(text.to_string())))),
        );
    }
}

/// 子孫の Text をつなげた文字列（`el.textContent` の読み取り相当）
pub fn text_content(node: &Rc<RefCell<Node>>) -> String {
    let mut result = String::new();
    for child in children(node) {
        match child.borrow().kind {
            NodeKind::Text(ref s) => result.push_str(s),
            NodeKind::Element(_) => result.push_str(&text_content(&child)),
            _ => {}
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::dom::node::Element;
    use crate::renderer::dom::node::Window;
    use crate::renderer::html::attribute::Attribute;
    use pretty_assertions::assert_eq;

    fn document_of(html: &str) -> Rc<RefCell<Node>> {
        HtmlParser::new(HtmlTokenizer::new(html.to_string()))
            .construct_tree()
            .document()
    }

    #[test]
    fn test_append_child_links() {
        let window = Window::new();
        let document = window.document();
        let a = Rc::new(RefCell::new(Node::new(NodeKind::Element(Element::new(
            "a",
            Vec::new(),
        )))));
        let b = Rc::new(RefCell::new(Node::new(NodeKind::Element(Element::new(
            "b",
            Vec::new(),
        )))));

        append_child(&document, a.clone());
        append_child(&document, b.clone());

        assert!(Rc::ptr_eq(&document.borrow().first_child().expect("first"), &a));
        assert!(Rc::ptr_eq(&document.borrow().last_child().upgrade().expect("last"), &b));
        assert!(Rc::ptr_eq(&a.borrow().next_sibling().expect("next"), &b));
        assert!(Rc::ptr_eq(&b.borrow().previous_sibling().upgrade().expect("prev"), &a));
        assert!(Rc::ptr_eq(&b.borrow().parent().upgrade().expect("parent"), &document));
    }

    #[test]
    fn test_remove_children() {
        let document = document_of("<ul><li>1</li><li>2</li></ul>");
        let ul = children(&document).remove(0);
        let first = children(&ul).remove(0);

        remove_children(&ul);

        assert!(children(&ul).is_empty());
        assert!(ul.borrow().last_child().upgrade().is_none());
        assert!(first.borrow().parent().upgrade().is_none());
        assert!(first.borrow().next_sibling().is_none());
    }

    #[test]
    fn test_query_all_with_attribute_in_document_order() {
        let document = document_of(
            "<div data-include=\"a\"><p data-include=\"b\"></p></div><span data-include=\"c\"></span>",
        );
        let found: Vec<String> = query_all_with_attribute(&document, "data-include")
            .iter()
            .filter_map(|n| n.borrow().get_attribute("data-include"))
            .collect();
        assert_eq!(found, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_query_all_excludes_root() {
        let document = document_of("<div data-include=\"a\"><p data-include=\"b\"></p></div>");
        let div = children(&document).remove(0);
        let found = query_all_with_attribute(&div, "data-include");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].borrow().tag_name(), Some("p"));
    }

    #[test]
    fn test_get_element_by_id() {
        let document = document_of("<footer><p>&copy; <span id=\"year\"></span></p></footer>");
        let year = get_element_by_id(&document, "year").expect("failed to find #year");
        assert_eq!(year.borrow().tag_name(), Some("span"));
        assert!(get_element_by_id(&document, "missing").is_none());
    }

    #[test]
    fn test_set_inner_html_replaces_children() {
        let document = document_of("<div><b>old</b></div>");
        let div = children(&document).remove(0);
        set_inner_html(&div, "<i>new</i> text");

        assert_eq!(text_content(&div), "new text");
        assert_eq!(children(&div)[0].borrow().tag_name(), Some("i"));
    }

    #[test]
    fn test_set_inner_html_on_script_is_text() {
        let script = Rc::new(RefCell::new(Node::new(NodeKind::Element(Element::new(
            "script",
            vec![Attribute::with_value("type", "module")],
        )))));
        set_inner_html(&script, "let a = '<b>';");
        let kids = children(&script);
        assert_eq!(kids.len(), 1);
        assert_eq!(
            kids[0].borrow().kind(),
            NodeKind::Text("let a = '<b>';".to_string())
        );
    }

    #[test]
    fn test_set_text_content() {
        let document = document_of("<span id=\"year\">1999<b>!</b></span>");
        let span = children(&document).remove(0);
        set_text_content(&span, "2026");
        assert_eq!(text_content(&span), "2026");
        assert_eq!(children(&span).len(), 1);

        set_text_content(&span, "");
        assert!(children(&span).is_empty());
    }
}
