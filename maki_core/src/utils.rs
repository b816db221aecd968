//! utils - デバッグ用ユーティリティ（DOM をインデント付きの文字列にする）
//!
//! `Page` が解析直後とインクルード解決後に `trace!` で DOM の概形を出すのに使います。
//! `RUST_LOG=maki_core=trace` で確認できます。
//!
//! 出力イメージ
//! ```text
//! Document
//!   Element(Element { tag_name: "header", attributes: [] })
//!     Text("\n")
//!     Comment(" include error: nav.html ")
//! ```

use crate::renderer::dom::node::Node;
use std::cell::RefCell;
use std::rc::Rc;

// ルートノードから、インデント付きのツリー文字列を作る
pub fn convert_dom_to_string(root: &Option<Rc<RefCell<Node>>>) -> String {
    let mut result = String::from("\n");
    convert_dom_to_string_internal(root, 0, &mut result);
    result
}

// 自分 → 最初の子（深さ+1） → 次の兄弟（同じ深さ）
fn convert_dom_to_string_internal(
    node: &Option<Rc<RefCell<Node>>>,
    depth: usize,
    result: &mut String,
) {
    if let Some(n) = node {
        result.push_str(&"  ".repeat(depth));
        result.push_str(&format!("{:?}", n.borrow().kind()));
        result.push('\n');
        convert_dom_to_string_internal(&n.borrow().first_child(), depth + 1, result);
        convert_dom_to_string_internal(&n.borrow().next_sibling(), depth, result);
    }
}
