//! HTML 属性（attribute）の最小表現とユーティリティ
//!
//! 目的（概要）
//! - HTML の `name="value"` のペアを表すシンプルな構造体です。
//! - トークナイザが1文字ずつ読み進める想定で、`add_char` で名前／値に文字を追加できます。
//! - DOM 側から書き換えるときは `Attribute::with_value` / `set_value` を使います。
//!
//! 使い方（イメージ）
//! ```ignore
//! use maki_core::renderer::html::attribute::Attribute;
//!
//! // name="value" を1文字ずつ作る
//! let mut attr = Attribute::new();
//! for ch in "data-include".chars() { attr.add_char(ch, true); } // name 部分
//! for ch in "nav.html".chars() { attr.add_char(ch, false); }    // value 部分
//! assert_eq!(attr.name(), "data-include");
//! assert_eq!(attr.value(), "nav.html");
//! ```

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribute {
    name: String,  // 例: "data-include"
    value: String, // 例: "components/navbar.html"
}

impl Attribute {
    // 空の name/value で開始します。
    pub fn new() -> Self {
        Self::default()
    }

    // 名前と値が決まっている属性を作る（DOM API からの setAttribute 用）
    pub fn with_value(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    // 1文字を追加する。`is_name=true` なら name 側、false なら value 側へ。
    pub fn add_char(&mut self, c: char, is_name: bool) {
        if is_name {
            self.name.push(c);
        } else {
            self.value.push(c)
        }
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_char() {
        let mut attr = Attribute::new();
        for c in "id".chars() {
            attr.add_char(c, true);
        }
        for c in "year".chars() {
            attr.add_char(c, false);
        }
        assert_eq!(attr, Attribute::with_value("id", "year"));
    }

    #[test]
    fn test_set_value() {
        let mut attr = Attribute::with_value("data-include", "a.html");
        attr.set_value("b.html");
        assert_eq!(attr.name(), "data-include");
        assert_eq!(attr.value(), "b.html");
    }
}
