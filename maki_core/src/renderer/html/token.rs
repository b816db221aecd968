//! HTML トークナイザ
//!
//! HTML の文字列を「トークン（部品）」に分割する状態機械です。
//! 文字を1つずつ読み進め、状態(State)に応じて `StartTag` / `EndTag` / `Char` /
//! `Comment` / `Doctype` を返します。
//!
//! サンプル（入力 → トークン列）
//! ```text
//! 入力: <div data-include="a.html">hi</div><!-- note -->
//! 出力: StartTag { tag: "div", attributes: [("data-include","a.html")], self_closing: false }
//!         Char('h')
//!         Char('i')
//!         EndTag { tag: "div" }
//!         Comment(" note ")
//! ```
//!
//! コード例（イテレータとして使う）
//! ```ignore
//! use maki_core::renderer::html::token::{HtmlTokenizer, HtmlToken};
//! let mut it = HtmlTokenizer::new("<br/>".to_string());
//! assert!(matches!(it.next(), Some(HtmlToken::StartTag{ tag, self_closing: true, .. }) if tag == "br"));
//! assert!(it.next().is_none());
//! ```
//!
//! reconsume の意図
//! - 「読み取り位置は進めたが、その文字を次の状態でもう一度処理したい」ときに使います。
//!
//! インクルード用途で効いてくる点
//! - フラグメントはそのまま DOM に差し込まれ、あとで `innerHTML` として書き戻されます。
//!   空白・コメント・`<script>` の中身を落とさないことが“往復で変わらない”ための条件です。
//! - 文字参照は HTML5 の名前付き参照表（`entities` クレート）と数値参照でデコードします。
//!   `&copy;` は `©` になり、シリアライズ時にはその文字のまま書き出されます。
//!   表にない名前（`&nosuch;` など）は `&` をそのまま文字として残します。
//!
//! 注意
//! - WHATWG HTML のトークナイザのサブセットです。CDATA、`<textarea>`/`<title>` の RCDATA などは未対応。

use crate::renderer::dom::node::is_raw_text_element;
use crate::renderer::html::attribute::Attribute;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlToken {
    // 開始タグ（例: <div class="a">）
    StartTag {
        tag: String,
        self_closing: bool,
        attributes: Vec<Attribute>,
    },
    // 終了タグ（例: </div>）
    EndTag {
        tag: String,
    },
    // テキストノードの 1 文字（例: 'h'）
    Char(char),
    // コメントの中身（例: <!-- x --> なら " x "）
    Comment(String),
    // DOCTYPE の中身（例: <!DOCTYPE html> なら "html"）
    Doctype(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// https://html.spec.whatwg.org/multipage/parsing.html#data-state
    Data,
    /// https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state
    TagOpen,
    /// https://html.spec.whatwg.org/multipage/parsing.html#end-tag-open-state
    EndTagOpen,
    /// https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state
    TagName,
    /// https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state
    BeforeAttributeName,
    /// https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state
    AttributeName,
    /// https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-name-state
    AfterAttributeName,
    /// https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-value-state
    BeforeAttributeValue,
    /// https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(double-quoted)-state
    AttributeValueDoubleQuoted,
    /// https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(single-quoted)-state
    AttributeValueSingleQuoted,
    /// https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(unquoted)-state
    AttributeValueUnquoted,
    /// https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-value-(quoted)-state
    AfterAttributeValueQuoted,
    /// https://html.spec.whatwg.org/multipage/parsing.html#self-closing-start-tag-state
    SelfClosingStartTag,
    /// https://html.spec.whatwg.org/multipage/parsing.html#comment-state
    Comment,
    /// https://html.spec.whatwg.org/multipage/parsing.html#bogus-comment-state
    BogusComment,
    /// https://html.spec.whatwg.org/multipage/parsing.html#doctype-state
    Doctype,
    /// https://html.spec.whatwg.org/multipage/parsing.html#rawtext-state
    RawText,
    /// https://html.spec.whatwg.org/multipage/parsing.html#rawtext-less-than-sign-state
    RawTextLessThanSign,
    /// https://html.spec.whatwg.org/multipage/parsing.html#rawtext-end-tag-open-state
    RawTextEndTagOpen,
    /// https://html.spec.whatwg.org/multipage/parsing.html#rawtext-end-tag-name-state
    RawTextEndTagName,
    /// https://html.spec.whatwg.org/multipage/parsing.html#temporary-buffer
    TemporaryBuffer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTokenizer {
    state: State,                    // 現在の状態（状態機械）
    pos: usize,                      // 次に読む入力位置（0..len）
    reconsume: bool,                 // 直前に読んだ文字を“もう一度この状態で”処理したいとき true
    latest_token: Option<HtmlToken>, // 生成途中のタグトークンを保持
    input: Vec<char>,                // 入力全体を char ベクタ化したもの
    buf: String,                     // コメント・DOCTYPE・RAWTEXT 終了タグ判定用の一時バッファ
    last_start_tag: String,          // RAWTEXT を抜けるための「対応する終了タグ名」
    pending: VecDeque<char>,         // 複数文字に展開された文字参照の残り
}

fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

// `copy` → "©"。`;` 付きの名前だけを引く（`&copy` のような省略形は対象外）。
fn named_character_reference(name: &str) -> Option<&'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        entities::ENTITIES
            .iter()
            .filter_map(|e| {
                let name = e.entity.strip_prefix('&')?.strip_suffix(';')?;
                Some((name, e.characters))
            })
            .collect()
    });
    table.get(name).copied()
}

impl HtmlTokenizer {
    /// 文字列からトークナイザを作成します。初期状態は `State::Data`。
    pub fn new(html: String) -> Self {
        Self {
            state: State::Data,
            pos: 0,
            reconsume: false,
            latest_token: None,
            input: html.chars().collect(),
            buf: String::new(),
            last_start_tag: String::new(),
            pending: VecDeque::new(),
        }
    }

    /// 直前の1文字を“もう一度”返します（`reconsume = true` のとき専用）。
    fn reconsume_input(&mut self) -> char {
        self.reconsume = false;
        self.input[self.pos - 1]
    }

    /// 次の1文字を返し、`pos` を 1 進めます。
    fn consume_next_input(&mut self) -> char {
        let c = self.input[self.pos];
        self.pos += 1;
        c
    }

    /// 現在位置から `s` が続くか（ASCII の大文字小文字は区別しない）
    fn next_input_matches(&self, s: &str) -> bool {
        let mut i = self.pos;
        for expected in s.chars() {
            match self.input.get(i) {
                Some(c) if c.eq_ignore_ascii_case(&expected) => i += 1,
                _ => return false,
            }
        }
        true
    }

    /// `&` の直後から文字参照を読み取る
    ///
    /// - 成功したら参照全体（`;` まで）を消費してデコード結果を返します（2文字になる参照もある）。
    /// - 失敗したら何も消費せず None。呼び出し側は `&` を普通の文字として扱います。
    /// - 末尾の `;` は必須にしています（`&amp` のような省略形は文字のまま残る）。
    fn consume_character_reference(&mut self) -> Option<String> {
        let start = self.pos;
        let mut end = start;
        while end < self.input.len() && end - start <= 32 && self.input[end] != ';' {
            end += 1;
        }
        if end >= self.input.len() || self.input[end] != ';' || end == start {
            return None;
        }

        let body: String = self.input[start..end].iter().collect();
        let decoded = match body.strip_prefix('#') {
            Some(numeric) => {
                let code = match numeric.strip_prefix(['x', 'X']) {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => numeric.parse::<u32>().ok(),
                };
                code.and_then(char::from_u32).map(String::from)
            }
            None => named_character_reference(&body).map(String::from),
        };

        if decoded.is_some() {
            self.pos = end + 1;
        }
        decoded
    }

    /// StartTag/EndTag の生成を開始し、`latest_token` に仮置きします。
    fn create_tag(&mut self, start_tag_token: bool) {
        if start_tag_token {
            self.latest_token = Some(HtmlToken::StartTag {
                tag: String::new(),
                self_closing: false,
                attributes: Vec::new(),
            });
        } else {
            self.latest_token = Some(HtmlToken::EndTag { tag: String::new() })
        }
    }

    /// 生成中のタグ名に1文字追加します。
    fn append_tag_name(&mut self, c: char) {
        assert!(self.latest_token.is_some());

        if let Some(t) = self.latest_token.as_mut() {
            match t {
                HtmlToken::StartTag { ref mut tag, .. } | HtmlToken::EndTag { ref mut tag } => {
                    tag.push(c)
                }
                _ => panic!("`latest_token` should be either StartTag or EndTag"),
            }
        }
    }

    /// 完成したタグトークンを取り出して返す
    ///
    /// `<script>` / `<style>` の開始タグなら、以降の中身を RAWTEXT として読むよう状態を切り替えます。
    fn emit_tag(&mut self) -> Option<HtmlToken> {
        assert!(self.latest_token.is_some());

        let t = self.latest_token.take();
        self.state = State::Data;

        if let Some(HtmlToken::StartTag {
            ref tag,
            self_closing: false,
            ..
        }) = t
        {
            if is_raw_text_element(tag) {
                self.last_start_tag = tag.clone();
                self.state = State::RawText;
            }
        }

        t
    }

    /// 新しい属性を開始します（`StartTag.attributes` に空の Attribute を push）。
    ///
    /// 終了タグに書かれた属性は捨てる決まりなので、EndTag のときは何もしません。
    fn start_new_attribute(&mut self) {
        assert!(self.latest_token.is_some());

        if let Some(HtmlToken::StartTag {
            ref mut attributes,
            ..
        }) = self.latest_token.as_mut()
        {
            attributes.push(Attribute::new());
        }
    }

    /// 現在の属性の name/value のどちらかに 1 文字を追加します。
    fn append_attribute(&mut self, c: char, is_name: bool) {
        assert!(self.latest_token.is_some());

        if let Some(HtmlToken::StartTag {
            ref mut attributes,
            ..
        }) = self.latest_token.as_mut()
        {
            if let Some(attr) = attributes.last_mut() {
                attr.add_char(c, is_name);
            }
        }
    }

    /// 属性値の中の文字を追加する（`&` なら文字参照を試す）
    fn append_attribute_value(&mut self, c: char) {
        if c == '&' {
            match self.consume_character_reference() {
                Some(decoded) => {
                    for d in decoded.chars() {
                        self.append_attribute(d, /*is_name*/ false);
                    }
                }
                None => self.append_attribute('&', /*is_name*/ false),
            }
            return;
        }
        self.append_attribute(c, /*is_name*/ false);
    }

    /// 現在の StartTag を自己終了（`<br/>` など）としてマークします。
    fn set_self_closing_flag(&mut self) {
        assert!(self.latest_token.is_some());

        if let Some(HtmlToken::StartTag {
            ref mut self_closing,
            ..
        }) = self.latest_token.as_mut()
        {
            *self_closing = true;
        }
    }

    /// 入力が尽きたときの後始末
    ///
    /// - 閉じていないコメントは、そこまでの中身をコメントとして返す。
    /// - `<` だけで終わった場合は文字として返す。
    /// - 作りかけのタグは捨てる。
    fn handle_eof(&mut self) -> Option<HtmlToken> {
        let state = std::mem::replace(&mut self.state, State::Data);
        self.latest_token = None;

        match state {
            State::Comment | State::BogusComment => {
                Some(HtmlToken::Comment(std::mem::take(&mut self.buf)))
            }
            State::Doctype => Some(HtmlToken::Doctype(
                std::mem::take(&mut self.buf).trim().to_string(),
            )),
            State::TagOpen | State::RawTextLessThanSign => Some(HtmlToken::Char('<')),
            _ => None,
        }
    }
}

impl Iterator for HtmlTokenizer {
    type Item = HtmlToken;

    fn next(&mut self) -> Option<Self::Item> {
        // この関数は「最大で1つのトークン」を返すのがルールです。
        // まだトークンが確定しない場合は `continue` で次の文字へ進みます。
        if let Some(c) = self.pending.pop_front() {
            return Some(HtmlToken::Char(c));
        }

        loop {
            let c = if self.reconsume {
                self.reconsume_input()
            } else if self.pos < self.input.len() {
                self.consume_next_input()
            } else {
                return self.handle_eof();
            };

            match self.state {
                State::Data => {
                    if c == '<' {
                        self.state = State::TagOpen;
                        continue;
                    }

                    if c == '&' {
                        let decoded = self
                            .consume_character_reference()
                            .unwrap_or_else(|| String::from("&"));
                        let mut decoded = decoded.chars();
                        let first = decoded.next().unwrap_or('&');
                        self.pending.extend(decoded);
                        return Some(HtmlToken::Char(first));
                    }

                    return Some(HtmlToken::Char(c));
                }

                State::TagOpen => {
                    // `<` の直後に来る文字で分岐：`/` なら終了タグ、英字なら開始タグ、`!` なら宣言。
                    if c == '/' {
                        self.state = State::EndTagOpen;
                        continue;
                    }

                    if c == '!' {
                        self.buf.clear();
                        if self.next_input_matches("--") {
                            self.pos += 2;
                            self.state = State::Comment;
                        } else if self.next_input_matches("doctype") {
                            self.pos += "doctype".len();
                            self.state = State::Doctype;
                        } else {
                            self.state = State::BogusComment;
                        }
                        continue;
                    }

                    if c == '?' {
                        self.buf.clear();
                        self.buf.push(c);
                        self.state = State::BogusComment;
                        continue;
                    }

                    if c.is_ascii_alphabetic() {
                        self.reconsume = true; // 同じ文字を TagName で一文字目として処理
                        self.state = State::TagName;
                        self.create_tag(true);
                        continue;
                    }

                    // タグではなかったので `<` を文字として返し、今の文字はデータとして読み直す
                    self.reconsume = true;
                    self.state = State::Data;
                    return Some(HtmlToken::Char('<'));
                }

                State::EndTagOpen => {
                    if c.is_ascii_alphabetic() {
                        self.reconsume = true;
                        self.state = State::TagName;
                        self.create_tag(false);
                        continue;
                    }

                    if c == '>' {
                        // `</>` は何も生まない
                        self.state = State::Data;
                        continue;
                    }

                    self.buf.clear();
                    self.reconsume = true;
                    self.state = State::BogusComment;
                }

                State::TagName => {
                    if is_html_whitespace(c) {
                        self.state = State::BeforeAttributeName;
                        continue;
                    }

                    if c == '/' {
                        self.state = State::SelfClosingStartTag;
                        continue;
                    }

                    if c == '>' {
                        return self.emit_tag();
                    }

                    self.append_tag_name(c.to_ascii_lowercase());
                }

                State::BeforeAttributeName => {
                    if is_html_whitespace(c) {
                        continue;
                    }

                    if c == '/' || c == '>' {
                        self.reconsume = true;
                        self.state = State::AfterAttributeName;
                        continue;
                    }

                    self.reconsume = true;
                    self.state = State::AttributeName;
                    self.start_new_attribute(); // 空の Attribute を attributes へプッシュ
                }

                State::AttributeName => {
                    if is_html_whitespace(c) || c == '/' || c == '>' {
                        self.reconsume = true;
                        self.state = State::AfterAttributeName;
                        continue;
                    }

                    if c == '=' {
                        self.state = State::BeforeAttributeValue;
                        continue;
                    }

                    self.append_attribute(c.to_ascii_lowercase(), /*is_name*/ true);
                }

                State::AfterAttributeName => {
                    if is_html_whitespace(c) {
                        continue;
                    }

                    if c == '/' {
                        self.state = State::SelfClosingStartTag;
                        continue;
                    }

                    if c == '=' {
                        self.state = State::BeforeAttributeValue;
                        continue;
                    }

                    if c == '>' {
                        return self.emit_tag();
                    }

                    self.reconsume = true;
                    self.state = State::AttributeName;
                    self.start_new_attribute();
                }

                State::BeforeAttributeValue => {
                    if is_html_whitespace(c) {
                        continue;
                    }

                    if c == '"' {
                        self.state = State::AttributeValueDoubleQuoted;
                        continue;
                    }

                    if c == '\'' {
                        self.state = State::AttributeValueSingleQuoted;
                        continue;
                    }

                    if c == '>' {
                        // `<div a=>` は空の値
                        return self.emit_tag();
                    }

                    self.reconsume = true;
                    self.state = State::AttributeValueUnquoted;
                }

                State::AttributeValueDoubleQuoted => {
                    if c == '"' {
                        self.state = State::AfterAttributeValueQuoted;
                        continue;
                    }

                    self.append_attribute_value(c);
                }

                State::AttributeValueSingleQuoted => {
                    if c == '\'' {
                        self.state = State::AfterAttributeValueQuoted;
                        continue;
                    }

                    self.append_attribute_value(c);
                }

                State::AttributeValueUnquoted => {
                    if is_html_whitespace(c) {
                        self.state = State::BeforeAttributeName;
                        continue;
                    }

                    if c == '>' {
                        return self.emit_tag();
                    }

                    self.append_attribute_value(c);
                }

                State::AfterAttributeValueQuoted => {
                    if is_html_whitespace(c) {
                        self.state = State::BeforeAttributeName;
                        continue;
                    }

                    if c == '/' {
                        self.state = State::SelfClosingStartTag;
                        continue;
                    }

                    if c == '>' {
                        return self.emit_tag();
                    }

                    self.reconsume = true;
                    self.state = State::BeforeAttributeName;
                }

                State::SelfClosingStartTag => {
                    if c == '>' {
                        self.set_self_closing_flag();
                        return self.emit_tag();
                    }

                    self.reconsume = true;
                    self.state = State::BeforeAttributeName;
                }

                State::Comment => {
                    // `-->` で閉じる。`c` が '-' で、続きが "->" なら終わり。
                    if c == '-' && self.next_input_matches("->") {
                        self.pos += 2;
                        self.state = State::Data;
                        return Some(HtmlToken::Comment(std::mem::take(&mut self.buf)));
                    }

                    self.buf.push(c);
                }

                State::BogusComment => {
                    if c == '>' {
                        self.state = State::Data;
                        return Some(HtmlToken::Comment(std::mem::take(&mut self.buf)));
                    }

                    self.buf.push(c);
                }

                State::Doctype => {
                    if c == '>' {
                        self.state = State::Data;
                        let doctype = std::mem::take(&mut self.buf).trim().to_string();
                        return Some(HtmlToken::Doctype(doctype));
                    }

                    self.buf.push(c);
                }

                State::RawText => {
                    // `<script>` / `<style>` の中身。対応する終了タグ以外はすべて文字。
                    if c == '<' {
                        self.state = State::RawTextLessThanSign;
                        continue;
                    }

                    return Some(HtmlToken::Char(c));
                }

                State::RawTextLessThanSign => {
                    if c == '/' {
                        self.buf.clear();
                        self.state = State::RawTextEndTagOpen;
                        continue;
                    }

                    self.reconsume = true;
                    self.state = State::RawText;
                    return Some(HtmlToken::Char('<'));
                }

                State::RawTextEndTagOpen => {
                    if c.is_ascii_alphabetic() {
                        self.reconsume = true;
                        self.state = State::RawTextEndTagName;
                        self.create_tag(false);
                        continue;
                    }

                    // "</" を文字として吐き出してから RAWTEXT に戻る
                    self.buf = String::from("</");
                    self.reconsume = true;
                    self.state = State::TemporaryBuffer;
                }

                State::RawTextEndTagName => {
                    if c.is_ascii_alphabetic() {
                        self.buf.push(c);
                        self.append_tag_name(c.to_ascii_lowercase());
                        continue;
                    }

                    let appropriate = self.buf.eq_ignore_ascii_case(&self.last_start_tag);
                    if appropriate && is_html_whitespace(c) {
                        self.state = State::BeforeAttributeName;
                        continue;
                    }
                    if appropriate && c == '/' {
                        self.state = State::SelfClosingStartTag;
                        continue;
                    }
                    if appropriate && c == '>' {
                        return self.emit_tag();
                    }

                    // 対応する終了タグではなかった。読んだ分を文字として返す。
                    self.latest_token = None;
                    self.buf = String::from("</") + &self.buf;
                    self.reconsume = true;
                    self.state = State::TemporaryBuffer;
                }

                State::TemporaryBuffer => {
                    // 一時バッファを1文字ずつ吐き出してから RAWTEXT に戻る
                    self.reconsume = true;

                    if self.buf.is_empty() {
                        self.state = State::RawText;
                        continue;
                    }

                    let c = self.buf.remove(0);
                    return Some(HtmlToken::Char(c));
                }
            }
        }
    }
}
