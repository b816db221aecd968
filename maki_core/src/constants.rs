//! インクルード処理で使う固定値
//!
//! 属性名・イベント名・要素 id など、ページ作者から見える名前をまとめています。

// インクルードマーカー。値は取得するフラグメントの相対/絶対 URL。
// 例: <div data-include="components/navbar.html"></div>
pub static INCLUDE_ATTRIBUTE: &str = "data-include";

// 取得失敗時に差し込むコメントの接頭辞
// 例: <!-- include error: components/navbar.html -->
pub static INCLUDE_ERROR_PREFIX: &str = "include error:";

// 文書のパースが終わったときにドキュメントへ配信されるイベント
pub static DOM_CONTENT_LOADED_EVENT: &str = "DOMContentLoaded";
pub static LOAD_EVENT: &str = "load";

// すべてのインクルード（入れ子を含む）と補助処理が終わったときのイベント
pub static INCLUDES_READY_EVENT: &str = "includes:ready";

// 補助処理の対象要素の id
pub static YEAR_ELEMENT_ID: &str = "year";
pub static LAST_UPDATED_ELEMENT_ID: &str = "last-updated";

// `#last-updated` の既定フォーマット（chrono の strftime 形式）。
// en-US の `toLocaleDateString()` と同じ "10/19/2026" の形になります。
pub static DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y";
