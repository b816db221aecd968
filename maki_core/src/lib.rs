//! maki_core - HTML インクルード解決の“コア”ライブラリ
//!
//! 目的（なにを入れる？）
//! - 静的サイト向けの「`<div data-include="nav.html"></div>` を取得した HTML で置き換える」
//!   仕組みを、ブラウザの最小モデル（DOM・HTML パーサ・イベント）ごと提供します。
//! - ネットワーク I/O そのものは持ちません。取得は `include::Fetch` トレイト越しに
//!   上位クレート（例: `net_tokio`）へ任せ、ここは“純粋な DOM 処理”に集中します。
//!
//! 処理の流れ（ざっくり）
//! 1) `renderer::page::Page` が HTML 文字列を受け取り、トークナイズ→ツリービルドで DOM を作る
//! 2) 文書の解析が終わる（DOMContentLoaded）のを待つ
//! 3) `include::IncludeResolver` が `data-include` 付き要素を1パスずつ解決する
//!    （新しく差し込まれた HTML にマーカーがあれば次のパスで処理）
//! 4) `enhance` が `#year` / `#last-updated` を埋める
//! 5) ドキュメントに `includes:ready` イベントを1回だけ配信する
//!
//! 使い方（超ミニ例）
//! ```ignore
//! use maki_core::include::IncludeResolver;
//! use maki_core::renderer::page::Page;
//!
//! let page = Page::new();
//! page.receive_response(r#"<div data-include="nav.html"></div>"#.to_string());
//! let resolver = IncludeResolver::new(fetcher); // fetcher: impl Fetch
//! page.load_includes(&resolver).await;
//! println!("{}", page.html());
//! ```
//!
//! モジュール構成
//! - `error`: 共有の `Error` 型。
//! - `constants`: 属性名・イベント名・要素 id などの固定値。
//! - `include`: インクルード解決（本体）。
//! - `enhance`: 解決後に走る補助的な DOM 書き換え。
//! - `renderer`: DOM / HTML パーサ / ページ。
//! - `utils`: デバッグ用の DOM ダンプ。

pub mod constants;
pub mod enhance;
pub mod error; // 共有エラー型（Result<T, Error> 用）
pub mod include;
pub mod renderer;
pub mod utils;
