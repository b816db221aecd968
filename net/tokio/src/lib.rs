//! net_tokio - tokio 上で動くネットワーク層（HTTP でフラグメントを取得する）
//!
//! 役割
//! - `maki_core::include::Fetch` を reqwest で実装した `HttpClient` を提供します。
//! - `maki_core` 自身は I/O を持たないので、実際の取得はこのクレートが担当します。
//!
//! 使い方（例）
//! ```ignore
//! use maki_core::include::IncludeResolver;
//! use net_tokio::http::{HttpClient, HttpClientConfig};
//!
//! let client = HttpClient::new(
//!     HttpClientConfig::default().with_base_url("https://example.com/index.html"),
//! )?;
//! let resolver = IncludeResolver::new(client);
//! ```

pub mod http;
