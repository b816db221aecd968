//! maki_core::error - アプリ全体で使うエラー型
//!
//! 目的（概要）
//! - フラグメント取得などの失敗パターンをざっくり分類した列挙体です。
//! - `thiserror` で `std::error::Error` と `Display` を実装しているので、
//!   バイナリ側では `anyhow::Result` へそのまま `?` で流せます。
//!
//! インクルード解決の観点では「取得失敗」は1種類だけです。
//! `Network`（接続・送受信の失敗）も `Status`（2xx 以外の応答）も、
//! 要素の中身をコメントに置き換えるという同じ扱いになります。
//!
//! 使い方（例）
//! ```ignore
//! use maki_core::error::Error;
//!
//! fn fetch() -> Result<String, Error> {
//!     Err(Error::Status { url: "b.html".to_string(), status: 404 })
//! }
//! ```

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// ネットワーク関連の失敗（接続不可・送受信エラー・DNS失敗など）
    #[error("network error: {0}")]
    Network(String),
    /// 応答は届いたがステータスが成功（2xx）ではなかった
    #[error("failed to fetch {url}: {status}")]
    Status { url: String, status: u16 },
    /// 予期しない入力（URL の形式不正・未対応の値など）
    #[error("unexpected input: {0}")]
    UnexpectedInput(String),
    /// 上記に当てはまらない汎用的な失敗
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// 2xx 以外の応答による失敗かどうか
    pub fn is_status(&self) -> bool {
        matches!(self, Error::Status { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = Error::Status {
            url: "b.html".to_string(),
            status: 404,
        };
        assert_eq!(e.to_string(), "failed to fetch b.html: 404");
        assert!(e.is_status());

        let e = Error::Network("connection refused".to_string());
        assert_eq!(e.to_string(), "network error: connection refused");
        assert!(!e.is_status());
    }
}
