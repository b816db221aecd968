//! net_tokio::http - reqwest を使った HTTP クライアント
//!
//! - 相対パス（`components/nav.html`）はベース URL を基準に解決します（`url` クレートの `join`）。
//!   絶対 URL はそのまま使います。
//! - どのリクエストにも `Cache-Control: no-cache` / `Pragma: no-cache` / `Accept: text/html` を付けます。
//! - 2xx 以外の応答は `Error::Status`、接続や受信の失敗は `Error::Network` になります。

use async_trait::async_trait;
use maki_core::error::Error;
use maki_core::include::Fetch;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::header::ACCEPT;
use reqwest::header::CACHE_CONTROL;
use reqwest::header::PRAGMA;
use reqwest::header::USER_AGENT;
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT_VALUE: &str = concat!("maki/", env!("CARGO_PKG_VERSION"));

/// `HttpClient` の設定
#[derive(Debug, Clone, Default)]
pub struct HttpClientConfig {
    /// 相対パスを解決するときの基準（通常はページ自身の URL）
    pub base_url: Option<String>,
    /// リクエスト全体のタイムアウト。未設定なら待ち続けます。
    pub timeout: Option<Duration>,
}

impl HttpClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, Error> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        default_headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("text/html"));
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let mut builder = reqwest::Client::builder().default_headers(default_headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Network(format!("failed to create HTTP client: {}", e)))?;

        let base_url = match config.base_url {
            Some(base) => Some(Url::parse(&base).map_err(|e| {
                Error::UnexpectedInput(format!("invalid base URL {:?}: {}", base, e))
            })?),
            None => None,
        };

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// `path` を取得先の URL にする
    ///
    /// 絶対 URL ならそのまま。相対ならベース URL から解決し、ベースがなければエラー。
    pub fn resolve(&self, path: &str) -> Result<Url, Error> {
        match Url::parse(path) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base.join(path).map_err(|e| {
                    Error::UnexpectedInput(format!("failed to resolve {:?}: {}", path, e))
                }),
                None => Err(Error::UnexpectedInput(format!(
                    "relative path {:?} without a base URL",
                    path
                ))),
            },
            Err(e) => Err(Error::UnexpectedInput(format!(
                "invalid URL {:?}: {}",
                path, e
            ))),
        }
    }

    /// `path` を取得して本文を返す
    pub async fn get(&self, path: &str) -> Result<String, Error> {
        let url = self.resolve(path)?;
        let (_, body) = self.request(url).await?;
        Ok(body)
    }

    /// ページ本体を取得し、リダイレクト後の URL と本文を返す
    ///
    /// 返ってきた URL は、そのページのインクルードを解決するときのベースに使えます。
    pub async fn get_page(&self, url: &str) -> Result<(Url, String), Error> {
        let url = self.resolve(url)?;
        self.request(url).await
    }

    async fn request(&self, url: Url) -> Result<(Url, String), Error> {
        debug!(url = %url, "fetching");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::Network(format!("failed to send a request to {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| {
            Error::Network(format!("failed to read response body from {}: {}", url, e))
        })?;
        debug!(url = %final_url, status = status.as_u16(), bytes = body.len(), "fetched");

        Ok((final_url, body))
    }
}

#[async_trait(?Send)]
impl Fetch for HttpClient {
    async fn fetch(&self, path: &str) -> Result<String, Error> {
        self.get(path).await
    }
}
