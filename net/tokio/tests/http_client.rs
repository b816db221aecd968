//! HttpClient の結合テスト（wiremock でサーバを立てる）

use maki_core::error::Error;
use maki_core::include::Fetch;
use maki_core::include::IncludeResolver;
use maki_core::renderer::page::Page;
use net_tokio::http::HttpClient;
use net_tokio::http::HttpClientConfig;
use pretty_assertions::assert_eq;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::new(HttpClientConfig::default().with_base_url(format!("{}/", server.uri())))
        .expect("failed to create client")
}

async fn serve(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_success() {
    let server = MockServer::start().await;
    serve(&server, "/a.html", 200, "<span>X</span>").await;

    let body = client_for(&server).fetch("a.html").await.expect("fetch failed");
    assert_eq!(body, "<span>X</span>");
}

#[tokio::test]
async fn test_requests_bypass_caches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nav.html"))
        .and(header("cache-control", "no-cache"))
        .and(header("pragma", "no-cache"))
        .and(header("accept", "text/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<nav></nav>"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.fetch("nav.html").await.expect("first fetch failed");
    client.fetch("nav.html").await.expect("second fetch failed");
}

#[tokio::test]
async fn test_not_found_is_status_error() {
    let server = MockServer::start().await;
    serve(&server, "/b.html", 404, "not found").await;

    let err = client_for(&server)
        .fetch("b.html")
        .await
        .expect_err("expected an error");
    assert!(err.is_status());
    match err {
        Error::Status { url, status } => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/b.html"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_is_status_error() {
    let server = MockServer::start().await;
    serve(&server, "/broken.html", 500, "").await;

    let err = client_for(&server)
        .fetch("broken.html")
        .await
        .expect_err("expected an error");
    assert!(matches!(err, Error::Status { status: 500, .. }));
}

#[tokio::test]
async fn test_nested_paths_resolve_against_base() {
    let server = MockServer::start().await;
    serve(&server, "/site/components/nav.html", 200, "nav").await;

    let client = HttpClient::new(
        HttpClientConfig::default().with_base_url(format!("{}/site/index.html", server.uri())),
    )
    .expect("failed to create client");

    assert_eq!(
        client.fetch("components/nav.html").await.expect("fetch failed"),
        "nav"
    );
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let client = HttpClient::new(HttpClientConfig::default().with_base_url("http://127.0.0.1:1/"))
        .expect("failed to create client");

    let err = client.fetch("a.html").await.expect_err("expected an error");
    assert!(matches!(err, Error::Network(_)));
}

#[tokio::test]
async fn test_get_page_returns_url_and_body() {
    let server = MockServer::start().await;
    serve(&server, "/index.html", 200, "<p>hi</p>").await;

    let client = HttpClient::new(HttpClientConfig::default()).expect("failed to create client");
    let (url, body) = client
        .get_page(&format!("{}/index.html", server.uri()))
        .await
        .expect("get_page failed");

    assert_eq!(url.path(), "/index.html");
    assert_eq!(body, "<p>hi</p>");
}

#[tokio::test]
async fn test_page_with_nested_and_failing_includes() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/index.html",
        200,
        "<header data-include=\"partials/header.html\"></header>\n<aside data-include=\"missing.html\"></aside>",
    )
    .await;
    serve(
        &server,
        "/partials/header.html",
        200,
        "<nav data-include=\"links.html\"></nav>",
    )
    .await;
    serve(&server, "/links.html", 200, "<a href=\"/\">Home</a>").await;
    serve(&server, "/missing.html", 404, "").await;

    let loader = HttpClient::new(HttpClientConfig::default()).expect("failed to create client");
    let (page_url, html) = loader
        .get_page(&format!("{}/index.html", server.uri()))
        .await
        .expect("get_page failed");

    let page = Page::new();
    page.receive_response(html);
    let resolver = IncludeResolver::new(
        HttpClient::new(HttpClientConfig::default().with_base_url(page_url.as_str()))
            .expect("failed to create client"),
    );

    let passes = page.load_includes(&resolver).await;

    assert_eq!(passes, 2);
    assert_eq!(
        page.html(),
        "<header><nav><a href=\"/\">Home</a></nav></header>\n<aside><!-- include error: missing.html --></aside>"
    );
}
