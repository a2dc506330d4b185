//! Integration tests for source classification against mock blogs.

use harvester_core::{ClassifyError, PaginationCursor, SourceKind, classify};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::fixtures::{html, mount_html, mount_wp_probe, quick_client, rss, rss_document};
use support::socket_guard::start_mock_server_or_skip;

fn base(uri: &str, route: &str) -> Url {
    Url::parse(&format!("{uri}{route}")).unwrap()
}

#[tokio::test]
async fn test_classify_wordpress_api_at_origin() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_wp_probe(&server).await;

    let source = classify(&quick_client(), &base(&server.uri(), "/"))
        .await
        .unwrap();

    assert_eq!(source.kind(), SourceKind::WordPressApi);
    match source.cursor() {
        PaginationCursor::ApiPage { endpoint, page } => {
            assert_eq!(endpoint.path(), "/wp-json/wp/v2/posts");
            assert_eq!(*page, 1);
        }
        other => panic!("unexpected cursor {other:?}"),
    }
}

#[tokio::test]
async fn test_classify_follows_api_root_from_link_header() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let link = format!(r#"<{}/blog/wp-json/>; rel="https://api.w.org/""#, server.uri());
    Mock::given(method("GET"))
        .and(path("/blog/"))
        .respond_with(html("<html><body>Blog</body></html>").insert_header("Link", link.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blog/wp-json/wp/v2/posts"))
        .and(query_param("_fields", "link"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let source = classify(&quick_client(), &base(&server.uri(), "/blog/"))
        .await
        .unwrap();

    assert_eq!(source.kind(), SourceKind::WordPressApi);
    let PaginationCursor::ApiPage { endpoint, .. } = source.cursor() else {
        panic!("expected API cursor");
    };
    assert_eq!(endpoint.path(), "/blog/wp-json/wp/v2/posts");
}

#[tokio::test]
async fn test_classify_prefers_advertised_feed() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_html(
        &server,
        "/",
        r#"<html><head>
        <link rel="alternate" type="application/rss+xml" href="/comments/feed/">
        <link rel="alternate" type="application/rss+xml" href="/posts.rss">
        </head><body>Home</body></html>"#
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/posts.rss"))
        .respond_with(rss(&rss_document(&[], None, None)))
        .mount(&server)
        .await;

    let source = classify(&quick_client(), &base(&server.uri(), "/"))
        .await
        .unwrap();

    assert_eq!(source.kind(), SourceKind::Feed);
    let PaginationCursor::Document(feed) = source.cursor() else {
        panic!("expected document cursor");
    };
    assert_eq!(feed.path(), "/posts.rss");
}

#[tokio::test]
async fn test_classify_finds_conventional_feed_path() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_html(&server, "/", "<html><body>No hints here</body></html>".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/atom.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom"><title>t</title></feed>"#,
            "application/atom+xml",
        ))
        .mount(&server)
        .await;

    let source = classify(&quick_client(), &base(&server.uri(), "/"))
        .await
        .unwrap();

    assert_eq!(source.kind(), SourceKind::Feed);
    let PaginationCursor::Document(feed) = source.cursor() else {
        panic!("expected document cursor");
    };
    assert_eq!(feed.path(), "/atom.xml");
}

#[tokio::test]
async fn test_classify_html_page_served_as_feed_path_is_not_a_feed() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_html(&server, "/", "<html><body>Index</body></html>".to_string()).await;
    mount_html(&server, "/feed/", "<html><body>Soft 404</body></html>".to_string()).await;

    let source = classify(&quick_client(), &base(&server.uri(), "/"))
        .await
        .unwrap();

    assert_eq!(source.kind(), SourceKind::Html);
}

#[tokio::test]
async fn test_classify_skips_feed_path_with_non_feed_media_type() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_html(&server, "/", "<html><body>Index</body></html>".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/feed/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<rss version="2.0"><channel></channel></rss>"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let source = classify(&quick_client(), &base(&server.uri(), "/"))
        .await
        .unwrap();

    assert_eq!(source.kind(), SourceKind::Html);
}

#[tokio::test]
async fn test_classify_falls_back_to_html_index() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_html(&server, "/journal/", "<html><body>Index</body></html>".to_string()).await;

    let base_url = base(&server.uri(), "/journal/");
    let source = classify(&quick_client(), &base_url).await.unwrap();

    assert_eq!(source.kind(), SourceKind::Html);
    assert_eq!(source.base_url(), &base_url);
    assert_eq!(source.cursor(), &PaginationCursor::Document(base_url.clone()));
}

#[tokio::test]
async fn test_classify_unreachable_source_is_terminal() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = classify(&quick_client(), &base(&server.uri(), "/"))
        .await
        .unwrap_err();

    let ClassifyError::SourceUnreachable { probes, .. } = &err;
    assert!(*probes >= 3, "every probe should have been tried: {err}");
}
