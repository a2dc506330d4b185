//! End-to-end harvests against mock blogs.

use std::sync::Arc;
use std::time::Duration;

use harvester_core::output::{default_output_name, post_file_name};
use harvester_core::{
    ExtractError, FetchError, HarvestOptions, Harvester, Heuristics, LanguageFilter, OutputMode,
    OutputWriter, SourceKind,
};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

mod support;
use support::fixtures::{
    client_with_timeout, html, mount_html, mount_wp_out_of_range, mount_wp_page, mount_wp_probe,
    post_page, quick_client, wp_entry,
};
use support::socket_guard::start_mock_server_or_skip;

fn post_route(i: usize) -> String {
    format!("/2024/05/post-{i}/")
}

async fn mount_posts(server: &MockServer, range: std::ops::Range<usize>, lang: Option<&str>) {
    for i in range {
        mount_html(server, &post_route(i), post_page(&format!("Post {i}"), lang)).await;
    }
}

#[tokio::test]
async fn test_wordpress_blog_filtered_to_finnish_written_per_post() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    mount_wp_probe(&server).await;

    let entry = |i: usize, lang: &str| {
        wp_entry(&format!("{uri}{}", post_route(i)), &format!("Post {i}"), Some(lang))
    };
    let mut first: Vec<_> = (0..8).map(|i| entry(i, "fi")).collect();
    first.extend((8..10).map(|i| entry(i, "en")));
    let second: Vec<_> = (10..14).map(|i| entry(i, "fi")).collect();
    mount_wp_page(&server, 1, first).await;
    mount_wp_page(&server, 2, second).await;
    mount_wp_out_of_range(&server, 3).await;
    mount_posts(&server, 0..8, Some("fi")).await;
    mount_posts(&server, 10..14, Some("fi")).await;

    let language = LanguageFilter::new(Some("fi"));
    let harvester = Harvester::new(
        quick_client(),
        Arc::new(Heuristics::default()),
        HarvestOptions {
            language: language.clone(),
            ..HarvestOptions::default()
        },
    );
    let base = Url::parse(&format!("{uri}/")).unwrap();
    let report = harvester.run(&base).await.unwrap();

    assert_eq!(report.source_kind, SourceKind::WordPressApi);
    assert_eq!(report.enumerated, 14);
    assert_eq!(report.filtered_out, 2);
    assert_eq!(report.posts.len(), 12);
    assert!(report.skipped.is_empty());
    assert!(
        report
            .posts
            .iter()
            .all(|p| p.language_code.as_deref() == Some("fi"))
    );

    let dir = TempDir::new().unwrap();
    let output = dir.path().join(default_output_name(&base));
    let written = OutputWriter::new(output, OutputMode::PerPost, base.clone(), language)
        .write(&report.posts)
        .unwrap();

    assert_eq!(written, dir.path().join("127.0.0.1_blog_posts"));
    assert_eq!(std::fs::read_dir(&written).unwrap().count(), 12);
    let first_file = std::fs::read_to_string(written.join(post_file_name(0, &report.posts[0]))).unwrap();
    assert!(first_file.contains("Title: Post 0"));
    assert!(first_file.contains("Post 0 opens with a paragraph"));
    assert!(!first_file.contains("Share this"));
    assert!(!first_file.contains("sidebar"));
}

#[tokio::test]
async fn test_one_post_timing_out_leaves_nine() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    mount_wp_probe(&server).await;
    let listing = (0..10)
        .map(|i| wp_entry(&format!("{uri}{}", post_route(i)), &format!("Post {i}"), None))
        .collect();
    mount_wp_page(&server, 1, listing).await;
    mount_wp_out_of_range(&server, 2).await;

    Mock::given(method("GET"))
        .and(path(post_route(4)))
        .respond_with(html(&post_page("Post 4", None)).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    mount_posts(&server, 0..4, None).await;
    mount_posts(&server, 5..10, None).await;

    let harvester = Harvester::new(
        client_with_timeout(Duration::from_millis(800)),
        Arc::new(Heuristics::default()),
        HarvestOptions {
            concurrency: 4,
            ..HarvestOptions::default()
        },
    );
    let report = harvester
        .run(&Url::parse(&format!("{uri}/")).unwrap())
        .await
        .unwrap();

    assert_eq!(report.enumerated, 10);
    assert_eq!(report.posts.len(), 9);
    assert_eq!(report.skipped.len(), 1);
    let skipped = &report.skipped[0];
    assert_eq!(skipped.url.path(), post_route(4));
    assert!(matches!(
        skipped.error,
        ExtractError::PostFetchFailed {
            source: FetchError::Timeout { .. },
            ..
        }
    ));

    let order: Vec<String> = report.posts.iter().map(|p| p.title.clone()).collect();
    let expected: Vec<String> = [0, 1, 2, 3, 5, 6, 7, 8, 9]
        .iter()
        .map(|i| format!("Post {i}"))
        .collect();
    assert_eq!(order, expected, "discovery order survives concurrent fetching");
}

#[tokio::test]
async fn test_html_blog_without_language_metadata_excluded_by_filter() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let uri = server.uri();
    mount_html(
        &server,
        "/",
        r#"<html><body><main>
        <article><h2><a href="/2024/05/post-0/">Post zero title</a></h2></article>
        <article><h2><a href="/2024/05/post-1/">Post one title</a></h2></article>
        </main></body></html>"#
            .to_string(),
    )
    .await;
    mount_html(&server, &post_route(0), post_page("Post 0", None)).await;
    mount_html(&server, &post_route(1), post_page("Post 1", Some("en-GB"))).await;

    let harvester = Harvester::new(
        quick_client(),
        Arc::new(Heuristics::default()),
        HarvestOptions {
            language: LanguageFilter::new(Some("en")),
            ..HarvestOptions::default()
        },
    );
    let report = harvester
        .run(&Url::parse(&format!("{uri}/")).unwrap())
        .await
        .unwrap();

    assert_eq!(report.source_kind, SourceKind::Html);
    assert_eq!(report.enumerated, 2);
    assert_eq!(report.undetermined, 1);
    assert_eq!(report.posts.len(), 1);
    assert_eq!(report.posts[0].title, "Post 1");
    assert_eq!(report.posts[0].language_code.as_deref(), Some("en-GB"));
}
