//! End-to-end CLI tests for the blog-harvester binary.

use std::net::TcpListener;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

mod support;
use support::fixtures::{mount_html, post_page};
use support::socket_guard::{should_skip_socket_bound_test, start_mock_server_or_skip};

fn harvester() -> Command {
    Command::cargo_bin("blog-harvester").unwrap()
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    harvester()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Harvest the readable text"))
        .stdout(predicate::str::contains("--one-file"))
        .stdout(predicate::str::contains("--lang"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    harvester()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("blog-harvester"));
}

/// Test that a missing base URL causes non-zero exit.
#[test]
fn test_binary_without_url_returns_error() {
    harvester()
        .assert()
        .failure()
        .stderr(predicate::str::contains("BASE_URL"));
}

/// Test that a non-http base URL is rejected before any network access.
#[test]
fn test_binary_invalid_url_returns_error() {
    harvester()
        .arg("ftp://blog.example/")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

/// Test that an unreachable blog is a terminal failure.
#[test]
fn test_binary_unreachable_source_exits_non_zero() {
    if should_skip_socket_bound_test() {
        return;
    }
    // Bind then release a port so nothing is listening on it.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let dir = TempDir::new().unwrap();
    let base = format!("http://127.0.0.1:{port}/");

    harvester()
        .current_dir(dir.path())
        .args([base.as_str(), "-q", "-t", "2", "-d", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("source unreachable"));

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

/// Test a full run writing every post into one file.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_one_file_run_writes_all_posts() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_html(
        &server,
        "/",
        r#"<html><body><main>
        <article><h2><a href="/first-entry/">First entry title</a></h2></article>
        <article><h2><a href="/second-entry/">Second entry title</a></h2></article>
        </main></body></html>"#
            .to_string(),
    )
    .await;
    mount_html(&server, "/first-entry/", post_page("First entry", Some("fi"))).await;
    mount_html(&server, "/second-entry/", post_page("Second entry", Some("fi"))).await;

    let dir = TempDir::new().unwrap();
    let base = format!("{}/", server.uri());
    let workdir = dir.path().to_path_buf();
    tokio::task::spawn_blocking(move || {
        harvester()
            .current_dir(&workdir)
            .args([base.as_str(), "--one-file", "-o", "posts", "-d", "0", "--lang", "fi"])
            .assert()
            .success();
    })
    .await
    .unwrap();

    let content = std::fs::read_to_string(dir.path().join("posts.txt")).unwrap();
    assert!(content.contains("Language filter: fi"));
    assert!(content.contains("Total posts: 2"));
    assert!(content.contains("Title: First entry"));
    assert!(content.contains("Title: Second entry"));
}

/// Test that the default layout writes one file per post next to nothing else.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_default_run_writes_post_directory() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_html(
        &server,
        "/",
        r#"<html><body><main>
        <article><h2><a href="/only-entry/">The only entry</a></h2></article>
        </main></body></html>"#
            .to_string(),
    )
    .await;
    mount_html(&server, "/only-entry/", post_page("Only entry", None)).await;

    let dir = TempDir::new().unwrap();
    let base = format!("{}/", server.uri());
    let workdir = dir.path().to_path_buf();
    tokio::task::spawn_blocking(move || {
        harvester()
            .current_dir(&workdir)
            .args([base.as_str(), "-d", "0"])
            .assert()
            .success();
    })
    .await
    .unwrap();

    let post = dir
        .path()
        .join("127.0.0.1_blog_posts")
        .join("001_only-entry.txt");
    let content = std::fs::read_to_string(post).unwrap();
    assert!(content.contains("Title: Only entry"));
}
