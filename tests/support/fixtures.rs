//! Mock blog builders: WordPress listings, feeds, index pages and post pages.

use std::time::Duration;

use harvester_core::{ClientSettings, PageClient};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client with short timeouts and no politeness delay.
pub fn quick_client() -> PageClient {
    client_with_timeout(Duration::from_secs(2))
}

pub fn client_with_timeout(timeout: Duration) -> PageClient {
    PageClient::new(ClientSettings {
        connect_timeout: timeout,
        request_timeout: timeout,
        delay: Duration::ZERO,
    })
    .expect("client builds")
}

pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

pub fn rss(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/rss+xml")
}

/// A post page with enough prose to pass the content threshold.
pub fn post_page(title: &str, lang: Option<&str>) -> String {
    let lang_attr = lang.map(|l| format!(r#" lang="{l}""#)).unwrap_or_default();
    format!(
        r#"<!DOCTYPE html><html{lang_attr}><head><title>{title} | Test blog</title></head>
<body>
<header class="site-header"><nav><a href="/">Home</a><a href="/about/">About</a></nav></header>
<main><article>
<h1 class="entry-title">{title}</h1>
<time class="published" datetime="2024-05-02">2024-05-02</time>
<div class="entry-content">
<p>{title} opens with a paragraph long enough to be recognised as real prose by the scorer.</p>
<p>A second paragraph keeps going about the topic so the article clears the minimum length easily.</p>
<p>The closing paragraph wraps things up and thanks the reader for following along to the end.</p>
</div>
<div class="sharedaddy"><p>Share this on every network you can think of.</p></div>
</article></main>
<aside class="widget-area"><p>Recent posts and a long list of other things in the sidebar.</p></aside>
<footer class="site-footer"><p>Copyright footer text</p></footer>
</body></html>"#
    )
}

/// A WordPress listing entry.
pub fn wp_entry(link: &str, title: &str, lang: Option<&str>) -> Value {
    let mut entry = json!({ "link": link, "title": { "rendered": title } });
    if let Some(lang) = lang {
        entry["lang"] = json!(lang);
    }
    entry
}

/// Mounts the discovery probe answering `{server}/wp-json/wp/v2/posts?per_page=1&_fields=link`.
pub async fn mount_wp_probe(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("_fields", "link"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "link": format!("{}/probe/", server.uri()) }])),
        )
        .mount(server)
        .await;
}

/// Mounts one listing page of the posts collection.
pub async fn mount_wp_page(server: &MockServer, page: u32, entries: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("_fields", "link,title,lang"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(entries)))
        .mount(server)
        .await;
}

/// Mounts the "page index out of range" answer for `page`.
pub async fn mount_wp_out_of_range(server: &MockServer, page: u32) {
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "rest_post_invalid_page_number",
            "message": "The page number requested is larger than the number of pages available.",
        })))
        .mount(server)
        .await;
}

/// Mounts an HTML page at `route`.
pub async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(&body))
        .mount(server)
        .await;
}

/// An RSS 2.0 document with one item per `(link, title)`, optionally pointing at a next page.
pub fn rss_document(items: &[(String, String)], language: Option<&str>, next: Option<&str>) -> String {
    let items: String = items
        .iter()
        .map(|(link, title)| format!("<item><title>{title}</title><link>{link}</link></item>"))
        .collect();
    let language = language
        .map(|l| format!("<language>{l}</language>"))
        .unwrap_or_default();
    let next = next
        .map(|n| format!(r#"<atom:link rel="next" href="{n}"/>"#))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom"><channel>
<title>Test feed</title><link>https://blog.example/</link>{language}{next}
{items}
</channel></rss>"#
    )
}
