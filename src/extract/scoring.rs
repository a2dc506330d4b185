//! Main-content ranking and boilerplate detection.
//!
//! [`score_element`] is a pure function over a parsed node so the ranking can
//! be tested against fixed pages without any network access.

use scraper::{ElementRef, Selector};

use crate::config::Heuristics;

/// Elements considered as main-content containers.
pub const CANDIDATE_TAGS: [&str; 5] = ["article", "main", "section", "div", "td"];

/// Paragraph-level elements whose text counts towards a candidate's score.
const PARAGRAPH_TAGS: [&str; 4] = ["p", "pre", "blockquote", "li"];

/// Whether this element itself is page chrome: a boilerplate tag, an ARIA
/// landmark role, or a boilerplate `class`/`id` segment.
///
/// `html` and `body` are never boilerplate; themes put layout classes on them.
#[must_use]
pub fn is_boilerplate(element: ElementRef<'_>, heuristics: &Heuristics) -> bool {
    let value = element.value();
    let name = value.name();
    if matches!(name, "html" | "body") {
        return false;
    }
    if heuristics
        .boilerplate_tags
        .iter()
        .any(|tag| tag.eq_ignore_ascii_case(name))
    {
        return true;
    }
    if value.attr("role").is_some_and(|role| {
        heuristics
            .boilerplate_roles
            .iter()
            .any(|known| known.eq_ignore_ascii_case(role.trim()))
    }) {
        return true;
    }
    ["class", "id"]
        .iter()
        .filter_map(|attr| value.attr(attr))
        .any(|v| heuristics.is_boilerplate_token(v))
}

/// Whether the element or any ancestor is boilerplate.
#[must_use]
pub fn within_boilerplate(element: ElementRef<'_>, heuristics: &Heuristics) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|el| is_boilerplate(el, heuristics))
}

/// Like [`within_boilerplate`], but an `<article>` owns its own header and
/// footer: inside one, only the article and what encloses it are examined.
#[must_use]
pub fn within_page_chrome(element: ElementRef<'_>, heuristics: &Heuristics) -> bool {
    let chain: Vec<ElementRef<'_>> = std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .collect();
    let start = chain
        .iter()
        .position(|el| el.value().name() == "article")
        .unwrap_or(0);
    chain[start..].iter().any(|el| is_boilerplate(*el, heuristics))
}

/// Non-whitespace characters of visible text.
fn text_len(element: ElementRef<'_>) -> usize {
    element
        .text()
        .flat_map(str::chars)
        .filter(|c| !c.is_whitespace())
        .count()
}

fn link_text_len(element: ElementRef<'_>) -> usize {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "a")
        .map(text_len)
        .sum()
}

fn is_paragraph(element: ElementRef<'_>) -> bool {
    PARAGRAPH_TAGS.contains(&element.value().name())
}

fn paragraph_text(element: ElementRef<'_>, heuristics: &Heuristics) -> f64 {
    if is_paragraph(element) && !is_boilerplate(element, heuristics) {
        #[allow(clippy::cast_precision_loss)]
        let len = text_len(element) as f64;
        len
    } else {
        0.0
    }
}

/// Share of an element's text that sits inside links, in `0.0..=1.0`.
#[must_use]
pub fn link_density(element: ElementRef<'_>) -> f64 {
    let total = text_len(element);
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let density = link_text_len(element) as f64 / total as f64;
    density.min(1.0)
}

/// Scores a candidate container.
///
/// Paragraph-level text among direct children counts fully, among
/// grandchildren at half weight. The sum is multiplied by the content hint
/// bonus when `hints` match the element, and by `1 - link_density`.
#[must_use]
pub fn score_element(element: ElementRef<'_>, heuristics: &Heuristics, hints: &[Selector]) -> f64 {
    let mut score = 0.0;
    for child in element.children().filter_map(ElementRef::wrap) {
        if is_boilerplate(child, heuristics) {
            continue;
        }
        score += paragraph_text(child, heuristics);
        for grandchild in child.children().filter_map(ElementRef::wrap) {
            score += paragraph_text(grandchild, heuristics) / 2.0;
        }
    }
    if score == 0.0 {
        return 0.0;
    }

    if hints.iter().any(|hint| hint.matches(&element)) {
        score *= heuristics.content_hint_bonus;
    }
    score * (1.0 - link_density(element))
}

/// Returns the best-scoring candidate outside boilerplate, if any scores above zero.
///
/// Ties go to the element met first in document order.
#[must_use]
pub fn best_candidate<'a>(
    root: ElementRef<'a>,
    heuristics: &Heuristics,
    hints: &[Selector],
) -> Option<ElementRef<'a>> {
    let mut best: Option<(ElementRef<'a>, f64)> = None;
    for element in root.descendants().filter_map(ElementRef::wrap) {
        if !CANDIDATE_TAGS.contains(&element.value().name()) {
            continue;
        }
        if within_boilerplate(element, heuristics) {
            continue;
        }
        let score = score_element(element, heuristics, hints);
        if score > 0.0 && best.is_none_or(|(_, top)| score > top) {
            best = Some((element, score));
        }
    }
    best.map(|(element, _)| element)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::compile_selectors;
    use scraper::Html;

    fn first<'a>(html: &'a Html, css: &str) -> ElementRef<'a> {
        html.select(&Selector::parse(css).unwrap()).next().unwrap()
    }

    fn hints() -> Vec<Selector> {
        compile_selectors(&Heuristics::default().content_hints)
    }

    #[test]
    fn test_boilerplate_by_tag_role_and_class() {
        let html = Html::parse_document(
            r#"<body class="has-sidebar"><nav id="n"></nav><div id="r" role="navigation"></div>
            <div id="s" class="site-sidebar"></div><div id="ok" class="entry-content"></div></body>"#,
        );
        let heuristics = Heuristics::default();
        assert!(is_boilerplate(first(&html, "#n"), &heuristics));
        assert!(is_boilerplate(first(&html, "#r"), &heuristics));
        assert!(is_boilerplate(first(&html, "#s"), &heuristics));
        assert!(!is_boilerplate(first(&html, "#ok"), &heuristics));
        assert!(!is_boilerplate(first(&html, "body"), &heuristics));
    }

    #[test]
    fn test_article_header_is_not_page_chrome() {
        let html = Html::parse_document(
            r#"<body><header><a id="site" href="/">Site</a></header>
            <article><header><a id="post" href="/p">Post</a></header></article></body>"#,
        );
        let heuristics = Heuristics::default();
        assert!(within_page_chrome(first(&html, "#site"), &heuristics));
        assert!(!within_page_chrome(first(&html, "#post"), &heuristics));
        assert!(within_boilerplate(first(&html, "#post"), &heuristics));
    }

    #[test]
    fn test_direct_paragraphs_outscore_grandchildren() {
        let html = Html::parse_document(
            r#"<div id="outer"><div id="inner"><p>Some paragraph text that is long enough.</p><p>Another one.</p></div></div>"#,
        );
        let heuristics = Heuristics::default();
        let outer = score_element(first(&html, "#outer"), &heuristics, &[]);
        let inner = score_element(first(&html, "#inner"), &heuristics, &[]);
        assert!(inner > 0.0);
        assert!((outer - inner / 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_link_density_penalizes_link_lists() {
        let html = Html::parse_document(
            r#"<div id="links"><p><a href="/a">A link with some text</a></p><p><a href="/b">Another linked line</a></p></div>
            <div id="prose"><p>A line of prose with text</p><p>Another line of prose</p></div>"#,
        );
        let heuristics = Heuristics::default();
        let links = first(&html, "#links");
        assert!((link_density(links) - 1.0).abs() < f64::EPSILON);
        assert!(score_element(links, &heuristics, &[]).abs() < f64::EPSILON);
        assert!(score_element(first(&html, "#prose"), &heuristics, &[]) > 0.0);
    }

    #[test]
    fn test_content_hint_bonus_applies() {
        let html = Html::parse_document(
            r#"<div id="plain"><p>Same text here.</p></div><div id="hinted" class="entry-content"><p>Same text here.</p></div>"#,
        );
        let heuristics = Heuristics::default();
        let plain = score_element(first(&html, "#plain"), &heuristics, &hints());
        let hinted = score_element(first(&html, "#hinted"), &heuristics, &hints());
        assert!((hinted - plain * heuristics.content_hint_bonus).abs() < 1e-9);
    }

    #[test]
    fn test_best_candidate_skips_sidebar_and_comments() {
        let html = Html::parse_document(
            r#"<body>
            <div class="sidebar"><p>Sidebar text that goes on and on and on and on and on and on and on.</p><p>More sidebar.</p><p>Even more sidebar text here.</p></div>
            <article><div class="entry-content" id="body"><p>The actual article text.</p><p>Second paragraph.</p></div>
            <div id="comments"><p>Great post! Great post! Great post! Great post! Great post! Great post!</p><p>Thanks for writing this long comment thread entry.</p></div></article>
            </body>"#,
        );
        let heuristics = Heuristics::default();
        let best = best_candidate(first(&html, "body"), &heuristics, &hints()).unwrap();
        assert_eq!(best.value().attr("id"), Some("body"));
    }
}
