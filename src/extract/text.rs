//! Plain-text rendering of a content container.
//!
//! One block per paragraph-level element, lists rendered as `- item` or
//! `1. item` lines, whitespace collapsed inside each block, blocks separated
//! by one blank line. Scripts, styles and boilerplate subtrees are skipped.

use scraper::{ElementRef, Node};

use super::scoring::is_boilerplate;
use crate::config::Heuristics;

/// Elements whose content is never text.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "svg", "canvas", "button", "select",
];

/// Elements that start a new block.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "header", "footer", "aside", "h1", "h2", "h3",
    "h4", "h5", "h6", "pre", "blockquote", "figure", "figcaption", "table", "thead", "tbody",
    "tr", "td", "th", "dl", "dt", "dd", "hr", "address",
];

/// Collapses runs of whitespace into single spaces and trims the ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Default)]
struct Blocks {
    done: Vec<String>,
    current: String,
}

impl Blocks {
    fn push_text(&mut self, text: &str) {
        self.current.push_str(text);
    }

    fn flush(&mut self) {
        let block = collapse_whitespace(&self.current);
        if !block.is_empty() {
            self.done.push(block);
        }
        self.current.clear();
    }

    fn push_block(&mut self, block: String) {
        self.flush();
        if !block.is_empty() {
            self.done.push(block);
        }
    }
}

fn skipped(element: ElementRef<'_>, heuristics: &Heuristics) -> bool {
    SKIPPED_TAGS.contains(&element.value().name()) || is_boilerplate(element, heuristics)
}

fn walk(parent: ElementRef<'_>, heuristics: &Heuristics, out: &mut Blocks) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => out.push_text(text),
            Node::Element(_) => {
                let Some(element) = ElementRef::wrap(child) else {
                    continue;
                };
                if skipped(element, heuristics) {
                    continue;
                }
                match element.value().name() {
                    "br" => out.push_text(" "),
                    name @ ("ul" | "ol") => {
                        out.flush();
                        let list = render_list(element, name == "ol", heuristics);
                        out.push_block(list);
                    }
                    name if BLOCK_TAGS.contains(&name) || name == "li" => {
                        out.flush();
                        walk(element, heuristics, out);
                        out.flush();
                    }
                    _ => walk(element, heuristics, out),
                }
            }
            _ => {}
        }
    }
}

fn inline_text(parent: ElementRef<'_>, heuristics: &Heuristics, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(element) = ElementRef::wrap(child) else {
                    continue;
                };
                if skipped(element, heuristics) {
                    continue;
                }
                let name = element.value().name();
                let separate = name == "br"
                    || BLOCK_TAGS.contains(&name)
                    || matches!(name, "ul" | "ol" | "li");
                if separate {
                    out.push(' ');
                }
                inline_text(element, heuristics, out);
                if separate {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn render_list(list: ElementRef<'_>, ordered: bool, heuristics: &Heuristics) -> String {
    let mut lines = Vec::new();
    let mut number = 0_usize;
    for item in list.children().filter_map(ElementRef::wrap) {
        if item.value().name() != "li" || skipped(item, heuristics) {
            continue;
        }
        number += 1;
        let mut raw = String::new();
        inline_text(item, heuristics, &mut raw);
        let text = collapse_whitespace(&raw);
        if text.is_empty() {
            continue;
        }
        if ordered {
            lines.push(format!("{number}. {text}"));
        } else {
            lines.push(format!("- {text}"));
        }
    }
    lines.join("\n")
}

/// Renders the readable text below `element`.
#[must_use]
pub fn render_text(element: ElementRef<'_>, heuristics: &Heuristics) -> String {
    let mut blocks = Blocks::default();
    walk(element, heuristics, &mut blocks);
    blocks.flush();
    blocks.done.join("\n\n")
}
