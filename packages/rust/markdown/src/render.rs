//! Markdown → HTML rendering.

use std::sync::LazyLock;

use editorial_shared::MarkdownStrategy;
use pulldown_cmark::{Options, Parser, html};
use regex::Regex;

/// Converts a Markdown body into an HTML fragment.
pub trait MarkdownRenderer: Send + Sync {
    fn name(&self) -> &'static str;
    fn render(&self, markdown: &str) -> String;
}

/// Pick the renderer selected in configuration.
pub fn renderer_for(strategy: MarkdownStrategy) -> Box<dyn MarkdownRenderer> {
    match strategy {
        MarkdownStrategy::Commonmark => Box::new(CommonmarkRenderer::default()),
        MarkdownStrategy::Basic => Box::new(BasicRenderer),
    }
}

/// CommonMark rendering via `pulldown-cmark`, with tables and strikethrough.
#[derive(Debug, Clone, Copy)]
pub struct CommonmarkRenderer {
    options: Options,
}

impl Default for CommonmarkRenderer {
    fn default() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        Self { options }
    }
}

impl MarkdownRenderer for CommonmarkRenderer {
    fn name(&self) -> &'static str {
        "commonmark"
    }

    fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})\s+(.*?)\s*$").expect("valid regex"));
static BOLD_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"));
static BOLD_UNDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__(.+?)__").expect("valid regex"));
static EM_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("valid regex"));
static EM_UNDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_(.+?)_\b").expect("valid regex"));
static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[(.*?)\]\((.*?)\)").expect("valid regex"));
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").expect("valid regex"));

/// Minimal regex renderer: headings, emphasis, images, links and paragraphs.
///
/// Used where a lightweight, dependency-free rendering is preferred. Anything
/// beyond those constructs passes through as escaped text.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicRenderer;

impl MarkdownRenderer for BasicRenderer {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn render(&self, markdown: &str) -> String {
        let text = escape_html(markdown);
        let text = HEADING_RE.replace_all(&text, |caps: &regex::Captures<'_>| {
            let level = caps[1].len();
            format!("<h{level}>{}</h{level}>", &caps[2])
        });
        let text = BOLD_STAR_RE.replace_all(&text, "<strong>$1</strong>");
        let text = BOLD_UNDER_RE.replace_all(&text, "<strong>$1</strong>");
        let text = EM_STAR_RE.replace_all(&text, "<em>$1</em>");
        let text = EM_UNDER_RE.replace_all(&text, "<em>$1</em>");
        // Images first so their `[alt](src)` tail is not taken as a link.
        let text = IMAGE_RE.replace_all(&text, r#"<img src="$2" alt="$1"/>"#);
        let text = LINK_RE.replace_all(&text, r#"<a href="$2">$1</a>"#);

        text.split("\n\n")
            .map(str::trim)
            .filter(|block| !block.is_empty())
            .map(|block| {
                if block.starts_with("<h") {
                    block.to_string()
                } else {
                    format!("<p>{}</p>", block.replace('\n', "<br>\n"))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
