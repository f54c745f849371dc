//! Markdown handling for the editorial pipeline.
//!
//! - [`frontmatter`]: split a document into metadata and body, with a
//!   primary parser and a tolerant fallback
//! - [`render`]: Markdown → HTML behind the [`MarkdownRenderer`] trait
//! - [`text`]: visible text of rendered HTML for keyword analysis

pub mod frontmatter;
pub mod render;
pub mod text;

pub use frontmatter::{
    Extracted, FrontmatterExtractor, KeyValueParser, MetadataParser, YamlParser, extract,
};
pub use render::{BasicRenderer, CommonmarkRenderer, MarkdownRenderer, renderer_for};
pub use text::html_to_text;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_then_render_round_trip() {
        let doc = "---\ntitle: Hello\n---\n# Heading\n\nBody text here.";
        let extracted = extract(doc);
        let html = CommonmarkRenderer::default().render(&extracted.body);
        assert_eq!(html_to_text(&html), "Heading Body text here.");
        assert_eq!(extracted.metadata["title"], "Hello");
    }
}
