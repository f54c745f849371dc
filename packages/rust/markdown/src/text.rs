//! Plain-text extraction from rendered HTML.

use scraper::Html;

/// Elements whose text content is never prose.
const SKIP_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Visible text of an HTML fragment: trimmed text nodes joined by single spaces.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_fragment(html);
    let mut parts: Vec<&str> = Vec::new();

    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let skipped = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|el| SKIP_ELEMENTS.contains(&el.name()))
        });
        if skipped {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_text_nodes_with_spaces() {
        let text = html_to_text("<h1>Title</h1><p>First <em>line</em>.</p>");
        assert_eq!(text, "Title First line .");
    }

    #[test]
    fn skips_script_and_style() {
        let text = html_to_text("<p>Keep</p><script>var x = 1;</script><style>p{}</style>");
        assert_eq!(text, "Keep");
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(html_to_text("<p>Fish &amp; chips</p>"), "Fish & chips");
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(html_to_text(""), "");
    }
}
