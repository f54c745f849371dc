//! Strategy bundle selected once from configuration and passed to stages.

use std::sync::Arc;

use editorial_markdown::{FrontmatterExtractor, MarkdownRenderer, renderer_for};
use editorial_shared::AppConfig;

use crate::suggest::Analyzer;

/// Frontmatter parser chain, Markdown renderer and text analyzer.
pub struct Capabilities {
    pub extractor: Arc<FrontmatterExtractor>,
    pub renderer: Arc<dyn MarkdownRenderer>,
    pub analyzer: Analyzer,
}

impl Capabilities {
    pub fn from_config(config: &AppConfig) -> Self {
        let strategies = &config.strategies;
        Self {
            extractor: Arc::new(FrontmatterExtractor::from_strategy(strategies.frontmatter)),
            renderer: Arc::from(renderer_for(strategies.markdown)),
            analyzer: Analyzer::new(
                strategies.stopwords,
                strategies.sentences,
                config.suggest.clone(),
            ),
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("frontmatter", &self.extractor.primary_name())
            .field("markdown", &self.renderer.name())
            .field("analyzer", &self.analyzer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use editorial_shared::{MarkdownStrategy, StopwordStrategy};

    #[test]
    fn follows_configured_strategies() {
        let mut config = AppConfig::default();
        config.strategies.markdown = MarkdownStrategy::Basic;
        config.strategies.stopwords = StopwordStrategy::Basic;

        let caps = Capabilities::from_config(&config);
        assert_eq!(caps.renderer.name(), "basic");
        assert_eq!(caps.analyzer.stopwords.name(), "basic");
        assert_eq!(caps.extractor.primary_name(), "yaml");
    }
}
