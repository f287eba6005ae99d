use pulldown_cmark::Options;
use serde::{Deserialize, Serialize};

use crate::plugin::{Plugin, PluginConfig};
use crate::renderer::MarkdownRenderer;

/// Parser features to switch on. Everything is off unless listed.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownOptions {
    #[serde(default)]
    pub tables: bool,
    #[serde(default)]
    pub footnotes: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub tasklists: bool,
    #[serde(default)]
    pub smart_punctuation: bool,
    #[serde(default)]
    pub heading_attributes: bool,
}

impl MarkdownOptions {
    /// Every supported feature.
    pub fn all() -> Self {
        MarkdownOptions {
            tables: true,
            footnotes: true,
            strikethrough: true,
            tasklists: true,
            smart_punctuation: true,
            heading_attributes: true,
        }
    }

    pub fn to_options(&self) -> Options {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, self.tables);
        options.set(Options::ENABLE_FOOTNOTES, self.footnotes);
        options.set(Options::ENABLE_STRIKETHROUGH, self.strikethrough);
        options.set(Options::ENABLE_TASKLISTS, self.tasklists);
        options.set(Options::ENABLE_SMART_PUNCTUATION, self.smart_punctuation);
        options.set(Options::ENABLE_HEADING_ATTRIBUTES, self.heading_attributes);
        options
    }
}

impl Plugin<MarkdownRenderer> for MarkdownOptions {
    fn name(&self) -> String {
        "options".to_string()
    }

    fn apply(&self, renderer: &mut MarkdownRenderer) -> anyhow::Result<()> {
        renderer.enable(self.to_options());
        Ok(())
    }
}

#[typetag::serde(name = "options")]
impl PluginConfig for MarkdownOptions {
    fn build(&self) -> anyhow::Result<Box<dyn Plugin<MarkdownRenderer>>> {
        Ok(Box::new(self.clone()))
    }
}
