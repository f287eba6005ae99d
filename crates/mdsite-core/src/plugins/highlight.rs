use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use anyhow::anyhow;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag};
use serde::{Deserialize, Serialize};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;

use crate::plugin::{Plugin, PluginConfig};
use crate::renderer::{Extension, ExtensionFactory, MarkdownRenderer};

/// Syntax highlighting for fenced code blocks, using Syntect's bundled syntaxes and themes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HighlightConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_theme() -> String {
    "InspiredGitHub".to_string()
}

impl Default for HighlightConfig {
    fn default() -> Self {
        HighlightConfig {
            theme: default_theme(),
        }
    }
}

#[typetag::serde(name = "highlight")]
impl PluginConfig for HighlightConfig {
    fn build(&self) -> anyhow::Result<Box<dyn Plugin<MarkdownRenderer>>> {
        Ok(Box::new(Highlight::new(&self.theme)?))
    }
}

#[derive(Clone)]
pub struct Highlight {
    syntax_set: Arc<SyntaxSet>,
    theme: Arc<Theme>,
}

impl Highlight {
    /// Loads the default syntaxes and the named theme. Fails if the theme does not exist.
    pub fn new(theme: &str) -> anyhow::Result<Self> {
        let mut themes = ThemeSet::load_defaults();
        let theme = themes
            .themes
            .remove(theme)
            .ok_or_else(|| anyhow!("unknown highlight theme '{}'", theme))?;

        Ok(Highlight {
            syntax_set: Arc::new(SyntaxSet::load_defaults_newlines()),
            theme: Arc::new(theme),
        })
    }
}

impl Debug for Highlight {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highlight")
            .field("theme", &self.theme.name)
            .finish()
    }
}

impl Plugin<MarkdownRenderer> for Highlight {
    fn name(&self) -> String {
        "highlight".to_string()
    }

    fn apply(&self, renderer: &mut MarkdownRenderer) -> anyhow::Result<()> {
        renderer.register(Box::new(self.clone()));
        Ok(())
    }
}

impl ExtensionFactory for Highlight {
    fn build<'a>(&self) -> Box<dyn Extension<'a> + 'a> {
        Box::new(HighlightBlocks {
            syntax_set: self.syntax_set.clone(),
            theme: self.theme.clone(),
            open: None,
        })
    }
}

struct OpenBlock {
    lang: String,
    source: String,
}

struct HighlightBlocks {
    syntax_set: Arc<SyntaxSet>,
    theme: Arc<Theme>,
    open: Option<OpenBlock>,
}

impl HighlightBlocks {
    fn highlight(&self, block: OpenBlock) -> anyhow::Result<String> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(&block.lang)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        Ok(syntect::html::highlighted_html_for_string(
            &block.source,
            &self.syntax_set,
            syntax,
            &self.theme,
        )?)
    }
}

impl<'a> Extension<'a> for HighlightBlocks {
    fn each(&mut self, event: Event<'a>) -> anyhow::Result<Option<Event<'a>>> {
        let res = match (self.open.take(), event) {
            (Some(block), Event::End(Tag::CodeBlock(_))) => {
                let html = self.highlight(block)?;
                Some(Event::Html(CowStr::Boxed(html.into_boxed_str())))
            }
            (Some(mut block), Event::Text(txt)) => {
                block.source.push_str(&txt);
                self.open = Some(block);
                None
            }
            (Some(block), event) => {
                self.open = Some(block);
                Some(event)
            }
            (None, Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info)))) => {
                let lang = info
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .next()
                    .unwrap_or_default();

                if !lang.is_empty() && self.syntax_set.find_syntax_by_token(lang).is_some() {
                    self.open = Some(OpenBlock {
                        lang: lang.to_string(),
                        source: String::new(),
                    });
                    None
                } else {
                    Some(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))))
                }
            }
            (None, event) => Some(event),
        };
        Ok(res)
    }
}
