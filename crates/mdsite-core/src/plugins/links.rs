use pulldown_cmark::escape::{escape_href, escape_html};
use pulldown_cmark::{CowStr, Event, Tag};
use serde::{Deserialize, Serialize};

use crate::plugin::{Plugin, PluginConfig};
use crate::renderer::{Extension, ExtensionFactory, MarkdownRenderer};

/// Marks absolute http(s) links as external.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExternalLinks {
    #[serde(default = "default_new_tab")]
    pub new_tab: bool,
}

fn default_new_tab() -> bool {
    true
}

impl Default for ExternalLinks {
    fn default() -> Self {
        ExternalLinks { new_tab: true }
    }
}

impl Plugin<MarkdownRenderer> for ExternalLinks {
    fn name(&self) -> String {
        "external_links".to_string()
    }

    fn apply(&self, renderer: &mut MarkdownRenderer) -> anyhow::Result<()> {
        renderer.register(Box::new(self.clone()));
        Ok(())
    }
}

#[typetag::serde(name = "external_links")]
impl PluginConfig for ExternalLinks {
    fn build(&self) -> anyhow::Result<Box<dyn Plugin<MarkdownRenderer>>> {
        Ok(Box::new(self.clone()))
    }
}

impl ExtensionFactory for ExternalLinks {
    fn build<'a>(&self) -> Box<dyn Extension<'a> + 'a> {
        Box::new(LinkRewriter {
            new_tab: self.new_tab,
            stack: Vec::new(),
        })
    }
}

struct LinkRewriter {
    new_tab: bool,
    // One entry per open link: whether it was rewritten.
    stack: Vec<bool>,
}

fn is_external(dest: &str) -> bool {
    dest.starts_with("http://") || dest.starts_with("https://")
}

impl<'a> Extension<'a> for LinkRewriter {
    fn each(&mut self, event: Event<'a>) -> anyhow::Result<Option<Event<'a>>> {
        let res = match event {
            Event::Start(Tag::Link(_, dest, title)) if is_external(&dest) => {
                let mut tag = String::from("<a href=\"");
                escape_href(&mut tag, &dest)?;
                tag.push('"');
                if !title.is_empty() {
                    tag.push_str(" title=\"");
                    escape_html(&mut tag, &title)?;
                    tag.push('"');
                }
                if self.new_tab {
                    tag.push_str(r#" target="_blank""#);
                }
                tag.push_str(r#" rel="noopener noreferrer">"#);

                self.stack.push(true);
                Event::Html(CowStr::Boxed(tag.into_boxed_str()))
            }
            Event::Start(Tag::Link(ty, dest, title)) => {
                self.stack.push(false);
                Event::Start(Tag::Link(ty, dest, title))
            }
            Event::End(Tag::Link(ty, dest, title)) => match self.stack.pop() {
                Some(true) => Event::Html(CowStr::Borrowed("</a>")),
                _ => Event::End(Tag::Link(ty, dest, title)),
            },
            e => e,
        };
        Ok(Some(res))
    }
}
