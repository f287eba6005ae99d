use std::collections::HashSet;

use pulldown_cmark::escape::escape_html;
use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Tag};
use serde::{Deserialize, Serialize};

use crate::plugin::{Plugin, PluginConfig};
use crate::renderer::{Extension, ExtensionFactory, MarkdownRenderer};

/// Gives every heading a unique id, optionally followed by a permalink.
///
/// Headings without an explicit `{#id}` get a slug of their text. Explicit ids are kept unless
/// an earlier heading already took them, in which case they get a `-N` suffix like slugs do.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadingAnchors {
    #[serde(default)]
    pub permalink: bool,
}

impl Plugin<MarkdownRenderer> for HeadingAnchors {
    fn name(&self) -> String {
        "heading_anchors".to_string()
    }

    fn apply(&self, renderer: &mut MarkdownRenderer) -> anyhow::Result<()> {
        renderer.register(Box::new(self.clone()));
        Ok(())
    }
}

#[typetag::serde(name = "heading_anchors")]
impl PluginConfig for HeadingAnchors {
    fn build(&self) -> anyhow::Result<Box<dyn Plugin<MarkdownRenderer>>> {
        Ok(Box::new(self.clone()))
    }
}

impl ExtensionFactory for HeadingAnchors {
    fn build<'a>(&self) -> Box<dyn Extension<'a> + 'a> {
        Box::new(Anchors {
            permalink: self.permalink,
            ids: HashSet::new(),
            open: None,
        })
    }
}

struct OpenHeading<'a> {
    level: HeadingLevel,
    explicit: Option<&'a str>,
    classes: Vec<&'a str>,
    inner: Vec<Event<'a>>,
}

struct Anchors<'a> {
    permalink: bool,
    ids: HashSet<String>,
    open: Option<OpenHeading<'a>>,
}

impl<'a> Anchors<'a> {
    fn unique(&mut self, base: &str) -> String {
        let mut id = base.to_string();
        let mut n = 0;
        while self.ids.contains(&id) {
            n += 1;
            id = format!("{}-{}", base, n);
        }
        self.ids.insert(id.clone());
        id
    }

    fn close(&mut self, heading: OpenHeading<'a>) -> anyhow::Result<Event<'a>> {
        let id = match heading.explicit {
            Some(explicit) => self.unique(explicit),
            None => {
                let text: String = heading
                    .inner
                    .iter()
                    .filter_map(|e| match e {
                        Event::Text(t) | Event::Code(t) => Some(t.to_string()),
                        _ => None,
                    })
                    .collect();

                let slug = slugify(&text);
                self.unique(if slug.is_empty() { "section" } else { &slug })
            }
        };
        let mut escaped_id = String::new();
        escape_html(&mut escaped_id, &id)?;

        let mut inner = String::new();
        html::push_html(&mut inner, heading.inner.into_iter());

        let mut class = String::new();
        if !heading.classes.is_empty() {
            class.push_str(" class=\"");
            escape_html(&mut class, &heading.classes.join(" "))?;
            class.push('"');
        }

        let permalink = if self.permalink {
            format!(r##"<a class="anchor" href="#{}" aria-hidden="true">#</a>"##, escaped_id)
        } else {
            String::new()
        };

        let lvl = heading.level;
        Ok(Event::Html(CowStr::Boxed(
            format!("<{lvl} id=\"{escaped_id}\"{class}>{inner}{permalink}</{lvl}>\n")
                .into_boxed_str(),
        )))
    }
}

impl<'a> Extension<'a> for Anchors<'a> {
    fn each(&mut self, event: Event<'a>) -> anyhow::Result<Option<Event<'a>>> {
        let res = match (self.open.take(), event) {
            (Some(heading), Event::End(Tag::Heading(..))) => Some(self.close(heading)?),
            (Some(mut heading), event) => {
                heading.inner.push(event);
                self.open = Some(heading);
                None
            }
            (None, Event::Start(Tag::Heading(level, explicit, classes))) => {
                self.open = Some(OpenHeading {
                    level,
                    explicit,
                    classes,
                    inner: Vec::new(),
                });
                None
            }
            (None, event) => Some(event),
        };
        Ok(res)
    }
}

/// Lowercases the text, joins words with `-` and drops punctuation.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
