use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};

use pulldown_cmark::{html, Event, Options, Parser};

use crate::plugin::{Plugin, PluginHost};

/// Converts markdown text to markup. This is the render step that runs after resolution.
pub trait Renderer {
    fn render(&self, markdown: &str) -> anyhow::Result<String>;
}

/// A stateful event transform that runs during a single render.
///
/// Returning `Ok(None)` swallows the event, which lets an extension buffer a range of events and
/// emit a replacement later.
pub trait Extension<'a> {
    fn each(&mut self, event: Event<'a>) -> anyhow::Result<Option<Event<'a>>>;
}

/// Builds a fresh [Extension] for every render so that renders never share state.
pub trait ExtensionFactory: Send + Sync {
    fn build<'a>(&self) -> Box<dyn Extension<'a> + 'a>;
}

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Identifies a renderer instance. Every constructed renderer gets a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererId(usize);

impl RendererId {
    fn next() -> Self {
        RendererId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for RendererId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "renderer-{}", self.0)
    }
}

/// The default renderer, built on pulldown-cmark.
///
/// Plugins configure it through [MarkdownRenderer::enable] and [MarkdownRenderer::register].
/// The renderer is a single-owner value: it moves into a configuration and moves back out with
/// the resolved result, so two resolutions can never mutate the same instance.
pub struct MarkdownRenderer {
    id: RendererId,
    options: Options,
    extensions: Vec<Box<dyn ExtensionFactory>>,
    plugins: Vec<String>,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        MarkdownRenderer {
            id: RendererId::next(),
            options: Options::empty(),
            extensions: Vec::new(),
            plugins: Vec::new(),
        }
    }

    pub fn id(&self) -> RendererId {
        self.id
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// Names of the plugins applied so far, in application order.
    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    /// Turns on parser features.
    pub fn enable(&mut self, options: Options) {
        self.options.insert(options);
    }

    /// Adds an extension. Extensions see events in registration order; an event swallowed by one
    /// extension never reaches the ones registered after it.
    pub fn register(&mut self, extension: Box<dyn ExtensionFactory>) {
        self.extensions.push(extension);
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for MarkdownRenderer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownRenderer")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("extensions", &self.extensions.len())
            .field("plugins", &self.plugins)
            .finish()
    }
}

impl PluginHost for MarkdownRenderer {
    fn use_plugin(&mut self, plugin: &dyn Plugin<Self>) -> anyhow::Result<()> {
        plugin.apply(self)?;
        self.plugins.push(plugin.name());
        Ok(())
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> anyhow::Result<String> {
        let mut extensions: Vec<Box<dyn Extension<'_> + '_>> =
            self.extensions.iter().map(|e| e.build()).collect();

        let mut events = Vec::new();
        for event in Parser::new_ext(markdown, self.options) {
            let mut current = Some(event);
            for extension in extensions.iter_mut() {
                current = match current {
                    Some(event) => extension.each(event)?,
                    None => break,
                };
            }
            events.extend(current);
        }

        let mut output = String::new();
        html::push_html(&mut output, events.into_iter());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::FnPlugin;
    use pulldown_cmark::CowStr;

    struct Shout;

    impl<'a> Extension<'a> for Shout {
        fn each(&mut self, event: Event<'a>) -> anyhow::Result<Option<Event<'a>>> {
            Ok(Some(match event {
                Event::Text(txt) => Event::Text(CowStr::Boxed(txt.to_uppercase().into_boxed_str())),
                e => e,
            }))
        }
    }

    struct ShoutFactory;

    impl ExtensionFactory for ShoutFactory {
        fn build<'a>(&self) -> Box<dyn Extension<'a> + 'a> {
            Box::new(Shout)
        }
    }

    struct DropCode;

    impl<'a> Extension<'a> for DropCode {
        fn each(&mut self, event: Event<'a>) -> anyhow::Result<Option<Event<'a>>> {
            Ok(match event {
                Event::Code(_) => None,
                e => Some(e),
            })
        }
    }

    struct DropCodeFactory;

    impl ExtensionFactory for DropCodeFactory {
        fn build<'a>(&self) -> Box<dyn Extension<'a> + 'a> {
            Box::new(DropCode)
        }
    }

    #[test]
    fn renders_plain_markdown() {
        let out = MarkdownRenderer::new().render("# Title\n\nsome *text*").unwrap();
        assert_eq!(out, "<h1>Title</h1>\n<p>some <em>text</em></p>\n");
    }

    #[test]
    fn each_instance_has_its_own_id() {
        let a = MarkdownRenderer::new();
        let b = MarkdownRenderer::default();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn options_change_parsing() {
        let input = "| a |\n|---|\n| b |\n";
        let mut renderer = MarkdownRenderer::new();
        assert!(!renderer.render(input).unwrap().contains("<table>"));

        renderer.enable(Options::ENABLE_TABLES);
        assert!(renderer.render(input).unwrap().contains("<table>"));
    }

    #[test]
    fn extensions_run_in_order_and_can_swallow() {
        let mut renderer = MarkdownRenderer::new();
        renderer.register(Box::new(DropCodeFactory));
        renderer.register(Box::new(ShoutFactory));

        let out = renderer.render("hello `code` world").unwrap();
        assert_eq!(out, "<p>HELLO  WORLD</p>\n");
        assert_eq!(renderer.extension_count(), 2);
    }

    #[test]
    fn use_plugin_records_name_after_success() {
        let mut renderer = MarkdownRenderer::new();
        let ok = FnPlugin::new("tables", |r: &mut MarkdownRenderer| {
            r.enable(Options::ENABLE_TABLES);
            Ok(())
        });
        let fails = FnPlugin::new("broken", |_: &mut MarkdownRenderer| {
            anyhow::bail!("cannot register")
        });

        renderer.use_plugin(&ok).unwrap();
        assert!(renderer.use_plugin(&fails).is_err());

        assert_eq!(renderer.plugins(), ["tables".to_string()]);
        assert!(renderer.options().contains(Options::ENABLE_TABLES));
    }
}
