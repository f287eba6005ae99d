use std::fs;

use tera::Tera;
use tracing::{debug, info};

use mdsite_core::inject::{AssetInjector, HeadTags};
use mdsite_core::{resolve, AssetDescriptor, MarkdownRenderer, Renderer, ResolvedConfig};

use crate::config::SiteConfig;
use crate::error::SiteError;

const PAGE_TEMPLATE: &str = "page.html";
const DEFAULT_TEMPLATE: &str = include_str!("../resources/page.tera.html");

/// A mounted site: the configuration together with the renderer and assets it resolved to.
///
/// The resolution happens once, in [Site::new]. It is only redone by [Site::reload].
pub struct Site {
    config: SiteConfig,
    resolved: ResolvedConfig<MarkdownRenderer>,
    tera: Tera,
}

impl Site {
    pub fn new(config: SiteConfig) -> Result<Self, SiteError> {
        let resolved = resolve(config.to_configuration()?)?;
        let tera = load_template(&config)?;

        info!(
            renderer = %resolved.renderer.id(),
            plugins = resolved.renderer.plugins().len(),
            assets = resolved.assets.len(),
            "configuration resolved"
        );

        Ok(Site {
            config,
            resolved,
            tera,
        })
    }

    /// Replaces the configuration and resolves it again with a new renderer. If the new
    /// configuration fails to resolve, the current state is kept.
    pub fn reload(&mut self, config: SiteConfig) -> Result<(), SiteError> {
        *self = Site::new(config)?;
        Ok(())
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn renderer(&self) -> &MarkdownRenderer {
        &self.resolved.renderer
    }

    pub fn assets(&self) -> &[AssetDescriptor] {
        &self.resolved.assets
    }

    pub fn render_body(&self, markdown: &str) -> Result<String, SiteError> {
        self.resolved
            .renderer
            .render(markdown)
            .map_err(SiteError::Render)
    }

    /// Renders `markdown` into the page template, with the asset tags in the head. `title`
    /// overrides the configured title.
    pub fn render_page(&self, markdown: &str, title: Option<&str>) -> Result<String, SiteError> {
        let body = self.render_body(markdown)?;
        let head = HeadTags
            .inject(&self.resolved.assets)
            .map_err(SiteError::Render)?;

        let mut context = tera::Context::new();
        context.insert("title", title.unwrap_or(&self.config.title));
        context.insert("head", &head);
        context.insert("body", &body);
        context.insert("assets", &self.resolved.assets);

        Ok(self.tera.render(PAGE_TEMPLATE, &context)?)
    }
}

fn load_template(config: &SiteConfig) -> Result<Tera, SiteError> {
    let source = match &config.template {
        Some(path) => {
            debug!(path = %path.display(), "loading page template");
            fs::read_to_string(path).map_err(|e| SiteError::Io(path.clone(), e))?
        }
        None => DEFAULT_TEMPLATE.to_string(),
    };

    let mut tera = Tera::default();
    tera.add_raw_template(PAGE_TEMPLATE, &source)?;
    Ok(tera)
}
