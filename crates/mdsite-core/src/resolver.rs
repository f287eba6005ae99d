//! Turns a partial [Configuration] into a [ResolvedConfig].
//!
//! Resolution is a single synchronous pass:
//!
//! 1. take the supplied renderer, or create one with the [RendererFactory];
//! 2. apply every plugin to that renderer in input order, stopping at the first failure;
//! 3. check every asset url in input order, stopping at the first empty one.
//!
//! Plugins that ran before a failure are not rolled back.

use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

use tracing::{debug, warn};

use crate::asset::AssetDescriptor;
use crate::error::ResolveError;
use crate::plugin::{Plugin, PluginHost};

/// Creates the renderer used when a configuration does not supply one. Every call must return a
/// new, independently owned instance.
pub trait RendererFactory {
    type Renderer;

    fn create_default(&self) -> Self::Renderer;
}

impl<R, F> RendererFactory for F
where
    F: Fn() -> R,
{
    type Renderer = R;

    fn create_default(&self) -> R {
        self()
    }
}

/// Creates renderers through their [Default] implementation.
pub struct DefaultFactory<R>(PhantomData<fn() -> R>);

impl<R> DefaultFactory<R> {
    pub fn new() -> Self {
        DefaultFactory(PhantomData)
    }
}

impl<R> Default for DefaultFactory<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Default> RendererFactory for DefaultFactory<R> {
    type Renderer = R;

    fn create_default(&self) -> R {
        R::default()
    }
}

/// User supplied configuration. Every field may be left out.
///
/// A supplied renderer is moved in and comes back out of [ConfigResolver::resolve] as the same
/// instance, with the plugins applied to it.
pub struct Configuration<R> {
    pub plugins: Option<Vec<Box<dyn Plugin<R>>>>,
    pub renderer: Option<R>,
    pub assets: Option<Vec<AssetDescriptor>>,
}

impl<R> Default for Configuration<R> {
    fn default() -> Self {
        Configuration {
            plugins: None,
            renderer: None,
            assets: None,
        }
    }
}

impl<R> Configuration<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_renderer(mut self, renderer: R) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_plugin(mut self, plugin: impl Plugin<R> + 'static) -> Self {
        self.plugins
            .get_or_insert_with(Vec::new)
            .push(Box::new(plugin));
        self
    }

    pub fn with_plugins(mut self, plugins: Vec<Box<dyn Plugin<R>>>) -> Self {
        self.plugins.get_or_insert_with(Vec::new).extend(plugins);
        self
    }

    pub fn with_asset(mut self, asset: AssetDescriptor) -> Self {
        self.assets.get_or_insert_with(Vec::new).push(asset);
        self
    }
}

impl<R: Debug> Debug for Configuration<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let plugins: Option<Vec<String>> = self
            .plugins
            .as_ref()
            .map(|ps| ps.iter().map(|p| p.name()).collect());

        f.debug_struct("Configuration")
            .field("plugins", &plugins)
            .field("renderer", &self.renderer)
            .field("assets", &self.assets)
            .finish()
    }
}

/// The outcome of a successful resolution: one renderer with every plugin applied, and the
/// validated assets in input order.
#[derive(Debug)]
pub struct ResolvedConfig<R> {
    pub renderer: R,
    pub assets: Vec<AssetDescriptor>,
}

pub struct ConfigResolver<F> {
    factory: F,
}

impl<R: Default + PluginHost> Default for ConfigResolver<DefaultFactory<R>> {
    fn default() -> Self {
        ConfigResolver::new(DefaultFactory::new())
    }
}

impl<F> ConfigResolver<F>
where
    F: RendererFactory,
    F::Renderer: PluginHost,
{
    pub fn new(factory: F) -> Self {
        ConfigResolver { factory }
    }

    pub fn resolve(
        &self,
        config: Configuration<F::Renderer>,
    ) -> Result<ResolvedConfig<F::Renderer>, ResolveError> {
        let Configuration {
            plugins,
            renderer,
            assets,
        } = config;

        let mut renderer = match renderer {
            Some(renderer) => renderer,
            None => {
                debug!("no renderer supplied, creating default");
                self.factory.create_default()
            }
        };

        apply_plugins(&mut renderer, plugins.as_deref().unwrap_or_default())?;

        let assets = assets.unwrap_or_default();
        validate_assets(&assets)?;

        Ok(ResolvedConfig { renderer, assets })
    }
}

/// Resolves with a renderer created through [Default].
pub fn resolve<R>(config: Configuration<R>) -> Result<ResolvedConfig<R>, ResolveError>
where
    R: Default + PluginHost,
{
    ConfigResolver::<DefaultFactory<R>>::default().resolve(config)
}

/// Applies `plugins` to `renderer` in order. Stops at the first failing plugin; the ones before
/// it stay applied.
pub fn apply_plugins<R: PluginHost>(
    renderer: &mut R,
    plugins: &[Box<dyn Plugin<R>>],
) -> Result<(), ResolveError> {
    for (index, plugin) in plugins.iter().enumerate() {
        let name = plugin.name();
        debug!(index, plugin = %name, "applying plugin");

        renderer.use_plugin(plugin.as_ref()).map_err(|source| {
            warn!(index, plugin = %name, error = %source, "plugin failed");
            ResolveError::PluginApplication {
                index,
                name,
                source,
            }
        })?;
    }
    Ok(())
}

/// Checks assets in order and reports the first invalid one.
pub fn validate_assets(assets: &[AssetDescriptor]) -> Result<(), ResolveError> {
    for (index, asset) in assets.iter().enumerate() {
        asset.validate().map_err(|reason| {
            warn!(index, url = %asset.url, %reason, "invalid asset");
            ResolveError::InvalidAsset { index, reason }
        })?;
    }
    debug!(count = assets.len(), "assets validated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetErrorReason;
    use crate::plugin::FnPlugin;
    use crate::renderer::MarkdownRenderer;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Records the plugins applied to it.
    #[derive(Debug, Default)]
    struct Log {
        applied: Vec<String>,
    }

    impl PluginHost for Log {}

    fn push(name: &'static str) -> Box<dyn Plugin<Log>> {
        Box::new(FnPlugin::new(name, move |log: &mut Log| {
            log.applied.push(name.to_string());
            Ok(())
        }))
    }

    fn fail(name: &'static str) -> Box<dyn Plugin<Log>> {
        Box::new(FnPlugin::new(name, |_: &mut Log| {
            anyhow::bail!("plugin exploded")
        }))
    }

    #[test]
    fn empty_configuration_creates_default_renderer() {
        let resolved = resolve(Configuration::<MarkdownRenderer>::new()).unwrap();
        assert!(resolved.assets.is_empty());
        assert!(resolved.renderer.plugins().is_empty());
    }

    #[test]
    fn default_renderers_are_fresh() {
        let a = resolve(Configuration::<MarkdownRenderer>::new()).unwrap();
        let b = resolve(Configuration::<MarkdownRenderer>::new()).unwrap();
        assert_ne!(a.renderer.id(), b.renderer.id());
    }

    #[test]
    fn supplied_renderer_is_kept() {
        let renderer = MarkdownRenderer::new();
        let id = renderer.id();

        let resolved = resolve(Configuration::new().with_renderer(renderer)).unwrap();
        assert_eq!(resolved.renderer.id(), id);
    }

    #[test]
    fn factory_is_only_used_without_renderer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let resolver = ConfigResolver::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Log::default()
        });

        resolver.resolve(Configuration::new()).unwrap();
        resolver
            .resolve(Configuration::new().with_renderer(Log::default()))
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn plugins_apply_in_order() {
        let config = Configuration::new().with_plugins(vec![push("a"), push("b"), push("c")]);
        let resolved = resolve(config).unwrap();
        assert_eq!(resolved.renderer.applied, vec!["a", "b", "c"]);
    }

    #[test]
    fn plugins_apply_to_supplied_renderer() {
        let mut log = Log::default();
        log.applied.push("before".to_string());

        let config = Configuration::new()
            .with_renderer(log)
            .with_plugins(vec![push("a")]);
        let resolved = resolve(config).unwrap();
        assert_eq!(resolved.renderer.applied, vec!["before", "a"]);
    }

    #[test]
    fn failing_plugin_stops_application() {
        let config = Configuration::new().with_plugins(vec![
            push("p0"),
            push("p1"),
            fail("p2"),
            push("p3"),
        ]);

        let err = resolve(config).unwrap_err();
        match err {
            ResolveError::PluginApplication {
                index,
                name,
                source,
            } => {
                assert_eq!(index, 2);
                assert_eq!(name, "p2");
                assert_eq!(source.to_string(), "plugin exploded");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn earlier_plugins_are_not_rolled_back() {
        let mut log = Log::default();
        let plugins = vec![push("p0"), push("p1"), fail("p2"), push("p3")];

        let err = apply_plugins(&mut log, &plugins).unwrap_err();
        assert_eq!(err.index(), 2);
        assert_eq!(log.applied, vec!["p0", "p1"]);
    }

    #[test]
    fn each_plugin_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let config = Configuration::<MarkdownRenderer>::new().with_plugin(FnPlugin::new(
            "count",
            move |_: &mut MarkdownRenderer| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        ));

        let resolved = resolve(config).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolved.renderer.plugins(), ["count".to_string()]);
    }

    #[test]
    fn log_plugin_with_cdn_asset() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let config = Configuration::<MarkdownRenderer>::new()
            .with_plugin(FnPlugin::new("log", move |_: &mut MarkdownRenderer| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .with_asset(AssetDescriptor::new("https://cdn.example.com/a.js"));

        let resolved = resolve(config).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(resolved.assets[0].url, "https://cdn.example.com/a.js");
    }

    #[test]
    fn whitespace_url_is_invalid() {
        let config =
            Configuration::<MarkdownRenderer>::new().with_asset(AssetDescriptor::new("  "));

        let err = resolve(config).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::InvalidAsset {
                index: 0,
                reason: AssetErrorReason::EmptyUrl
            }
        ));
        assert_eq!(err.to_string(), "invalid asset at index 0: empty_url");
    }

    #[test]
    fn first_invalid_asset_is_reported() {
        let assets = vec![
            AssetDescriptor::new("https://cdn.example.com/a.js"),
            AssetDescriptor::new(""),
            AssetDescriptor::new("\n"),
        ];

        let err = validate_assets(&assets).unwrap_err();
        assert_eq!(err.index(), 1);
    }

    #[test]
    fn valid_assets_pass_through_unchanged() {
        let assets = vec![
            AssetDescriptor::new("https://cdn.example.com/b.css").with_attr("media", "print"),
            AssetDescriptor::new(" https://cdn.example.com/a.js ")
                .with_attr("defer", "")
                .with_attr("", "odd but accepted"),
        ];

        let mut config = Configuration::<MarkdownRenderer>::new();
        config.assets = Some(assets.clone());

        let resolved = resolve(config).unwrap();
        assert_eq!(resolved.assets, assets);
    }

    #[test]
    fn plugins_run_before_assets_are_checked() {
        let config = Configuration::new()
            .with_plugins(vec![push("a")])
            .with_asset(AssetDescriptor::new(""));

        let err = resolve(config).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidAsset { index: 0, .. }));
    }

    #[test]
    fn independent_resolutions_on_threads() {
        let ids: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    s.spawn(move || {
                        let config = Configuration::<MarkdownRenderer>::new()
                            .with_plugin(crate::plugins::MarkdownOptions::all())
                            .with_asset(AssetDescriptor::new(format!(
                                "https://cdn.example.com/{}.js",
                                i
                            )));
                        resolve(config).unwrap().renderer.id()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let unique: HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
    }
}
