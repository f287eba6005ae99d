use std::fmt::Debug;

use dyn_clone::DynClone;

use crate::renderer::MarkdownRenderer;

/// A procedure that registers extensions on a renderer. It returns nothing on success; its
/// effects are only visible through the renderer's later behaviour.
///
/// Plugins are synchronous. They run to completion on the resolving thread.
pub trait Plugin<R>: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    fn apply(&self, renderer: &mut R) -> anyhow::Result<()>;
}

/// The capability a renderer must offer for plugins to be applied to it.
///
/// The default implementation hands the renderer to the plugin. Renderers override it to keep
/// track of what was applied.
pub trait PluginHost: Sized {
    fn use_plugin(&mut self, plugin: &dyn Plugin<Self>) -> anyhow::Result<()> {
        plugin.apply(self)
    }
}

/// Wraps a closure as a named plugin.
pub struct FnPlugin<F> {
    name: String,
    f: F,
}

impl<F> FnPlugin<F> {
    pub fn new<R>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut R) -> anyhow::Result<()> + Send + Sync,
    {
        FnPlugin {
            name: name.into(),
            f,
        }
    }
}

impl<R, F> Plugin<R> for FnPlugin<F>
where
    F: Fn(&mut R) -> anyhow::Result<()> + Send + Sync,
{
    fn name(&self) -> String {
        self.name.clone()
    }

    fn apply(&self, renderer: &mut R) -> anyhow::Result<()> {
        (self.f)(renderer)
    }
}

/// Serializable description of a plugin for the default renderer. Implementations are
/// registered with `typetag` so they can be listed in a configuration file.
#[typetag::serde]
pub trait PluginConfig: Debug + Send + Sync + DynClone {
    fn build(&self) -> anyhow::Result<Box<dyn Plugin<MarkdownRenderer>>>;
}

dyn_clone::clone_trait_object!(PluginConfig);

pub fn build_plugins(
    configs: &[Box<dyn PluginConfig>],
) -> anyhow::Result<Vec<Box<dyn Plugin<MarkdownRenderer>>>> {
    configs.iter().map(|c| c.build()).collect()
}
