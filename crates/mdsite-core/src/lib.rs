//! Configuration resolution for a markdown renderer that is extended through plugins.
//!
//! A [resolver::Configuration] names an optional renderer, an ordered list of plugins and a list
//! of asset descriptors. [resolver::ConfigResolver] turns it into a [resolver::ResolvedConfig]
//! holding exactly one renderer with every plugin applied, in order, and the validated assets.

/// Asset descriptors (url plus html attributes) and their validation.
pub mod asset;

/// Errors produced while resolving a configuration.
pub mod error;

/// Turns resolved assets into page markup.
pub mod inject;

/// The plugin contract and the serializable plugin configuration trait.
pub mod plugin;

/// Built-in plugins for [renderer::MarkdownRenderer].
pub mod plugins;

/// The renderer capability and the default pulldown-cmark based renderer.
pub mod renderer;

pub mod resolver;

pub use asset::AssetDescriptor;
pub use error::{AssetErrorReason, ResolveError};
pub use plugin::{FnPlugin, Plugin, PluginConfig, PluginHost};
pub use renderer::{MarkdownRenderer, Renderer, RendererId};
pub use resolver::{resolve, ConfigResolver, Configuration, ResolvedConfig};
