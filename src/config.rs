use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use mdsite_core::plugin::PluginConfig;
use mdsite_core::{AssetDescriptor, Configuration, MarkdownRenderer};

use crate::error::SiteError;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "mdsite.yml";

/// Refers to an mdsite.yml file that lists the renderer plugins and the assets of a page.
///
/// ```yaml
/// title: Handbook
/// plugins:
///   - options:
///       tables: true
///   - heading_anchors:
///       permalink: true
/// assets:
///   - url: https://cdn.example.com/katex.min.css
///   - url: https://cdn.example.com/katex.min.js
///     attrs:
///       defer: ""
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SiteConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub plugins: Vec<Box<dyn PluginConfig>>,
    #[serde(default)]
    pub assets: Vec<AssetDescriptor>,
    /// Page template. Relative paths are resolved against the configuration file.
    #[serde(default)]
    pub template: Option<PathBuf>,
}

impl SiteConfig {
    pub fn load(path: &Path) -> Result<Self, SiteError> {
        let input = fs::read_to_string(path).map_err(|e| SiteError::Io(path.to_path_buf(), e))?;
        let mut config: SiteConfig = input.parse()?;

        if let (Some(template), Some(dir)) = (config.template.as_ref(), path.parent()) {
            if template.is_relative() {
                config.template = Some(dir.join(template));
            }
        }

        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns an empty configuration.
    pub fn load_or_default(path: &Path) -> Result<Self, SiteError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "no configuration file, using defaults");
            Ok(SiteConfig::default())
        }
    }

    /// Builds the plugins and produces the configuration handed to the resolver. A renderer is
    /// never supplied; the resolver creates a fresh one.
    pub fn to_configuration(&self) -> Result<Configuration<MarkdownRenderer>, SiteError> {
        let plugins = self
            .plugins
            .iter()
            .enumerate()
            .map(|(index, p)| p.build().map_err(|source| SiteError::Plugin { index, source }))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Configuration {
            plugins: Some(plugins),
            renderer: None,
            assets: Some(self.assets.clone()),
        })
    }
}

impl FromStr for SiteConfig {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_yaml::from_str(s)?)
    }
}
