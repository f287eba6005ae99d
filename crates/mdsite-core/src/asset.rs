use linked_hash_map::LinkedHashMap;
use serde::{Deserialize, Serialize};

use crate::error::AssetErrorReason;

/// An external resource (usually served from a CDN) to be linked into the page.
///
/// Attributes keep their insertion order so that generated markup is deterministic.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    pub url: String,
    #[serde(default, skip_serializing_if = "LinkedHashMap::is_empty")]
    pub attrs: LinkedHashMap<String, String>,
}

/// The tag an asset is linked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Script,
    Stylesheet,
}

impl AssetDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        AssetDescriptor {
            url: url.into(),
            attrs: LinkedHashMap::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Checks the shape of the descriptor. Attributes are not inspected.
    pub fn validate(&self) -> Result<(), AssetErrorReason> {
        if self.url.trim().is_empty() {
            Err(AssetErrorReason::EmptyUrl)
        } else {
            Ok(())
        }
    }

    /// Stylesheets are recognized by a `rel` attribute or a `.css` path; everything else is
    /// treated as a script.
    pub fn kind(&self) -> AssetKind {
        if self.attrs.contains_key("rel") {
            return AssetKind::Stylesheet;
        }

        let path = self
            .url
            .trim()
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or_default();

        if path.ends_with(".css") {
            AssetKind::Stylesheet
        } else {
            AssetKind::Script
        }
    }
}
