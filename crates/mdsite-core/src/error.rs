use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Why an asset descriptor was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetErrorReason {
    /// The url is empty or only whitespace.
    EmptyUrl,
}

impl AssetErrorReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetErrorReason::EmptyUrl => "empty_url",
        }
    }
}

impl Display for AssetErrorReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolution failures. Neither kind is fatal; the caller decides whether to abort the mount or
/// fall back to a default configuration.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The plugin at `index` returned an error. Plugins before it stay applied.
    #[error("plugin {index} ({name}) failed to apply")]
    PluginApplication {
        index: usize,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid asset at index {index}: {reason}")]
    InvalidAsset {
        index: usize,
        reason: AssetErrorReason,
    },
}

impl ResolveError {
    /// Position of the offending entry in its input sequence.
    pub fn index(&self) -> usize {
        match self {
            ResolveError::PluginApplication { index, .. } => *index,
            ResolveError::InvalidAsset { index, .. } => *index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_displays_as_code() {
        assert_eq!(AssetErrorReason::EmptyUrl.to_string(), "empty_url");
    }

    #[test]
    fn plugin_error_keeps_source() {
        let err = ResolveError::PluginApplication {
            index: 2,
            name: "anchors".to_string(),
            source: anyhow::anyhow!("boom"),
        };

        assert_eq!(err.index(), 2);
        assert_eq!(err.to_string(), "plugin 2 (anchors) failed to apply");
        let source = std::error::Error::source(&err).expect("source should be kept");
        assert_eq!(source.to_string(), "boom");
    }
}
