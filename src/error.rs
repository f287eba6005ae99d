use std::path::PathBuf;

use mdsite_core::ResolveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("could not read {}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("error loading site configuration")]
    Config(#[from] serde_yaml::Error),

    #[error("plugin {index} could not be built")]
    Plugin {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("error in page template")]
    Template(#[from] tera::Error),

    #[error("render error")]
    Render(#[source] anyhow::Error),
}
