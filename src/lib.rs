//! mdsite renders markdown pages with a renderer that is configured from an `mdsite.yml` file.
//! The configuration is resolved once by [mdsite_core::resolver::ConfigResolver]; the resulting
//! renderer and assets are kept by a [site::Site] until the configuration changes.

/// The site configuration file.
pub mod config;

pub mod error;

/// Page assembly from a resolved configuration.
pub mod site;

pub use config::SiteConfig;
pub use error::SiteError;
pub use site::Site;
