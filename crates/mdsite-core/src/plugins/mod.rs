mod anchors;
mod highlight;
mod links;
mod options;

pub use anchors::{slugify, HeadingAnchors};
pub use highlight::{Highlight, HighlightConfig};
pub use links::ExternalLinks;
pub use options::MarkdownOptions;
