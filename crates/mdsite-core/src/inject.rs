use std::io;

use pulldown_cmark::escape::{escape_href, escape_html};

use crate::asset::{AssetDescriptor, AssetKind};

/// Consumes validated assets and produces the markup that links them into a page.
pub trait AssetInjector {
    fn inject(&self, assets: &[AssetDescriptor]) -> anyhow::Result<String>;
}

/// Writes one `<script>` or `<link>` tag per asset, one per line, in input order.
///
/// Attributes with an empty value are written as boolean attributes (`defer`, `async`).
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadTags;

impl AssetInjector for HeadTags {
    fn inject(&self, assets: &[AssetDescriptor]) -> anyhow::Result<String> {
        let mut out = String::new();
        for asset in assets {
            write_tag(&mut out, asset)?;
            out.push('\n');
        }
        Ok(out)
    }
}

fn write_tag(out: &mut String, asset: &AssetDescriptor) -> io::Result<()> {
    match asset.kind() {
        AssetKind::Script => out.push_str("<script src=\""),
        AssetKind::Stylesheet if asset.attrs.contains_key("rel") => out.push_str("<link href=\""),
        AssetKind::Stylesheet => out.push_str("<link rel=\"stylesheet\" href=\""),
    }
    escape_href(&mut *out, asset.url.trim())?;
    out.push('"');

    for (name, value) in &asset.attrs {
        out.push(' ');
        escape_html(&mut *out, name)?;
        if !value.is_empty() {
            out.push_str("=\"");
            escape_html(&mut *out, value)?;
            out.push('"');
        }
    }

    match asset.kind() {
        AssetKind::Script => out.push_str("></script>"),
        AssetKind::Stylesheet => out.push('>'),
    }
    Ok(())
}
