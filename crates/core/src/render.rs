//! Fixed-width listing table
//!
//! Every page of a listing renders to a text block: a header, a dashed
//! separator, an optional `../` row, then one row per entry with the key as a
//! link. Columns are padded (and truncated) to fixed widths so the block
//! lines up in a `<pre>` element or a terminal.

use crate::context::ListingContext;
use crate::listing::{Entry, ListingPage};
use crate::request::{encode_path, parent_prefix};

/// Column widths used for the table layout
pub const COLUMNS: [usize; 3] = [45, 30, 15];

const GUTTER: &str = "  ";

/// How the key column is emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Markup {
    /// `<a href="...">key</a>`, escaped for embedding in HTML
    #[default]
    Html,
    /// Bare key text
    Plain,
}

/// Pad `value` with spaces to exactly `width` characters.
///
/// Values longer than `width - 3` characters are cut and suffixed with `...`.
/// Below a width of 3 the ellipsis itself is cut to fit.
pub fn pad_right(value: &str, width: usize) -> String {
    let keep = width.saturating_sub(3);
    let mut out: String = value.chars().take(keep).collect();
    if value.chars().count() > keep {
        out.extend("...".chars().take(width - keep));
    }

    let len = out.chars().count();
    if len < width {
        out.push_str(&" ".repeat(width - len));
    }
    out
}

/// Render the table block for one page
pub fn render_page(ctx: &ListingContext, page: &ListingPage, markup: Markup) -> String {
    render_table(ctx, &page.prefix, &page.entries, markup)
}

/// Render the table block for `entries` listed under `prefix`
pub fn render_table(
    ctx: &ListingContext,
    prefix: &str,
    entries: &[Entry],
    markup: Markup,
) -> String {
    let mut out = String::new();

    out.push_str(&pad_right("Last Modified", COLUMNS[1]));
    out.push_str(GUTTER);
    out.push_str(&pad_right("Size", COLUMNS[2]));
    out.push_str("Key \n");
    out.push_str(&"-".repeat(COLUMNS.iter().sum::<usize>() + 3));
    out.push('\n');

    if !prefix.is_empty() {
        let up = ctx.listing_href(&encode_path(&parent_prefix(prefix)));
        out.push_str(&render_row("", "", "../", &up, markup));
    }

    for entry in entries {
        let text = entry.key.strip_prefix(prefix).unwrap_or(&entry.key);
        let href = if entry.is_dir() {
            ctx.listing_href(&encode_path(&entry.key))
        } else {
            ctx.object_href(&encode_path(&entry.key))
        };
        out.push_str(&render_row(
            &entry.last_modified,
            &entry.size_display(),
            text,
            &href,
            markup,
        ));
    }

    out
}

fn render_row(last_modified: &str, size: &str, text: &str, href: &str, markup: Markup) -> String {
    let mut row = pad_right(last_modified, COLUMNS[1]);
    row.push_str(GUTTER);
    row.push_str(&pad_right(size, COLUMNS[2]));
    row.push_str(&link(text, href, markup));
    row.push('\n');
    row
}

pub(crate) fn link(text: &str, href: &str, markup: Markup) -> String {
    match markup {
        Markup::Html => format!(
            r#"<a href="{}">{}</a>"#,
            escape_html(href),
            escape_html(text)
        ),
        Markup::Plain => text.to_string(),
    }
}

pub(crate) fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
