//! Standalone HTML listing page
//!
//! Wraps the breadcrumb trail and the aggregated table in a minimal
//! document. A failed listing keeps the pages rendered so far and appends the
//! error in bold.

use crate::context::ListingContext;
use crate::nav::{Breadcrumb, render_breadcrumbs};
use crate::paginate::{AggregatedListing, ListingOutcome};
use crate::render::{Markup, escape_html};

/// Inner HTML of the listing container
pub fn render_listing_html(listing: &AggregatedListing) -> String {
    let mut out = String::new();
    if !listing.text.is_empty() {
        out.push_str("<pre>");
        out.push_str(&listing.text);
        out.push_str("</pre>");
    }
    if let ListingOutcome::Failed(e) = &listing.outcome {
        out.push_str("<strong>Error: ");
        out.push_str(&escape_html(&e.to_string()));
        out.push_str("</strong>");
    }
    out
}

/// Full HTML document for a listing
pub fn render_document(
    ctx: &ListingContext,
    breadcrumbs: &[Breadcrumb],
    listing: &AggregatedListing,
) -> String {
    let mut doc = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");

    if let Some(base) = ctx.base_href() {
        doc.push_str(&format!("<base href=\"{}\">\n", escape_html(&base)));
    }

    doc.push_str(&format!(
        "<title>{}/{}</title>\n</head>\n<body>\n",
        escape_html(&ctx.bucket),
        escape_html(&listing.prefix)
    ));
    doc.push_str(&format!(
        "<div id=\"navigation\">{}</div>\n",
        render_breadcrumbs(ctx, breadcrumbs, Markup::Html)
    ));
    doc.push_str(&format!(
        "<div id=\"listing\">{}</div>\n",
        render_listing_html(listing)
    ));
    doc.push_str("</body>\n</html>\n");
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::nav::build_breadcrumbs;

    fn listing(text: &str, outcome: ListingOutcome) -> AggregatedListing {
        AggregatedListing {
            prefix: "a/".into(),
            text: text.into(),
            entries: Vec::new(),
            pages: 1,
            outcome,
        }
    }

    #[test]
    fn test_complete_listing_in_pre() {
        let html = render_listing_html(&listing("table\n", ListingOutcome::Complete));
        assert_eq!(html, "<pre>table\n</pre>");
    }

    #[test]
    fn test_failed_listing_keeps_partial_output() {
        let html = render_listing_html(&listing(
            "table\n",
            ListingOutcome::Failed(Error::Network("relay <down>".into())),
        ));
        assert_eq!(
            html,
            "<pre>table\n</pre><strong>Error: Network error: relay &lt;down&gt;</strong>"
        );
    }

    #[test]
    fn test_failed_first_page_shows_only_error() {
        let html = render_listing_html(&listing(
            "",
            ListingOutcome::Failed(Error::Network("refused".into())),
        ));
        assert_eq!(html, "<strong>Error: Network error: refused</strong>");
    }

    #[test]
    fn test_document_structure() {
        let ctx = ListingContext::new("data", "https://data.example.com")
            .with_page_url("https://index.example.com/list");
        let crumbs = build_breadcrumbs(&ctx, "a/");
        let doc = render_document(&ctx, &crumbs, &listing("rows\n", ListingOutcome::Complete));

        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<base href=\"https://index.example.com/list/\">"));
        assert!(doc.contains("<title>data/a/</title>"));
        assert!(doc.contains("<div id=\"navigation\"><a href="));
        assert!(doc.contains("<div id=\"listing\"><pre>rows\n</pre></div>"));
    }

    #[test]
    fn test_document_without_page_url_has_no_base() {
        let ctx = ListingContext::new("data", "https://data.example.com");
        let doc = render_document(&ctx, &[], &listing("", ListingOutcome::Complete));
        assert!(!doc.contains("<base"));
    }
}
