//! Breadcrumb navigation for a prefix

use serde::Serialize;

use crate::context::ListingContext;
use crate::render::{Markup, link};

/// One link in the breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    /// Raw segment text (bucket identifier for the root crumb)
    pub label: String,

    /// Percent-encoded prefix the crumb navigates to, ending in `/`
    /// (empty for the root crumb)
    pub prefix: String,
}

/// Root crumb followed by one crumb per path segment of `prefix`
pub fn build_breadcrumbs(ctx: &ListingContext, prefix: &str) -> Vec<Breadcrumb> {
    let mut crumbs = vec![Breadcrumb {
        label: ctx.bucket.clone(),
        prefix: String::new(),
    }];

    let mut cumulative = String::new();
    for segment in prefix.split('/').filter(|s| !s.is_empty()) {
        cumulative.push_str(&urlencoding::encode(segment));
        cumulative.push('/');
        crumbs.push(Breadcrumb {
            label: segment.to_string(),
            prefix: cumulative.clone(),
        });
    }

    crumbs
}

/// Join crumbs with a visible ` / ` separator
pub fn render_breadcrumbs(ctx: &ListingContext, crumbs: &[Breadcrumb], markup: Markup) -> String {
    let mut parts = crumbs
        .iter()
        .map(|crumb| link(&crumb.label, &ctx.listing_href(&crumb.prefix), markup));

    let Some(root) = parts.next() else {
        return String::new();
    };

    let rest: Vec<String> = parts.collect();
    format!("{root} / {}", rest.join(" / "))
}
