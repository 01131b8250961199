//! # Paginator
//!
//! Turns (page, page size, total count) into the offset for the store and
//! the abbreviated list of page links shown to the user. Pure; every call
//! site shares this one implementation instead of carrying its own copy.
//!
//! Links always carry the active filters forward. Dropping a filter while
//! flipping pages would silently change the result set under the user.

use serde::Serialize;

/// Catalog listing page size.
pub const PAGE_SIZE: usize = 32;

/// Window half-width around the current page.
const NEAR: u32 = 2;

/// Page counts at or below this render every page number, no ellipsis.
const FULL_WINDOW_MAX: u32 = 10;

/// One entry of the rendered pagination strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageLink {
    Page {
        number: u32,
        href: String,
        current: bool,
    },
    Ellipsis,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub offset: usize,
    pub total_pages: u32,
    /// Empty when there is a single page or none; controls are not rendered.
    pub links: Vec<PageLink>,
}

/// Computes the page window and its links.
///
/// `page` is the raw query value: non-numeric or below 1 is treated as 1.
/// `active_params` are the caller's filter parameters; each link repeats
/// them and overwrites `page` with the target page number.
pub fn paginate(
    page: Option<&str>,
    page_size: usize,
    total_count: u64,
    base_url: &str,
    active_params: &[(String, String)],
) -> Pagination {
    let page = normalize_page(page);
    let offset = (page as usize - 1) * page_size;
    let total_pages = total_count.div_ceil(page_size as u64) as u32;

    let mut links = Vec::new();
    if total_pages > 1 {
        for p in 1..=total_pages {
            let distance = p.abs_diff(page);
            if total_pages > FULL_WINDOW_MAX && distance > NEAR && p != 1 && p != total_pages {
                // One marker per gap, placed where the window edge falls off.
                if distance == NEAR + 1 {
                    links.push(PageLink::Ellipsis);
                }
                continue;
            }
            links.push(PageLink::Page {
                number: p,
                href: page_href(base_url, active_params, p),
                current: p == page,
            });
        }
    }

    Pagination {
        page,
        offset,
        total_pages,
        links,
    }
}

fn normalize_page(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.parse::<u32>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

fn page_href(base_url: &str, active_params: &[(String, String)], page: u32) -> String {
    let mut pairs: Vec<(&str, String)> = active_params
        .iter()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.as_str(), value.clone()))
        .collect();
    pairs.push(("page", page.to_string()));

    // Serializing pairs cannot fail; fall back to the bare path regardless.
    match serde_urlencoded::to_string(&pairs) {
        Ok(query) => format!("{base_url}?{query}"),
        Err(_) => base_url.to_string(),
    }
}
