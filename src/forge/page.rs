//! forge::page
//!
//! Pagination normalizer.
//!
//! Providers signal "there is more" in three different ways:
//!
//! - **Cursor-style**: the body carries explicit `next`/`previous` links
//!   (Bitbucket Cloud).
//! - **Offset/limit-style**: the body carries an `isLastPage` flag, and no
//!   cheap total count (Bitbucket Server). When the flag is missing, a
//!   full page is confirmed by probing the following page.
//! - **Header-relation style**: an RFC 8288 `Link` header with
//!   `first`/`next`/`prev`/`last` relations (GitHub).
//!
//! Each constructor here turns one of those signals into a canonical
//! [`Page`]. None of them fail: a malformed signal degrades to a page with
//! only `first` populated.
//!
//! # Invariants
//!
//! - `first` is `1` whenever any paging metadata is known.
//! - `next` is non-zero only if more results exist beyond the current page,
//!   and is always zero when the current page returned no items.
//! - Populated fields are monotonic: `first <= prev < next <= last`.

use serde::Serialize;
use tracing::{debug, trace};

use crate::core::types::ListOptions;

/// Canonical paging result attached to every list response.
///
/// Each field is a 1-based page number, or `0` when not applicable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Page {
    pub first: u32,
    pub next: u32,
    pub prev: u32,
    pub last: u32,
}

impl Page {
    /// A page where only `first` is known.
    pub fn first_only() -> Self {
        Self {
            first: 1,
            ..Self::default()
        }
    }

    /// Whether more results exist beyond this page.
    pub fn has_next(&self) -> bool {
        self.next != 0
    }

    /// Cursor-style signal: the provider hands back the next and previous
    /// page numbers directly (already extracted from its cursor links).
    ///
    /// `next` is trusted only when it moves forward from the requested page.
    pub fn from_cursor(
        opts: ListOptions,
        item_count: usize,
        next: Option<u32>,
        prev: Option<u32>,
    ) -> Self {
        let current = opts.effective_page();
        let mut page = Self::first_only();

        if item_count > 0 {
            match next {
                Some(n) if n > current => page.next = n,
                Some(n) => {
                    debug!(current, next = n, "ignoring non-advancing cursor");
                }
                None => {}
            }
        }
        if let Some(p) = prev.filter(|p| *p >= 1 && *p < current) {
            page.prev = p;
        }

        trace!(?page, "normalized cursor page");
        page
    }

    /// Offset/limit-style signal with an "is last page" flag.
    ///
    /// These providers do not report a total count, so `last` stays zero.
    pub fn from_last_page_flag(opts: ListOptions, item_count: usize, is_last_page: bool) -> Self {
        let current = opts.effective_page();
        let mut page = Self::first_only();

        if !is_last_page && item_count > 0 {
            match current.checked_add(1) {
                Some(n) => page.next = n,
                None => debug!(current, "no page number after the current page"),
            }
        }
        if current > 1 {
            page.prev = current - 1;
        }

        trace!(?page, "normalized offset page");
        page
    }

    /// Whether an overflow probe is needed to decide if a further page exists.
    ///
    /// Only a page filled exactly to the requested size is ambiguous. With no
    /// requested size there is nothing to compare against.
    pub fn needs_overflow_probe(opts: ListOptions, item_count: usize) -> bool {
        match opts.effective_size() {
            Some(size) => item_count > 0 && item_count == size as usize,
            None => false,
        }
    }

    /// Offset/limit-style signal decided by item count plus, for a full page,
    /// the outcome of a probe of the following page.
    pub fn from_overflow(opts: ListOptions, item_count: usize, probe_found_more: bool) -> Self {
        let more = Self::needs_overflow_probe(opts, item_count) && probe_found_more;
        Self::from_last_page_flag(opts, item_count, !more)
    }

    /// Header-relation signal: parse an RFC 8288 `Link` header.
    ///
    /// Unknown relations are ignored, as are links without a parseable
    /// `page` query parameter. `first` is always page 1, whatever the
    /// `first` relation claims.
    pub fn from_link_header(header: Option<&str>, item_count: usize) -> Self {
        let mut page = Self::first_only();

        let Some(header) = header else {
            return page;
        };

        for part in header.split(',') {
            let Some((url, params)) = split_link(part) else {
                debug!(link = part.trim(), "skipping malformed link");
                continue;
            };
            let Some(number) = page_param(url, "page") else {
                continue;
            };
            for rel in rel_values(params) {
                match rel {
                    "next" => page.next = number,
                    "prev" | "previous" => page.prev = number,
                    "last" => page.last = number,
                    _ => {}
                }
            }
        }

        if item_count == 0 {
            page.next = 0;
        }

        let page = page.normalized();
        trace!(?page, "normalized link header page");
        page
    }

    /// Drop fields that break monotonicity instead of reporting them.
    fn normalized(mut self) -> Self {
        if self.first == 0 {
            self.first = 1;
        }
        if self.last != 0 && self.last < self.first {
            self.last = 0;
        }
        if self.next != 0 && (self.next < self.first || self.next <= self.prev) {
            self.next = 0;
        }
        if self.next != 0 && self.last != 0 && self.next > self.last {
            self.next = 0;
        }
        if self.prev != 0 && self.prev < self.first {
            self.prev = 0;
        }
        self
    }
}

/// Split one `<url>; rel="x"` link value into its URL and parameter list.
fn split_link(part: &str) -> Option<(&str, &str)> {
    let part = part.trim();
    let rest = part.strip_prefix('<')?;
    let end = rest.find('>')?;
    Some((&rest[..end], &rest[end + 1..]))
}

/// Extract the space-separated relation types of a link's `rel` parameter.
fn rel_values(params: &str) -> Vec<&str> {
    params
        .split(';')
        .filter_map(|p| {
            let (key, value) = p.trim().split_once('=')?;
            (key.trim().eq_ignore_ascii_case("rel")).then(|| value.trim().trim_matches('"'))
        })
        .flat_map(|v| v.split_whitespace())
        .collect()
}

/// Read a numeric query parameter from a URL.
pub(crate) fn page_param(url: &str, key: &str) -> Option<u32> {
    let (_, query) = url.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .and_then(|(_, v)| v.parse().ok())
}
