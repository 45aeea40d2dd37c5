//! Page-number pagination over an in-memory candidate set.
//!
//! Each call re-slices the collection independently; nothing is held
//! between requests, so concurrent readers never share cursor state.

/// One page of an ordered candidate set.
///
/// Page numbers are 1-based. An empty candidate set still yields a single
/// empty page so every view has something to render.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    /// Map the page's items while keeping the page geometry intact.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Slice `items` into pages of `page_size` and return the page selected
/// by the raw `page` query value.
///
/// Selection policy: a missing or empty parameter means the first page; a
/// value that is not a positive number in range falls back to the last
/// valid page. The caller never sees an error for a bad page number.
pub fn paginate<T>(items: Vec<T>, page_size: usize, requested: Option<&str>) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);

    let number = resolve_page_number(requested, total_pages);

    let start = (number - 1) * page_size;
    let items = items
        .into_iter()
        .skip(start)
        .take(page_size)
        .collect::<Vec<_>>();

    Page {
        items,
        number,
        total_items,
        total_pages,
    }
}

fn resolve_page_number(requested: Option<&str>, total_pages: usize) -> usize {
    let raw = match requested.map(str::trim) {
        None | Some("") => return 1,
        Some(raw) => raw,
    };

    match raw.parse::<usize>() {
        Ok(number) if (1..=total_pages).contains(&number) => number,
        // Out of range or not a number: clamp to the last valid page
        // instead of erroring back to the caller.
        _ => total_pages,
    }
}
