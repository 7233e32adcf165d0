/// Number of articles on a regular index page.
pub const PAGE_SIZE: usize = 10;

/// Page
///
/// One window of a newest-first article sequence together with the page number that
/// was actually served and the highest page number.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub max_page: i64,
}

/// paginate
///
/// Slices an already ordered sequence (newest first) into the window for
/// `requested_page`. Pure and deterministic; the caller owns ordering.
///
/// * `max_page` is `len / PAGE_SIZE` (floor). The items past `max_page * PAGE_SIZE`
///   are served by the last page, which therefore holds up to `2 * PAGE_SIZE - 1` items.
/// * Sequences of at most `PAGE_SIZE` items are a single page 1; an empty sequence
///   reports `max_page` 0.
/// * The requested page is clamped into `1..=max_page`.
pub fn paginate<T>(items: Vec<T>, requested_page: i64) -> Page<T> {
    let len = items.len();

    if len <= PAGE_SIZE {
        let max_page = if len == 0 { 0 } else { 1 };
        return Page {
            items,
            page: 1,
            max_page,
        };
    }

    let max_page = (len / PAGE_SIZE) as i64;
    let page = requested_page.clamp(1, max_page);

    let start = (page as usize - 1) * PAGE_SIZE;
    let end = if page == max_page {
        len
    } else {
        start + PAGE_SIZE
    };

    Page {
        items: items.into_iter().skip(start).take(end - start).collect(),
        page,
        max_page,
    }
}

/// parse_page_token
///
/// Turns the `{page}` path segment into a page number. Missing or non-numeric tokens
/// silently mean page 1.
pub fn parse_page_token(token: Option<&str>) -> i64 {
    token
        .and_then(|t| t.trim().parse::<i64>().ok())
        .unwrap_or(1)
}
