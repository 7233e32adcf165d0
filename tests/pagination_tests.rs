use devblog::pagination::{PAGE_SIZE, paginate, parse_page_token};

fn numbers(n: usize) -> Vec<usize> {
    (0..n).collect()
}

#[test]
fn test_empty_sequence_has_no_pages() {
    let page = paginate(Vec::<usize>::new(), 3);
    assert!(page.items.is_empty());
    assert_eq!(page.page, 1);
    assert_eq!(page.max_page, 0);
}

#[test]
fn test_short_sequence_is_a_single_page() {
    for n in [1, 7, PAGE_SIZE] {
        let page = paginate(numbers(n), 5);
        assert_eq!(page.items, numbers(n));
        assert_eq!(page.page, 1);
        assert_eq!(page.max_page, 1);
    }
}

#[test]
fn test_last_page_absorbs_the_remainder() {
    // 25 items: max_page = 2, page 2 holds items 10..25.
    let first = paginate(numbers(25), 1);
    assert_eq!(first.items, (0..10).collect::<Vec<_>>());
    assert_eq!(first.max_page, 2);

    let last = paginate(numbers(25), 2);
    assert_eq!(last.items, (10..25).collect::<Vec<_>>());
    assert_eq!(last.page, 2);
}

#[test]
fn test_out_of_range_pages_are_clamped() {
    let high = paginate(numbers(25), 3);
    assert_eq!(high.page, 2);
    assert_eq!(high.items.len(), 15);

    let low = paginate(numbers(25), -4);
    assert_eq!(low.page, 1);
    assert_eq!(low.items, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_exact_multiple_has_full_last_page() {
    let last = paginate(numbers(30), 3);
    assert_eq!(last.max_page, 3);
    assert_eq!(last.items, (20..30).collect::<Vec<_>>());
}

#[test]
fn test_eleven_items_fit_on_one_page() {
    // floor(11 / 10) = 1, so the single page carries all eleven.
    let page = paginate(numbers(11), 2);
    assert_eq!(page.page, 1);
    assert_eq!(page.max_page, 1);
    assert_eq!(page.items.len(), 11);
}

#[test]
fn test_properties_hold_across_sizes() {
    for n in 0..=45 {
        for requested in -1..=6 {
            let page = paginate(numbers(n), requested);

            assert_eq!(page.items.is_empty(), n == 0);
            assert!(page.page >= 1 && page.page <= page.max_page.max(1));
            assert!(page.items.len() < 2 * PAGE_SIZE);

            let again = paginate(numbers(n), requested);
            assert_eq!(page, again);
        }
    }
}

#[test]
fn test_every_item_is_reachable() {
    let n = 37;
    let max = paginate(numbers(n), 1).max_page;
    let served: Vec<usize> = (1..=max)
        .flat_map(|p| paginate(numbers(n), p).items)
        .collect();
    assert_eq!(served, numbers(n));
}

#[test]
fn test_page_token_parsing() {
    assert_eq!(parse_page_token(Some("3")), 3);
    assert_eq!(parse_page_token(Some(" 2 ")), 2);
    assert_eq!(parse_page_token(Some("abc")), 1);
    assert_eq!(parse_page_token(Some("")), 1);
    assert_eq!(parse_page_token(None), 1);
}
