use docforge::{
    error::SidecarError,
    page_range::{parse_range, parse_selection, PageSelection},
};

#[test]
fn reversed_range_is_normalized() {
    assert_eq!(parse_range("5-1", 10), vec![0, 1, 2, 3, 4]);
}

#[test]
fn mixed_ranges_and_singles() {
    assert_eq!(parse_range("1-3,8,11-13", 20), vec![0, 1, 2, 7, 10, 11, 12]);
    assert_eq!(parse_range(" 1 - 2 ,  4 ", 5), vec![0, 1, 3]);
}

#[test]
fn garbage_yields_nothing_and_selection_is_refused() {
    assert!(parse_range("abc", 10).is_empty());
    let err = parse_selection("abc", 10).unwrap_err();
    assert!(matches!(
        err,
        SidecarError::InvalidRange { page_count: 10, .. }
    ));
}

#[test]
fn partial_garbage_keeps_valid_segments() {
    assert_eq!(parse_range("x, 2, 3-y, ,4", 10), vec![1, 3]);
}

#[test]
fn out_of_bounds_pages_are_dropped() {
    assert_eq!(parse_range("0, 9-12, 40", 10), vec![8, 9]);
    assert!(parse_range("11-20", 10).is_empty());
}

#[test]
fn duplicates_collapse() {
    assert_eq!(parse_range("2,1-3,3,2-2", 10), vec![0, 1, 2]);
}

#[test]
fn huge_range_is_clamped_to_document() {
    assert_eq!(parse_range("1-4000000000", 3), vec![0, 1, 2]);
}

#[test]
fn zero_page_document_selects_nothing() {
    assert!(parse_range("1-5", 0).is_empty());
}

#[test]
fn open_ended_hyphen_segments_count_from_zero() {
    assert_eq!(parse_range("-3", 10), vec![0, 1, 2]);
    assert_eq!(parse_range("3-", 10), vec![0, 1, 2]);
    assert_eq!(parse_range("1-", 10), vec![0]);
    assert!(parse_range("-", 10).is_empty());
}

#[test]
fn extra_hyphen_pieces_are_ignored() {
    assert_eq!(parse_range("1-3-5", 10), vec![0, 1, 2]);
    assert_eq!(parse_range("2-4-x", 10), vec![1, 2, 3]);
    assert!(parse_range("x-3-5", 10).is_empty());
}

#[test]
fn output_is_ascending_unique_and_in_bounds() {
    let inputs = [
        "1-5, 8, 11-13",
        "13-11, 5-1, 8",
        "100, 1, 50-60, 7-7, 3",
        "2,2,2,2",
        "-, 1-, -1, 0-0",
    ];
    for n in [1u32, 7, 12, 55] {
        for text in inputs {
            let pages = parse_range(text, n);
            assert!(pages.windows(2).all(|w| w[0] < w[1]), "{text} / {n}: {pages:?}");
            assert!(pages.iter().all(|&p| p < n), "{text} / {n}: {pages:?}");
        }
    }
}

#[test]
fn selection_sorts_and_joins() {
    let sel = PageSelection::from_indices([7, 0, 1, 7]).unwrap();
    assert_eq!(sel.indices(), &[0, 1, 7]);
    assert_eq!(sel.to_arg(), "0,1,7");
    assert!(PageSelection::from_indices(Vec::new()).is_none());
}
