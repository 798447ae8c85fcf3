use super::*;

#[test]
fn starts_empty() {
    let lc = RequestLifecycle::new();
    assert!(!lc.is_active());
    assert_eq!(lc.active_chars(), None);
}

#[test]
fn start_aborts_the_predecessor() {
    let mut lc = RequestLifecycle::new();
    let first = lc.start("first");
    assert!(!first.token().is_cancelled());

    let second = lc.start("second");
    assert!(first.token().is_cancelled());
    assert!(!second.token().is_cancelled());
    assert!(lc.is_active());
}

#[test]
fn clear_releases_only_for_the_owner() {
    let mut lc = RequestLifecycle::new();
    let first = lc.start("first");
    let second = lc.start("second");

    // The superseded request must not release the successor's slot.
    assert!(!lc.clear(&first));
    assert!(lc.is_active());

    assert!(lc.clear(&second));
    assert!(!lc.is_active());

    // Settling twice is harmless.
    assert!(!lc.clear(&second));
}

#[test]
fn cancel_current_fires_the_token_but_keeps_the_slot() {
    let mut lc = RequestLifecycle::new();
    let handle = lc.start("text");

    assert!(lc.cancel_current());
    assert!(handle.token().is_cancelled());
    // The owning flow still settles and clears.
    assert!(lc.is_active());
    assert!(lc.clear(&handle));
}

#[test]
fn cancel_with_nothing_in_flight_reports_false() {
    let mut lc = RequestLifecycle::new();
    assert!(!lc.cancel_current());

    let handle = lc.start("text");
    lc.clear(&handle);
    assert!(!lc.cancel_current());
}

#[test]
fn active_chars_tracks_the_source_text() {
    let mut lc = RequestLifecycle::new();
    lc.start("Hello world");
    assert_eq!(lc.active_chars(), Some(11));
}
