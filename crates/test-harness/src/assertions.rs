//! Test assertions for shell state

use rootshell::{DesktopEvent, ResizeTicket, ServerMessage, ViewId};

use crate::headless::TestShell;

/// Assert a view sits at `(x, y)`
pub fn assert_position(ts: &TestShell, view: ViewId, expected: (i32, i32)) {
    let position = ts.position(view);
    assert_eq!(
        position,
        Some(expected),
        "view {:?} should be at {:?}, got {:?}",
        view, expected, position
    );
}

/// Assert a view has no move/resize outstanding
pub fn assert_idle(ts: &TestShell, view: ViewId) {
    let ticket = ts.ticket(view);
    assert_eq!(
        ticket,
        Some(ResizeTicket::Idle),
        "view {:?} should have no outstanding move/resize, got {:?}",
        view, ticket
    );
}

/// Assert no listener is registered anywhere
pub fn assert_no_listeners(ts: &TestShell) {
    let snapshot = ts.snapshot();
    assert_eq!(
        snapshot.listener_count, 0,
        "all listeners should be released, {} still registered",
        snapshot.listener_count
    );
}

/// Assert no desktop event concerning `view` was recorded
pub fn assert_no_events_for(events: &[DesktopEvent], view: ViewId) {
    let stray: Vec<_> = events.iter().filter(|event| event.view() == view).collect();
    assert!(stray.is_empty(), "unexpected events for {:?}: {:?}", view, stray);
}

/// Assert every `PopupDone` precedes every `Close`
pub fn assert_popups_closed_first(messages: &[ServerMessage]) {
    let last_popup_done = messages
        .iter()
        .rposition(|m| matches!(m, ServerMessage::PopupDone { .. }));
    let first_close = messages
        .iter()
        .position(|m| matches!(m, ServerMessage::Close { .. }));

    if let (Some(popup), Some(close)) = (last_popup_done, first_close) {
        assert!(
            popup < close,
            "popup_done at {} should precede close at {}: {:?}",
            popup, close, messages
        );
    }
}
