//! Tests for client-initiated move, resize, maximize and fullscreen

use rootshell::{ClientRequest, DesktopEvent, OutputId, ProtocolError, ResizeEdges, SeatId, ShellError};
use test_harness::fixtures::{mapped_toplevel, toplevel_with_popups, BUSY_SEAT, IDLE_SEAT};

/// An idle seat may start an interactive move
#[test]
fn move_from_idle_seat_starts_grab() {
    let (mut ts, surface, view) = mapped_toplevel();

    ts.request(ClientRequest::Move { surface, seat: IDLE_SEAT }).unwrap();

    assert_eq!(ts.events(), &[DesktopEvent::BeginMove { seat: IDLE_SEAT, view }]);
}

/// A seat already in a grab is ignored
#[test]
fn move_from_busy_seat_is_ignored() {
    let (mut ts, surface, _view) = mapped_toplevel();

    ts.request(ClientRequest::Move { surface, seat: BUSY_SEAT }).unwrap();
    ts.request(ClientRequest::Resize { surface, seat: BUSY_SEAT, edges: ResizeEdges::LEFT })
        .unwrap();

    assert!(ts.events().is_empty());
}

/// Unknown seats are ignored too
#[test]
fn request_from_unknown_seat_is_ignored() {
    let (mut ts, surface, _view) = mapped_toplevel();

    ts.request(ClientRequest::Move { surface, seat: SeatId(77) }).unwrap();

    assert!(ts.events().is_empty());
}

/// Resize forwards the dragged edges
#[test]
fn resize_forwards_edges() {
    let (mut ts, surface, view) = mapped_toplevel();
    let edges = ResizeEdges::TOP | ResizeEdges::LEFT;

    ts.request(ClientRequest::Resize { surface, seat: IDLE_SEAT, edges }).unwrap();

    assert_eq!(ts.events(), &[DesktopEvent::BeginResize { seat: IDLE_SEAT, view, edges }]);
}

/// Maximize and fullscreen requests go to the desktop, which decides
#[test]
fn state_requests_are_forwarded() {
    let (mut ts, surface, view) = mapped_toplevel();

    ts.request(ClientRequest::SetMaximized { surface, maximized: true }).unwrap();
    ts.request(ClientRequest::SetFullscreen { surface, fullscreen: true, output: Some(OutputId(2)) })
        .unwrap();

    assert_eq!(
        ts.events(),
        &[
            DesktopEvent::MaximizeRequested { view, maximized: true },
            DesktopEvent::FullscreenRequested { view, fullscreen: true, output: Some(OutputId(2)) },
        ]
    );
    // The desktop has not answered, so nothing was configured
    assert!(ts.messages().is_empty());
}

/// Popups cannot ask to be moved
#[test]
fn move_on_popup_is_rejected() {
    let (mut ts, _surface, _view, popups) = toplevel_with_popups(1);

    let result = ts.request(ClientRequest::Move { surface: popups[0], seat: IDLE_SEAT });

    assert!(matches!(
        result,
        Err(ShellError::Protocol(ProtocolError::NotToplevel(_)))
    ));
    assert!(ts.events().is_empty());
}
