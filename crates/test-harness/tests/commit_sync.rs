//! Tests for commit handling of toplevel views

use rootshell::{ClientRequest, DesktopEvent, ProtocolError, ShellError, SurfaceCommit};
use smithay::utils::Size;
use test_harness::fixtures::{mapped_toplevel, shell_with_seats, TEST_HEIGHT, TEST_WIDTH};

/// Every commit of a mapped view damages it and reports its size, even when
/// nothing changed
#[test]
fn every_commit_damages_and_reports_size() {
    let (mut ts, surface, view) = mapped_toplevel();

    ts.commit(surface, SurfaceCommit::default()).unwrap();
    ts.commit(surface, SurfaceCommit::default()).unwrap();

    let resized = DesktopEvent::Resized { view, width: TEST_WIDTH, height: TEST_HEIGHT };
    assert_eq!(
        ts.events(),
        &[DesktopEvent::Damaged { view }, resized.clone(), DesktopEvent::Damaged { view }, resized]
    );
}

/// Commits before the first buffer do not reach the desktop
#[test]
fn unmapped_commits_are_ignored() {
    let mut ts = shell_with_seats();
    let surface = ts.create_toplevel().unwrap();
    let view = ts.shell().view_for_surface(surface).unwrap();
    ts.take_events();

    ts.commit(surface, SurfaceCommit::default()).unwrap();

    assert!(ts.events().is_empty());
    assert!(!ts.view(view).unwrap().is_mapped());
}

/// The declared window geometry wins over the buffer size
#[test]
fn size_follows_window_geometry() {
    let (mut ts, surface, view) = mapped_toplevel();

    ts.commit(surface, SurfaceCommit::with_buffer(840, 640).geometry(20, 20, 800, 600))
        .unwrap();

    assert_eq!(ts.view(view).unwrap().size(), Size::from((800, 600)));
}

/// Mapping notifies the desktop once with the committed size
#[test]
fn map_reports_size_once() {
    let mut ts = shell_with_seats();
    let (surface, view) = ts.map_toplevel(320, 240).unwrap();
    ts.commit_buffer(surface, 320, 240).unwrap();

    let maps: Vec<_> = ts
        .events()
        .iter()
        .filter(|e| matches!(e, DesktopEvent::Mapped { .. }))
        .collect();
    assert_eq!(maps, vec![&DesktopEvent::Mapped { view, width: 320, height: 240 }]);
}

/// Removing the buffer unmaps; the client starts over with an initial commit
#[test]
fn buffer_removal_unmaps_and_resets() {
    let (mut ts, surface, view) = mapped_toplevel();

    ts.commit(
        surface,
        SurfaceCommit {
            buffer: rootshell::protocol::BufferChange::Remove,
            geometry: None,
        },
    )
    .unwrap();
    assert_eq!(ts.take_events(), vec![DesktopEvent::Unmapped { view }]);
    assert!(!ts.view(view).unwrap().is_mapped());

    // Attaching straight away is a protocol error
    let result = ts.request(ClientRequest::Commit {
        surface,
        commit: SurfaceCommit::with_buffer(10, 10),
    });
    assert!(matches!(
        result,
        Err(ShellError::Protocol(ProtocolError::UnconfiguredBuffer(_)))
    ));

    ts.map_surface(surface, 400, 300).unwrap();
    assert!(ts.view(view).unwrap().is_mapped());
    assert!(ts.events().contains(&DesktopEvent::Mapped { view, width: 400, height: 300 }));
}

/// Destroying a mapped surface unmaps before destroying
#[test]
fn destroy_unmaps_first() {
    let (mut ts, surface, view) = mapped_toplevel();

    ts.destroy(surface).unwrap();

    assert_eq!(
        ts.events(),
        &[DesktopEvent::Unmapped { view }, DesktopEvent::Destroyed { view }]
    );
    assert!(ts.shell().surface(surface).is_none());
}

/// Acks must name a configure that is still in flight
#[test]
fn stale_ack_is_rejected() {
    let (mut ts, surface, _view) = mapped_toplevel();

    let result = ts.request(ClientRequest::AckConfigure { surface, serial: 12345 });

    assert!(matches!(
        result,
        Err(ShellError::Protocol(ProtocolError::InvalidSerial { serial: 12345, .. }))
    ));
}
