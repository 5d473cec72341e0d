//! Test fixtures for common test scenarios

use rootshell::{Config, CursorMode, SeatId, SurfaceId, ViewId};

use crate::headless::TestShell;

/// Default window size used by fixtures
pub const TEST_WIDTH: i32 = 800;
pub const TEST_HEIGHT: i32 = 600;

/// Seat that is idle in every fixture
pub const IDLE_SEAT: SeatId = SeatId(0);

/// Seat that is busy dragging in every fixture
pub const BUSY_SEAT: SeatId = SeatId(1);

/// A shell with one idle and one busy seat, pings disabled
pub fn shell_with_seats() -> TestShell {
    let mut shell = TestShell::with_config(Config {
        ping_on_create: false,
        ..Config::default()
    });
    shell.desktop_mut().set_seat_mode(IDLE_SEAT, CursorMode::Passthrough);
    shell.desktop_mut().set_seat_mode(BUSY_SEAT, CursorMode::Move);
    shell
}

/// A shell with a single mapped toplevel
///
/// Events and messages from mapping are cleared.
pub fn mapped_toplevel() -> (TestShell, SurfaceId, ViewId) {
    let mut shell = shell_with_seats();
    let (surface, view) = shell
        .map_toplevel(TEST_WIDTH, TEST_HEIGHT)
        .expect("mapping a fresh toplevel");
    shell.take_events();
    shell.take_messages();
    (shell, surface, view)
}

/// A mapped toplevel whose client declared a minimum size
///
/// The constraint is latched by a commit before returning.
pub fn constrained_toplevel(min_width: u32, min_height: u32) -> (TestShell, SurfaceId, ViewId) {
    let (mut shell, surface, view) = mapped_toplevel();
    shell.set_min_size(surface, min_width, min_height).expect("set_min_size");
    shell
        .commit(surface, Default::default())
        .expect("latching min size");
    shell.take_events();
    (shell, surface, view)
}

/// A mapped toplevel with `count` mapped popups opened directly on it
pub fn toplevel_with_popups(count: usize) -> (TestShell, SurfaceId, ViewId, Vec<SurfaceId>) {
    let (mut shell, surface, view) = mapped_toplevel();
    let popups = (0..count)
        .map(|i| {
            let popup = shell
                .create_popup(surface, (10 * i as i32, 10, 100, 80))
                .expect("creating popup");
            shell.map_surface(popup, 100, 80).expect("mapping popup");
            popup
        })
        .collect();
    shell.take_events();
    shell.take_messages();
    (shell, surface, view, popups)
}
