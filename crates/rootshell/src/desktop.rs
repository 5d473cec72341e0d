//! The surrounding window manager, as seen from the shell
//!
//! The shell does not own seats, damage tracking, or the scene. It reaches
//! those through the [`Desktop`] trait, and generic window-management code
//! reaches back into the shell only through [`crate::view::ViewAdapter`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smithay::utils::{Logical, Point, Size};

/// Generic window handle, allocated by the desktop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(pub u32);

/// Input seat identifier as used on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(pub u32);

/// Output identifier as used on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputId(pub u32);

/// What a seat's pointer is currently doing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorMode {
    /// Idle; events pass through to clients
    #[default]
    Passthrough,
    Move,
    Resize,
    Rotate,
}

bitflags! {
    /// Edges being dragged in an interactive resize
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ResizeEdges: u32 {
        const TOP = 1;
        const BOTTOM = 2;
        const LEFT = 4;
        const RIGHT = 8;
    }
}

/// Collaborators the shell calls into.
///
/// Only view creation and seat lookup are required; the notification hooks
/// default to doing nothing.
pub trait Desktop {
    /// Allocate a generic window handle. `None` under resource exhaustion.
    fn create_view(&mut self) -> Option<ViewId>;

    /// Cursor mode of a seat, `None` if the seat is unknown
    fn seat_mode(&self, seat: SeatId) -> Option<CursorMode>;

    fn begin_move(&mut self, _seat: SeatId, _view: ViewId) {}

    fn begin_resize(&mut self, _seat: SeatId, _view: ViewId, _edges: ResizeEdges) {}

    fn mark_view_damaged(&mut self, _view: ViewId) {}

    fn mark_view_fully_damaged(&mut self, _view: ViewId) {}

    fn view_mapped(&mut self, _view: ViewId, _size: Size<i32, Logical>) {}

    fn view_unmapped(&mut self, _view: ViewId) {}

    fn view_destroyed(&mut self, _view: ViewId) {}

    fn view_moved(&mut self, _view: ViewId, _position: Point<i32, Logical>) {}

    fn view_resized(&mut self, _view: ViewId, _size: Size<i32, Logical>) {}

    /// The client asked to be (un)maximized. The desktop decides and answers
    /// through the view adapter.
    fn maximize_requested(&mut self, _view: ViewId, _maximized: bool) {}

    fn fullscreen_requested(&mut self, _view: ViewId, _fullscreen: bool, _output: Option<OutputId>) {}
}

/// A recorded [`Desktop`] call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DesktopEvent {
    ViewCreated { view: ViewId },
    BeginMove { seat: SeatId, view: ViewId },
    BeginResize { seat: SeatId, view: ViewId, edges: ResizeEdges },
    Damaged { view: ViewId },
    FullyDamaged { view: ViewId },
    Mapped { view: ViewId, width: i32, height: i32 },
    Unmapped { view: ViewId },
    Destroyed { view: ViewId },
    Moved { view: ViewId, x: i32, y: i32 },
    Resized { view: ViewId, width: i32, height: i32 },
    MaximizeRequested { view: ViewId, maximized: bool },
    FullscreenRequested { view: ViewId, fullscreen: bool, output: Option<OutputId> },
}

impl DesktopEvent {
    /// The view this event concerns
    pub fn view(&self) -> ViewId {
        match self {
            Self::ViewCreated { view }
            | Self::BeginMove { view, .. }
            | Self::BeginResize { view, .. }
            | Self::Damaged { view }
            | Self::FullyDamaged { view }
            | Self::Mapped { view, .. }
            | Self::Unmapped { view }
            | Self::Destroyed { view }
            | Self::Moved { view, .. }
            | Self::Resized { view, .. }
            | Self::MaximizeRequested { view, .. }
            | Self::FullscreenRequested { view, .. } => *view,
        }
    }
}
