//! Scripted replay of client and compositor events
//!
//! A scenario is a TOML file listing seats and a sequence of steps. Client
//! steps become [`ClientRequest`]s; compositor steps are view adapter calls
//! addressed by the view's toplevel surface.
//!
//! ```toml
//! [[seats]]
//! id = 0
//! mode = "passthrough"
//!
//! [[steps]]
//! op = "new_toplevel"
//! surface = 1
//!
//! [[steps]]
//! op = "move_resize"
//! surface = 1
//! x = 10
//! y = 0
//! width = 200
//! height = 50
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smithay::utils::{Logical, Point, Rectangle, Size};

use crate::config::Config;
use crate::desktop::{CursorMode, Desktop, DesktopEvent, OutputId, ResizeEdges, SeatId, ViewId};
use crate::error::{ProtocolError, ShellError};
use crate::popup::{PopupId, PopupState, POPUP_SIGNALS};
use crate::protocol::{BufferChange, ClientRequest, ServerMessage, SurfaceCommit, SurfaceId};
use crate::serial::Serial;
use crate::shell::Shell;
use crate::view::{ViewAdapter, TOPLEVEL_SIGNALS};

/// A seat and its cursor mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSpec {
    pub id: SeatId,
    #[serde(default)]
    pub mode: CursorMode,
}

/// One replay step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    NewToplevel {
        surface: SurfaceId,
    },
    NewPopup {
        surface: SurfaceId,
        parent: SurfaceId,
        /// x, y, width, height relative to the parent
        #[serde(default)]
        geometry: [i32; 4],
    },
    SetMinSize {
        surface: SurfaceId,
        width: u32,
        height: u32,
    },
    SetMaxSize {
        surface: SurfaceId,
        width: u32,
        height: u32,
    },
    /// Ack `serial`, or the newest in-flight configure when omitted
    Ack {
        surface: SurfaceId,
        #[serde(default)]
        serial: Option<u32>,
    },
    Commit {
        surface: SurfaceId,
        #[serde(default)]
        buffer: Option<[i32; 2]>,
        #[serde(default)]
        remove_buffer: bool,
        #[serde(default)]
        geometry: Option<[i32; 4]>,
    },
    RequestMove {
        surface: SurfaceId,
        seat: SeatId,
    },
    RequestResize {
        surface: SurfaceId,
        seat: SeatId,
        #[serde(default)]
        edges: ResizeEdges,
    },
    RequestMaximize {
        surface: SurfaceId,
        maximized: bool,
    },
    RequestFullscreen {
        surface: SurfaceId,
        fullscreen: bool,
        #[serde(default)]
        output: Option<OutputId>,
    },
    Destroy {
        surface: SurfaceId,
    },
    Activate {
        surface: SurfaceId,
        active: bool,
    },
    Resize {
        surface: SurfaceId,
        width: u32,
        height: u32,
    },
    MoveResize {
        surface: SurfaceId,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    Maximize {
        surface: SurfaceId,
        maximized: bool,
    },
    Fullscreen {
        surface: SurfaceId,
        fullscreen: bool,
    },
    Close {
        surface: SurfaceId,
    },
    DestroyView {
        surface: SurfaceId,
    },
}

/// A replay scenario
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub seats: Vec<SeatSpec>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// A desktop with this scenario's seats
    pub fn desktop(&self) -> ScriptDesktop {
        ScriptDesktop {
            seats: self.seats.iter().map(|seat| (seat.id, seat.mode)).collect(),
            ..ScriptDesktop::default()
        }
    }
}

/// Desktop used for replays and tests: scripted seats, sequential view ids,
/// and a log of everything the shell told it
#[derive(Debug, Default)]
pub struct ScriptDesktop {
    seats: HashMap<SeatId, CursorMode>,
    next_view: u32,
    /// Number of upcoming `create_view` calls to refuse
    refuse_views: usize,
    events: Vec<DesktopEvent>,
}

impl ScriptDesktop {
    pub fn set_seat_mode(&mut self, seat: SeatId, mode: CursorMode) {
        self.seats.insert(seat, mode);
    }

    /// Make the next `count` view allocations fail
    pub fn refuse_views(&mut self, count: usize) {
        self.refuse_views = count;
    }

    pub fn events(&self) -> &[DesktopEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<DesktopEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Desktop for ScriptDesktop {
    fn create_view(&mut self) -> Option<ViewId> {
        if self.refuse_views > 0 {
            self.refuse_views -= 1;
            tracing::debug!(remaining = self.refuse_views, "refusing view allocation");
            return None;
        }
        self.next_view += 1;
        let view = ViewId(self.next_view);
        self.events.push(DesktopEvent::ViewCreated { view });
        Some(view)
    }

    fn seat_mode(&self, seat: SeatId) -> Option<CursorMode> {
        self.seats.get(&seat).copied()
    }

    fn begin_move(&mut self, seat: SeatId, view: ViewId) {
        self.events.push(DesktopEvent::BeginMove { seat, view });
    }

    fn begin_resize(&mut self, seat: SeatId, view: ViewId, edges: ResizeEdges) {
        self.events.push(DesktopEvent::BeginResize { seat, view, edges });
    }

    fn mark_view_damaged(&mut self, view: ViewId) {
        self.events.push(DesktopEvent::Damaged { view });
    }

    fn mark_view_fully_damaged(&mut self, view: ViewId) {
        self.events.push(DesktopEvent::FullyDamaged { view });
    }

    fn view_mapped(&mut self, view: ViewId, size: Size<i32, Logical>) {
        self.events.push(DesktopEvent::Mapped { view, width: size.w, height: size.h });
    }

    fn view_unmapped(&mut self, view: ViewId) {
        self.events.push(DesktopEvent::Unmapped { view });
    }

    fn view_destroyed(&mut self, view: ViewId) {
        self.events.push(DesktopEvent::Destroyed { view });
    }

    fn view_moved(&mut self, view: ViewId, position: Point<i32, Logical>) {
        self.events.push(DesktopEvent::Moved { view, x: position.x, y: position.y });
    }

    fn view_resized(&mut self, view: ViewId, size: Size<i32, Logical>) {
        self.events.push(DesktopEvent::Resized { view, width: size.w, height: size.h });
    }

    fn maximize_requested(&mut self, view: ViewId, maximized: bool) {
        self.events.push(DesktopEvent::MaximizeRequested { view, maximized });
    }

    fn fullscreen_requested(&mut self, view: ViewId, fullscreen: bool, output: Option<OutputId>) {
        self.events.push(DesktopEvent::FullscreenRequested { view, fullscreen, output });
    }
}

fn rectangle([x, y, width, height]: [i32; 4]) -> Rectangle<i32, Logical> {
    Rectangle::new((x, y).into(), (width, height).into())
}

/// Apply one step to a shell
pub fn apply_step<D: Desktop>(shell: &mut Shell<D>, step: &Step) -> Result<(), ShellError> {
    let request = match *step {
        Step::NewToplevel { surface } => ClientRequest::GetToplevel { surface },
        Step::NewPopup { surface, parent, geometry } => ClientRequest::GetPopup {
            surface,
            parent,
            geometry: rectangle(geometry),
        },
        Step::SetMinSize { surface, width, height } => ClientRequest::SetMinSize { surface, width, height },
        Step::SetMaxSize { surface, width, height } => ClientRequest::SetMaxSize { surface, width, height },
        Step::Ack { surface, serial } => {
            let serial = match serial {
                Some(serial) => serial,
                None => shell
                    .surface(surface)
                    .ok_or(ProtocolError::UnknownSurface(surface))?
                    .inflight()
                    .last()
                    .map(|configure| configure.serial.get())
                    .ok_or(ProtocolError::InvalidSerial { surface, serial: 0 })?,
            };
            ClientRequest::AckConfigure { surface, serial }
        }
        Step::Commit { surface, buffer, remove_buffer, geometry } => {
            let buffer = match (buffer, remove_buffer) {
                (_, true) => BufferChange::Remove,
                (Some([width, height]), false) => BufferChange::Attach(Size::from((width, height))),
                (None, false) => BufferChange::Unchanged,
            };
            ClientRequest::Commit {
                surface,
                commit: SurfaceCommit {
                    buffer,
                    geometry: geometry.map(rectangle),
                },
            }
        }
        Step::RequestMove { surface, seat } => ClientRequest::Move { surface, seat },
        Step::RequestResize { surface, seat, edges } => ClientRequest::Resize { surface, seat, edges },
        Step::RequestMaximize { surface, maximized } => ClientRequest::SetMaximized { surface, maximized },
        Step::RequestFullscreen { surface, fullscreen, output } => {
            ClientRequest::SetFullscreen { surface, fullscreen, output }
        }
        Step::Destroy { surface } => ClientRequest::Destroy { surface },
        _ => {
            apply_compositor_step(shell, step);
            return Ok(());
        }
    };

    shell.handle_request(request)
}

fn apply_compositor_step<D: Desktop>(shell: &mut Shell<D>, step: &Step) {
    let surface = match *step {
        Step::Activate { surface, .. }
        | Step::Resize { surface, .. }
        | Step::MoveResize { surface, .. }
        | Step::Maximize { surface, .. }
        | Step::Fullscreen { surface, .. }
        | Step::Close { surface }
        | Step::DestroyView { surface } => surface,
        _ => return,
    };
    let Some(view) = shell.view_for_surface(surface) else {
        tracing::warn!(?surface, ?step, "no view for surface");
        return;
    };

    match *step {
        Step::Activate { active, .. } => shell.activate(view, active),
        Step::Resize { width, height, .. } => shell.resize(view, width, height),
        Step::MoveResize { x, y, width, height, .. } => shell.move_resize(view, x, y, width, height),
        Step::Maximize { maximized, .. } => shell.maximize(view, maximized),
        Step::Fullscreen { fullscreen, .. } => shell.set_fullscreen(view, fullscreen),
        Step::Close { .. } => shell.close(view),
        Step::DestroyView { .. } => shell.destroy(view),
        _ => {}
    }
}

/// A step that failed
#[derive(Debug, Clone, Serialize)]
pub struct StepError {
    pub step: usize,
    pub error: String,
}

/// Final state of one popup
#[derive(Debug, Clone, Serialize)]
pub struct PopupReport {
    pub popup: PopupId,
    pub surface: SurfaceId,
    pub state: PopupState,
}

/// Final state of one view
#[derive(Debug, Clone, Serialize)]
pub struct ViewReport {
    pub view: ViewId,
    pub surface: SurfaceId,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub mapped: bool,
    pub awaiting_serial: Option<Serial>,
    pub popups: Vec<PopupReport>,
}

/// Outcome of a replay
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub views: Vec<ViewReport>,
    pub messages: Vec<ServerMessage>,
    pub desktop: Vec<DesktopEvent>,
    pub errors: Vec<StepError>,
    pub listeners: usize,
}

impl Report {
    pub fn collect(shell: &Shell<ScriptDesktop>, errors: Vec<StepError>) -> Self {
        let views = shell
            .views()
            .into_iter()
            .map(|view| ViewReport {
                view: view.id(),
                surface: view.surface(),
                x: view.position().x,
                y: view.position().y,
                width: view.size().w,
                height: view.size().h,
                mapped: view.is_mapped(),
                awaiting_serial: view.ticket().serial(),
                popups: view
                    .popups()
                    .iter()
                    .filter_map(|id| shell.popup(*id))
                    .map(|popup| PopupReport {
                        popup: popup.id(),
                        surface: popup.surface(),
                        state: popup.state(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            views,
            messages: shell.outbox().to_vec(),
            desktop: shell.desktop().events().to_vec(),
            errors,
            listeners: shell.listener_count(),
        }
    }

    /// Listener registrations the live views and popups should hold
    pub fn expected_listeners(&self) -> usize {
        let popups: usize = self.views.iter().map(|view| view.popups.len()).sum();
        self.views.len() * TOPLEVEL_SIGNALS.len() + popups * POPUP_SIGNALS.len()
    }
}

/// Replay a whole scenario synchronously
pub fn replay(scenario: &Scenario, config: Config) -> Report {
    let mut shell = Shell::new(config, scenario.desktop());
    let mut errors = Vec::new();

    for (index, step) in scenario.steps.iter().enumerate() {
        if let Err(e) = apply_step(&mut shell, step) {
            tracing::warn!(step = index, error = %e, "step failed");
            errors.push(StepError { step: index, error: e.to_string() });
        }
    }

    Report::collect(&shell, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVE_RESIZE: &str = r#"
        [[seats]]
        id = 0

        [[steps]]
        op = "new_toplevel"
        surface = 1

        [[steps]]
        op = "set_min_size"
        surface = 1
        width = 300
        height = 0

        [[steps]]
        op = "commit"
        surface = 1

        [[steps]]
        op = "ack"
        surface = 1

        [[steps]]
        op = "commit"
        surface = 1
        buffer = [300, 50]

        [[steps]]
        op = "move_resize"
        surface = 1
        x = 10
        y = 0
        width = 200
        height = 50

        [[steps]]
        op = "ack"
        surface = 1

        [[steps]]
        op = "commit"
        surface = 1
    "#;

    #[test]
    fn parse_scenario() {
        let scenario = Scenario::parse(MOVE_RESIZE).unwrap();
        assert_eq!(scenario.seats, vec![SeatSpec { id: SeatId(0), mode: CursorMode::Passthrough }]);
        assert_eq!(scenario.steps.len(), 8);
        assert_eq!(scenario.steps[0], Step::NewToplevel { surface: SurfaceId(1) });
    }

    #[test]
    fn replay_applies_constrained_move() {
        let scenario = Scenario::parse(MOVE_RESIZE).unwrap();
        let report = replay(&scenario, Config::default());

        assert!(report.errors.is_empty(), "{:?}", report.errors);
        let view = &report.views[0];
        assert_eq!((view.x, view.y), (-90, 0));
        assert_eq!((view.width, view.height), (300, 50));
        assert_eq!(view.awaiting_serial, None);
    }

    #[test]
    fn failing_steps_are_reported_not_fatal() {
        let scenario = Scenario {
            seats: Vec::new(),
            steps: vec![
                Step::Ack { surface: SurfaceId(9), serial: None },
                Step::NewToplevel { surface: SurfaceId(1) },
            ],
        };
        let report = replay(&scenario, Config::default());

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].step, 0);
        assert_eq!(report.views.len(), 1);
    }

    #[test]
    fn unknown_op_is_a_parse_error() {
        let result = Scenario::parse("[[steps]]\nop = \"teleport\"\nsurface = 1\n");
        assert!(result.is_err());
    }

    fn commit(surface: u32, buffer: Option<[i32; 2]>) -> Step {
        Step::Commit { surface: SurfaceId(surface), buffer, remove_buffer: false, geometry: None }
    }

    #[test]
    fn report_lists_popup_states() {
        let scenario = Scenario {
            seats: Vec::new(),
            steps: vec![
                Step::NewToplevel { surface: SurfaceId(1) },
                commit(1, None),
                Step::Ack { surface: SurfaceId(1), serial: None },
                commit(1, Some([200, 100])),
                Step::NewPopup { surface: SurfaceId(2), parent: SurfaceId(1), geometry: [0, 0, 40, 40] },
                commit(2, None),
                Step::Ack { surface: SurfaceId(2), serial: None },
                commit(2, Some([40, 40])),
                Step::NewPopup { surface: SurfaceId(3), parent: SurfaceId(2), geometry: [5, 5, 20, 20] },
            ],
        };
        let report = replay(&scenario, Config::default());

        assert!(report.errors.is_empty(), "{:?}", report.errors);
        let states: Vec<_> = report.views[0].popups.iter().map(|p| (p.surface, p.state)).collect();
        assert_eq!(
            states,
            vec![(SurfaceId(2), PopupState::Mapped), (SurfaceId(3), PopupState::Created)]
        );
        assert_eq!(report.listeners, report.expected_listeners());
        assert_eq!(report.listeners, 9 + 2 * 5);
    }

    #[test]
    fn destroyed_view_takes_its_listeners() {
        let scenario = Scenario {
            seats: Vec::new(),
            steps: vec![
                Step::NewToplevel { surface: SurfaceId(1) },
                Step::NewToplevel { surface: SurfaceId(2) },
                Step::NewPopup { surface: SurfaceId(3), parent: SurfaceId(1), geometry: [0, 0, 10, 10] },
                Step::Destroy { surface: SurfaceId(1) },
            ],
        };
        let report = replay(&scenario, Config::default());

        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert_eq!(report.views.len(), 1);
        assert_eq!(report.listeners, report.expected_listeners());
        assert_eq!(report.listeners, 9);
    }

    #[test]
    fn refused_views_are_not_counted() {
        let mut desktop = ScriptDesktop::default();
        desktop.refuse_views(1);
        let mut shell = Shell::new(Config::default(), desktop);
        apply_step(&mut shell, &Step::NewToplevel { surface: SurfaceId(1) }).unwrap();
        apply_step(&mut shell, &Step::NewToplevel { surface: SurfaceId(2) }).unwrap();

        let report = Report::collect(&shell, Vec::new());
        assert_eq!(report.views.len(), 1);
        assert_eq!(report.views[0].surface, SurfaceId(2));
        assert_eq!(report.listeners, report.expected_listeners());
    }
}
