//! Toplevel configure negotiation
//!
//! The compositor asks a toplevel for new geometry by sending a configure
//! with a fresh serial. The client applies it whenever it likes and says so by
//! acking that serial and committing. A move/resize is only half applied until
//! then: the size is up to the client, but the position is ours, and moving
//! the window before the client has resized makes a dragged edge jump.
//!
//! So the target position is parked in a [`PendingMoveResize`] and a
//! [`ResizeTicket`] remembers which serial will release it. There is at most
//! one ticket per view; a newer request overwrites the older one.

use smithay::utils::{Logical, Point, Size};

use crate::protocol::{ServerMessage, XdgSurface};
use crate::serial::{Serial, SerialCounter};

/// Outstanding move/resize negotiation of one view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResizeTicket {
    #[default]
    Idle,
    /// A move/resize configure is in flight
    AwaitingAck { serial: Serial },
}

impl ResizeTicket {
    pub fn serial(&self) -> Option<Serial> {
        match self {
            Self::Idle => None,
            Self::AwaitingAck { serial } => Some(*serial),
        }
    }
}

/// `position + (from - to)`, saturating at the coordinate range
fn shift(position: i32, from: u32, to: u32) -> i32 {
    let shifted = i64::from(position) + i64::from(from) - i64::from(to);
    shifted.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Target geometry of the latest move/resize request.
///
/// Only meaningful while the ticket is [`ResizeTicket::AwaitingAck`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingMoveResize {
    pub update_x: bool,
    pub update_y: bool,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PendingMoveResize {
    /// Plan a move/resize from `current` to the requested rectangle, given
    /// the size the constraints allow.
    ///
    /// An axis whose position changes is being resized from its leading edge
    /// (left or top), so the trailing edge must stay put: the target position
    /// moves by whatever the constraints took off the requested size.
    pub fn plan(
        current: Point<i32, Logical>,
        x: i32,
        y: i32,
        requested: (u32, u32),
        constrained: (u32, u32),
    ) -> Self {
        let update_x = x != current.x;
        let update_y = y != current.y;

        let x = if update_x {
            shift(x, requested.0, constrained.0)
        } else {
            x
        };
        let y = if update_y {
            shift(y, requested.1, constrained.1)
        } else {
            y
        };

        Self {
            update_x,
            update_y,
            x,
            y,
            width: constrained.0,
            height: constrained.1,
        }
    }

    /// Where the view goes once the client committed `committed`.
    ///
    /// Any difference between the size we asked for and what the client
    /// committed is taken off the leading edge again.
    pub fn position_for(&self, current: Point<i32, Logical>, committed: Size<i32, Logical>) -> Point<i32, Logical> {
        let x = if self.update_x {
            shift(self.x, self.width, committed.w.max(0) as u32)
        } else {
            current.x
        };
        let y = if self.update_y {
            shift(self.y, self.height, committed.h.max(0) as u32)
        } else {
            current.y
        };
        Point::from((x, y))
    }
}

/// Move/resize state machine of one view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveResizeNegotiation {
    pending: PendingMoveResize,
    ticket: ResizeTicket,
}

impl MoveResizeNegotiation {
    pub fn pending(&self) -> &PendingMoveResize {
        &self.pending
    }

    pub fn ticket(&self) -> ResizeTicket {
        self.ticket
    }

    /// Record a new request.
    ///
    /// `serial` is the configure that carries it, if one was sent. Returns the
    /// position to apply right away when there is nothing to wait for.
    pub fn request(&mut self, pending: PendingMoveResize, serial: Option<Serial>) -> Option<Point<i32, Logical>> {
        self.pending = pending;
        match (serial, self.ticket) {
            (Some(serial), _) => {
                self.ticket = ResizeTicket::AwaitingAck { serial };
                None
            }
            (None, ResizeTicket::Idle) => Some(Point::from((pending.x, pending.y))),
            // An earlier configure is still in flight; its ack releases this target
            (None, ResizeTicket::AwaitingAck { .. }) => None,
        }
    }

    /// Reconcile with a commit.
    ///
    /// `acked` is the configure serial the client has caught up to. Once it
    /// reaches the ticket's serial the parked position is applied. The ticket
    /// itself only clears on an exact match: a client that acked past it may
    /// still have a newer request in flight.
    pub fn reconcile(
        &mut self,
        acked: Option<Serial>,
        current: Point<i32, Logical>,
        committed: Size<i32, Logical>,
    ) -> Option<Point<i32, Logical>> {
        let ResizeTicket::AwaitingAck { serial: expected } = self.ticket else {
            return None;
        };
        let acked = acked?;
        if acked < expected {
            return None;
        }

        let position = self.pending.position_for(current, committed);
        if acked == expected {
            self.ticket = ResizeTicket::Idle;
        }
        Some(position)
    }
}

/// Result of a toplevel configure operation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfigureOutcome {
    pub serial: Option<Serial>,
    /// Position to apply immediately
    pub moved_to: Option<Point<i32, Logical>>,
}

/// Configure operations on one toplevel, borrowed out of the shell.
///
/// Constructed only for surfaces whose role is toplevel.
pub struct ToplevelConfigurer<'a> {
    pub(crate) surface: &'a mut XdgSurface,
    pub(crate) negotiation: &'a mut MoveResizeNegotiation,
    pub(crate) position: Point<i32, Logical>,
    pub(crate) serials: &'a mut SerialCounter,
    pub(crate) outbox: &'a mut Vec<ServerMessage>,
}

impl ToplevelConfigurer<'_> {
    /// Send a configure if the pending state changed
    fn send_configure(&mut self) -> Option<Serial> {
        let configure = self.surface.schedule_configure(self.serials, false)?;
        tracing::debug!(
            surface = ?self.surface.id(),
            serial = %configure.serial,
            payload = ?configure.payload,
            "sending configure"
        );
        self.outbox.push(ServerMessage::Configure {
            surface: self.surface.id(),
            configure,
        });
        Some(configure.serial)
    }

    fn constrain(&self, width: u32, height: u32) -> (u32, u32) {
        self.surface
            .toplevel()
            .map(|toplevel| toplevel.current().bounds.constrain(width, height))
            .unwrap_or((width, height))
    }

    fn update_pending(&mut self, update: impl FnOnce(&mut crate::protocol::ToplevelConfigure)) {
        if let Some(toplevel) = self.surface.toplevel_mut() {
            update(toplevel.pending_mut());
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) -> ConfigureOutcome {
        let (width, height) = self.constrain(width, height);
        self.update_pending(|pending| {
            pending.width = width;
            pending.height = height;
        });
        ConfigureOutcome {
            serial: self.send_configure(),
            moved_to: None,
        }
    }

    pub fn move_resize(&mut self, x: i32, y: i32, width: u32, height: u32) -> ConfigureOutcome {
        let constrained = self.constrain(width, height);
        let pending = PendingMoveResize::plan(self.position, x, y, (width, height), constrained);

        self.update_pending(|state| {
            state.width = constrained.0;
            state.height = constrained.1;
        });
        let serial = self.send_configure();
        let moved_to = self.negotiation.request(pending, serial);

        tracing::debug!(
            surface = ?self.surface.id(),
            ?pending,
            serial = ?serial,
            immediate = moved_to.is_some(),
            "move_resize requested"
        );

        ConfigureOutcome { serial, moved_to }
    }

    pub fn maximize(&mut self, maximized: bool) -> ConfigureOutcome {
        self.update_pending(|pending| pending.maximized = maximized);
        ConfigureOutcome {
            serial: self.send_configure(),
            moved_to: None,
        }
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) -> ConfigureOutcome {
        self.update_pending(|pending| pending.fullscreen = fullscreen);
        ConfigureOutcome {
            serial: self.send_configure(),
            moved_to: None,
        }
    }

    pub fn activate(&mut self, activated: bool) -> ConfigureOutcome {
        self.update_pending(|pending| pending.activated = activated);
        ConfigureOutcome {
            serial: self.send_configure(),
            moved_to: None,
        }
    }
}
