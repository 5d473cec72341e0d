//! Client-side protocol state of shell surfaces
//!
//! Models the configure/ack/commit exchange of one client connection: which
//! role each surface has, which configures are in flight, and what the client
//! has committed. The shell reacts to the effects reported here; it never
//! inspects wire bytes.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use smithay::utils::{Logical, Rectangle, Size};

use crate::constraints::SizeBounds;
use crate::desktop::{OutputId, SeatId, ResizeEdges};
use crate::error::ProtocolError;
use crate::serial::{Serial, SerialCounter};

/// Client surface identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(pub u32);

/// Toplevel state the compositor proposes in a configure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ToplevelConfigure {
    pub width: u32,
    pub height: u32,
    pub maximized: bool,
    pub fullscreen: bool,
    pub activated: bool,
}

/// Committed toplevel state: the acknowledged configure plus declared bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToplevelState {
    pub configure: ToplevelConfigure,
    pub bounds: SizeBounds,
}

/// Requests the client made that have not been latched or acted on yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientPending {
    pub min_size: Option<(u32, u32)>,
    pub max_size: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Default)]
pub struct ToplevelRole {
    current: ToplevelState,
    /// What the compositor wants to configure next
    pending: ToplevelConfigure,
    client_pending: ClientPending,
}

impl ToplevelRole {
    pub fn current(&self) -> &ToplevelState {
        &self.current
    }

    pub fn pending_mut(&mut self) -> &mut ToplevelConfigure {
        &mut self.pending
    }
}

#[derive(Debug, Clone)]
pub struct PopupRole {
    parent: SurfaceId,
    /// Position relative to the parent, as computed from the positioner
    geometry: Rectangle<i32, Logical>,
}

impl PopupRole {
    pub fn parent(&self) -> SurfaceId {
        self.parent
    }

    pub fn geometry(&self) -> Rectangle<i32, Logical> {
        self.geometry
    }
}

/// Surface role. Assigned once, never changed.
#[derive(Debug, Clone, Default)]
pub enum SurfaceRole {
    #[default]
    Unset,
    Toplevel(ToplevelRole),
    Popup(PopupRole),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ConfigurePayload {
    Toplevel(ToplevelConfigure),
    Popup { x: i32, y: i32, width: i32, height: i32 },
}

/// A configure event as sent to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Configure {
    pub serial: Serial,
    pub payload: ConfigurePayload,
}

/// Messages the compositor sent, in send order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "message", rename_all = "snake_case")]
pub enum ServerMessage {
    Configure { surface: SurfaceId, configure: Configure },
    Close { surface: SurfaceId },
    PopupDone { surface: SurfaceId },
    Ping { surface: SurfaceId, serial: Serial },
}

impl ServerMessage {
    pub fn surface(&self) -> SurfaceId {
        match self {
            Self::Configure { surface, .. }
            | Self::Close { surface }
            | Self::PopupDone { surface }
            | Self::Ping { surface, .. } => *surface,
        }
    }
}

/// Buffer attachment carried by a commit
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum BufferChange {
    #[default]
    Unchanged,
    Attach(Size<i32, Logical>),
    Remove,
}

/// Double-buffered surface state a client commits
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurfaceCommit {
    pub buffer: BufferChange,
    /// Window geometry declared with `set_window_geometry`
    pub geometry: Option<Rectangle<i32, Logical>>,
}

impl SurfaceCommit {
    pub fn with_buffer(width: i32, height: i32) -> Self {
        Self {
            buffer: BufferChange::Attach(Size::from((width, height))),
            geometry: None,
        }
    }

    pub fn geometry(mut self, x: i32, y: i32, width: i32, height: i32) -> Self {
        self.geometry = Some(Rectangle::new((x, y).into(), (width, height).into()));
        self
    }
}

/// What a commit changed, for the shell to react to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitEffects {
    pub mapped: bool,
    pub unmapped: bool,
    pub needs_initial_configure: bool,
}

/// Requests a client sends
#[derive(Debug, Clone, PartialEq)]
pub enum ClientRequest {
    GetToplevel { surface: SurfaceId },
    GetPopup { surface: SurfaceId, parent: SurfaceId, geometry: Rectangle<i32, Logical> },
    SetMinSize { surface: SurfaceId, width: u32, height: u32 },
    SetMaxSize { surface: SurfaceId, width: u32, height: u32 },
    SetMaximized { surface: SurfaceId, maximized: bool },
    SetFullscreen { surface: SurfaceId, fullscreen: bool, output: Option<OutputId> },
    Move { surface: SurfaceId, seat: SeatId },
    Resize { surface: SurfaceId, seat: SeatId, edges: ResizeEdges },
    AckConfigure { surface: SurfaceId, serial: u32 },
    Commit { surface: SurfaceId, commit: SurfaceCommit },
    Destroy { surface: SurfaceId },
}

/// Protocol state of one shell surface
#[derive(Debug)]
pub struct XdgSurface {
    id: SurfaceId,
    role: SurfaceRole,
    configured: bool,
    mapped: bool,
    geometry: Option<Rectangle<i32, Logical>>,
    buffer_size: Option<Size<i32, Logical>>,
    inflight: VecDeque<Configure>,
    acked: Option<Configure>,
    configure_serial: Option<Serial>,
}

impl XdgSurface {
    pub fn new(id: SurfaceId) -> Self {
        Self {
            id,
            role: SurfaceRole::Unset,
            configured: false,
            mapped: false,
            geometry: None,
            buffer_size: None,
            inflight: VecDeque::new(),
            acked: None,
            configure_serial: None,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn role(&self) -> &SurfaceRole {
        &self.role
    }

    pub fn assign_role(&mut self, role: SurfaceRole) -> Result<(), ProtocolError> {
        if !matches!(self.role, SurfaceRole::Unset) {
            return Err(ProtocolError::RoleAlreadyAssigned(self.id));
        }
        self.role = role;
        Ok(())
    }

    pub fn assign_toplevel(&mut self) -> Result<(), ProtocolError> {
        self.assign_role(SurfaceRole::Toplevel(ToplevelRole::default()))
    }

    pub fn assign_popup(
        &mut self,
        parent: SurfaceId,
        geometry: Rectangle<i32, Logical>,
    ) -> Result<(), ProtocolError> {
        self.assign_role(SurfaceRole::Popup(PopupRole { parent, geometry }))
    }

    pub fn toplevel(&self) -> Option<&ToplevelRole> {
        match &self.role {
            SurfaceRole::Toplevel(toplevel) => Some(toplevel),
            _ => None,
        }
    }

    pub fn toplevel_mut(&mut self) -> Option<&mut ToplevelRole> {
        match &mut self.role {
            SurfaceRole::Toplevel(toplevel) => Some(toplevel),
            _ => None,
        }
    }

    pub fn popup(&self) -> Option<&PopupRole> {
        match &self.role {
            SurfaceRole::Popup(popup) => Some(popup),
            _ => None,
        }
    }

    pub fn is_toplevel(&self) -> bool {
        matches!(self.role, SurfaceRole::Toplevel(_))
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn geometry(&self) -> Option<Rectangle<i32, Logical>> {
        self.geometry
    }

    pub fn buffer_size(&self) -> Option<Size<i32, Logical>> {
        self.buffer_size
    }

    /// Serial of the configure the client's last commit caught up to
    pub fn configure_serial(&self) -> Option<Serial> {
        self.configure_serial
    }

    /// Configures sent but not yet acknowledged, oldest first
    pub fn inflight(&self) -> impl Iterator<Item = &Configure> {
        self.inflight.iter()
    }

    /// Record a client `set_min_size` (latched on commit)
    pub fn set_min_size(&mut self, width: u32, height: u32) -> Result<(), ProtocolError> {
        let id = self.id;
        let toplevel = self.toplevel_mut().ok_or(ProtocolError::NotToplevel(id))?;
        toplevel.client_pending.min_size = Some((width, height));
        Ok(())
    }

    /// Record a client `set_max_size` (latched on commit)
    pub fn set_max_size(&mut self, width: u32, height: u32) -> Result<(), ProtocolError> {
        let id = self.id;
        let toplevel = self.toplevel_mut().ok_or(ProtocolError::NotToplevel(id))?;
        toplevel.client_pending.max_size = Some((width, height));
        Ok(())
    }

    /// Toplevel state of the newest configure, sent or committed
    fn latest_toplevel_configure(&self) -> Option<ToplevelConfigure> {
        let newest_sent = self.inflight.back().and_then(|configure| match configure.payload {
            ConfigurePayload::Toplevel(state) => Some(state),
            ConfigurePayload::Popup { .. } => None,
        });
        newest_sent.or_else(|| self.toplevel().map(|toplevel| toplevel.current.configure))
    }

    /// Send a configure if the compositor-side state changed.
    ///
    /// Returns the configure to put on the wire, or `None` when the pending
    /// state matches the newest configured state. `force` sends regardless
    /// (initial configure).
    pub fn schedule_configure(&mut self, serials: &mut SerialCounter, force: bool) -> Option<Configure> {
        let payload = match &self.role {
            SurfaceRole::Unset => return None,
            SurfaceRole::Toplevel(toplevel) => {
                let pending = toplevel.pending;
                if !force && self.latest_toplevel_configure() == Some(pending) {
                    return None;
                }
                ConfigurePayload::Toplevel(pending)
            }
            SurfaceRole::Popup(popup) => {
                if !force {
                    return None;
                }
                ConfigurePayload::Popup {
                    x: popup.geometry.loc.x,
                    y: popup.geometry.loc.y,
                    width: popup.geometry.size.w,
                    height: popup.geometry.size.h,
                }
            }
        };

        let configure = Configure {
            serial: serials.next_serial(),
            payload,
        };
        self.inflight.push_back(configure);
        Some(configure)
    }

    /// Client acknowledged a configure. Older in-flight configures are
    /// superseded by it.
    pub fn ack_configure(&mut self, serial: u32) -> Result<(), ProtocolError> {
        let invalid = ProtocolError::InvalidSerial { surface: self.id, serial };
        let serial = Serial::from_raw(serial).ok_or(invalid.clone())?;
        let position = self
            .inflight
            .iter()
            .position(|configure| configure.serial == serial)
            .ok_or(invalid)?;

        let acked = self.inflight.drain(..=position).last();
        self.acked = acked;
        Ok(())
    }

    /// Apply a client commit
    pub fn commit(&mut self, commit: SurfaceCommit) -> Result<CommitEffects, ProtocolError> {
        if matches!(self.role, SurfaceRole::Unset) {
            return Err(ProtocolError::NoRole(self.id));
        }
        if matches!(commit.buffer, BufferChange::Attach(_)) && !self.configured && self.acked.is_none() {
            return Err(ProtocolError::UnconfiguredBuffer(self.id));
        }

        let mut effects = CommitEffects::default();

        if let Some(configure) = self.acked.take() {
            self.configure_serial = Some(configure.serial);
            self.configured = true;
            if let (ConfigurePayload::Toplevel(state), Some(toplevel)) =
                (configure.payload, self.toplevel_mut())
            {
                toplevel.current.configure = state;
            }
        }

        if let Some(toplevel) = self.toplevel_mut() {
            let pending = toplevel.client_pending;
            if let Some((width, height)) = pending.min_size {
                toplevel.current.bounds.min_width = width;
                toplevel.current.bounds.min_height = height;
            }
            if let Some((width, height)) = pending.max_size {
                toplevel.current.bounds.max_width = width;
                toplevel.current.bounds.max_height = height;
            }
            toplevel.client_pending.min_size = None;
            toplevel.client_pending.max_size = None;
        }

        if commit.geometry.is_some() {
            self.geometry = commit.geometry;
        }

        match commit.buffer {
            BufferChange::Unchanged => {}
            BufferChange::Attach(size) => self.buffer_size = Some(size),
            BufferChange::Remove => self.buffer_size = None,
        }

        if self.mapped && self.buffer_size.is_none() {
            // Unmapping resets the surface; the client starts over with an
            // initial commit
            self.mapped = false;
            self.configured = false;
            self.geometry = None;
            self.inflight.clear();
            effects.unmapped = true;
        } else if !self.mapped && self.configured && self.buffer_size.is_some() {
            self.mapped = true;
            effects.mapped = true;
        } else if !self.configured && self.inflight.is_empty() && self.buffer_size.is_none() {
            effects.needs_initial_configure = true;
        }

        Ok(effects)
    }

    /// Drop mapped state ahead of destruction. Returns whether it was mapped.
    pub fn force_unmap(&mut self) -> bool {
        std::mem::replace(&mut self.mapped, false)
    }

    /// The close message for this surface's role
    pub fn close_message(&self) -> Option<ServerMessage> {
        match self.role {
            SurfaceRole::Unset => None,
            SurfaceRole::Toplevel(_) => Some(ServerMessage::Close { surface: self.id }),
            SurfaceRole::Popup(_) => Some(ServerMessage::PopupDone { surface: self.id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured_toplevel(serials: &mut SerialCounter) -> XdgSurface {
        let mut surface = XdgSurface::new(SurfaceId(1));
        surface.assign_toplevel().unwrap();
        let effects = surface.commit(SurfaceCommit::default()).unwrap();
        assert!(effects.needs_initial_configure);
        let configure = surface.schedule_configure(serials, true).unwrap();
        surface.ack_configure(configure.serial.get()).unwrap();
        surface
    }

    #[test]
    fn role_is_assigned_once() {
        let mut surface = XdgSurface::new(SurfaceId(1));
        surface.assign_toplevel().unwrap();
        assert_eq!(
            surface.assign_popup(SurfaceId(2), Rectangle::new((0, 0).into(), (10, 10).into())),
            Err(ProtocolError::RoleAlreadyAssigned(SurfaceId(1)))
        );
        assert!(surface.is_toplevel());
    }

    #[test]
    fn commit_without_role_is_rejected() {
        let mut surface = XdgSurface::new(SurfaceId(1));
        assert_eq!(
            surface.commit(SurfaceCommit::default()),
            Err(ProtocolError::NoRole(SurfaceId(1)))
        );
    }

    #[test]
    fn buffer_before_configure_is_rejected() {
        let mut surface = XdgSurface::new(SurfaceId(1));
        surface.assign_toplevel().unwrap();
        assert_eq!(
            surface.commit(SurfaceCommit::with_buffer(100, 100)),
            Err(ProtocolError::UnconfiguredBuffer(SurfaceId(1)))
        );
    }

    #[test]
    fn unchanged_state_yields_no_configure() {
        let mut serials = SerialCounter::new();
        let mut surface = configured_toplevel(&mut serials);
        surface.commit(SurfaceCommit::with_buffer(640, 480)).unwrap();

        assert!(surface.schedule_configure(&mut serials, false).is_none());

        surface.toplevel_mut().unwrap().pending_mut().width = 800;
        assert!(surface.schedule_configure(&mut serials, false).is_some());
        // Same pending state again: already in flight
        assert!(surface.schedule_configure(&mut serials, false).is_none());
    }

    #[test]
    fn ack_supersedes_older_configures() {
        let mut serials = SerialCounter::new();
        let mut surface = configured_toplevel(&mut serials);
        surface.commit(SurfaceCommit::with_buffer(640, 480)).unwrap();

        surface.toplevel_mut().unwrap().pending_mut().width = 800;
        let first = surface.schedule_configure(&mut serials, false).unwrap();
        surface.toplevel_mut().unwrap().pending_mut().width = 900;
        let second = surface.schedule_configure(&mut serials, false).unwrap();

        surface.ack_configure(second.serial.get()).unwrap();
        assert_eq!(surface.inflight().count(), 0);
        assert_eq!(
            surface.ack_configure(first.serial.get()),
            Err(ProtocolError::InvalidSerial { surface: SurfaceId(1), serial: first.serial.get() })
        );

        surface.commit(SurfaceCommit::default()).unwrap();
        assert_eq!(surface.configure_serial(), Some(second.serial));
        assert_eq!(surface.toplevel().unwrap().current().configure.width, 900);
    }

    #[test]
    fn map_and_unmap_follow_buffer() {
        let mut serials = SerialCounter::new();
        let mut surface = configured_toplevel(&mut serials);

        let effects = surface.commit(SurfaceCommit::with_buffer(300, 200)).unwrap();
        assert!(effects.mapped);
        assert!(surface.is_mapped());

        let effects = surface
            .commit(SurfaceCommit { buffer: BufferChange::Remove, geometry: None })
            .unwrap();
        assert!(effects.unmapped);
        assert!(!surface.is_mapped());
        assert!(!surface.is_configured());
    }

    #[test]
    fn size_bounds_latch_on_commit() {
        let mut serials = SerialCounter::new();
        let mut surface = configured_toplevel(&mut serials);
        surface.set_min_size(100, 50).unwrap();
        surface.set_max_size(800, 600).unwrap();
        assert_eq!(surface.toplevel().unwrap().current().bounds, SizeBounds::default());

        surface.commit(SurfaceCommit::default()).unwrap();
        let bounds = surface.toplevel().unwrap().current().bounds;
        assert_eq!(
            bounds,
            SizeBounds { min_width: 100, min_height: 50, max_width: 800, max_height: 600 }
        );
    }

    #[test]
    fn popup_configures_only_when_forced() {
        let mut serials = SerialCounter::new();
        let mut popup = XdgSurface::new(SurfaceId(2));
        popup
            .assign_popup(SurfaceId(1), Rectangle::new((10, 20).into(), (100, 50).into()))
            .unwrap();
        assert!(popup.schedule_configure(&mut serials, false).is_none());

        let configure = popup.schedule_configure(&mut serials, true).unwrap();
        assert_eq!(
            configure.payload,
            ConfigurePayload::Popup { x: 10, y: 20, width: 100, height: 50 }
        );
        assert_eq!(
            popup.close_message(),
            Some(ServerMessage::PopupDone { surface: SurfaceId(2) })
        );
    }
}
