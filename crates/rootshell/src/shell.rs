//! Shell state and client request routing
//!
//! [`Shell`] owns the protocol surfaces of one client connection together
//! with the views and popups built on them. Client requests come in through
//! [`Shell::handle_request`]; each surface change is turned into signals, and
//! signals reach views and popups only through their registered listeners.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use smithay::utils::{Logical, Rectangle};

use crate::config::Config;
use crate::desktop::{CursorMode, Desktop, OutputId, ResizeEdges, SeatId, ViewId};
use crate::error::{ProtocolError, ShellError};
use crate::listener::{ListenerTarget, SignalKind, SignalRegistry};
use crate::popup::{PopupId, ViewPopup};
use crate::protocol::{ClientRequest, ServerMessage, SurfaceCommit, SurfaceId, XdgSurface};
use crate::serial::SerialCounter;
use crate::view::View;

/// Extra data carried by a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignalData {
    None,
    NewPopup(SurfaceId),
    Move(SeatId),
    Resize(SeatId, ResizeEdges),
    Maximize(bool),
    Fullscreen { fullscreen: bool, output: Option<OutputId> },
}

/// Shell surfaces of one client connection
pub struct Shell<D: Desktop> {
    pub(crate) config: Config,
    pub(crate) desktop: D,
    pub(crate) surfaces: HashMap<SurfaceId, XdgSurface>,
    pub(crate) views: HashMap<ViewId, View>,
    pub(crate) popups: HashMap<PopupId, ViewPopup>,
    pub(crate) registry: Rc<RefCell<SignalRegistry>>,
    pub(crate) serials: SerialCounter,
    pub(crate) outbox: Vec<ServerMessage>,
    pub(crate) next_popup_id: u32,
}

impl<D: Desktop> Shell<D> {
    pub fn new(config: Config, desktop: D) -> Self {
        Self {
            config,
            desktop,
            surfaces: HashMap::new(),
            views: HashMap::new(),
            popups: HashMap::new(),
            registry: SignalRegistry::new(),
            serials: SerialCounter::new(),
            outbox: Vec::new(),
            next_popup_id: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn desktop(&self) -> &D {
        &self.desktop
    }

    pub fn desktop_mut(&mut self) -> &mut D {
        &mut self.desktop
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&XdgSurface> {
        self.surfaces.get(&id)
    }

    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(&id)
    }

    /// All views, ordered by id
    pub fn views(&self) -> Vec<&View> {
        let mut views: Vec<_> = self.views.values().collect();
        views.sort_by_key(|view| view.id());
        views
    }

    /// The view wrapping a toplevel surface
    pub fn view_for_surface(&self, surface: SurfaceId) -> Option<ViewId> {
        self.views
            .values()
            .find(|view| view.surface() == surface)
            .map(|view| view.id())
    }

    /// Messages sent to the client so far
    pub fn outbox(&self) -> &[ServerMessage] {
        &self.outbox
    }

    pub fn take_outbox(&mut self) -> Vec<ServerMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Number of live listener registrations
    pub fn listener_count(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Number of live listener registrations owned by `target`
    pub fn listener_count_for(&self, target: ListenerTarget) -> usize {
        self.registry.borrow().count_for(target)
    }

    /// Total listener registrations removed so far
    pub fn listeners_released(&self) -> u64 {
        self.registry.borrow().released()
    }

    fn surface_mut(&mut self, id: SurfaceId) -> Result<&mut XdgSurface, ProtocolError> {
        self.surfaces.get_mut(&id).ok_or(ProtocolError::UnknownSurface(id))
    }

    fn require_toplevel(&self, id: SurfaceId) -> Result<(), ProtocolError> {
        match self.surfaces.get(&id) {
            None => Err(ProtocolError::UnknownSurface(id)),
            Some(surface) if !surface.is_toplevel() => Err(ProtocolError::NotToplevel(id)),
            Some(_) => Ok(()),
        }
    }

    /// Process one client request
    pub fn handle_request(&mut self, request: ClientRequest) -> Result<(), ShellError> {
        tracing::trace!(?request, "client request");

        match request {
            ClientRequest::GetToplevel { surface } => self.new_toplevel(surface)?,
            ClientRequest::GetPopup { surface, parent, geometry } => {
                self.new_popup_surface(surface, parent, geometry)?
            }
            ClientRequest::SetMinSize { surface, width, height } => {
                self.surface_mut(surface)?.set_min_size(width, height)?
            }
            ClientRequest::SetMaxSize { surface, width, height } => {
                self.surface_mut(surface)?.set_max_size(width, height)?
            }
            ClientRequest::SetMaximized { surface, maximized } => {
                self.require_toplevel(surface)?;
                self.emit(surface, SignalKind::RequestMaximize, SignalData::Maximize(maximized));
            }
            ClientRequest::SetFullscreen { surface, fullscreen, output } => {
                self.require_toplevel(surface)?;
                self.emit(
                    surface,
                    SignalKind::RequestFullscreen,
                    SignalData::Fullscreen { fullscreen, output },
                );
            }
            ClientRequest::Move { surface, seat } => {
                self.require_toplevel(surface)?;
                self.emit(surface, SignalKind::RequestMove, SignalData::Move(seat));
            }
            ClientRequest::Resize { surface, seat, edges } => {
                self.require_toplevel(surface)?;
                self.emit(surface, SignalKind::RequestResize, SignalData::Resize(seat, edges));
            }
            ClientRequest::AckConfigure { surface, serial } => {
                self.surface_mut(surface)?.ack_configure(serial)?
            }
            ClientRequest::Commit { surface, commit } => self.commit_surface(surface, commit)?,
            ClientRequest::Destroy { surface } => self.destroy_surface(surface)?,
        }

        Ok(())
    }

    fn new_toplevel(&mut self, id: SurfaceId) -> Result<(), ProtocolError> {
        self.surfaces
            .entry(id)
            .or_insert_with(|| XdgSurface::new(id))
            .assign_toplevel()?;
        tracing::debug!(surface = ?id, "new toplevel");

        if self.config.ping_on_create {
            let serial = self.serials.next_serial();
            self.outbox.push(ServerMessage::Ping { surface: id, serial });
        }

        if let Err(e) = self.create_view(id) {
            tracing::warn!(surface = ?id, error = %e, "dropping new toplevel");
        }
        Ok(())
    }

    fn new_popup_surface(
        &mut self,
        id: SurfaceId,
        parent: SurfaceId,
        geometry: Rectangle<i32, Logical>,
    ) -> Result<(), ProtocolError> {
        if parent == id || !self.surfaces.contains_key(&parent) {
            return Err(ProtocolError::UnknownParent { surface: id, parent });
        }
        self.surfaces
            .entry(id)
            .or_insert_with(|| XdgSurface::new(id))
            .assign_popup(parent, geometry)?;
        tracing::debug!(surface = ?id, ?parent, "new popup");

        self.emit(parent, SignalKind::NewPopup, SignalData::NewPopup(id));
        Ok(())
    }

    fn commit_surface(&mut self, id: SurfaceId, commit: SurfaceCommit) -> Result<(), ProtocolError> {
        let surface = self.surfaces.get_mut(&id).ok_or(ProtocolError::UnknownSurface(id))?;
        let effects = surface.commit(commit)?;

        if effects.needs_initial_configure {
            if let Some(configure) = surface.schedule_configure(&mut self.serials, true) {
                tracing::debug!(surface = ?id, serial = %configure.serial, "initial configure");
                self.outbox.push(ServerMessage::Configure { surface: id, configure });
            }
        }

        if effects.unmapped {
            self.emit(id, SignalKind::Unmap, SignalData::None);
        }
        if effects.mapped {
            self.emit(id, SignalKind::Map, SignalData::None);
        }
        self.emit(id, SignalKind::Commit, SignalData::None);
        Ok(())
    }

    fn destroy_surface(&mut self, id: SurfaceId) -> Result<(), ProtocolError> {
        if !self.surfaces.contains_key(&id) {
            return Err(ProtocolError::UnknownSurface(id));
        }

        // Child popups go first
        let mut children: Vec<SurfaceId> = self
            .surfaces
            .values()
            .filter(|surface| surface.popup().map(|popup| popup.parent()) == Some(id))
            .map(|surface| surface.id())
            .collect();
        children.sort();
        for child in children {
            self.destroy_surface(child)?;
        }

        let was_mapped = self
            .surfaces
            .get_mut(&id)
            .map(|surface| surface.force_unmap())
            .unwrap_or(false);
        if was_mapped {
            self.emit(id, SignalKind::Unmap, SignalData::None);
        }
        self.emit(id, SignalKind::Destroy, SignalData::None);

        self.surfaces.remove(&id);
        tracing::debug!(surface = ?id, "surface destroyed");
        Ok(())
    }

    /// Deliver a signal to every listener registered for it
    pub(crate) fn emit(&mut self, surface: SurfaceId, kind: SignalKind, data: SignalData) {
        let listeners = self.registry.borrow().listeners(surface, kind);

        for (id, target) in listeners {
            // An earlier handler may have torn this listener down
            if !self.registry.borrow().is_live(id) {
                continue;
            }
            match target {
                ListenerTarget::Toplevel(view) => self.handle_toplevel_signal(view, kind, data),
                ListenerTarget::Popup(popup) => self.handle_popup_signal(popup, kind, data),
            }
        }
    }

    fn handle_toplevel_signal(&mut self, view: ViewId, kind: SignalKind, data: SignalData) {
        match (kind, data) {
            (SignalKind::Commit, _) => self.handle_view_commit(view),
            (SignalKind::Map, _) => self.handle_view_map(view),
            (SignalKind::Unmap, _) => self.handle_view_unmap(view),
            (SignalKind::Destroy, _) => self.handle_view_surface_destroyed(view),
            (SignalKind::NewPopup, SignalData::NewPopup(surface)) => {
                if let Err(e) = self.create_popup(view, surface) {
                    tracing::warn!(?view, ?surface, error = %e, "dropping new popup");
                }
            }
            (SignalKind::RequestMove, SignalData::Move(seat)) => {
                if self.seat_is_idle(seat) {
                    self.desktop.begin_move(seat, view);
                }
            }
            (SignalKind::RequestResize, SignalData::Resize(seat, edges)) => {
                if self.seat_is_idle(seat) {
                    self.desktop.begin_resize(seat, view, edges);
                }
            }
            (SignalKind::RequestMaximize, SignalData::Maximize(maximized)) => {
                self.desktop.maximize_requested(view, maximized);
            }
            (SignalKind::RequestFullscreen, SignalData::Fullscreen { fullscreen, output }) => {
                self.desktop.fullscreen_requested(view, fullscreen, output);
            }
            (kind, data) => {
                tracing::trace!(?view, ?kind, ?data, "signal without handler");
            }
        }
    }

    /// Interactive move/resize may only start from an idle seat
    fn seat_is_idle(&self, seat: SeatId) -> bool {
        match self.desktop.seat_mode(seat) {
            Some(CursorMode::Passthrough) => true,
            mode => {
                tracing::debug!(?seat, ?mode, "ignoring interactive request from busy or unknown seat");
                false
            }
        }
    }
}
