//! Views and the view adapter
//!
//! A [`View`] is the generic window handle the desktop manages. Generic
//! window-management code never touches protocol surfaces; it calls the
//! [`ViewAdapter`] capability set, and the shell delegates each call to the
//! surface's role. Calls against a surface of the wrong role are dropped.

use smithay::utils::{Logical, Point, Size};

use crate::configure::{MoveResizeNegotiation, ResizeTicket, ToplevelConfigurer};
use crate::desktop::{Desktop, ViewId};
use crate::error::ShellError;
use crate::listener::{ListenerSet, ListenerTarget, SignalKind};
use crate::popup::PopupId;
use crate::protocol::SurfaceId;
use crate::shell::Shell;

/// Signals a toplevel view listens to
pub const TOPLEVEL_SIGNALS: [SignalKind; 9] = [
    SignalKind::Commit,
    SignalKind::Destroy,
    SignalKind::NewPopup,
    SignalKind::Map,
    SignalKind::Unmap,
    SignalKind::RequestMove,
    SignalKind::RequestResize,
    SignalKind::RequestMaximize,
    SignalKind::RequestFullscreen,
];

/// A managed toplevel window
#[derive(Debug)]
pub struct View {
    pub(crate) id: ViewId,
    pub(crate) surface: SurfaceId,
    pub(crate) position: Point<i32, Logical>,
    pub(crate) size: Size<i32, Logical>,
    pub(crate) negotiation: MoveResizeNegotiation,
    pub(crate) popups: Vec<PopupId>,
    pub(crate) mapped: bool,
    pub(crate) listeners: ListenerSet,
}

impl View {
    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn position(&self) -> Point<i32, Logical> {
        self.position
    }

    pub fn size(&self) -> Size<i32, Logical> {
        self.size
    }

    pub fn negotiation(&self) -> &MoveResizeNegotiation {
        &self.negotiation
    }

    pub fn ticket(&self) -> ResizeTicket {
        self.negotiation.ticket()
    }

    /// Popups anchored to this view, nested ones included
    pub fn popups(&self) -> &[PopupId] {
        &self.popups
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }
}

/// What generic window management may do with a view
pub trait ViewAdapter {
    fn activate(&mut self, view: ViewId, active: bool);

    fn resize(&mut self, view: ViewId, width: u32, height: u32);

    fn move_resize(&mut self, view: ViewId, x: i32, y: i32, width: u32, height: u32);

    fn maximize(&mut self, view: ViewId, maximized: bool);

    fn set_fullscreen(&mut self, view: ViewId, fullscreen: bool);

    /// Ask the client to close the view and all its popups
    fn close(&mut self, view: ViewId);

    /// Tear down the view's listeners and popups and forget it
    fn destroy(&mut self, view: ViewId);
}

impl<D: Desktop> Shell<D> {
    /// Create the view for a new toplevel surface
    pub(crate) fn create_view(&mut self, surface: SurfaceId) -> Result<ViewId, ShellError> {
        if !self.config.view_capacity_left(self.views.len()) {
            return Err(ShellError::ResourceExhausted { what: "view limit reached" });
        }
        let id = self
            .desktop
            .create_view()
            .ok_or(ShellError::ResourceExhausted { what: "desktop refused view" })?;

        let listeners = ListenerSet::install(
            &self.registry,
            surface,
            ListenerTarget::Toplevel(id),
            &TOPLEVEL_SIGNALS,
        );

        self.views.insert(
            id,
            View {
                id,
                surface,
                position: Point::from((0, 0)),
                size: Size::from((0, 0)),
                negotiation: MoveResizeNegotiation::default(),
                popups: Vec::new(),
                mapped: false,
                listeners,
            },
        );
        tracing::info!(view = ?id, ?surface, "view created");
        Ok(id)
    }

    /// Remove a view: listeners first, then popups, then the record
    pub(crate) fn teardown_view(&mut self, id: ViewId) -> Option<View> {
        let mut view = self.views.remove(&id)?;
        view.listeners.release();
        for popup in std::mem::take(&mut view.popups) {
            self.destroy_popup(popup);
        }
        tracing::debug!(view = ?id, ticket = ?view.ticket(), "view torn down");
        Some(view)
    }

    pub(crate) fn handle_view_surface_destroyed(&mut self, id: ViewId) {
        let Some(view) = self.teardown_view(id) else {
            return;
        };
        if view.mapped {
            self.desktop.view_unmapped(id);
        }
        self.desktop.view_destroyed(id);
        tracing::info!(view = ?id, "view destroyed");
    }

    /// Move a view, notifying the desktop if the position changed
    pub(crate) fn update_view_position(&mut self, id: ViewId, position: Point<i32, Logical>) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        if view.position == position {
            return;
        }
        view.position = position;
        self.desktop.view_moved(id, position);
    }

    /// Borrow the configure machinery of a toplevel view
    fn configurer(&mut self, id: ViewId) -> Option<ToplevelConfigurer<'_>> {
        let Some(view) = self.views.get_mut(&id) else {
            tracing::trace!(view = ?id, "view adapter call on unknown view");
            return None;
        };
        let surface = self.surfaces.get_mut(&view.surface)?;
        if !surface.is_toplevel() {
            tracing::trace!(view = ?id, surface = ?view.surface, "view adapter call on non-toplevel");
            return None;
        }
        Some(ToplevelConfigurer {
            surface,
            negotiation: &mut view.negotiation,
            position: view.position,
            serials: &mut self.serials,
            outbox: &mut self.outbox,
        })
    }
}

impl<D: Desktop> ViewAdapter for Shell<D> {
    fn activate(&mut self, view: ViewId, active: bool) {
        if let Some(mut configurer) = self.configurer(view) {
            configurer.activate(active);
        }
    }

    fn resize(&mut self, view: ViewId, width: u32, height: u32) {
        if let Some(mut configurer) = self.configurer(view) {
            configurer.resize(width, height);
        }
    }

    fn move_resize(&mut self, view: ViewId, x: i32, y: i32, width: u32, height: u32) {
        let Some(mut configurer) = self.configurer(view) else {
            return;
        };
        let outcome = configurer.move_resize(x, y, width, height);
        if let Some(position) = outcome.moved_to {
            self.update_view_position(view, position);
        }
    }

    fn maximize(&mut self, view: ViewId, maximized: bool) {
        if let Some(mut configurer) = self.configurer(view) {
            configurer.maximize(maximized);
        }
    }

    fn set_fullscreen(&mut self, view: ViewId, fullscreen: bool) {
        if let Some(mut configurer) = self.configurer(view) {
            configurer.set_fullscreen(fullscreen);
        }
    }

    fn close(&mut self, id: ViewId) {
        let Some(view) = self.views.get(&id) else {
            return;
        };
        let Some(surface) = self.surfaces.get(&view.surface) else {
            return;
        };
        if !surface.is_toplevel() {
            tracing::trace!(view = ?id, "close on non-toplevel");
            return;
        }

        let mut messages: Vec<_> = view
            .popups
            .iter()
            .filter_map(|popup| self.popups.get(popup))
            .filter_map(|popup| self.surfaces.get(&popup.surface))
            .filter_map(|popup_surface| popup_surface.close_message())
            .collect();
        messages.extend(surface.close_message());

        tracing::debug!(view = ?id, popups = view.popups.len(), "closing view");
        self.outbox.extend(messages);
    }

    fn destroy(&mut self, view: ViewId) {
        self.teardown_view(view);
    }
}
