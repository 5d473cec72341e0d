//! Popups of a view
//!
//! Every popup is anchored to the toplevel view it was ultimately opened
//! from. A popup opened from another popup does not become that popup's
//! child: it is attached to the same root view as a sibling. Damage from any
//! popup is therefore reported against the root view.

use serde::Serialize;

use crate::desktop::{Desktop, ViewId};
use crate::error::ShellError;
use crate::listener::{ListenerSet, ListenerTarget, SignalKind};
use crate::protocol::SurfaceId;
use crate::shell::{Shell, SignalData};

/// Signals a popup listens to
pub const POPUP_SIGNALS: [SignalKind; 5] = [
    SignalKind::Destroy,
    SignalKind::Map,
    SignalKind::Unmap,
    SignalKind::NewPopup,
    SignalKind::Commit,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PopupId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopupState {
    Created,
    Mapped,
    Unmapped,
    Destroyed,
}

/// A popup attached to a view
#[derive(Debug)]
pub struct ViewPopup {
    pub(crate) id: PopupId,
    pub(crate) view: ViewId,
    pub(crate) surface: SurfaceId,
    pub(crate) state: PopupState,
    pub(crate) listeners: ListenerSet,
}

impl ViewPopup {
    pub fn id(&self) -> PopupId {
        self.id
    }

    /// The root view this popup is anchored to
    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn state(&self) -> PopupState {
        self.state
    }
}

impl<D: Desktop> Shell<D> {
    pub fn popup(&self, id: PopupId) -> Option<&ViewPopup> {
        self.popups.get(&id)
    }

    /// The popup wrapping a popup surface
    pub fn popup_for_surface(&self, surface: SurfaceId) -> Option<PopupId> {
        self.popups
            .values()
            .find(|popup| popup.surface == surface)
            .map(|popup| popup.id)
    }

    /// Attach a new popup surface to `view`
    pub(crate) fn create_popup(&mut self, view: ViewId, surface: SurfaceId) -> Result<PopupId, ShellError> {
        let popup_count = self
            .views
            .get(&view)
            .map(|owner| owner.popups.len())
            .ok_or(ShellError::UnknownView(view))?;
        if !self.config.popup_capacity_left(popup_count) {
            return Err(ShellError::ResourceExhausted { what: "popup limit reached" });
        }

        self.next_popup_id += 1;
        let id = PopupId(self.next_popup_id);
        let listeners = ListenerSet::install(&self.registry, surface, ListenerTarget::Popup(id), &POPUP_SIGNALS);

        self.popups.insert(
            id,
            ViewPopup {
                id,
                view,
                surface,
                state: PopupState::Created,
                listeners,
            },
        );
        if let Some(owner) = self.views.get_mut(&view) {
            owner.popups.push(id);
        }

        tracing::debug!(popup = ?id, ?view, ?surface, "popup created");
        Ok(id)
    }

    /// Deregister a popup's listeners and forget it, handing back the
    /// destroyed record
    pub(crate) fn destroy_popup(&mut self, id: PopupId) -> Option<ViewPopup> {
        let mut popup = self.popups.remove(&id)?;
        popup.listeners.release();
        popup.state = PopupState::Destroyed;

        if let Some(owner) = self.views.get_mut(&popup.view) {
            owner.popups.retain(|p| *p != id);
        }
        tracing::debug!(popup = ?id, view = ?popup.view, "popup destroyed");
        Some(popup)
    }

    pub(crate) fn handle_popup_signal(&mut self, id: PopupId, kind: SignalKind, data: SignalData) {
        let Some(popup) = self.popups.get_mut(&id) else {
            return;
        };
        let view = popup.view;

        match (kind, data) {
            (SignalKind::Destroy, _) => {
                self.destroy_popup(id);
            }
            (SignalKind::Map, _) => {
                popup.state = PopupState::Mapped;
                self.desktop.mark_view_fully_damaged(view);
            }
            (SignalKind::Unmap, _) => {
                popup.state = PopupState::Unmapped;
                self.desktop.mark_view_fully_damaged(view);
            }
            (SignalKind::Commit, _) => self.desktop.mark_view_damaged(view),
            (SignalKind::NewPopup, SignalData::NewPopup(surface)) => {
                // Nested popups are siblings under the root view
                if let Err(e) = self.create_popup(view, surface) {
                    tracing::warn!(parent = ?id, ?surface, error = %e, "dropping nested popup");
                }
            }
            (kind, data) => {
                tracing::trace!(popup = ?id, ?kind, ?data, "signal without handler");
            }
        }
    }
}
