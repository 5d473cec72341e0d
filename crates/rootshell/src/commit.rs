//! Commit handling for toplevel views
//!
//! Keeps a view's size and position in step with what its client commits.

use smithay::utils::{Logical, Size};

use crate::desktop::{Desktop, ViewId};
use crate::protocol::XdgSurface;
use crate::shell::Shell;

/// Size of a surface as the desktop should see it.
///
/// The declared window geometry wins when it is non-empty, then the buffer
/// size, then nothing.
pub fn current_size(surface: &XdgSurface) -> Size<i32, Logical> {
    match (surface.geometry(), surface.buffer_size()) {
        (Some(geometry), _) if geometry.size.w > 0 && geometry.size.h > 0 => geometry.size,
        (_, Some(buffer)) => buffer,
        _ => Size::from((0, 0)),
    }
}

impl<D: Desktop> Shell<D> {
    pub(crate) fn handle_view_commit(&mut self, id: ViewId) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        let Some(surface) = self.surfaces.get(&view.surface) else {
            return;
        };
        if !surface.is_mapped() {
            return;
        }

        let size = current_size(surface);
        let acked = surface.configure_serial();
        view.size = size;
        let moved_to = view.negotiation.reconcile(acked, view.position, size);

        if let Some(position) = moved_to {
            tracing::debug!(view = ?id, acked = ?acked, ?position, "applying acknowledged move");
            self.update_view_position(id, position);
        }

        // Content may have changed even when geometry did not
        self.desktop.mark_view_damaged(id);
        self.desktop.view_resized(id, size);
    }

    pub(crate) fn handle_view_map(&mut self, id: ViewId) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        let Some(surface) = self.surfaces.get(&view.surface) else {
            return;
        };

        view.size = current_size(surface);
        if view.mapped {
            return;
        }
        view.mapped = true;

        let size = view.size;
        tracing::info!(view = ?id, width = size.w, height = size.h, "view mapped");
        self.desktop.view_mapped(id, size);
    }

    pub(crate) fn handle_view_unmap(&mut self, id: ViewId) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        if !view.mapped {
            return;
        }
        view.mapped = false;

        tracing::info!(view = ?id, "view unmapped");
        self.desktop.view_unmapped(id);
    }
}
