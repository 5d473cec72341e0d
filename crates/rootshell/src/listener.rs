//! Signal listeners with scoped registration
//!
//! Views and popups subscribe to signals of the protocol surfaces they wrap.
//! Subscribing hands back an owned [`Listener`]; dropping it removes the
//! registration. Owners keep their listeners in a [`ListenerSet`], so every
//! destruction path (including a constructor bailing out halfway) releases
//! exactly the registrations that were installed.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::desktop::ViewId;
use crate::popup::PopupId;
use crate::protocol::SurfaceId;

/// Signals a protocol surface emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalKind {
    Commit,
    Destroy,
    Map,
    Unmap,
    NewPopup,
    RequestMove,
    RequestResize,
    RequestMaximize,
    RequestFullscreen,
}

/// Who handles a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerTarget {
    Toplevel(ViewId),
    Popup(PopupId),
}

/// Registration id, unique for the lifetime of a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

#[derive(Debug)]
struct Registration {
    surface: SurfaceId,
    kind: SignalKind,
    target: ListenerTarget,
}

/// All live signal registrations of one shell
#[derive(Debug, Default)]
pub struct SignalRegistry {
    next_id: u64,
    // Ordered by id so dispatch follows registration order
    registrations: BTreeMap<ListenerId, Registration>,
    released: u64,
}

impl SignalRegistry {
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Register `target` for `kind` on `surface`
    pub fn subscribe(
        registry: &Rc<RefCell<Self>>,
        surface: SurfaceId,
        kind: SignalKind,
        target: ListenerTarget,
    ) -> Listener {
        let mut inner = registry.borrow_mut();
        inner.next_id += 1;
        let id = ListenerId(inner.next_id);
        inner.registrations.insert(id, Registration { surface, kind, target });
        tracing::trace!(?id, ?surface, ?kind, ?target, "listener registered");
        Listener {
            id,
            registry: Rc::downgrade(registry),
        }
    }

    fn remove(&mut self, id: ListenerId) {
        if let Some(reg) = self.registrations.remove(&id) {
            self.released += 1;
            tracing::trace!(?id, surface = ?reg.surface, kind = ?reg.kind, "listener removed");
        }
    }

    /// Listeners for a signal, in registration order
    pub fn listeners(&self, surface: SurfaceId, kind: SignalKind) -> Vec<(ListenerId, ListenerTarget)> {
        self.registrations
            .iter()
            .filter(|(_, reg)| reg.surface == surface && reg.kind == kind)
            .map(|(id, reg)| (*id, reg.target))
            .collect()
    }

    pub fn is_live(&self, id: ListenerId) -> bool {
        self.registrations.contains_key(&id)
    }

    /// Number of live registrations
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Number of live registrations owned by `target`
    pub fn count_for(&self, target: ListenerTarget) -> usize {
        self.registrations.values().filter(|reg| reg.target == target).count()
    }

    /// Total registrations removed so far
    pub fn released(&self) -> u64 {
        self.released
    }
}

/// An installed registration. Dropping it deregisters.
#[derive(Debug)]
pub struct Listener {
    id: ListenerId,
    registry: Weak<RefCell<SignalRegistry>>,
}

impl Listener {
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().remove(self.id);
        }
    }
}

/// The listeners owned by one view or popup
#[derive(Debug, Default)]
pub struct ListenerSet {
    listeners: Vec<Listener>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `target` to each of `kinds` on `surface`
    pub fn install(
        registry: &Rc<RefCell<SignalRegistry>>,
        surface: SurfaceId,
        target: ListenerTarget,
        kinds: &[SignalKind],
    ) -> Self {
        let mut set = Self::new();
        for kind in kinds {
            set.push(SignalRegistry::subscribe(registry, surface, *kind, target));
        }
        set
    }

    pub fn push(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deregister everything now
    pub fn release(&mut self) {
        self.listeners.clear();
    }
}
