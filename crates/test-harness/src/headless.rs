//! Headless shell wrapper for testing

use rootshell::configure::ResizeTicket;
use rootshell::protocol::{Configure, ConfigurePayload, ToplevelConfigure};
use rootshell::script::ScriptDesktop;
use rootshell::serial::Serial;
use rootshell::view::View;
use rootshell::{ClientRequest, Config, DesktopEvent, ServerMessage, Shell, ShellError, SurfaceCommit, SurfaceId, ViewId};
use smithay::utils::Rectangle;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestError {
    #[error("no configure in flight for {0:?}")]
    NoConfigure(SurfaceId),

    #[error("no view for {0:?}")]
    NoView(SurfaceId),

    #[error("shell error: {0}")]
    Shell(#[from] ShellError),
}

/// Snapshot of shell state for assertions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSnapshot {
    /// Number of views
    pub view_count: usize,

    /// Popups across all views
    pub popup_count: usize,

    /// Live listener registrations
    pub listener_count: usize,

    /// Listener registrations removed so far
    pub listeners_released: u64,

    /// Messages sent to the client
    pub message_count: usize,
}

/// Test shell wrapper playing the client side
pub struct TestShell {
    shell: Shell<ScriptDesktop>,
    next_surface: u32,
}

impl TestShell {
    /// Create a shell with default configuration and no seats
    pub fn new_headless() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            shell: Shell::new(config, ScriptDesktop::default()),
            next_surface: 0,
        }
    }

    pub fn shell(&self) -> &Shell<ScriptDesktop> {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut Shell<ScriptDesktop> {
        &mut self.shell
    }

    pub fn desktop_mut(&mut self) -> &mut ScriptDesktop {
        self.shell.desktop_mut()
    }

    fn next_surface_id(&mut self) -> SurfaceId {
        self.next_surface += 1;
        SurfaceId(self.next_surface)
    }

    /// Send a raw client request
    pub fn request(&mut self, request: ClientRequest) -> Result<(), ShellError> {
        self.shell.handle_request(request)
    }

    /// Create a toplevel surface without committing it
    pub fn create_toplevel(&mut self) -> Result<SurfaceId, TestError> {
        let surface = self.next_surface_id();
        self.request(ClientRequest::GetToplevel { surface })?;
        Ok(surface)
    }

    /// Create a toplevel and take it through initial configure to mapped
    pub fn map_toplevel(&mut self, width: i32, height: i32) -> Result<(SurfaceId, ViewId), TestError> {
        let surface = self.create_toplevel()?;
        self.map_surface(surface, width, height)?;
        let view = self.shell.view_for_surface(surface).ok_or(TestError::NoView(surface))?;
        Ok((surface, view))
    }

    /// Create a popup surface with geometry `(x, y, width, height)`
    pub fn create_popup(&mut self, parent: SurfaceId, geometry: (i32, i32, i32, i32)) -> Result<SurfaceId, TestError> {
        let surface = self.next_surface_id();
        let (x, y, width, height) = geometry;
        self.request(ClientRequest::GetPopup {
            surface,
            parent,
            geometry: Rectangle::new((x, y).into(), (width, height).into()),
        })?;
        Ok(surface)
    }

    /// Initial commit, ack the initial configure, then commit a buffer
    pub fn map_surface(&mut self, surface: SurfaceId, width: i32, height: i32) -> Result<(), TestError> {
        self.commit(surface, SurfaceCommit::default())?;
        self.ack_latest(surface)?;
        self.commit(surface, SurfaceCommit::with_buffer(width, height))
    }

    pub fn commit(&mut self, surface: SurfaceId, commit: SurfaceCommit) -> Result<(), TestError> {
        self.request(ClientRequest::Commit { surface, commit })?;
        Ok(())
    }

    /// Commit a new buffer size
    pub fn commit_buffer(&mut self, surface: SurfaceId, width: i32, height: i32) -> Result<(), TestError> {
        self.commit(surface, SurfaceCommit::with_buffer(width, height))
    }

    /// Ack the newest in-flight configure
    pub fn ack_latest(&mut self, surface: SurfaceId) -> Result<Serial, TestError> {
        let serial = self
            .inflight_serials(surface)
            .last()
            .copied()
            .ok_or(TestError::NoConfigure(surface))?;
        self.ack(surface, serial)?;
        Ok(serial)
    }

    pub fn ack(&mut self, surface: SurfaceId, serial: Serial) -> Result<(), TestError> {
        self.request(ClientRequest::AckConfigure { surface, serial: serial.get() })?;
        Ok(())
    }

    /// Serials sent to `surface` and not yet acknowledged, oldest first
    pub fn inflight_serials(&self, surface: SurfaceId) -> Vec<Serial> {
        self.shell
            .surface(surface)
            .map(|s| s.inflight().map(|configure| configure.serial).collect())
            .unwrap_or_default()
    }

    pub fn set_min_size(&mut self, surface: SurfaceId, width: u32, height: u32) -> Result<(), TestError> {
        self.request(ClientRequest::SetMinSize { surface, width, height })?;
        Ok(())
    }

    pub fn set_max_size(&mut self, surface: SurfaceId, width: u32, height: u32) -> Result<(), TestError> {
        self.request(ClientRequest::SetMaxSize { surface, width, height })?;
        Ok(())
    }

    pub fn destroy(&mut self, surface: SurfaceId) -> Result<(), TestError> {
        self.request(ClientRequest::Destroy { surface })?;
        Ok(())
    }

    pub fn view(&self, view: ViewId) -> Option<&View> {
        self.shell.view(view)
    }

    pub fn position(&self, view: ViewId) -> Option<(i32, i32)> {
        self.view(view).map(|v| (v.position().x, v.position().y))
    }

    pub fn ticket(&self, view: ViewId) -> Option<ResizeTicket> {
        self.view(view).map(View::ticket)
    }

    /// Every configure sent to `surface`, oldest first
    pub fn configures_for(&self, surface: SurfaceId) -> Vec<Configure> {
        self.shell
            .outbox()
            .iter()
            .filter_map(|message| match message {
                ServerMessage::Configure { surface: s, configure } if *s == surface => Some(*configure),
                _ => None,
            })
            .collect()
    }

    /// Toplevel state of the newest configure sent to `surface`
    pub fn last_toplevel_configure(&self, surface: SurfaceId) -> Option<ToplevelConfigure> {
        self.configures_for(surface)
            .into_iter()
            .rev()
            .find_map(|configure| match configure.payload {
                ConfigurePayload::Toplevel(state) => Some(state),
                ConfigurePayload::Popup { .. } => None,
            })
    }

    pub fn messages(&self) -> &[ServerMessage] {
        self.shell.outbox()
    }

    pub fn take_messages(&mut self) -> Vec<ServerMessage> {
        self.shell.take_outbox()
    }

    pub fn events(&self) -> &[DesktopEvent] {
        self.shell.desktop().events()
    }

    pub fn take_events(&mut self) -> Vec<DesktopEvent> {
        self.shell.desktop_mut().take_events()
    }

    /// Get a snapshot of current state
    pub fn snapshot(&self) -> ShellSnapshot {
        let views = self.shell.views();
        ShellSnapshot {
            view_count: views.len(),
            popup_count: views.iter().map(|v| v.popups().len()).sum(),
            listener_count: self.shell.listener_count(),
            listeners_released: self.shell.listeners_released(),
            message_count: self.shell.outbox().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smithay::utils::Size;

    #[test]
    fn map_toplevel_creates_mapped_view() {
        let mut ts = TestShell::new_headless();
        let (surface, view) = ts.map_toplevel(640, 480).unwrap();

        let v = ts.view(view).unwrap();
        assert!(v.is_mapped());
        assert_eq!(v.surface(), surface);
        assert_eq!(v.size(), Size::from((640, 480)));
        assert!(ts.events().contains(&DesktopEvent::Mapped { view, width: 640, height: 480 }));
    }

    #[test]
    fn refused_view_leaves_no_listeners() {
        let mut ts = TestShell::new_headless();
        ts.desktop_mut().refuse_views(1);
        let surface = ts.create_toplevel().unwrap();

        assert!(ts.shell().view_for_surface(surface).is_none());
        assert_eq!(ts.snapshot().listener_count, 0);
    }

    #[test]
    fn ack_latest_without_configure_fails() {
        let mut ts = TestShell::new_headless();
        let surface = ts.create_toplevel().unwrap();
        assert!(matches!(ts.ack_latest(surface), Err(TestError::NoConfigure(_))));
    }
}
