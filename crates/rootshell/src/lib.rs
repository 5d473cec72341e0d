//! Shell surface core for a Wayland compositor
//!
//! Wraps the toplevel and popup roles of a client's shell surfaces into
//! generic views, runs the configure/ack/commit negotiation that keeps a
//! view's position in step with the size its client commits, and manages
//! popups and listener lifetimes.

pub mod commit;
pub mod config;
pub mod configure;
pub mod constraints;
pub mod desktop;
pub mod error;
pub mod listener;
pub mod popup;
pub mod protocol;
pub mod script;
pub mod serial;
pub mod shell;
pub mod view;

pub use config::Config;
pub use configure::ResizeTicket;
pub use desktop::{CursorMode, Desktop, DesktopEvent, OutputId, ResizeEdges, SeatId, ViewId};
pub use error::{ConfigError, ProtocolError, ShellError};
pub use popup::PopupId;
pub use protocol::{ClientRequest, ServerMessage, SurfaceCommit, SurfaceId};
pub use shell::Shell;
pub use view::ViewAdapter;
