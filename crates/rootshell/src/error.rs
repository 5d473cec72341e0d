//! Error types

use thiserror::Error;

use crate::desktop::ViewId;
use crate::protocol::SurfaceId;

/// Client requests the protocol model rejects
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown surface {0:?}")]
    UnknownSurface(SurfaceId),

    #[error("surface {0:?} already has a role")]
    RoleAlreadyAssigned(SurfaceId),

    #[error("surface {0:?} has no role")]
    NoRole(SurfaceId),

    #[error("surface {0:?} is not a toplevel")]
    NotToplevel(SurfaceId),

    #[error("popup parent {parent:?} of surface {surface:?} does not exist")]
    UnknownParent { surface: SurfaceId, parent: SurfaceId },

    #[error("surface {surface:?} acked unknown configure serial {serial}")]
    InvalidSerial { surface: SurfaceId, serial: u32 },

    #[error("surface {0:?} attached a buffer before acknowledging a configure")]
    UnconfiguredBuffer(SurfaceId),
}

/// Errors from driving the shell with client requests
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("unknown view {0:?}")]
    UnknownView(ViewId),

    #[error("resource exhausted: {what}")]
    ResourceExhausted { what: &'static str },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}
