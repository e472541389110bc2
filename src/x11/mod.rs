//! X11-specific implementations.
//!
//! This module provides the concrete backends for the
//! [`WindowSystem`](crate::traits::WindowSystem) and
//! [`NotificationSource`](crate::traits::NotificationSource) traits, built
//! on `x11rb`.
//!
//! Nothing outside this module should reference X11 directly.

pub mod conn;
pub mod events;

use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};

/// Errors that can occur when talking to the X server.
#[derive(Debug, thiserror::Error)]
pub enum X11Error {
    #[error("cannot connect to X server: {0}")]
    Connect(#[from] ConnectError),
    #[error("X connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("X request failed: {0}")]
    Reply(#[from] ReplyError),
    #[error("cannot allocate X resource: {0}")]
    Id(#[from] ReplyOrIdError),
}
