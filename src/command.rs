//! Types shared by every component of gridded.
//!
//! [`Notification`] is the single vocabulary spoken between the
//! notification sources (the X11 event stream, child-process watchers) and
//! the [`Embedder`](crate::embedder::Embedder).  [`Action`] names what a key
//! binding does.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a graphical surface (an X11 window id).
pub type SurfaceId = u32;

/// Identifier of a spawned process.
pub type Pid = u32;

/// A physical key code as reported by the window system.
pub type Keycode = u8;

/// A layout mutation that can be bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Swap slot `2k` with slot `2k + 1` for every complete pair.
    Mirror,
    /// Flip full mode on or off.
    ToggleFull,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Mirror => write!(f, "mirror"),
            Action::ToggleFull => write!(f, "toggle-full"),
        }
    }
}

/// Which title property changed on a surface.
///
/// Both are mirrored from the leading slot to the container so that a
/// window manager shows the embedded application's title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TitleProperty {
    /// `_NET_WM_NAME`, UTF-8.
    NetWmName,
    /// Legacy `WM_NAME`, Latin-1.
    WmName,
}

impl TitleProperty {
    /// Every title property, in the order they are copied.
    pub const ALL: [TitleProperty; 2] = [TitleProperty::NetWmName, TitleProperty::WmName];
}

/// Something that happened and that the reconciliation loop must react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A surface became visible inside the container.
    SurfaceCreated { surface: SurfaceId },

    /// A title property of a watched surface changed.
    MetadataChanged {
        surface: SurfaceId,
        property: TitleProperty,
    },

    /// A surface was destroyed.  May be the container itself.
    SurfaceDestroyed { surface: SurfaceId },

    /// The container received a new size.
    ContainerResized { width: u32, height: u32 },

    /// A grabbed key was pressed.  The keyboard stays frozen until the
    /// embedder releases it.
    KeyPress { keycode: Keycode, state: u16 },

    /// A spawned child terminated.  `code` is already mapped to a process
    /// exit code (see [`exit_code`](crate::supervisor::exit_code)).
    ChildExited { pid: Pid, code: i32 },

    /// The connection to the window system is gone.
    ConnectionLost,
}
