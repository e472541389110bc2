//! Core traits that decouple gridded from the X11 protocol and from the
//! way notifications are delivered.
//!
//! The [`Embedder`](crate::embedder::Embedder) only depends on these
//! abstractions; the concrete X11 implementations live in [`x11`](crate::x11)
//! and the child watchers in [`supervisor`](crate::supervisor).

use crate::command::{Keycode, Notification, Pid, SurfaceId, TitleProperty};
use crate::grid::{Container, Rect};
use std::sync::mpsc;

/// Abstraction over the windowing environment the embedder drives.
///
/// An implementation might talk to an X server, or it might be a recording
/// stub used in tests.
pub trait WindowSystem {
    /// The error type produced by this window system.
    type Error: std::error::Error + Send + 'static;

    /// Read the id of the process that owns `surface`.
    ///
    /// Returns `None` when the surface does not advertise one.
    fn owner_pid(&self, surface: SurfaceId) -> Result<Option<Pid>, Self::Error>;

    /// Start receiving [`Notification::MetadataChanged`] for `surface`.
    fn watch_metadata(&self, surface: SurfaceId) -> Result<(), Self::Error>;

    /// Copy a title property from `src` to `dest`.  Does nothing if `src`
    /// has no value for it.
    fn copy_title(
        &self,
        src: SurfaceId,
        dest: SurfaceId,
        property: TitleProperty,
    ) -> Result<(), Self::Error>;

    /// Repaint the container background over its whole area.
    fn clear_container(&self, container: &Container) -> Result<(), Self::Error>;

    /// Move and resize `surface`.
    fn configure_surface(&self, surface: SurfaceId, rect: Rect) -> Result<(), Self::Error>;

    /// Resolve a keysym to a physical key code of the current keyboard map.
    fn keycode_for(&self, keysym: u32) -> Result<Option<Keycode>, Self::Error>;

    /// Grab `keycode` with exactly `modifiers` on `window`.
    ///
    /// The grab is synchronous: after each press the keyboard stays frozen
    /// until [`release_key`](WindowSystem::release_key) is called.
    fn grab_key(
        &self,
        window: SurfaceId,
        modifiers: u16,
        keycode: Keycode,
    ) -> Result<(), Self::Error>;

    /// Thaw the keyboard after a grabbed key press.  With `replay` the
    /// event is delivered again to the window it was originally aimed at.
    fn release_key(&self, replay: bool) -> Result<(), Self::Error>;

    /// Push buffered requests to the window system.
    fn flush(&self) -> Result<(), Self::Error>;
}

/// A source of [`Notification`]s.
///
/// # Contract
///
/// * [`run`](NotificationSource::run) **blocks** until the source is
///   exhausted or an unrecoverable error occurs.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
/// * All state changes happen on the receiving side; a source only
///   translates and forwards.
pub trait NotificationSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Forward every notification into `sink` until exhausted.
    fn run(&mut self, sink: mpsc::Sender<Notification>) -> Result<(), Self::Error>;
}
