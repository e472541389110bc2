//! **gridded** — a minimal tiling embedder.
//!
//! gridded creates (or adopts) a container window, launches one process per
//! command line with the container's id in its environment, and tiles the
//! windows those processes map into the container as a grid.  The layout
//! follows windows appearing and disappearing and the container being
//! resized; two key bindings swap pairs of slots and toggle full mode.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::WindowSystem`] — abstracts geometry, properties and key grabs
//!   so the reconciliation logic is not coupled to X11.
//! * [`traits::NotificationSource`] — abstracts whatever produces
//!   [`command::Notification`]s (the X11 event stream, child watchers) so
//!   the main loop only ever reads one channel.
//!
//! [`embedder::Embedder`] owns the [`registry::Registry`] and
//! [`grid::GridConfig`] and runs on the main thread; sources run on
//! background threads and only forward.

pub mod bindings;
pub mod cli;
pub mod command;
pub mod config;
pub mod embedder;
pub mod grid;
pub mod registry;
pub mod supervisor;
pub mod traits;
pub mod x11;
