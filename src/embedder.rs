//! The reconciliation loop that ties the registry, the grid and the window
//! system together.
//!
//! [`Embedder`] owns all mutable layout state and reacts to
//! [`Notification`]s by updating it and issuing calls to the
//! [`WindowSystem`] trait.  Every structural change ends in a full relayout;
//! nothing is updated incrementally.

use crate::bindings::KeyTable;
use crate::command::{Action, Notification, Pid, SurfaceId, TitleProperty};
use crate::grid::{self, Container, GridConfig, Rect};
use crate::registry::{Registry, RegistryError};
use crate::supervisor::ProcessTable;
use crate::traits::WindowSystem;
use log::{debug, error, info, warn};
use std::sync::mpsc;

/// Possible errors from the embedder.
#[derive(Debug, thiserror::Error)]
pub enum EmbedderError {
    /// The window system returned an error.
    #[error("window system error: {0}")]
    WindowSystem(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// What the loop should do after a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop and exit the process with this code.
    Exit(i32),
}

/// Orchestrates slot tracking, layout and key handling.
///
/// The embedder is generic over any [`WindowSystem`] implementation, so it
/// can be driven by X11 or by a recording stub in tests.
///
/// # Typical usage
///
/// ```ignore
/// let mut embedder = Embedder::new(ws, container, GridConfig::new(2, 2, false), keys, table);
/// embedder.track_process(pid)?;
/// let code = embedder.run(rx);
/// ```
pub struct Embedder<W: WindowSystem> {
    ws: W,
    container: Container,
    grid: GridConfig,
    registry: Registry,
    keys: KeyTable,
    processes: ProcessTable,
    consume_bound_keys: bool,
    /// Surface whose title was last mirrored onto the container.
    titled: Option<SurfaceId>,
}

impl<W: WindowSystem> Embedder<W> {
    pub fn new(
        ws: W,
        container: Container,
        grid: GridConfig,
        keys: KeyTable,
        processes: ProcessTable,
    ) -> Self {
        Self {
            ws,
            container,
            grid,
            registry: Registry::new(),
            keys,
            processes,
            consume_bound_keys: false,
            titled: None,
        }
    }

    /// Release matched key presses without replaying them to the child.
    pub fn set_consume_bound_keys(&mut self, consume: bool) {
        self.consume_bound_keys = consume;
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Reserve a slot for a freshly spawned process.
    pub fn track_process(&mut self, pid: Pid) -> Result<(), EmbedderError> {
        self.registry.reserve_slot(pid)?;
        self.processes.track(pid);
        Ok(())
    }

    /// Track every spawned pid in order, optionally mirror the still
    /// unbound slots, then lay out and flush.
    pub fn start(
        &mut self,
        pids: impl IntoIterator<Item = Pid>,
        mirror: bool,
    ) -> Result<(), EmbedderError> {
        for pid in pids {
            self.track_process(pid)?;
        }
        if mirror {
            self.apply(Action::Mirror);
        }
        self.relayout()?;
        self.flush()
    }

    /// Apply a layout mutation without relayouting.
    pub fn apply(&mut self, action: Action) {
        debug!("apply {}", action);
        match action {
            Action::Mirror => self.registry.mirror(),
            Action::ToggleFull => self.grid.toggle_full(),
        }
    }

    /// Rectangles the next relayout would apply.
    pub fn placements(&self) -> Vec<(SurfaceId, Rect)> {
        grid::layout(&self.container, &self.grid, &self.registry.bound_surfaces())
    }

    /// Clear the container and place every bound surface.
    pub fn relayout(&mut self) -> Result<(), EmbedderError> {
        self.ws.clear_container(&self.container).map_err(ws_err)?;
        for (surface, rect) in self.placements() {
            self.ws.configure_surface(surface, rect).map_err(ws_err)?;
        }
        self.sync_title()
    }

    pub fn flush(&self) -> Result<(), EmbedderError> {
        self.ws.flush().map_err(ws_err)
    }

    /// Process a single [`Notification`].
    pub fn handle(&mut self, notification: Notification) -> Result<Flow, EmbedderError> {
        match notification {
            Notification::SurfaceCreated { surface } => {
                let Some(pid) = self.ws.owner_pid(surface).map_err(ws_err)? else {
                    debug!("surface {:#x} has no pid, ignoring", surface);
                    return Ok(Flow::Continue);
                };
                if self.registry.bind_surface(surface, pid) {
                    info!("surface {:#x} bound to pid {}", surface, pid);
                    self.ws.watch_metadata(surface).map_err(ws_err)?;
                    self.relayout()?;
                }
            }

            Notification::MetadataChanged { surface, property } => {
                if self.registry.leader() == Some(surface) {
                    self.ws
                        .copy_title(surface, self.container.id, property)
                        .map_err(ws_err)?;
                }
            }

            Notification::SurfaceDestroyed { surface } => {
                if surface == self.container.id {
                    error!("container {:#x} was destroyed", surface);
                    return Ok(Flow::Exit(1));
                }
                if self.registry.unbind_surface(surface) {
                    info!("surface {:#x} destroyed", surface);
                    self.relayout()?;
                }
            }

            Notification::ContainerResized { width, height } => {
                debug!("container resized to {}x{}", width, height);
                self.container.width = width;
                self.container.height = height;
                self.relayout()?;
            }

            Notification::KeyPress { keycode, state } => {
                match self.keys.lookup(keycode, state) {
                    Some(action) => {
                        info!("key {} (state {:#x}) → {}", keycode, state, action);
                        self.apply(action);
                        let laid_out = self.relayout();
                        self.ws
                            .release_key(!self.consume_bound_keys)
                            .map_err(ws_err)?;
                        laid_out?;
                    }
                    None => {
                        debug!("key {} (state {:#x}) unbound, replaying", keycode, state);
                        self.ws.release_key(true).map_err(ws_err)?;
                    }
                }
            }

            Notification::ChildExited { pid, code } => {
                if self.registry.remove_process(pid) {
                    info!("pid {} exited, slot removed", pid);
                    self.relayout()?;
                }
                if let Some(code) = self.processes.reap(pid, code) {
                    return Ok(Flow::Exit(code));
                }
            }

            Notification::ConnectionLost => {
                info!("window system connection closed");
                return Ok(Flow::Exit(0));
            }
        }
        Ok(Flow::Continue)
    }

    /// Drain `notifications` until a handler asks to exit or every sender
    /// is gone.  Returns the process exit code.
    pub fn run(&mut self, notifications: mpsc::Receiver<Notification>) -> i32 {
        info!("gridded running");
        for notification in notifications {
            let flow = self.handle(notification);
            if let Err(e) = self.flush() {
                warn!("flush failed: {}", e);
            }
            match flow {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit(code)) => return code,
                Err(e) => error!("notification error: {}", e),
            }
        }
        info!("all notification sources closed, exiting");
        0
    }

    /// Mirror both title properties of the leading surface onto the
    /// container when the leader changed.
    fn sync_title(&mut self) -> Result<(), EmbedderError> {
        let leader = self.registry.leader();
        if leader == self.titled {
            return Ok(());
        }
        self.titled = leader;
        if let Some(surface) = leader {
            for property in TitleProperty::ALL {
                self.ws
                    .copy_title(surface, self.container.id, property)
                    .map_err(ws_err)?;
            }
        }
        Ok(())
    }
}

fn ws_err<E: std::error::Error>(e: E) -> EmbedderError {
    EmbedderError::WindowSystem(e.to_string())
}

//  Tests
