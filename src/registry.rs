//! The window-slot registry.
//!
//! One [`WindowSlot`] exists per spawned process.  A slot starts unbound
//! and is bound to a surface once the process maps a window that
//! advertises its pid.  Slots live in a dense `Vec`; the position of a slot
//! is its place in row-major layout order, so removal shifts the remainder
//! down instead of leaving a hole.

use crate::command::{Pid, SurfaceId};
use log::debug;

/// Upper bound on the number of tracked processes.
pub const MAX_SLOTS: usize = 255;

/// A spawned process and, once it appeared, its surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSlot {
    pub pid: Pid,
    pub surface: Option<SurfaceId>,
}

/// Errors from reserving slots.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("cannot track more than {MAX_SLOTS} processes")]
    CapacityExceeded,
    #[error("process {0} already has a slot")]
    DuplicateProcess(Pid),
}

/// Fail when `count` processes would not fit in a registry.
pub fn check_capacity(count: usize) -> Result<(), RegistryError> {
    if count > MAX_SLOTS {
        return Err(RegistryError::CapacityExceeded);
    }
    Ok(())
}

/// Ordered collection of [`WindowSlot`]s.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    slots: Vec<WindowSlot>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an unbound slot for `pid` and return its index.
    pub fn reserve_slot(&mut self, pid: Pid) -> Result<usize, RegistryError> {
        if self.slots.len() >= MAX_SLOTS {
            return Err(RegistryError::CapacityExceeded);
        }
        if self.slots.iter().any(|s| s.pid == pid) {
            return Err(RegistryError::DuplicateProcess(pid));
        }
        self.slots.push(WindowSlot { pid, surface: None });
        Ok(self.slots.len() - 1)
    }

    /// Bind `surface` to the first unbound slot owned by `pid`.
    ///
    /// Returns `false` when nothing matches.  Such surfaces (grandchildren,
    /// foreign windows, remaps of an already-bound process) are never laid
    /// out.
    pub fn bind_surface(&mut self, surface: SurfaceId, pid: Pid) -> bool {
        if self.contains_surface(surface) {
            return false;
        }
        match self
            .slots
            .iter_mut()
            .find(|s| s.pid == pid && s.surface.is_none())
        {
            Some(slot) => {
                slot.surface = Some(surface);
                true
            }
            None => {
                debug!("surface {:#x} (pid {}) matches no pending slot", surface, pid);
                false
            }
        }
    }

    /// Remove the slot holding `surface`, compacting the rest.
    pub fn unbind_surface(&mut self, surface: SurfaceId) -> bool {
        match self.slots.iter().position(|s| s.surface == Some(surface)) {
            Some(i) => {
                self.slots.remove(i);
                true
            }
            None => false,
        }
    }

    /// Remove the slot owned by `pid`, compacting the rest.
    pub fn remove_process(&mut self, pid: Pid) -> bool {
        match self.slots.iter().position(|s| s.pid == pid) {
            Some(i) => {
                self.slots.remove(i);
                true
            }
            None => false,
        }
    }

    /// Swap every even slot with its odd successor.  An odd trailing slot
    /// stays in place.
    pub fn mirror(&mut self) {
        for pair in self.slots.chunks_exact_mut(2) {
            pair.swap(0, 1);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[WindowSlot] {
        &self.slots
    }

    /// Bound surfaces in slot order.
    pub fn bound_surfaces(&self) -> Vec<SurfaceId> {
        self.slots.iter().filter_map(|s| s.surface).collect()
    }

    /// The surface of slot 0, if that slot is bound.
    pub fn leader(&self) -> Option<SurfaceId> {
        self.slots.first().and_then(|s| s.surface)
    }

    pub fn contains_surface(&self, surface: SurfaceId) -> bool {
        self.slots.iter().any(|s| s.surface == Some(surface))
    }
}
