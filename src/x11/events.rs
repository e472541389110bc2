//! X11 event stream as a [`NotificationSource`].
//!
//! Blocks on the shared connection and translates the handful of events the
//! embedder cares about into [`Notification`]s.  Everything else, including
//! asynchronous protocol errors, is logged and dropped.

use super::conn::Atoms;
use super::X11Error;
use crate::command::{Notification, SurfaceId, TitleProperty};
use crate::traits::NotificationSource;
use log::{debug, info, warn};
use std::sync::mpsc;
use std::sync::Arc;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::AtomEnum;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

/// A [`NotificationSource`] reading X11 events for one container.
pub struct X11EventSource {
    conn: Arc<RustConnection>,
    container: SurfaceId,
    atoms: Atoms,
}

impl X11EventSource {
    pub fn new(conn: Arc<RustConnection>, container: SurfaceId, atoms: Atoms) -> Self {
        Self {
            conn,
            container,
            atoms,
        }
    }
}

/// Translate one X11 event into a notification about `container`.
pub fn translate(event: &Event, container: SurfaceId, atoms: &Atoms) -> Option<Notification> {
    match event {
        Event::MapNotify(e) if e.window != container => {
            Some(Notification::SurfaceCreated { surface: e.window })
        }
        Event::DestroyNotify(e) => Some(Notification::SurfaceDestroyed { surface: e.window }),
        Event::ConfigureNotify(e) if e.window == container => {
            Some(Notification::ContainerResized {
                width: u32::from(e.width),
                height: u32::from(e.height),
            })
        }
        Event::PropertyNotify(e) => {
            let property = if e.atom == atoms.net_wm_name {
                TitleProperty::NetWmName
            } else if e.atom == u32::from(AtomEnum::WM_NAME) {
                TitleProperty::WmName
            } else {
                return None;
            };
            Some(Notification::MetadataChanged {
                surface: e.window,
                property,
            })
        }
        Event::KeyPress(e) => Some(Notification::KeyPress {
            keycode: e.detail,
            state: u16::from(e.state),
        }),
        _ => None,
    }
}

impl NotificationSource for X11EventSource {
    type Error = X11Error;

    /// Forward events until the connection breaks, then send
    /// [`Notification::ConnectionLost`].
    fn run(&mut self, sink: mpsc::Sender<Notification>) -> Result<(), Self::Error> {
        loop {
            let event = match self.conn.wait_for_event() {
                Ok(event) => event,
                Err(e) => {
                    info!("X connection closed: {}", e);
                    let _ = sink.send(Notification::ConnectionLost);
                    return Ok(());
                }
            };
            if let Event::Error(e) = &event {
                warn!("X error: {:?}", e);
                continue;
            }
            if let Some(notification) = translate(&event, self.container, &self.atoms) {
                debug!("received {:?}", notification);
                if sink.send(notification).is_err() {
                    info!("sink closed, shutting down");
                    return Ok(());
                }
            }
        }
    }
}

//  Tests
