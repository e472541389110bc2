//! [`WindowSystem`] implementation backed by an X11 connection.

use super::events::X11EventSource;
use super::X11Error;
use crate::command::{Keycode, Pid, SurfaceId, TitleProperty};
use crate::grid::{Container, Rect};
use crate::traits::WindowSystem;
use log::{debug, info};
use std::sync::Arc;
use x11rb::connection::{Connection, RequestConnection};
use x11rb::properties::{WmHints, WmHintsState};
use x11rb::protocol::xproto::{
    Allow, Atom, AtomEnum, ChangeWindowAttributesAux, ConfigureWindowAux, ConnectionExt as _,
    CreateWindowAux, EventMask, GrabMode, ModMask, PropMode, Window, WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{COPY_DEPTH_FROM_PARENT, CURRENT_TIME};

/// Atoms interned once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Atoms {
    pub net_wm_pid: Atom,
    pub net_wm_name: Atom,
    pub utf8_string: Atom,
}

impl Atoms {
    pub fn intern<C: RequestConnection>(conn: &C) -> Result<Self, X11Error> {
        let pid = conn.intern_atom(false, b"_NET_WM_PID")?;
        let name = conn.intern_atom(false, b"_NET_WM_NAME")?;
        let utf8 = conn.intern_atom(false, b"UTF8_STRING")?;
        Ok(Self {
            net_wm_pid: pid.reply()?.atom,
            net_wm_name: name.reply()?.atom,
            utf8_string: utf8.reply()?.atom,
        })
    }

    /// Property atom and type atom of a title property.
    pub fn title(&self, property: TitleProperty) -> (Atom, Atom) {
        match property {
            TitleProperty::NetWmName => (self.net_wm_name, self.utf8_string),
            TitleProperty::WmName => (AtomEnum::WM_NAME.into(), AtomEnum::STRING.into()),
        }
    }
}

/// Events the container listens to on itself and its children.
fn container_event_mask() -> EventMask {
    EventMask::STRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_NOTIFY
}

/// X11-backed window system.
///
/// The connection is shared with the [`X11EventSource`] thread; requests
/// from the main thread and the blocking event wait interleave safely on a
/// [`RustConnection`].
pub struct X11WindowSystem {
    conn: Arc<RustConnection>,
    screen_num: usize,
    atoms: Atoms,
}

impl X11WindowSystem {
    /// Connect to the display named by `$DISPLAY`.
    pub fn connect() -> Result<Self, X11Error> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let atoms = Atoms::intern(&conn)?;
        info!("connected to X server, screen {}", screen_num);
        Ok(Self {
            conn: Arc::new(conn),
            screen_num,
            atoms,
        })
    }

    /// Create and map a new container window, as a child of `embed` when
    /// given, otherwise of the root window.
    pub fn create_container(&self, embed: Option<Window>) -> Result<Container, X11Error> {
        let screen = &self.conn.setup().roots[self.screen_num];
        let parent = embed.unwrap_or(screen.root);
        let win = self.conn.generate_id()?;
        let aux = CreateWindowAux::new()
            .background_pixel(0)
            .event_mask(container_event_mask());
        self.conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            win,
            parent,
            0,
            0,
            10,
            10,
            0,
            WindowClass::INPUT_OUTPUT,
            screen.root_visual,
            &aux,
        )?;

        let mut hints = WmHints::new();
        hints.input = Some(true);
        hints.initial_state = Some(WmHintsState::Normal);
        hints.set(&*self.conn, win)?;
        self.conn.change_property8(
            PropMode::REPLACE,
            win,
            AtomEnum::WM_CLASS,
            AtomEnum::STRING,
            b"gridded\0gridded\0",
        )?;
        self.conn.change_property32(
            PropMode::REPLACE,
            win,
            self.atoms.net_wm_pid,
            AtomEnum::CARDINAL,
            &[std::process::id()],
        )?;
        self.conn.map_window(win)?;
        info!("created container {:#x} under {:#x}", win, parent);

        Ok(Container {
            id: win,
            width: 10,
            height: 10,
        })
    }

    /// Use an existing window as the container.
    pub fn adopt_container(&self, win: Window) -> Result<Container, X11Error> {
        self.conn.change_window_attributes(
            win,
            &ChangeWindowAttributesAux::new().event_mask(container_event_mask()),
        )?;
        let geometry = self.conn.get_geometry(win)?.reply()?;
        info!(
            "adopted container {:#x} ({}x{})",
            win, geometry.width, geometry.height
        );
        Ok(Container {
            id: win,
            width: u32::from(geometry.width),
            height: u32::from(geometry.height),
        })
    }

    /// A notification source reading this connection's event stream.
    pub fn event_source(&self, container: SurfaceId) -> X11EventSource {
        X11EventSource::new(Arc::clone(&self.conn), container, self.atoms)
    }
}

impl WindowSystem for X11WindowSystem {
    type Error = X11Error;

    fn owner_pid(&self, surface: SurfaceId) -> Result<Option<Pid>, Self::Error> {
        let reply = self
            .conn
            .get_property(false, surface, self.atoms.net_wm_pid, AtomEnum::CARDINAL, 0, 1)?
            .reply()?;
        Ok(reply
            .value32()
            .and_then(|mut values| values.next())
            .filter(|&pid| pid != 0))
    }

    fn watch_metadata(&self, surface: SurfaceId) -> Result<(), Self::Error> {
        self.conn.change_window_attributes(
            surface,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
        )?;
        Ok(())
    }

    fn copy_title(
        &self,
        src: SurfaceId,
        dest: SurfaceId,
        property: TitleProperty,
    ) -> Result<(), Self::Error> {
        let (atom, ty) = self.atoms.title(property);
        let reply = self
            .conn
            .get_property(false, src, atom, ty, 0, u32::MAX)?
            .reply()?;
        if !reply.value.is_empty() {
            debug!("copy {:?} from {:#x} to {:#x}", property, src, dest);
            self.conn
                .change_property8(PropMode::REPLACE, dest, atom, ty, &reply.value)?;
        }
        Ok(())
    }

    fn clear_container(&self, container: &Container) -> Result<(), Self::Error> {
        let width = u16::try_from(container.width).unwrap_or(u16::MAX);
        let height = u16::try_from(container.height).unwrap_or(u16::MAX);
        self.conn.clear_area(true, container.id, 0, 0, width, height)?;
        Ok(())
    }

    fn configure_surface(&self, surface: SurfaceId, rect: Rect) -> Result<(), Self::Error> {
        // X rejects zero-sized windows.
        let aux = ConfigureWindowAux::new()
            .x(rect.x)
            .y(rect.y)
            .width(rect.width.max(1))
            .height(rect.height.max(1));
        self.conn.configure_window(surface, &aux)?;
        Ok(())
    }

    fn keycode_for(&self, keysym: u32) -> Result<Option<Keycode>, Self::Error> {
        let setup = self.conn.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let mapping = self.conn.get_keyboard_mapping(min, max - min + 1)?.reply()?;
        let per_keycode = usize::from(mapping.keysyms_per_keycode).max(1);
        Ok(mapping
            .keysyms
            .chunks(per_keycode)
            .position(|syms| syms.contains(&keysym))
            .and_then(|i| u8::try_from(i).ok())
            .map(|i| min + i))
    }

    fn grab_key(
        &self,
        window: SurfaceId,
        modifiers: u16,
        keycode: Keycode,
    ) -> Result<(), Self::Error> {
        self.conn.grab_key(
            true,
            window,
            ModMask::from(modifiers),
            keycode,
            GrabMode::ASYNC,
            GrabMode::SYNC,
        )?;
        Ok(())
    }

    fn release_key(&self, replay: bool) -> Result<(), Self::Error> {
        let mode = if replay {
            Allow::REPLAY_KEYBOARD
        } else {
            Allow::ASYNC_KEYBOARD
        };
        self.conn.allow_events(mode, CURRENT_TIME)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), Self::Error> {
        self.conn.flush()?;
        Ok(())
    }
}
