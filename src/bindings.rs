//! Key bindings.
//!
//! A [`KeyBinding`] names a key symbolically (`"space"`, `"f"`) so it can be
//! written in the config file.  [`KeyTable::grab`] resolves every binding
//! once to a physical key code and grabs it on the container; afterwards
//! [`KeyTable::lookup`] matches incoming key presses exactly, ignoring only
//! the NumLock bit.

use crate::command::{Action, Keycode, SurfaceId};
use crate::traits::WindowSystem;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Modifier bits as used in X11 key and button masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Shift,
    Lock,
    Control,
    Mod1,
    Mod2,
    Mod3,
    Mod4,
    Mod5,
}

impl Modifier {
    pub fn mask(self) -> u16 {
        match self {
            Modifier::Shift => 1 << 0,
            Modifier::Lock => 1 << 1,
            Modifier::Control => 1 << 2,
            Modifier::Mod1 => 1 << 3,
            Modifier::Mod2 => 1 << 4,
            Modifier::Mod3 => 1 << 5,
            Modifier::Mod4 => 1 << 6,
            Modifier::Mod5 => 1 << 7,
        }
    }
}

/// Modifier that is masked out before matching (NumLock on most maps).
pub const IGNORE_MASK: u16 = 1 << 4;

/// A binding as written by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    pub key: String,
    pub action: Action,
}

impl KeyBinding {
    pub fn new(modifiers: &[Modifier], key: &str, action: Action) -> Self {
        Self {
            modifiers: modifiers.to_vec(),
            key: key.to_string(),
            action,
        }
    }

    pub fn modifier_mask(&self) -> u16 {
        self.modifiers.iter().fold(0, |m, k| m | k.mask())
    }
}

/// `Ctrl+space` mirrors, `Ctrl+f` toggles full mode.
pub fn default_bindings() -> Vec<KeyBinding> {
    vec![
        KeyBinding::new(&[Modifier::Control], "space", Action::Mirror),
        KeyBinding::new(&[Modifier::Control], "f", Action::ToggleFull),
    ]
}

/// Map a symbolic key name to its keysym.
///
/// Covers the Latin-1 printable range by character and a handful of named
/// keys.
pub fn keysym_from_name(name: &str) -> Option<u32> {
    let named = match name.to_ascii_lowercase().as_str() {
        "space" => Some(0x0020),
        "return" | "enter" => Some(0xff0d),
        "tab" => Some(0xff09),
        "escape" | "esc" => Some(0xff1b),
        "backspace" => Some(0xff08),
        "left" => Some(0xff51),
        "up" => Some(0xff52),
        "right" => Some(0xff53),
        "down" => Some(0xff54),
        _ => None,
    };
    if named.is_some() {
        return named;
    }
    if let Some(n) = name
        .strip_prefix(['F', 'f'])
        .and_then(|n| n.parse::<u32>().ok())
    {
        if (1..=12).contains(&n) {
            return Some(0xffbe + n - 1);
        }
    }
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_graphic() => Some(c.to_ascii_lowercase() as u32),
        _ => None,
    }
}

/// A binding resolved against the current keyboard map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedBinding {
    pub modifiers: u16,
    pub keycode: Keycode,
    pub action: Action,
}

/// The resolved binding table consulted on every key press.
#[derive(Debug, Clone, Default)]
pub struct KeyTable {
    bindings: Vec<ResolvedBinding>,
}

impl KeyTable {
    pub fn new(bindings: Vec<ResolvedBinding>) -> Self {
        Self { bindings }
    }

    /// Resolve `bindings` and grab each on `window`, with and without
    /// [`IGNORE_MASK`].  Keys missing from the keyboard map are skipped.
    pub fn grab<W: WindowSystem>(
        ws: &W,
        window: SurfaceId,
        bindings: &[KeyBinding],
    ) -> Result<Self, W::Error> {
        let mut resolved = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let Some(keysym) = keysym_from_name(&binding.key) else {
                warn!("unknown key name {:?} for {}", binding.key, binding.action);
                continue;
            };
            let Some(keycode) = ws.keycode_for(keysym)? else {
                warn!(
                    "no keycode for {:?} (keysym {:#x}), {} is unbound",
                    binding.key, keysym, binding.action
                );
                continue;
            };
            let modifiers = binding.modifier_mask() & !IGNORE_MASK;
            ws.grab_key(window, modifiers | IGNORE_MASK, keycode)?;
            ws.grab_key(window, modifiers, keycode)?;
            info!(
                "grabbed {} (keycode {}, mods {:#x})",
                binding.action, keycode, modifiers
            );
            resolved.push(ResolvedBinding {
                modifiers,
                keycode,
                action: binding.action,
            });
        }
        Ok(Self::new(resolved))
    }

    /// The action bound to a press of `keycode` with modifier `state`.
    pub fn lookup(&self, keycode: Keycode, state: u16) -> Option<Action> {
        let state = state & !IGNORE_MASK;
        self.bindings
            .iter()
            .find(|b| b.keycode == keycode && b.modifiers == state)
            .map(|b| b.action)
    }

    pub fn bindings(&self) -> &[ResolvedBinding] {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Pid, TitleProperty};
    use crate::grid::{Container, Rect};
    use std::cell::RefCell;

    /// Keyboard map stub that knows `space` and `f`.
    #[derive(Default)]
    struct KeymapWs {
        grabs: RefCell<Vec<(SurfaceId, u16, Keycode)>>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("keymap error")]
    struct KeymapError;

    impl WindowSystem for KeymapWs {
        type Error = KeymapError;

        fn owner_pid(&self, _: SurfaceId) -> Result<Option<Pid>, KeymapError> {
            Ok(None)
        }
        fn watch_metadata(&self, _: SurfaceId) -> Result<(), KeymapError> {
            Ok(())
        }
        fn copy_title(
            &self,
            _: SurfaceId,
            _: SurfaceId,
            _: TitleProperty,
        ) -> Result<(), KeymapError> {
            Ok(())
        }
        fn clear_container(&self, _: &Container) -> Result<(), KeymapError> {
            Ok(())
        }
        fn configure_surface(&self, _: SurfaceId, _: Rect) -> Result<(), KeymapError> {
            Ok(())
        }
        fn keycode_for(&self, keysym: u32) -> Result<Option<Keycode>, KeymapError> {
            Ok(match keysym {
                0x20 => Some(65),
                0x66 => Some(41),
                _ => None,
            })
        }
        fn grab_key(
            &self,
            window: SurfaceId,
            modifiers: u16,
            keycode: Keycode,
        ) -> Result<(), KeymapError> {
            self.grabs.borrow_mut().push((window, modifiers, keycode));
            Ok(())
        }
        fn release_key(&self, _: bool) -> Result<(), KeymapError> {
            Ok(())
        }
        fn flush(&self) -> Result<(), KeymapError> {
            Ok(())
        }
    }

    const CONTROL: u16 = 1 << 2;

    #[test]
    fn keysym_names() {
        assert_eq!(keysym_from_name("space"), Some(0x20));
        assert_eq!(keysym_from_name("f"), Some(0x66));
        assert_eq!(keysym_from_name("F"), Some(0x66));
        assert_eq!(keysym_from_name("F5"), Some(0xffc2));
        assert_eq!(keysym_from_name("Return"), Some(0xff0d));
        assert_eq!(keysym_from_name("1"), Some(0x31));
        assert_eq!(keysym_from_name("nonsense"), None);
        assert_eq!(keysym_from_name(""), None);
    }

    #[test]
    fn default_bindings_grab_with_and_without_numlock() {
        let ws = KeymapWs::default();
        let table = KeyTable::grab(&ws, 0x400, &default_bindings()).unwrap();
        assert_eq!(table.bindings().len(), 2);
        let grabs = ws.grabs.borrow();
        assert_eq!(
            *grabs,
            vec![
                (0x400, CONTROL | IGNORE_MASK, 65),
                (0x400, CONTROL, 65),
                (0x400, CONTROL | IGNORE_MASK, 41),
                (0x400, CONTROL, 41),
            ]
        );
    }

    #[test]
    fn unresolvable_keys_are_skipped() {
        let ws = KeymapWs::default();
        let bindings = vec![
            KeyBinding::new(&[Modifier::Control], "x", Action::Mirror),
            KeyBinding::new(&[Modifier::Control], "not-a-key", Action::Mirror),
            KeyBinding::new(&[Modifier::Control], "f", Action::ToggleFull),
        ];
        let table = KeyTable::grab(&ws, 1, &bindings).unwrap();
        assert_eq!(table.bindings().len(), 1);
        assert_eq!(table.bindings()[0].action, Action::ToggleFull);
    }

    #[test]
    fn lookup_ignores_numlock_only() {
        let ws = KeymapWs::default();
        let table = KeyTable::grab(&ws, 1, &default_bindings()).unwrap();
        assert_eq!(table.lookup(65, CONTROL), Some(Action::Mirror));
        assert_eq!(table.lookup(65, CONTROL | IGNORE_MASK), Some(Action::Mirror));
        assert_eq!(table.lookup(41, CONTROL), Some(Action::ToggleFull));
        // Shift is not ignored: exact match only.
        assert_eq!(table.lookup(65, CONTROL | Modifier::Shift.mask()), None);
        assert_eq!(table.lookup(65, 0), None);
        assert_eq!(table.lookup(99, CONTROL), None);
    }

    #[test]
    fn binding_deserializes_from_config_form() {
        let json = r#"{ "modifiers": ["control", "shift"], "key": "m", "action": "mirror" }"#;
        let b: KeyBinding = serde_json::from_str(json).unwrap();
        assert_eq!(b.modifier_mask(), CONTROL | 1);
        assert_eq!(b.action, Action::Mirror);
    }
}
