#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Space,
    ArrowLeft,
    ArrowRight,
    Character(char),
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    /// Shift only changes letter case; the others turn a key into a
    /// browser/OS shortcut the player must leave alone.
    pub fn blocks_shortcuts(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

impl From<Key> for KeyInput {
    fn from(key: Key) -> Self {
        Self::plain(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Exit fullscreen, or close the player when not fullscreen
    Escape,
    ToggleCinema,
    ToggleSidebars,
    ToggleBottomBar,
    TogglePlayPause,
    Previous,
    Next,
}

impl Shortcut {
    pub fn from_input(input: &KeyInput) -> Option<Self> {
        if input.modifiers.blocks_shortcuts() {
            return None;
        }

        match input.key {
            Key::Escape => Some(Self::Escape),
            Key::Space => Some(Self::TogglePlayPause),
            Key::ArrowLeft => Some(Self::Previous),
            Key::ArrowRight => Some(Self::Next),
            Key::Character(c) => match c.to_ascii_lowercase() {
                'h' => Some(Self::ToggleCinema),
                's' => Some(Self::ToggleSidebars),
                'b' => Some(Self::ToggleBottomBar),
                ' ' => Some(Self::TogglePlayPause),
                _ => None,
            },
            Key::Other => None,
        }
    }
}
