use std::collections::HashMap;

use maplit::hashmap;

use crate::editor::Mode;
use crate::event::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    InsertByte(u8),
    Backspace,

    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,

    /// Accumulate a digit of a numeric prefix.
    Digit(u8),
    /// Scroll the prefixed line (or the last line) to the top.
    GotoLine,

    SetMode(Mode),

    Quit,
}

pub struct KeyMap {
    pub all: HashMap<KeyCode, Action>,
    pub command: HashMap<KeyCode, Action>,
    pub insert: HashMap<KeyCode, Action>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::basic()
    }
}

impl KeyMap {
    pub fn basic() -> Self {
        let all = hashmap! {
            KeyCode::Left => Action::MoveLeft,
            KeyCode::Right => Action::MoveRight,
            KeyCode::Up => Action::MoveUp,
            KeyCode::Down => Action::MoveDown,
        };

        let mut command = hashmap! {
            KeyCode::Char(b'i') => Action::SetMode(Mode::Insert),

            KeyCode::Char(b'h') => Action::MoveLeft,
            KeyCode::Char(b'l') => Action::MoveRight,
            KeyCode::Char(b'k') => Action::MoveUp,
            KeyCode::Char(b'j') => Action::MoveDown,

            KeyCode::Char(b'G') => Action::GotoLine,

            KeyCode::Char(b'q') => Action::Quit,
        };
        for digit in b'0'..=b'9' {
            command.insert(KeyCode::Char(digit), Action::Digit(digit - b'0'));
        }

        let insert = hashmap! {
            KeyCode::Backspace => Action::Backspace,
            KeyCode::Escape => Action::SetMode(Mode::Command),
        };

        Self {
            all,
            command,
            insert,
        }
    }

    pub fn get_action(&self, mode: Mode, key: KeyCode) -> Option<Action> {
        match mode {
            Mode::Command => self
                .command
                .get(&key)
                .or_else(|| self.all.get(&key))
                .copied(),

            Mode::Insert => match key {
                KeyCode::Char(byte) if is_insertable(byte) => Some(Action::InsertByte(byte)),
                key => self.insert.get(&key).or_else(|| self.all.get(&key)).copied(),
            },
        }
    }
}

fn is_insertable(byte: u8) -> bool {
    byte == b'\t' || byte.is_ascii_graphic() || byte == b' '
}
