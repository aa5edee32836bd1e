use std::ops::ControlFlow;

use vie_text::{Document, Viewport};

use crate::action::{Action, KeyMap};
use crate::event::{Event, KeyCode};

/// Rows at the bottom of the terminal that don't show the document.
pub const STATUS_ROWS: usize = 1;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Command,
    Insert,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Insert => "insert",
        }
    }
}

/// Everything needed to edit one open document.
///
/// The document and its viewport live and die together here; nothing else
/// holds on to either.
pub struct Editor {
    document: Document,
    viewport: Viewport,

    /// Terminal size, including the status rows.
    height: usize,
    width: usize,

    mode: Mode,
    keymap: KeyMap,

    /// Numeric prefix typed so far in command mode.
    count: Option<usize>,

    /// Message for the status line, cleared by the next key.
    message: Option<String>,
}

impl Editor {
    /// Open `document` on a terminal of the given size.
    pub fn new(document: Document, height: usize, width: usize) -> Self {
        let viewport = Viewport::attach(&document, text_rows(height), width);

        Self {
            document,
            viewport,
            height,
            width,
            mode: Mode::default(),
            keymap: KeyMap::default(),
            count: None,
            message: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The terminal size as `(height, width)`.
    pub fn screen_size(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn handle_event(&mut self, event: Event) -> ControlFlow<()> {
        match event {
            Event::Resize { height, width } => {
                self.height = height;
                self.width = width;
                self.viewport
                    .resize(&self.document, text_rows(height), width);
                ControlFlow::Continue(())
            }

            Event::Key(key) => self.handle_key(key),
        }
    }

    fn handle_key(&mut self, key: KeyCode) -> ControlFlow<()> {
        self.message = None;

        let Some(action) = self.keymap.get_action(self.mode, key) else {
            log::debug!("unbound key {key:?} in {} mode", self.mode.name());
            self.count = None;
            return ControlFlow::Continue(());
        };

        // A count only applies to the action right after it.
        let count = match action {
            Action::Digit(_) => None,
            _ => self.count.take(),
        };

        self.apply(action, count)
    }

    fn apply(&mut self, action: Action, count: Option<usize>) -> ControlFlow<()> {
        let doc = &mut self.document;
        let viewport = &mut self.viewport;

        match action {
            Action::InsertByte(byte) => {
                if let Err(err) = viewport.insert_char(doc, byte) {
                    log::error!("insert failed: {err}");
                    self.message = Some(format!("couldn't insert: {err}"));
                }
            }

            Action::Backspace => {
                viewport.delete_char(doc);
            }

            Action::MoveLeft => viewport.char_left(doc),
            Action::MoveRight => viewport.char_right(doc),
            Action::MoveUp => viewport.line_up(doc),
            Action::MoveDown => viewport.line_down(doc),

            Action::Digit(digit) => {
                let count = self.count.unwrap_or(0);
                self.count = Some(count.saturating_mul(10).saturating_add(usize::from(digit)));
            }

            Action::GotoLine => {
                let target = count.unwrap_or(doc.count());
                viewport.goto_line(doc, target);
            }

            Action::SetMode(mode) => self.switch_mode(mode),

            Action::Quit => return ControlFlow::Break(()),
        }

        ControlFlow::Continue(())
    }

    fn switch_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }

        log::info!("{} mode -> {} mode", self.mode.name(), mode.name());
        self.mode = mode;
    }
}

pub fn text_rows(height: usize) -> usize {
    height.saturating_sub(STATUS_ROWS)
}
