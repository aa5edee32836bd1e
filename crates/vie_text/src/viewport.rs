use vie_gap_buffer::AllocError;

use crate::document::{Document, Line, LineId};

/// A line handle together with its 1-based line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LineRef {
    id: LineId,
    number: usize,
}

/// The window of a [`Document`] that is mapped onto the screen.
///
/// A viewport only holds handles into its document; every operation takes
/// the document it was attached to. When the document is rebuilt, the
/// viewport has to be rebuilt with it.
///
/// Invariant: when the window is non-empty, `first <= cur <= last` by line
/// number and `last - first < height`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Viewport {
    first: Option<LineRef>,
    last: Option<LineRef>,
    cur: Option<LineRef>,

    /// Column to try to move to, which may be past the end of the current
    /// line.
    curline_cursor: usize,

    height: usize,
    width: usize,
}

impl Viewport {
    /// Create a viewport showing the top of `doc`.
    ///
    /// Attaching to an empty document yields an inert viewport with every
    /// field zeroed.
    pub fn attach(doc: &Document, height: usize, width: usize) -> Self {
        let Some(head) = doc.head() else {
            return Self::default();
        };

        let first = LineRef { id: head, number: 1 };

        Self {
            first: Some(first),
            last: window_end(doc, first, height),
            cur: Some(first),
            curline_cursor: 0,
            height,
            width,
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// The number of the line at the top of the screen (0 if there is none).
    #[inline]
    pub fn top_line_number(&self) -> usize {
        self.first.map_or(0, |line| line.number)
    }

    /// The number of the line at the bottom of the screen (0 if there is
    /// none).
    #[inline]
    pub fn bottom_line_number(&self) -> usize {
        self.last.map_or(0, |line| line.number)
    }

    /// The number of the line holding the cursor (0 if there is none).
    #[inline]
    pub fn current_line_number(&self) -> usize {
        self.cur.map_or(0, |line| line.number)
    }

    #[inline]
    pub fn current_line(&self) -> Option<LineId> {
        self.cur.map(|line| line.id)
    }

    /// The remembered column, which survives visits to shorter lines.
    #[inline]
    pub fn desired_column(&self) -> usize {
        self.curline_cursor
    }

    /// The column the cursor actually sits at on the current line.
    pub fn column(&self, doc: &Document) -> usize {
        self.curline_cursor.min(self.current_line_len(doc))
    }

    /// Whether nothing can be shown, either because the document is empty or
    /// because the screen has no area.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.first.is_none() || self.height == 0 || self.width == 0
    }

    /// Scroll so that line `target` is at the top of the screen, or as close
    /// as the document allows.
    pub fn goto_line(&mut self, doc: &Document, target: usize) {
        if self.is_degenerate() {
            return;
        }
        let (Some(first), Some(cur)) = (self.first, self.cur) else {
            return;
        };

        let first = if target > first.number {
            walk_forward(doc, first, target - first.number)
        } else {
            walk_backward(doc, first, first.number - target.max(1))
        };
        let last = window_end(doc, first, self.height).unwrap_or(first);

        let cur = if cur.number < first.number {
            first
        } else if cur.number > last.number {
            last
        } else {
            cur
        };

        log::debug!(
            "goto line {target}: showing {}..={}, cursor on {}",
            first.number,
            last.number,
            cur.number
        );

        self.first = Some(first);
        self.last = Some(last);
        self.cur = Some(cur);
    }

    /// Move the cursor down a line, scrolling if it was on the bottom row.
    pub fn line_down(&mut self, doc: &Document) {
        if self.is_degenerate() {
            return;
        }
        let (Some(first), Some(last), Some(cur)) = (self.first, self.last, self.cur) else {
            return;
        };
        let Some(next) = doc.next(cur.id) else {
            return;
        };

        let next = LineRef {
            id: next,
            number: cur.number + 1,
        };

        if cur == last {
            self.first = Some(walk_forward(doc, first, 1));
            self.last = Some(next);
        }
        self.cur = Some(next);
    }

    /// Move the cursor up a line, scrolling if it was on the top row.
    pub fn line_up(&mut self, doc: &Document) {
        if self.is_degenerate() {
            return;
        }
        let (Some(first), Some(last), Some(cur)) = (self.first, self.last, self.cur) else {
            return;
        };
        let Some(prev) = doc.prev(cur.id) else {
            return;
        };

        let prev = LineRef {
            id: prev,
            number: cur.number - 1,
        };

        if cur == first {
            // A window cut short by the end of the document grows instead of
            // dropping its bottom line.
            if last.number - first.number + 1 == self.height {
                self.last = Some(walk_backward(doc, last, 1));
            }
            self.first = Some(prev);
        }
        self.cur = Some(prev);
    }

    /// Move the cursor one column left, stopping at the start of the line.
    pub fn char_left(&mut self, doc: &Document) {
        if self.is_degenerate() {
            return;
        }
        let column = self.column(doc);
        self.move_to_column(column, column.saturating_sub(1));
    }

    /// Move the cursor one column right, stopping at the end of the line.
    pub fn char_right(&mut self, doc: &Document) {
        if self.is_degenerate() {
            return;
        }
        let column = self.column(doc);
        self.move_to_column(column, (column + 1).min(self.current_line_len(doc)));
    }

    /// A move that the line's bounds stop short keeps the desired column.
    fn move_to_column(&mut self, from: usize, to: usize) {
        if to != from {
            self.curline_cursor = to;
        }
    }

    /// Adapt to a new screen size, keeping the top line where it is.
    pub fn resize(&mut self, doc: &Document, height: usize, width: usize) {
        let Some(first) = self.first else {
            return;
        };

        self.height = height;
        self.width = width;
        self.last = window_end(doc, first, height);

        if let (Some(cur), Some(last)) = (self.cur, self.last) {
            if cur.number > last.number {
                let len = doc.get(last.id).map_or(0, Line::len);
                self.cur = Some(last);
                self.curline_cursor = self.curline_cursor.min(len);
            }
        }

        log::debug!(
            "resized to {height}x{width}: showing {}..={}",
            self.top_line_number(),
            self.bottom_line_number()
        );
    }

    /// Insert a byte before the cursor on the current line.
    pub fn insert_char(&mut self, doc: &mut Document, byte: u8) -> Result<(), AllocError> {
        if self.is_degenerate() {
            return Ok(());
        }
        let column = self.column(doc);
        let Some(cur) = self.cur else {
            return Ok(());
        };
        let Some(line) = doc.get_mut(cur.id) else {
            return Ok(());
        };

        let buffer = line.buffer_mut();
        buffer.set_cursor(column);
        buffer.insert_before_cursor(byte)?;
        self.curline_cursor = buffer.cursor();

        Ok(())
    }

    /// Delete the byte before the cursor on the current line.
    ///
    /// Never joins lines: at the start of a line this does nothing and
    /// returns `false`.
    pub fn delete_char(&mut self, doc: &mut Document) -> bool {
        if self.is_degenerate() {
            return false;
        }
        let column = self.column(doc);
        let Some(cur) = self.cur else {
            return false;
        };
        let Some(line) = doc.get_mut(cur.id) else {
            return false;
        };

        let buffer = line.buffer_mut();
        buffer.set_cursor(column);
        let deleted = buffer.delete_before_cursor();
        self.curline_cursor = buffer.cursor();

        deleted
    }

    /// The lines on screen, top to bottom, each truncated to the width.
    pub fn visible_lines<'a>(&self, doc: &'a Document) -> VisibleLines<'a> {
        let (next, remaining) = match (self.first, self.last) {
            (Some(first), Some(last)) if !self.is_degenerate() => {
                (Some(first.id), last.number - first.number + 1)
            }
            _ => (None, 0),
        };

        VisibleLines {
            doc,
            next,
            remaining,
            width: self.width,
        }
    }

    /// The cursor position as `(row, col)` from the top-left of the screen.
    ///
    /// The column is kept on screen, so a cursor past the width sits on the
    /// last column.
    pub fn cursor_screen_position(&self, doc: &Document) -> Option<(usize, usize)> {
        if self.is_degenerate() {
            return None;
        }
        let (first, cur) = (self.first?, self.cur?);

        let row = cur.number - first.number;
        let col = self.column(doc).min(self.width - 1);

        Some((row, col))
    }

    fn current_line_len(&self, doc: &Document) -> usize {
        self.current_line()
            .and_then(|id| doc.get(id))
            .map_or(0, Line::len)
    }
}

fn walk_forward(doc: &Document, mut line: LineRef, steps: usize) -> LineRef {
    for _ in 0..steps {
        let Some(next) = doc.next(line.id) else {
            break;
        };
        line = LineRef {
            id: next,
            number: line.number + 1,
        };
    }
    line
}

fn walk_backward(doc: &Document, mut line: LineRef, steps: usize) -> LineRef {
    for _ in 0..steps {
        let Some(prev) = doc.prev(line.id) else {
            break;
        };
        line = LineRef {
            id: prev,
            number: line.number - 1,
        };
    }
    line
}

/// The bottom line of a window of `height` lines starting at `first`.
fn window_end(doc: &Document, first: LineRef, height: usize) -> Option<LineRef> {
    let steps = height.checked_sub(1)?;
    Some(walk_forward(doc, first, steps))
}

/// A line's content as it appears on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSlice<'a> {
    front: &'a [u8],
    back: &'a [u8],
}

impl<'a> LineSlice<'a> {
    fn new(line: &'a Line, width: usize) -> Self {
        let (front, back) = (line.buffer().front(), line.buffer().back());

        let front = &front[..front.len().min(width)];
        let back = &back[..back.len().min(width - front.len())];

        Self { front, back }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.front.len() + self.back.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The content in two pieces; the split point carries no meaning.
    #[inline]
    pub fn as_slices(&self) -> (&'a [u8], &'a [u8]) {
        (self.front, self.back)
    }

    #[inline]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = u8> + 'a {
        self.front.iter().chain(self.back).copied()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        [self.front, self.back].concat()
    }
}

/// Iterator returned by [`Viewport::visible_lines`]. Clone it to restart.
#[derive(Clone)]
pub struct VisibleLines<'a> {
    doc: &'a Document,
    next: Option<LineId>,
    remaining: usize,
    width: usize,
}

impl<'a> Iterator for VisibleLines<'a> {
    type Item = LineSlice<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let line = self.doc.get(self.next?)?;

        self.next = line.next();
        self.remaining -= 1;

        Some(LineSlice::new(line, self.width))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
