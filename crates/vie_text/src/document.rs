use slotmap::{new_key_type, SlotMap};
use vie_gap_buffer::{AllocError, GapBuffer};

new_key_type! {
    /// A handle to a line in a [`Document`].
    ///
    /// Handles are generational: once a line is removed its handle never
    /// resolves again, even if the slot is reused.
    pub struct LineId;
}

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("couldn't allocate line {line}")]
    Alloc {
        line: usize,
        #[source]
        source: AllocError,
    },
}

pub type DocumentResult<T> = Result<T, DocumentError>;

#[derive(Debug)]
pub struct Line {
    buffer: GapBuffer,
    prev: Option<LineId>,
    next: Option<LineId>,
}

impl Line {
    #[inline]
    pub fn buffer(&self) -> &GapBuffer {
        &self.buffer
    }

    #[inline]
    pub fn buffer_mut(&mut self) -> &mut GapBuffer {
        &mut self.buffer
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline]
    pub fn prev(&self) -> Option<LineId> {
        self.prev
    }

    #[inline]
    pub fn next(&self) -> Option<LineId> {
        self.next
    }
}

/// An ordered, doubly linked sequence of lines, each owning its own
/// [`GapBuffer`].
#[derive(Debug, Default)]
pub struct Document {
    lines: SlotMap<LineId, Line>,
    head: Option<LineId>,
    tail: Option<LineId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `blob` into lines on `\n`, dropping the terminators.
    ///
    /// A single trailing newline terminates the last line rather than
    /// starting an empty one, and an empty blob has no lines at all. If any
    /// line can't be allocated, nothing built so far is kept.
    pub fn from_bytes(blob: &[u8]) -> DocumentResult<Self> {
        let mut doc = Self::new();

        if blob.is_empty() {
            return Ok(doc);
        }

        let body = blob.strip_suffix(b"\n").unwrap_or(blob);

        for (i, segment) in body.split(|&b| b == b'\n').enumerate() {
            let buffer = GapBuffer::from_slice(segment)
                .map_err(|source| DocumentError::Alloc { line: i + 1, source })?;
            doc.push_back(buffer);
        }

        log::debug!("loaded {} lines from {} bytes", doc.count(), blob.len());

        Ok(doc)
    }

    /// The number of lines.
    #[inline]
    pub fn count(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[inline]
    pub fn head(&self) -> Option<LineId> {
        self.head
    }

    #[inline]
    pub fn tail(&self) -> Option<LineId> {
        self.tail
    }

    #[inline]
    pub fn get(&self, id: LineId) -> Option<&Line> {
        self.lines.get(id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: LineId) -> Option<&mut Line> {
        self.lines.get_mut(id)
    }

    #[inline]
    pub fn next(&self, id: LineId) -> Option<LineId> {
        self.get(id)?.next
    }

    #[inline]
    pub fn prev(&self, id: LineId) -> Option<LineId> {
        self.get(id)?.prev
    }

    #[inline]
    pub fn iter(&self) -> Lines<'_> {
        Lines {
            doc: self,
            next: self.head,
        }
    }

    /// Append a line at the end.
    pub fn push_back(&mut self, buffer: GapBuffer) -> LineId {
        let id = self.lines.insert(Line {
            buffer,
            prev: self.tail,
            next: None,
        });

        match self.tail {
            Some(tail) => self.lines[tail].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);

        id
    }

    /// Insert a line directly after `after`.
    ///
    /// Returns `None` (dropping `buffer`) if `after` is no longer in the
    /// document.
    pub fn insert_after(&mut self, after: LineId, buffer: GapBuffer) -> Option<LineId> {
        let next = self.get(after)?.next;

        let id = self.lines.insert(Line {
            buffer,
            prev: Some(after),
            next,
        });

        self.lines[after].next = Some(id);
        match next {
            Some(next) => self.lines[next].prev = Some(id),
            None => self.tail = Some(id),
        }

        Some(id)
    }

    /// Unlink and remove a line, handing back its buffer.
    pub fn remove(&mut self, id: LineId) -> Option<GapBuffer> {
        let line = self.lines.remove(id)?;

        match line.prev {
            Some(prev) => self.lines[prev].next = line.next,
            None => self.head = line.next,
        }
        match line.next {
            Some(next) => self.lines[next].prev = line.prev,
            None => self.tail = line.prev,
        }

        Some(line.buffer)
    }
}

/// Iterator over the lines of a [`Document`], head to tail.
#[derive(Clone)]
pub struct Lines<'a> {
    doc: &'a Document,
    next: Option<LineId>,
}

impl<'a> Iterator for Lines<'a> {
    type Item = (LineId, &'a Line);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let line = self.doc.get(id)?;
        self.next = line.next;
        Some((id, line))
    }
}
