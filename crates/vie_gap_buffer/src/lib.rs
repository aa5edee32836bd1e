mod raw;

use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::Index;
use std::{ptr, slice};

use self::raw::RawBuf;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    #[error("capacity overflow")]
    CapacityOverflow,

    #[error("could not allocate {requested} bytes")]
    OutOfMemory { requested: usize },
}

/// A byte buffer with a movable gap, edited at a logical cursor.
///
/// The cursor is only the *intended* edit point: moving it is free, and the
/// gap is dragged over to it lazily by the next insertion or deletion. The
/// cost of an edit is therefore proportional to the distance the cursor
/// travelled since the previous edit, not to the length of the buffer.
///
/// ```text
///  content        gap         content
/// [0, gap_begin) [gap_begin, gap_end) [gap_end, capacity)
/// ```
pub struct GapBuffer {
    inner: RawBuf,
    len: usize,
    gap_begin: usize,
    gap_end: usize,
    cursor: usize,
}

impl Default for GapBuffer {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl GapBuffer {
    /// Create a new, empty gap buffer (without allocating).
    #[inline]
    pub const fn new() -> Self {
        Self {
            inner: RawBuf::new(),
            len: 0,
            gap_begin: 0,
            gap_end: 0,
            cursor: 0,
        }
    }

    /// Create an empty gap buffer whose gap spans `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        let inner = RawBuf::try_with_capacity(capacity)?;

        Ok(Self {
            inner,
            len: 0,
            gap_begin: 0,
            gap_end: capacity,
            cursor: 0,
        })
    }

    /// Create a buffer holding exactly `bytes`, with the cursor at the start.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AllocError> {
        let inner = RawBuf::try_with_capacity(bytes.len())?;

        // Safety: the allocation holds `bytes.len()` bytes and a borrowed
        // slice cannot alias it.
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), inner.as_ptr(), bytes.len()) };

        Ok(Self {
            inner,
            len: bytes.len(),
            gap_begin: bytes.len(),
            gap_end: bytes.len(),
            cursor: 0,
        })
    }

    /// The total capacity, content plus gap.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// The number of content bytes (not including the gap).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Place the cursor at `pos`, clamped to `[0, len]`.
    #[inline]
    pub fn set_cursor(&mut self, pos: usize) -> usize {
        self.cursor = pos.min(self.len);
        self.cursor
    }

    /// Move the cursor by `delta`, clamped to `[0, len]`.
    #[inline]
    pub fn move_cursor(&mut self, delta: isize) -> usize {
        self.cursor = self.cursor.saturating_add_signed(delta).min(self.len);
        self.cursor
    }

    /// Insert a byte before the cursor and advance the cursor past it.
    ///
    /// If the gap has to grow and the allocation fails, the content is left
    /// as it was.
    pub fn insert_before_cursor(&mut self, byte: u8) -> Result<(), AllocError> {
        self.sync();
        self.reserve_one()?;

        // Safety: `reserve_one` left at least one byte of gap.
        unsafe { ptr::write(self.gap_ptr(), byte) };

        self.gap_begin += 1;
        self.cursor += 1;
        self.len += 1;

        Ok(())
    }

    /// Delete the byte before the cursor.
    ///
    /// Returns `false` if there was nothing to delete.
    pub fn delete_before_cursor(&mut self) -> bool {
        self.sync();

        if self.len == 0 || self.cursor == 0 {
            return false;
        }

        self.cursor -= 1;
        self.gap_begin -= 1;
        self.len -= 1;

        if let Err(err) = self.shrink_if_sparse() {
            // The larger allocation is still valid, so the deletion stands.
            log::warn!("keeping {} byte line buffer: {err}", self.capacity());
        }

        true
    }

    /// Copy content into `dst`, returning the number of bytes written.
    ///
    /// At most `min(dst.len(), self.len())` bytes are copied.
    pub fn copy_out(&self, dst: &mut [u8]) -> usize {
        let (front, back) = (self.front(), self.back());

        let n_front = front.len().min(dst.len());
        dst[..n_front].copy_from_slice(&front[..n_front]);

        let n_back = back.len().min(dst.len() - n_front);
        dst[n_front..n_front + n_back].copy_from_slice(&back[..n_back]);

        n_front + n_back
    }

    /// The byte at logical position `pos`, or `None` past the end.
    #[inline]
    pub fn byte_at(&self, pos: usize) -> Option<u8> {
        self.get(pos).copied()
    }

    #[inline]
    pub fn get(&self, pos: usize) -> Option<&u8> {
        if pos >= self.len {
            return None;
        }

        let physical = if pos >= self.gap_begin {
            pos + self.gap_len()
        } else {
            pos
        };

        // Safety: `physical` indexes an initialized content byte.
        Some(unsafe { &*self.inner.as_ptr().add(physical) })
    }

    /// The content bytes before the gap.
    #[inline]
    pub fn front(&self) -> &[u8] {
        // Safety: `[0, gap_begin)` is initialized content.
        unsafe { slice::from_raw_parts(self.inner.as_ptr(), self.gap_begin) }
    }

    /// The content bytes after the gap.
    #[inline]
    pub fn back(&self) -> &[u8] {
        let back_len = self.capacity() - self.gap_end;
        // Safety: `[gap_end, capacity)` is initialized content.
        unsafe { slice::from_raw_parts(self.back_ptr(), back_len) }
    }

    #[inline]
    pub fn iter(&self) -> Bytes<'_> {
        Bytes {
            front: self.front().iter(),
            back: self.back().iter(),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(self.len);
        v.extend_from_slice(self.front());
        v.extend_from_slice(self.back());
        v
    }

    /// Drag the gap over so that it starts at the cursor.
    fn sync(&mut self) {
        match self.cursor.cmp(&self.gap_begin) {
            Ordering::Less => {
                let count = self.gap_begin - self.cursor;
                // Safety: `count` bytes before the gap move to its far end,
                // all within the allocation. `ptr::copy` allows overlap.
                let src_ptr = unsafe { self.inner.as_ptr().add(self.cursor) };
                let dest_ptr = unsafe { self.inner.as_ptr().add(self.gap_end - count) };

                unsafe { ptr::copy(src_ptr, dest_ptr, count) };

                self.gap_begin -= count;
                self.gap_end -= count;
            }

            Ordering::Equal => {}

            Ordering::Greater => {
                let count = self.cursor - self.gap_begin;

                // Safety: `cursor <= len`, so the `count` bytes after the gap
                // exist. `ptr::copy` allows overlap.
                unsafe { ptr::copy(self.back_ptr(), self.gap_ptr(), count) };

                self.gap_begin += count;
                self.gap_end += count;
            }
        }
    }

    /// Double the capacity if the gap is exhausted, moving the content after
    /// the gap to the new end.
    fn reserve_one(&mut self) -> Result<(), AllocError> {
        if self.gap_begin < self.gap_end {
            return Ok(());
        }

        let old_cap = self.capacity();
        let new_cap = match old_cap {
            0 => 1,
            cap => cap.checked_mul(2).ok_or(AllocError::CapacityOverflow)?,
        };

        let back_len = old_cap - self.gap_end;
        self.inner.try_set_capacity(new_cap)?;

        // Use offsets, the allocation could have moved.
        // Safety: the tail `[gap_end, old_cap)` was preserved by the resize
        // and `[new_gap_end, new_cap)` lies within the new allocation.
        let new_gap_end = new_cap - back_len;
        let src_ptr = unsafe { self.inner.as_ptr().add(self.gap_end) };
        let dest_ptr = unsafe { self.inner.as_ptr().add(new_gap_end) };

        unsafe { ptr::copy(src_ptr, dest_ptr, back_len) };

        self.gap_end = new_gap_end;

        log::trace!("grew line buffer {old_cap} -> {new_cap}");

        Ok(())
    }

    /// Halve the capacity once the content fits in a quarter of it.
    fn shrink_if_sparse(&mut self) -> Result<(), AllocError> {
        let old_cap = self.capacity();
        let new_cap = old_cap / 2;

        // Never shrink to zero: a buffer with content must keep its storage.
        if new_cap == 0 || self.len > old_cap / 4 {
            return Ok(());
        }

        let prev_cursor = self.cursor;

        // Pack all content at the front so that only gap is cut off.
        self.cursor = self.len;
        self.sync();

        let res = self.inner.try_set_capacity(new_cap);
        if res.is_ok() {
            self.gap_end = new_cap;
            log::trace!("shrank line buffer {old_cap} -> {new_cap}");
        }

        self.cursor = prev_cursor;

        res
    }

    #[inline]
    fn gap_ptr(&self) -> *mut u8 {
        // Safety: resulting pointer is within (or one past) the allocation
        unsafe { self.inner.as_ptr().add(self.gap_begin) }
    }

    #[inline]
    fn back_ptr(&self) -> *mut u8 {
        // Safety: resulting pointer is within (or one past) the allocation
        unsafe { self.inner.as_ptr().add(self.gap_end) }
    }

    #[inline]
    fn gap_len(&self) -> usize {
        self.gap_end - self.gap_begin
    }
}

impl Index<usize> for GapBuffer {
    type Output = u8;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        self.get(index).expect("index out of bounds")
    }
}

impl fmt::Debug for GapBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GapBuffer")
            .field("front", &String::from_utf8_lossy(self.front()))
            .field("back", &String::from_utf8_lossy(self.back()))
            .field("cursor", &self.cursor)
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// An iterator over the content bytes, skipping the gap.
#[derive(Clone)]
pub struct Bytes<'a> {
    front: slice::Iter<'a, u8>,
    back: slice::Iter<'a, u8>,
}

impl Iterator for Bytes<'_> {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<u8> {
        self.front.next().or_else(|| self.back.next()).copied()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.front.len() + self.back.len();
        (len, Some(len))
    }
}

impl DoubleEndedIterator for Bytes<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<u8> {
        self.back.next_back().or_else(|| self.front.next_back()).copied()
    }
}

impl ExactSizeIterator for Bytes<'_> {}
impl FusedIterator for Bytes<'_> {}

#[cfg(test)]
mod tests {
    use super::{AllocError, GapBuffer};

    fn filled(s: &[u8]) -> GapBuffer {
        let mut buf = GapBuffer::new();
        for &b in s {
            buf.insert_before_cursor(b).unwrap();
        }
        buf
    }

    #[test]
    fn zero_capacity() {
        let buf = GapBuffer::with_capacity(0).unwrap();
        assert_eq!(buf.capacity(), 0);
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.front(), b"");
        assert_eq!(buf.back(), b"");
    }

    #[test]
    fn out_of_memory() {
        let requested = isize::MAX as usize;
        let err = GapBuffer::with_capacity(requested).unwrap_err();

        assert_eq!(err, AllocError::OutOfMemory { requested });
        assert_eq!(
            err.to_string(),
            format!("could not allocate {requested} bytes")
        );
    }

    // A failing insert can only fail in `reserve_one`'s resize, which runs
    // before anything is written and leaves the old block in place (see
    // `raw::tests::out_of_memory_leaves_buffer_intact`). Reaching it through
    // `insert_before_cursor` would need a buffer of `isize::MAX / 2` bytes.

    #[test]
    fn insert_hello() {
        let buf = filled(b"hello");

        assert_eq!(buf.to_vec(), b"hello");
        assert_eq!(buf.len(), 5);
        assert_eq!(buf.cursor(), 5);
        assert_eq!(buf.capacity(), 8);
    }

    #[test]
    fn grows_from_nothing() {
        let mut buf = GapBuffer::with_capacity(0).unwrap();

        buf.insert_before_cursor(b'a').unwrap();
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.gap_begin, 1);
        assert_eq!(buf.cursor(), 1);

        buf.insert_before_cursor(b'b').unwrap();
        assert_eq!(buf.capacity(), 2);

        buf.insert_before_cursor(b'c').unwrap();
        assert_eq!(buf.capacity(), 4);
        assert_eq!(buf.to_vec(), b"abc");
    }

    #[test]
    fn delete_empty() {
        let mut buf = GapBuffer::new();

        assert!(!buf.delete_before_cursor());
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 0);
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn delete_at_start() {
        let mut buf = filled(b"abc");
        buf.set_cursor(0);

        assert!(!buf.delete_before_cursor());
        assert_eq!(buf.to_vec(), b"abc");
    }

    #[test]
    fn cursor_leads_gap() {
        let mut buf = GapBuffer::with_capacity(64).unwrap();
        assert_eq!(buf.gap_end - buf.gap_begin, 64);

        buf.insert_before_cursor(b'a').unwrap();
        assert_eq!(buf.cursor(), 1);
        assert_eq!(buf.gap_begin, 1);

        // Moving doesn't touch the gap until the next edit.
        buf.move_cursor(-1);
        assert_eq!(buf.cursor(), 0);
        assert_eq!(buf.gap_begin, 1);

        buf.insert_before_cursor(b'b').unwrap();
        assert_eq!(buf.to_vec(), b"ba");
        assert_eq!(buf.cursor(), 1);
        assert_eq!(buf.gap_begin, 1);
        assert_eq!(buf.capacity(), 64);
    }

    #[test]
    fn insert_in_middle() {
        let mut buf = filled(b"hello world");
        buf.set_cursor(5);
        buf.insert_before_cursor(b',').unwrap();

        assert_eq!(buf.front(), b"hello,");
        assert_eq!(buf.back(), b" world");
        assert_eq!(buf.to_vec(), b"hello, world");
    }

    #[test]
    fn insert_at_front_of_full_buffer() {
        let mut buf = GapBuffer::from_slice(b"bc").unwrap();
        assert_eq!(buf.capacity(), 2);
        assert_eq!(buf.cursor(), 0);

        buf.insert_before_cursor(b'a').unwrap();

        assert_eq!(buf.capacity(), 4);
        assert_eq!(buf.to_vec(), b"abc");
        assert_eq!(buf.cursor(), 1);
    }

    #[test]
    fn delete_in_middle() {
        let mut buf = filled(b"abcdefgh");
        buf.set_cursor(6);

        for _ in 0..4 {
            assert!(buf.delete_before_cursor());
        }

        assert_eq!(buf.to_vec(), b"abgh");
        assert_eq!(buf.cursor(), 2);
        assert_eq!(buf.capacity(), 8);
    }

    #[test]
    fn shrink_policy() {
        let mut buf = filled(b"abcdefgh");
        assert_eq!(buf.capacity(), 8);

        for _ in 0..5 {
            buf.delete_before_cursor();
        }
        assert_eq!(buf.to_vec(), b"abc");
        assert_eq!(buf.capacity(), 8);

        buf.delete_before_cursor();
        assert_eq!(buf.to_vec(), b"ab");
        assert_eq!(buf.capacity(), 4);

        buf.delete_before_cursor();
        assert_eq!(buf.to_vec(), b"a");
        assert_eq!(buf.capacity(), 2);

        buf.delete_before_cursor();
        assert_eq!(buf.to_vec(), b"");
        assert_eq!(buf.capacity(), 1);

        // Nothing left to delete, and the last byte of storage stays.
        assert!(!buf.delete_before_cursor());
        assert_eq!(buf.capacity(), 1);
    }

    #[test]
    fn single_byte_never_shrinks_to_zero() {
        let mut buf = filled(b"a");
        assert!(buf.delete_before_cursor());
        assert_eq!(buf.capacity(), 1);

        buf.insert_before_cursor(b'z').unwrap();
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.to_vec(), b"z");
    }

    #[test]
    fn shrink_restores_cursor() {
        let mut buf = filled(b"abcdefgh");
        buf.set_cursor(7);

        for _ in 0..6 {
            buf.delete_before_cursor();
        }

        assert_eq!(buf.to_vec(), b"ah");
        assert_eq!(buf.cursor(), 1);
        assert_eq!(buf.capacity(), 4);

        buf.insert_before_cursor(b'x').unwrap();
        assert_eq!(buf.to_vec(), b"axh");
    }

    #[test]
    fn cursor_clamps() {
        let mut buf = filled(b"abc");

        assert_eq!(buf.move_cursor(isize::MIN), 0);
        assert_eq!(buf.move_cursor(isize::MAX), 3);
        assert_eq!(buf.move_cursor(-2), 1);
        assert_eq!(buf.set_cursor(100), 3);
    }

    #[test]
    fn copy_out() {
        let mut buf = filled(b"hello world");
        buf.set_cursor(5);
        buf.insert_before_cursor(b',').unwrap();

        let mut small = [0; 4];
        assert_eq!(buf.copy_out(&mut small), 4);
        assert_eq!(&small, b"hell");

        let mut straddle = [0; 8];
        assert_eq!(buf.copy_out(&mut straddle), 8);
        assert_eq!(&straddle, b"hello, w");

        let mut large = [0; 64];
        assert_eq!(buf.copy_out(&mut large), 12);
        assert_eq!(&large[..12], b"hello, world");

        assert_eq!(buf.copy_out(&mut []), 0);
    }

    #[test]
    fn byte_at() {
        let mut buf = GapBuffer::with_capacity(16).unwrap();
        for &b in b"hello" {
            buf.insert_before_cursor(b).unwrap();
        }
        buf.set_cursor(1);
        buf.insert_before_cursor(b'_').unwrap();

        assert_eq!(buf.front(), b"h_");
        assert_eq!(buf.back(), b"ello");

        for (i, byte) in b"h_ello".iter().enumerate() {
            assert_eq!(buf.byte_at(i), Some(*byte));
            assert_eq!(&buf[i], byte);
        }

        assert_eq!(buf.byte_at(6), None);
    }

    #[test]
    #[should_panic = "index out of bounds"]
    fn index_out_of_bounds() {
        let buf = GapBuffer::new();
        let _ = buf[0];
    }

    #[test]
    fn from_slice() {
        let buf = GapBuffer::from_slice(b"line").unwrap();
        assert_eq!(buf.to_vec(), b"line");
        assert_eq!(buf.capacity(), 4);
        assert_eq!(buf.cursor(), 0);

        let empty = GapBuffer::from_slice(b"").unwrap();
        assert_eq!(empty.capacity(), 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn iterators() {
        let mut buf = filled(b"world");
        buf.set_cursor(0);
        buf.insert_before_cursor(b' ').unwrap();

        assert_eq!(buf.iter().len(), 6);
        assert_eq!(buf.iter().collect::<Vec<_>>(), b" world");
        assert_eq!(buf.iter().rev().collect::<Vec<_>>(), b"dlrow ");
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::GapBuffer;

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u8),
        Delete,
        Move(isize),
        Set(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => any::<u8>().prop_map(Op::Insert),
            2 => Just(Op::Delete),
            1 => (-40isize..40).prop_map(Op::Move),
            1 => (0usize..80).prop_map(Op::Set),
        ]
    }

    proptest! {
        #[test]
        fn insert_then_delete_round_trips(
            initial in prop::collection::vec(any::<u8>(), 0..64),
            pos in 0usize..64,
            inserted in prop::collection::vec(any::<u8>(), 0..64),
        ) {
            let mut buf = GapBuffer::from_slice(&initial).unwrap();
            buf.set_cursor(pos);
            let cursor = buf.cursor();

            for &b in &inserted {
                buf.insert_before_cursor(b).unwrap();
            }
            for _ in &inserted {
                prop_assert!(buf.delete_before_cursor());
            }

            prop_assert_eq!(buf.to_vec(), initial.clone());
            prop_assert_eq!(buf.len(), initial.len());
            prop_assert_eq!(buf.cursor(), cursor);
        }

        #[test]
        fn cursor_stays_in_bounds(
            initial in prop::collection::vec(any::<u8>(), 0..32),
            deltas in prop::collection::vec(any::<isize>(), 0..32),
        ) {
            let mut buf = GapBuffer::from_slice(&initial).unwrap();

            for delta in deltas {
                let cursor = buf.move_cursor(delta);
                prop_assert!(cursor <= buf.len());
            }
        }

        #[test]
        fn matches_vec_model(ops in prop::collection::vec(op_strategy(), 0..200)) {
            let mut buf = GapBuffer::new();
            let mut model: Vec<u8> = Vec::new();
            let mut cursor = 0usize;

            for op in ops {
                let prev_cap = buf.capacity();
                let prev_len = buf.len();

                match op {
                    Op::Insert(b) => {
                        buf.insert_before_cursor(b).unwrap();
                        model.insert(cursor, b);
                        cursor += 1;

                        if buf.capacity() != prev_cap {
                            // Growth only ever happens on an exhausted gap.
                            prop_assert_eq!(prev_len, prev_cap);
                            prop_assert_eq!(buf.capacity(), (prev_cap * 2).max(1));
                        }
                    }
                    Op::Delete => {
                        let deleted = buf.delete_before_cursor();
                        prop_assert_eq!(deleted, cursor > 0);
                        if deleted {
                            cursor -= 1;
                            model.remove(cursor);
                        }

                        if buf.capacity() != prev_cap {
                            prop_assert_eq!(buf.capacity(), prev_cap / 2);
                            prop_assert!(buf.len() <= prev_cap / 4);
                        }
                    }
                    Op::Move(delta) => {
                        cursor = buf.move_cursor(delta);
                        prop_assert_eq!(buf.capacity(), prev_cap);
                    }
                    Op::Set(pos) => {
                        cursor = buf.set_cursor(pos);
                        prop_assert_eq!(cursor, pos.min(model.len()));
                    }
                }

                prop_assert_eq!(buf.to_vec(), model.clone());
                prop_assert_eq!(buf.cursor(), cursor);
                prop_assert!(buf.len() <= buf.capacity());
                prop_assert!(buf.is_empty() || buf.capacity() > 0);
            }
        }

        #[test]
        fn copy_out_is_bounded_prefix(
            content in prop::collection::vec(any::<u8>(), 0..64),
            split in 0usize..64,
            max in 0usize..96,
        ) {
            let mut buf = GapBuffer::from_slice(&content).unwrap();
            // Open a gap in the middle of the content.
            buf.set_cursor(split);
            buf.insert_before_cursor(0).unwrap();
            buf.delete_before_cursor();

            let mut dst = vec![0xff; max];
            let n = buf.copy_out(&mut dst);

            prop_assert_eq!(n, max.min(content.len()));
            prop_assert_eq!(&dst[..n], &content[..n]);
        }
    }
}
