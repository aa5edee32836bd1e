//! Line storage and the scrolling window over it.
//!
//! A [`Document`] owns its lines, and each line owns a gap buffer. A
//! [`Viewport`] tracks which lines are on screen and where the cursor is,
//! holding only handles into the document it was attached to.

pub mod document;
pub mod viewport;

pub use document::{Document, DocumentError, DocumentResult, Line, LineId};
pub use viewport::{LineSlice, Viewport, VisibleLines};
