#![warn(missing_docs)]
//! Document Model - Rich-Document Tree for the Command Engine
//!
//! # Overview
//!
//! `doc-model` is the document-side collaborator of the `doc-command` undo/redo
//! engine. It provides the mutable state commands operate on, without any
//! rendering, layout, or page-geometry concern:
//!
//! - **Element Tree**: a flat sequence of elements (text blocks, tables,
//!   images, page breaks) with insert/remove/clone primitives
//! - **Text Storage**: per-block rope storage with char-offset addressing
//! - **Formats**: character format runs, block formats, and a page format,
//!   with partial-update patches that return prior state for undo
//! - **Cursor Addressing**: [`ElementCursor`] positions ordered by document
//!   order, live [`Cursor`] objects, and immutable [`CursorSnapshot`]s
//! - **Batch Cursor Adjustment**: a [`CursorAdjuster`] that every structural
//!   mutation consults so all live carets stay valid
//! - **Split Gating**: a [`SplitPolicy`] that decides whether an element may
//!   be split at a given position for a given reason
//!
//! # Example
//!
//! ```rust
//! use doc_model::{Cursor, CursorAdjuster, Document, ElementCursor};
//!
//! let mut doc = Document::new();
//! let cursor = Cursor::new_ref(ElementCursor::body(0, 0));
//!
//! let ctx = CursorAdjuster::for_cursors([&cursor]);
//! doc.insert_text(&ElementCursor::body(0, 0), "Hello", &ctx).unwrap();
//!
//! assert_eq!(doc.block_text(0).unwrap(), "Hello");
//! // The live cursor was shifted past the inserted text.
//! assert_eq!(cursor.borrow().position().offset, 5);
//! ```
//!
//! # Module Description
//!
//! - [`element`] - element tree node types and document fragments
//! - [`format`] - character/block/page format values and patches
//! - [`runs`] - run-length character format map
//! - [`text`] - grapheme-cluster boundary helpers
//! - [`cursor`] - cursor addressing, snapshots, and batch adjustment
//! - [`document`] - the document root and its mutation primitives

pub mod cursor;
pub mod document;
pub mod element;
pub mod format;
pub mod runs;
pub mod text;

pub use cursor::{
    Cursor, CursorAdjuster, CursorHandle, CursorRef, CursorSnapshot, ElementCursor, Region,
};
pub use document::{
    DefaultSplitPolicy, Document, DocumentError, SplitPolicy, SplitReason,
};
pub use element::{CellSpan, Element, Fragment, Image, Table, TextBlock};
pub use format::{
    Alignment, BlockFormat, BlockFormatPatch, CharFormat, CharFormatPatch, Color, PageFormat,
};
pub use runs::RunMap;
