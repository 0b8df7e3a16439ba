//! Cursor addressing, snapshots, and batch adjustment.
//!
//! A [`Cursor`] is a live caret owned by the caller (typically one per view).
//! The command engine never owns cursors: it holds [`CursorHandle`] weak
//! references and tolerates any cursor being dropped between operations.
//!
//! Every document mutation receives a [`CursorAdjuster`] built from the live
//! cursors the engine currently tracks. The document consults it exactly once
//! per structural change so every caret keeps addressing the same content
//! after offsets or element indices shift.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Sub-element region an [`ElementCursor`] addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Region {
    /// The element's own text body.
    Body,
    /// A table cell.
    Cell {
        /// Zero-based row of the cell.
        row: usize,
        /// Zero-based column of the cell.
        col: usize,
    },
}

/// A position within the document tree: element index, region within the
/// element, and char offset within that region's text.
///
/// Ordering follows document order, so cursor positions can be compared to
/// normalize selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ElementCursor {
    /// Index of the element in the document.
    pub element: usize,
    /// Region within the element.
    pub region: Region,
    /// Char offset within the region's text.
    pub offset: usize,
}

impl ElementCursor {
    /// Position in an element's body text.
    pub fn body(element: usize, offset: usize) -> Self {
        Self {
            element,
            region: Region::Body,
            offset,
        }
    }

    /// Position in a table cell.
    pub fn cell(element: usize, row: usize, col: usize, offset: usize) -> Self {
        Self {
            element,
            region: Region::Cell { row, col },
            offset,
        }
    }

    /// Whether two positions address the same element region.
    pub fn same_region(&self, other: &ElementCursor) -> bool {
        self.element == other.element && self.region == other.region
    }
}

/// Immutable value snapshot of a cursor's state at a point in time.
///
/// Commands capture one of these when they are bound to a cursor; the
/// snapshot stays fixed for the command's whole life on the queue and is the
/// position undo/redo replays against, regardless of where the live cursor
/// has moved since.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorSnapshot {
    /// Primary position at capture time.
    pub position: ElementCursor,
    /// Selection anchor at capture time, `None` when nothing was selected.
    pub anchor: Option<ElementCursor>,
}

impl CursorSnapshot {
    /// Snapshot used by invalid command containers.
    pub const INVALID: CursorSnapshot = CursorSnapshot {
        position: ElementCursor {
            element: usize::MAX,
            region: Region::Body,
            offset: 0,
        },
        anchor: None,
    };

    /// Whether a selection was active at capture time.
    pub fn has_selection(&self) -> bool {
        matches!(self.anchor, Some(anchor) if anchor != self.position)
    }

    /// Selection bounds in document order, `None` without a selection.
    pub fn selection_range(&self) -> Option<(ElementCursor, ElementCursor)> {
        let anchor = self.anchor.filter(|anchor| *anchor != self.position)?;
        if anchor <= self.position {
            Some((anchor, self.position))
        } else {
            Some((self.position, anchor))
        }
    }
}

/// A live caret with an optional selection anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    position: ElementCursor,
    anchor: Option<ElementCursor>,
}

/// Shared handle to a live cursor. Owned by the caller.
pub type CursorRef = Rc<RefCell<Cursor>>;

/// Weak observer handle to a cursor. Held by commands and the queue so they
/// never extend a cursor's lifetime.
pub type CursorHandle = Weak<RefCell<Cursor>>;

impl Cursor {
    /// Create a caret at `position` with no selection.
    pub fn new(position: ElementCursor) -> Self {
        Self {
            position,
            anchor: None,
        }
    }

    /// Create a shared caret, the form views hand to the command engine.
    pub fn new_ref(position: ElementCursor) -> CursorRef {
        Rc::new(RefCell::new(Self::new(position)))
    }

    /// Current position.
    pub fn position(&self) -> ElementCursor {
        self.position
    }

    /// Current selection anchor, `None` when nothing is selected.
    pub fn anchor(&self) -> Option<ElementCursor> {
        self.anchor
    }

    /// Move the caret, dropping any selection.
    pub fn set_position(&mut self, position: ElementCursor) {
        self.position = position;
        self.anchor = None;
    }

    /// Select from `anchor` to `position`.
    pub fn select(&mut self, anchor: ElementCursor, position: ElementCursor) {
        self.anchor = Some(anchor);
        self.position = position;
    }

    /// Drop the selection, keeping the position.
    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }

    /// Capture the current state as an immutable snapshot.
    pub fn snapshot(&self) -> CursorSnapshot {
        CursorSnapshot {
            position: self.position,
            anchor: self.anchor,
        }
    }

    /// Restore position (and anchor, if the snapshot recorded a selection)
    /// from a snapshot.
    pub fn restore(&mut self, snapshot: &CursorSnapshot) {
        if snapshot.has_selection() {
            self.anchor = snapshot.anchor;
            self.position = snapshot.position;
        } else {
            self.set_position(snapshot.position);
        }
    }
}

/// Batch cursor-adjustment context.
///
/// Built once per document mutation from the live cursors the engine tracks;
/// dead weak handles are silently skipped. The document calls exactly one
/// adjustment method per structural change.
#[derive(Default)]
pub struct CursorAdjuster {
    cursors: Vec<CursorRef>,
}

impl CursorAdjuster {
    /// An adjuster over no cursors (mutations without cursor tracking).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from shared cursor references.
    pub fn for_cursors<'a>(cursors: impl IntoIterator<Item = &'a CursorRef>) -> Self {
        Self {
            cursors: cursors.into_iter().map(Rc::clone).collect(),
        }
    }

    /// Build from weak handles, skipping any cursor that no longer exists.
    pub fn from_handles(handles: &[CursorHandle]) -> Self {
        Self {
            cursors: handles.iter().filter_map(Weak::upgrade).collect(),
        }
    }

    /// Number of live cursors in this context.
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    /// Whether the context tracks no cursors.
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    fn adjust(&self, f: impl Fn(&mut ElementCursor)) {
        for cursor in &self.cursors {
            let mut cursor = cursor.borrow_mut();
            f(&mut cursor.position);
            if let Some(anchor) = cursor.anchor.as_mut() {
                f(anchor);
            }
        }
    }

    /// `len` characters were inserted at `at`. Carets at or past the insertion
    /// point shift right; a caret exactly at the point ends up after the new
    /// text, matching typing behavior.
    pub fn text_inserted(&self, at: &ElementCursor, len: usize) {
        self.adjust(|pos| {
            if pos.same_region(at) && pos.offset >= at.offset {
                pos.offset += len;
            }
        });
    }

    /// `len` characters were removed at `at`. Carets inside the removed range
    /// collapse to its start.
    pub fn text_removed(&self, at: &ElementCursor, len: usize) {
        self.adjust(|pos| {
            if pos.same_region(at) {
                if pos.offset >= at.offset + len {
                    pos.offset -= len;
                } else if pos.offset > at.offset {
                    pos.offset = at.offset;
                }
            }
        });
    }

    /// `count` elements were inserted at `index`.
    pub fn elements_inserted(&self, index: usize, count: usize) {
        self.adjust(|pos| {
            if pos.element >= index {
                pos.element += count;
            }
        });
    }

    /// `count` elements were removed at `index`. Carets inside a removed
    /// element collapse to the start of the element now at `index`.
    pub fn elements_removed(&self, index: usize, count: usize) {
        self.adjust(|pos| {
            if pos.element >= index + count {
                pos.element -= count;
            } else if pos.element >= index {
                *pos = ElementCursor::body(index, 0);
            }
        });
    }

    /// The element at `element` was split at `offset`: text at or past the
    /// offset moved to a new element at `element + 1`.
    pub fn element_split(&self, element: usize, offset: usize) {
        self.adjust(|pos| {
            if pos.element > element {
                pos.element += 1;
            } else if pos.element == element
                && pos.region == Region::Body
                && pos.offset >= offset
            {
                pos.element += 1;
                pos.offset -= offset;
            }
        });
    }

    /// The element at `element + 1` was merged into `element`, whose body held
    /// `join_offset` characters before the merge.
    pub fn elements_merged(&self, element: usize, join_offset: usize) {
        self.adjust(|pos| {
            if pos.element == element + 1 && pos.region == Region::Body {
                pos.element = element;
                pos.offset += join_offset;
            } else if pos.element > element + 1 {
                pos.element -= 1;
            }
        });
    }

    /// `count` rows were inserted at row `at` of the table at `element`.
    pub fn rows_inserted(&self, element: usize, at: usize, count: usize) {
        self.adjust(|pos| {
            if pos.element == element {
                if let Region::Cell { row, col } = pos.region {
                    if row >= at {
                        pos.region = Region::Cell {
                            row: row + count,
                            col,
                        };
                    }
                }
            }
        });
    }

    /// `count` rows were removed at row `at`; `remaining` rows are left.
    /// Carets in removed rows clamp to the nearest surviving row, offset 0.
    pub fn rows_removed(&self, element: usize, at: usize, count: usize, remaining: usize) {
        self.adjust(|pos| {
            if pos.element == element {
                if let Region::Cell { row, col } = pos.region {
                    if row >= at + count {
                        pos.region = Region::Cell {
                            row: row - count,
                            col,
                        };
                    } else if row >= at {
                        pos.region = Region::Cell {
                            row: at.min(remaining.saturating_sub(1)),
                            col,
                        };
                        pos.offset = 0;
                    }
                }
            }
        });
    }

    /// `count` columns were inserted at column `at` of the table at `element`.
    pub fn columns_inserted(&self, element: usize, at: usize, count: usize) {
        self.adjust(|pos| {
            if pos.element == element {
                if let Region::Cell { row, col } = pos.region {
                    if col >= at {
                        pos.region = Region::Cell {
                            row,
                            col: col + count,
                        };
                    }
                }
            }
        });
    }

    /// `count` columns were removed at column `at`; `remaining` columns are
    /// left.
    pub fn columns_removed(&self, element: usize, at: usize, count: usize, remaining: usize) {
        self.adjust(|pos| {
            if pos.element == element {
                if let Region::Cell { row, col } = pos.region {
                    if col >= at + count {
                        pos.region = Region::Cell {
                            row,
                            col: col - count,
                        };
                    } else if col >= at {
                        pos.region = Region::Cell {
                            row,
                            col: at.min(remaining.saturating_sub(1)),
                        };
                        pos.offset = 0;
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_order() {
        assert!(ElementCursor::body(0, 5) < ElementCursor::body(1, 0));
        assert!(ElementCursor::body(2, 3) < ElementCursor::body(2, 4));
        assert!(ElementCursor::body(1, 9) < ElementCursor::cell(1, 0, 0, 0));
    }

    #[test]
    fn test_snapshot_selection_range_is_ordered() {
        let snapshot = CursorSnapshot {
            position: ElementCursor::body(0, 2),
            anchor: Some(ElementCursor::body(0, 7)),
        };
        assert!(snapshot.has_selection());
        let (start, end) = snapshot.selection_range().unwrap();
        assert_eq!(start.offset, 2);
        assert_eq!(end.offset, 7);
    }

    #[test]
    fn test_collapsed_anchor_is_no_selection() {
        let snapshot = CursorSnapshot {
            position: ElementCursor::body(0, 2),
            anchor: Some(ElementCursor::body(0, 2)),
        };
        assert!(!snapshot.has_selection());
        assert_eq!(snapshot.selection_range(), None);
    }

    #[test]
    fn test_text_shifts() {
        let cursor = Cursor::new_ref(ElementCursor::body(0, 4));
        let ctx = CursorAdjuster::for_cursors([&cursor]);

        ctx.text_inserted(&ElementCursor::body(0, 4), 3);
        assert_eq!(cursor.borrow().position().offset, 7);

        ctx.text_inserted(&ElementCursor::body(0, 8), 3);
        assert_eq!(cursor.borrow().position().offset, 7);

        ctx.text_removed(&ElementCursor::body(0, 5), 4);
        assert_eq!(cursor.borrow().position().offset, 5);
    }

    #[test]
    fn test_element_removal_collapses_inside_cursor() {
        let cursor = Cursor::new_ref(ElementCursor::body(2, 9));
        let ctx = CursorAdjuster::for_cursors([&cursor]);
        ctx.elements_removed(1, 2);
        assert_eq!(cursor.borrow().position(), ElementCursor::body(1, 0));
    }

    #[test]
    fn test_split_and_merge_round_trip() {
        let cursor = Cursor::new_ref(ElementCursor::body(0, 6));
        let ctx = CursorAdjuster::for_cursors([&cursor]);

        ctx.element_split(0, 4);
        assert_eq!(cursor.borrow().position(), ElementCursor::body(1, 2));

        ctx.elements_merged(0, 4);
        assert_eq!(cursor.borrow().position(), ElementCursor::body(0, 6));
    }

    #[test]
    fn test_row_removal_clamps_into_surviving_row() {
        let cursor = Cursor::new_ref(ElementCursor::cell(0, 3, 1, 5));
        let ctx = CursorAdjuster::for_cursors([&cursor]);
        ctx.rows_removed(0, 2, 2, 2);
        assert_eq!(cursor.borrow().position(), ElementCursor::cell(0, 1, 1, 0));
    }

    #[test]
    fn test_dead_handles_are_skipped() {
        let cursor = Cursor::new_ref(ElementCursor::body(0, 0));
        let handle = Rc::downgrade(&cursor);
        drop(cursor);
        let ctx = CursorAdjuster::from_handles(&[handle]);
        assert!(ctx.is_empty());
        // Adjusting with no live cursors is a no-op, not an error.
        ctx.text_inserted(&ElementCursor::body(0, 0), 10);
    }
}
