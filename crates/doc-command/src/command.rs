//! The command protocol: one reversible unit of document mutation.
//!
//! # Overview
//!
//! A [`Command`] encapsulates one forward mutation of the document together
//! with everything needed to reverse it later. Commands are created by UI
//! logic, bound to the cursor that issued them with
//! [`set_cursor`](Command::set_cursor), and handed to the
//! [`CommandQueue`](crate::CommandQueue), which executes them immediately and
//! keeps them for undo/redo.
//!
//! Binding captures a [`CursorSnapshot`] — the position and selection at
//! issue time. That snapshot never changes afterwards: it is where the edit
//! conceptually happened, and undo/redo replay against it no matter where the
//! live cursor has moved since (or whether it still exists; commands hold
//! only a weak handle).
//!
//! `execute`/`undo`/`redo` return `bool`. A `false` return means the
//! mutation could not be applied and the document is unchanged; commands
//! validate every precondition before touching the document.

use doc_model::{CursorAdjuster, CursorHandle, CursorRef, CursorSnapshot, Document};
use std::any::Any;
use std::rc::Rc;

/// Tag identifying a concrete command variant.
///
/// Used to gate merge eligibility (only identical types may merge) and for
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    /// Text insertion at a cursor.
    InsertText,
    /// Text deletion (selection or explicit range).
    DeleteText,
    /// Whole-element insertion.
    InsertElement,
    /// Whole-element deletion.
    DeleteElement,
    /// Table structure edit (rows, columns, cell merge/split).
    Table,
    /// Character format update over a range.
    CharFormat,
    /// Block format update of a paragraph or cell.
    BlockFormat,
    /// Page format update.
    PageFormat,
    /// Cut selection to the clipboard.
    Cut,
    /// Copy selection to the clipboard.
    Copy,
    /// Paste the clipboard at a cursor.
    Paste,
}

/// One reversible unit of document mutation.
pub trait Command {
    /// The variant tag of this command.
    fn command_type(&self) -> CommandType;

    /// Perform the forward mutation. Returns `false`, leaving the document
    /// unchanged, when the mutation cannot be applied.
    fn execute(&mut self, document: &mut Document, ctx: &CursorAdjuster) -> bool;

    /// Reverse a prior successful [`execute`](Self::execute). Returns `false`
    /// without touching the document when the stored undo state is absent.
    fn undo(&mut self, document: &mut Document, ctx: &CursorAdjuster) -> bool;

    /// Replay the forward mutation after an undo. Defaults to re-invoking
    /// [`execute`](Self::execute); variants whose execute derives data from
    /// transient state (e.g. the clipboard) override this to replay from
    /// their stored snapshot instead.
    fn redo(&mut self, document: &mut Document, ctx: &CursorAdjuster) -> bool {
        self.execute(document, ctx)
    }

    /// Offer to absorb `other` (a newer command) into this one so `other` can
    /// be discarded. Default refuses. Implementations must check
    /// [`command_type`](Self::command_type) before downcasting.
    fn merge(&mut self, other: &mut dyn Command) -> bool {
        let _ = other;
        false
    }

    /// Short text for undo/redo UI presentation.
    fn description(&self) -> String;

    /// Longer text for history views. Defaults to
    /// [`description`](Self::description).
    fn detailed_description(&self) -> String {
        self.description()
    }

    /// Bind the issuing cursor, capturing its state as the at-issue snapshot.
    fn set_cursor(&mut self, cursor: &CursorRef);

    /// The issuing cursor, if it still exists.
    fn cursor(&self) -> Option<CursorRef>;

    /// The immutable snapshot captured when the cursor was bound.
    fn cursor_at_issue(&self) -> &CursorSnapshot;

    /// Downcast support for the merge protocol.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Shared cursor-binding state every concrete command embeds.
///
/// Holds the weak handle to the issuing cursor and the at-issue snapshot, so
/// all variants get identical `set_cursor`/`cursor`/`cursor_at_issue`
/// behavior.
#[derive(Debug, Clone)]
pub struct CursorBinding {
    cursor: Option<CursorHandle>,
    at_issue: CursorSnapshot,
}

impl CursorBinding {
    /// An unbound binding with the invalid snapshot.
    pub fn new() -> Self {
        Self {
            cursor: None,
            at_issue: CursorSnapshot::INVALID,
        }
    }

    /// Bind `cursor` and capture its current state.
    pub fn bind(&mut self, cursor: &CursorRef) {
        self.cursor = Some(Rc::downgrade(cursor));
        self.at_issue = cursor.borrow().snapshot();
    }

    /// The bound cursor, if it still exists.
    pub fn cursor(&self) -> Option<CursorRef> {
        self.cursor.as_ref().and_then(CursorHandle::upgrade)
    }

    /// The at-issue snapshot.
    pub fn at_issue(&self) -> &CursorSnapshot {
        &self.at_issue
    }

    /// Whether a cursor was ever bound.
    pub fn is_bound(&self) -> bool {
        self.cursor.is_some()
    }
}

impl Default for CursorBinding {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Cursor, ElementCursor};

    #[test]
    fn test_binding_captures_snapshot_at_bind_time() {
        let cursor = Cursor::new_ref(ElementCursor::body(0, 3));
        let mut binding = CursorBinding::new();
        binding.bind(&cursor);

        cursor.borrow_mut().set_position(ElementCursor::body(0, 9));

        assert_eq!(binding.at_issue().position, ElementCursor::body(0, 3));
        assert!(binding.cursor().is_some());
    }

    #[test]
    fn test_binding_tolerates_dropped_cursor() {
        let cursor = Cursor::new_ref(ElementCursor::body(0, 0));
        let mut binding = CursorBinding::new();
        binding.bind(&cursor);
        drop(cursor);
        assert!(binding.cursor().is_none());
        assert!(binding.is_bound());
    }
}
