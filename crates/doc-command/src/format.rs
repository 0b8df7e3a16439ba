//! Format update commands.
//!
//! One command covers character, block, and page format updates; the edit
//! variant decides the [`CommandType`]. Unlike text insertion, merging is not
//! inferred from content: the caller decides at construction time whether an
//! edit may coalesce with the previous one (a font dialog applying several
//! properties at once marks all but the first as mergeable, so the whole
//! dialog is one undo step).

use crate::command::{Command, CommandType, CursorBinding};
use doc_model::{
    BlockFormat, BlockFormatPatch, CharFormat, CharFormatPatch, CursorAdjuster, CursorRef,
    CursorSnapshot, Document, ElementCursor, PageFormat,
};
use std::any::Any;
use std::ops::Range;

/// Which format layer a [`FormatCommand`] updates.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatEdit {
    /// Patch character formatting over a char range of one block.
    Char {
        /// Block the range lies in.
        at: ElementCursor,
        /// Char range the patch applies to.
        range: Range<usize>,
        /// Properties to change.
        patch: CharFormatPatch,
    },
    /// Patch a block's paragraph formatting.
    Block {
        /// Block to reformat.
        at: ElementCursor,
        /// Properties to change.
        patch: BlockFormatPatch,
    },
    /// Replace the page format.
    Page(PageFormat),
}

impl FormatEdit {
    /// Whether two edits target the same scope, the merge precondition.
    fn same_scope(&self, other: &FormatEdit) -> bool {
        match (self, other) {
            (
                FormatEdit::Char { at, range, .. },
                FormatEdit::Char {
                    at: other_at,
                    range: other_range,
                    ..
                },
            ) => at.same_region(other_at) && range == other_range,
            (FormatEdit::Block { at, .. }, FormatEdit::Block { at: other_at, .. }) => {
                at.same_region(other_at)
            }
            (FormatEdit::Page(_), FormatEdit::Page(_)) => true,
            _ => false,
        }
    }
}

/// Prior state captured by execute.
enum FormatUndo {
    Char(Vec<(Range<usize>, CharFormat)>),
    Block(BlockFormat),
    Page(PageFormat),
}

/// Apply a format patch, keeping the replaced state for undo.
pub struct FormatCommand {
    binding: CursorBinding,
    edit: FormatEdit,
    undo_state: Option<FormatUndo>,
    allow_merge: bool,
}

impl FormatCommand {
    /// Patch character formatting over `range` of the block at `at`.
    pub fn char_format(at: ElementCursor, range: Range<usize>, patch: CharFormatPatch) -> Self {
        Self::new(FormatEdit::Char { at, range, patch })
    }

    /// Patch the paragraph formatting of the block at `at`.
    pub fn block_format(at: ElementCursor, patch: BlockFormatPatch) -> Self {
        Self::new(FormatEdit::Block { at, patch })
    }

    /// Replace the page format.
    pub fn page_format(format: PageFormat) -> Self {
        Self::new(FormatEdit::Page(format))
    }

    fn new(edit: FormatEdit) -> Self {
        Self {
            binding: CursorBinding::new(),
            edit,
            undo_state: None,
            allow_merge: false,
        }
    }

    /// Mark this command as allowed to merge into the previous format command
    /// of the same scope.
    pub fn with_merge_allowed(mut self) -> Self {
        self.allow_merge = true;
        self
    }
}

impl Command for FormatCommand {
    fn command_type(&self) -> CommandType {
        match self.edit {
            FormatEdit::Char { .. } => CommandType::CharFormat,
            FormatEdit::Block { .. } => CommandType::BlockFormat,
            FormatEdit::Page(_) => CommandType::PageFormat,
        }
    }

    fn execute(&mut self, document: &mut Document, _ctx: &CursorAdjuster) -> bool {
        match &self.edit {
            FormatEdit::Char { at, range, patch } => {
                match document.set_char_format(at, range.clone(), patch) {
                    Ok(saved) => {
                        self.undo_state = Some(FormatUndo::Char(saved));
                        true
                    }
                    Err(_) => false,
                }
            }
            FormatEdit::Block { at, patch } => match document.set_block_format(at, patch) {
                Ok(old) => {
                    self.undo_state = Some(FormatUndo::Block(old));
                    true
                }
                Err(_) => false,
            },
            FormatEdit::Page(format) => {
                let old = document.set_page_format(*format);
                self.undo_state = Some(FormatUndo::Page(old));
                true
            }
        }
    }

    fn undo(&mut self, document: &mut Document, _ctx: &CursorAdjuster) -> bool {
        match (&self.edit, self.undo_state.take()) {
            (FormatEdit::Char { at, .. }, Some(FormatUndo::Char(saved))) => {
                if document.restore_char_format(at, &saved).is_err() {
                    self.undo_state = Some(FormatUndo::Char(saved));
                    return false;
                }
                true
            }
            (FormatEdit::Block { at, .. }, Some(FormatUndo::Block(old))) => {
                if document.restore_block_format(at, old.clone()).is_err() {
                    self.undo_state = Some(FormatUndo::Block(old));
                    return false;
                }
                true
            }
            (FormatEdit::Page(_), Some(FormatUndo::Page(old))) => {
                document.set_page_format(old);
                true
            }
            (_, state) => {
                self.undo_state = state;
                false
            }
        }
    }

    /// Merge gated by the caller's flag on the *incoming* command, identical
    /// type, and identical target scope. The existing command keeps its
    /// original undo state, so one undo after a merged run restores the
    /// pre-dialog formatting; the incoming patch is absorbed with
    /// later-wins semantics.
    fn merge(&mut self, other: &mut dyn Command) -> bool {
        if other.command_type() != self.command_type() {
            return false;
        }
        let Some(incoming) = other.as_any_mut().downcast_mut::<FormatCommand>() else {
            return false;
        };
        if !incoming.allow_merge || !self.edit.same_scope(&incoming.edit) {
            return false;
        }
        match (&mut self.edit, &incoming.edit) {
            (FormatEdit::Char { patch, .. }, FormatEdit::Char { patch: later, .. }) => {
                patch.absorb(later);
            }
            (FormatEdit::Block { patch, .. }, FormatEdit::Block { patch: later, .. }) => {
                patch.absorb(later);
            }
            (FormatEdit::Page(format), FormatEdit::Page(later)) => {
                *format = *later;
            }
            _ => return false,
        }
        true
    }

    fn description(&self) -> String {
        match self.edit {
            FormatEdit::Char { .. } => "format characters",
            FormatEdit::Block { .. } => "format paragraph",
            FormatEdit::Page(_) => "format page",
        }
        .to_string()
    }

    fn set_cursor(&mut self, cursor: &CursorRef) {
        self.binding.bind(cursor);
    }

    fn cursor(&self) -> Option<CursorRef> {
        self.binding.cursor()
    }

    fn cursor_at_issue(&self) -> &CursorSnapshot {
        self.binding.at_issue()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
