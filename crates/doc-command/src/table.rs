//! Table structure commands.
//!
//! Every table edit is a discrete structural change: these commands never
//! merge, so each row/column/cell operation stays its own undo step.

use crate::command::{Command, CommandType, CursorBinding};
use doc_model::{CellSpan, CursorAdjuster, CursorRef, CursorSnapshot, Document, TextBlock};
use std::any::Any;

/// One table structure edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableEdit {
    /// Insert `count` empty rows before row `at`.
    InsertRows {
        /// Row index the new rows are inserted before.
        at: usize,
        /// Number of rows to insert.
        count: usize,
    },
    /// Remove `count` rows starting at `at`.
    RemoveRows {
        /// First row to remove.
        at: usize,
        /// Number of rows to remove.
        count: usize,
    },
    /// Insert `count` empty columns before column `at`.
    InsertColumns {
        /// Column index the new columns are inserted before.
        at: usize,
        /// Number of columns to insert.
        count: usize,
    },
    /// Remove `count` columns starting at `at`.
    RemoveColumns {
        /// First column to remove.
        at: usize,
        /// Number of columns to remove.
        count: usize,
    },
    /// Merge the cells covered by a span into one.
    MergeCells(CellSpan),
    /// Split the merged span anchored at a cell back into individual cells.
    SplitCell {
        /// Anchor row of the span.
        row: usize,
        /// Anchor column of the span.
        col: usize,
    },
}

/// State captured during execute that undo needs to reverse the edit.
/// Inserted rows/columns need none: undoing an insertion just removes the
/// still-empty cells.
enum TableUndo {
    RemovedRows {
        rows: Vec<Vec<TextBlock>>,
        spans: Vec<CellSpan>,
    },
    RemovedColumns {
        columns: Vec<Vec<TextBlock>>,
        spans: Vec<CellSpan>,
    },
    MergedCells {
        span: CellSpan,
        cleared: Vec<((usize, usize), TextBlock)>,
    },
    SplitSpan(CellSpan),
}

/// Apply one [`TableEdit`] to the table element at a document index.
pub struct TableCommand {
    binding: CursorBinding,
    element: usize,
    edit: TableEdit,
    undo_state: Option<TableUndo>,
}

impl TableCommand {
    /// A command applying `edit` to the table at document index `element`.
    pub fn new(element: usize, edit: TableEdit) -> Self {
        Self {
            binding: CursorBinding::new(),
            element,
            edit,
            undo_state: None,
        }
    }
}

impl Command for TableCommand {
    fn command_type(&self) -> CommandType {
        CommandType::Table
    }

    fn execute(&mut self, document: &mut Document, ctx: &CursorAdjuster) -> bool {
        let element = self.element;
        match self.edit {
            TableEdit::InsertRows { at, count } => {
                document.insert_rows(element, at, count, ctx).is_ok()
            }
            TableEdit::RemoveRows { at, count } => {
                match document.remove_rows(element, at, count, ctx) {
                    Ok((rows, spans)) => {
                        self.undo_state = Some(TableUndo::RemovedRows { rows, spans });
                        true
                    }
                    Err(_) => false,
                }
            }
            TableEdit::InsertColumns { at, count } => {
                document.insert_columns(element, at, count, ctx).is_ok()
            }
            TableEdit::RemoveColumns { at, count } => {
                match document.remove_columns(element, at, count, ctx) {
                    Ok((columns, spans)) => {
                        self.undo_state = Some(TableUndo::RemovedColumns { columns, spans });
                        true
                    }
                    Err(_) => false,
                }
            }
            TableEdit::MergeCells(span) => match document.merge_cells(element, span) {
                Ok(cleared) => {
                    self.undo_state = Some(TableUndo::MergedCells { span, cleared });
                    true
                }
                Err(_) => false,
            },
            TableEdit::SplitCell { row, col } => match document.split_cell(element, row, col) {
                Ok(span) => {
                    self.undo_state = Some(TableUndo::SplitSpan(span));
                    true
                }
                Err(_) => false,
            },
        }
    }

    fn undo(&mut self, document: &mut Document, ctx: &CursorAdjuster) -> bool {
        let element = self.element;
        match self.edit {
            TableEdit::InsertRows { at, count } => {
                document.remove_rows(element, at, count, ctx).is_ok()
            }
            TableEdit::InsertColumns { at, count } => {
                document.remove_columns(element, at, count, ctx).is_ok()
            }
            TableEdit::RemoveRows { at, .. } => {
                let Some(TableUndo::RemovedRows { rows, spans }) = self.undo_state.take() else {
                    return false;
                };
                document.restore_rows(element, at, rows, spans, ctx).is_ok()
            }
            TableEdit::RemoveColumns { at, .. } => {
                let Some(TableUndo::RemovedColumns { columns, spans }) = self.undo_state.take()
                else {
                    return false;
                };
                document
                    .restore_columns(element, at, columns, spans, ctx)
                    .is_ok()
            }
            TableEdit::MergeCells(_) => {
                let Some(TableUndo::MergedCells { span, cleared }) = self.undo_state.take() else {
                    return false;
                };
                document.restore_merged_cells(element, span, cleared).is_ok()
            }
            TableEdit::SplitCell { .. } => {
                let Some(TableUndo::SplitSpan(span)) = self.undo_state.take() else {
                    return false;
                };
                document.restore_span(element, span).is_ok()
            }
        }
    }

    // Table edits never merge: the default merge refusal is the contract.

    fn description(&self) -> String {
        match self.edit {
            TableEdit::InsertRows { .. } => "insert table rows",
            TableEdit::RemoveRows { .. } => "remove table rows",
            TableEdit::InsertColumns { .. } => "insert table columns",
            TableEdit::RemoveColumns { .. } => "remove table columns",
            TableEdit::MergeCells(_) => "merge table cells",
            TableEdit::SplitCell { .. } => "split table cell",
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
