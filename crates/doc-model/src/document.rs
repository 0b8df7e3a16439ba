//! The document root and its mutation primitives.
//!
//! # Overview
//!
//! [`Document`] owns the element sequence and exposes the narrow mutation
//! surface the command layer is written against: child insert/remove, text
//! insert/remove, format setters that return prior state, gated element
//! split/merge, subtree cloning, and table structure edits.
//!
//! Every primitive that shifts char offsets or element/table indices calls
//! the supplied [`CursorAdjuster`] exactly once with the structural delta, so
//! every live caret the engine tracks keeps addressing the same content.
//!
//! Primitives return `Result<_, DocumentError>`; they validate all
//! preconditions before touching any state, so a returned error means the
//! document is unchanged.

use crate::cursor::{CursorAdjuster, ElementCursor, Region};
use crate::element::{CellSpan, Element, Fragment, Table, TextBlock};
use crate::format::{
    BlockFormat, BlockFormatPatch, CharFormat, CharFormatPatch, PageFormat,
};
use crate::text;
use std::ops::Range;
use thiserror::Error;

/// Errors returned by document mutation primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// No element exists at the given index.
    #[error("no element at index {0}")]
    InvalidElement(usize),
    /// A cursor does not resolve to text in the document.
    #[error("cursor does not address text in the document")]
    InvalidCursor,
    /// A char range is out of bounds or inverted.
    #[error("invalid range {start}..{end}")]
    InvalidRange {
        /// Inclusive start char offset.
        start: usize,
        /// Exclusive end char offset.
        end: usize,
    },
    /// A range's endpoints lie in different element regions.
    #[error("range endpoints lie in different regions")]
    RegionMismatch,
    /// The split policy refused the split.
    #[error("split refused by policy")]
    SplitRefused,
    /// A table structure edit does not fit the table's shape.
    #[error("table edit does not fit: {0}")]
    TableShape(&'static str),
}

type Result<T> = std::result::Result<T, DocumentError>;

/// Why an element split is being requested, for the policy's benefit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitReason {
    /// The user typed a paragraph break.
    ParagraphBreak,
    /// A new element is being inserted mid-paragraph.
    ElementInsertion,
}

/// Policy gate deciding whether an element may be split at a position.
pub trait SplitPolicy {
    /// Whether the element at `at` may be split there for `reason`.
    fn may_split(&self, document: &Document, at: &ElementCursor, reason: SplitReason) -> bool;
}

/// Default policy: text-block bodies may always split; table cells never
/// split their containing element.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSplitPolicy;

impl SplitPolicy for DefaultSplitPolicy {
    fn may_split(&self, document: &Document, at: &ElementCursor, _reason: SplitReason) -> bool {
        at.region == Region::Body
            && document
                .element(at.element)
                .is_some_and(|element| element.as_text().is_some())
    }
}

/// The document: a sequence of elements plus the page format.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    elements: Vec<Element>,
    page_format: PageFormat,
}

impl Document {
    /// A document with a single empty paragraph.
    pub fn new() -> Self {
        Self {
            elements: vec![Element::Text(TextBlock::new())],
            page_format: PageFormat::default(),
        }
    }

    /// A document whose paragraphs are the lines of `text`.
    pub fn from_text(text: &str) -> Self {
        let elements = text
            .split('\n')
            .map(|line| Element::Text(TextBlock::from_str(line)))
            .collect();
        Self {
            elements,
            page_format: PageFormat::default(),
        }
    }

    /// Number of elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Element at `index`, if any.
    pub fn element(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Current page format.
    pub fn page_format(&self) -> &PageFormat {
        &self.page_format
    }

    /// Plain text of the whole document, paragraphs joined with `\n`.
    /// Non-text elements contribute nothing. Intended for tests and
    /// diagnostics, not rendering.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        let mut first = true;
        for element in &self.elements {
            if let Element::Text(block) = element {
                if !first {
                    out.push('\n');
                }
                out.push_str(&block.to_text());
                first = false;
            }
        }
        out
    }

    /// Body text of the element at `index` (for tests and diagnostics).
    pub fn block_text(&self, index: usize) -> Result<String> {
        let element = self
            .elements
            .get(index)
            .ok_or(DocumentError::InvalidElement(index))?;
        element
            .as_text()
            .map(TextBlock::to_text)
            .ok_or(DocumentError::InvalidCursor)
    }

    /// Resolve a cursor to the text block it addresses.
    pub fn block_at(&self, at: &ElementCursor) -> Result<&TextBlock> {
        let element = self
            .elements
            .get(at.element)
            .ok_or(DocumentError::InvalidElement(at.element))?;
        match (at.region, element) {
            (Region::Body, Element::Text(block)) => Ok(block),
            (Region::Cell { row, col }, Element::Table(table)) => {
                table.cell(row, col).ok_or(DocumentError::InvalidCursor)
            }
            _ => Err(DocumentError::InvalidCursor),
        }
    }

    fn block_at_mut(&mut self, at: &ElementCursor) -> Result<&mut TextBlock> {
        let element = self
            .elements
            .get_mut(at.element)
            .ok_or(DocumentError::InvalidElement(at.element))?;
        match (at.region, element) {
            (Region::Body, Element::Text(block)) => Ok(block),
            (Region::Cell { row, col }, Element::Table(table)) => {
                table.cell_mut(row, col).ok_or(DocumentError::InvalidCursor)
            }
            _ => Err(DocumentError::InvalidCursor),
        }
    }

    /// Validate that `at` addresses a grapheme boundary in its block.
    fn checked_offset(&self, at: &ElementCursor) -> Result<usize> {
        let block = self.block_at(at)?;
        if at.offset > block.char_len() {
            return Err(DocumentError::InvalidCursor);
        }
        let content = block.to_text();
        if !text::is_grapheme_boundary(&content, at.offset) {
            return Err(DocumentError::InvalidCursor);
        }
        Ok(at.offset)
    }

    // ---- element primitives ----

    /// Insert an element at `index` (`index == element_count()` appends).
    pub fn insert_element(
        &mut self,
        index: usize,
        element: Element,
        ctx: &CursorAdjuster,
    ) -> Result<()> {
        if index > self.elements.len() {
            return Err(DocumentError::InvalidElement(index));
        }
        self.elements.insert(index, element);
        ctx.elements_inserted(index, 1);
        Ok(())
    }

    /// Remove and return the element at `index`.
    pub fn remove_element(&mut self, index: usize, ctx: &CursorAdjuster) -> Result<Element> {
        if index >= self.elements.len() {
            return Err(DocumentError::InvalidElement(index));
        }
        let removed = self.elements.remove(index);
        ctx.elements_removed(index, 1);
        Ok(removed)
    }

    // ---- text primitives ----

    /// Insert `text` at `at`. Zero-length inserts are no-ops.
    pub fn insert_text(&mut self, at: &ElementCursor, text: &str, ctx: &CursorAdjuster) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let offset = self.checked_offset(at)?;
        let block = self.block_at_mut(at)?;
        block.insert(offset, text);
        ctx.text_inserted(at, text.chars().count());
        Ok(())
    }

    /// Remove `len` characters starting at `at`, returning the removed text.
    pub fn remove_text(
        &mut self,
        at: &ElementCursor,
        len: usize,
        ctx: &CursorAdjuster,
    ) -> Result<String> {
        if len == 0 {
            return Ok(String::new());
        }
        let start = self.checked_offset(at)?;
        let block = self.block_at(at)?;
        let end = start + len;
        if end > block.char_len() {
            return Err(DocumentError::InvalidRange { start, end });
        }
        let block = self.block_at_mut(at)?;
        let removed = block.remove(start, end);
        ctx.text_removed(at, len);
        Ok(removed)
    }

    /// Remove the text between `start` and `end` (document order), returning
    /// it as a fragment. Both endpoints must address the same element region;
    /// element-spanning removals are composed from element removals by the
    /// caller.
    pub fn remove_range(
        &mut self,
        start: &ElementCursor,
        end: &ElementCursor,
        ctx: &CursorAdjuster,
    ) -> Result<Fragment> {
        if !start.same_region(end) {
            return Err(DocumentError::RegionMismatch);
        }
        if start.offset > end.offset {
            return Err(DocumentError::InvalidRange {
                start: start.offset,
                end: end.offset,
            });
        }
        let removed = self.remove_text(start, end.offset - start.offset, ctx)?;
        Ok(Fragment::Text(removed))
    }

    /// Deep-copy the content between `start` and `end` without mutating.
    ///
    /// Same-region ranges yield a text fragment; ranges spanning elements
    /// yield clones of every element the range touches.
    pub fn clone_range(&self, start: &ElementCursor, end: &ElementCursor) -> Result<Fragment> {
        if start.same_region(end) {
            let block = self.block_at(start)?;
            if start.offset > end.offset || end.offset > block.char_len() {
                return Err(DocumentError::InvalidRange {
                    start: start.offset,
                    end: end.offset,
                });
            }
            return Ok(Fragment::Text(block.slice(start.offset, end.offset)));
        }
        if start.element > end.element || end.element >= self.elements.len() {
            return Err(DocumentError::InvalidRange {
                start: start.element,
                end: end.element,
            });
        }
        Ok(Fragment::Elements(
            self.elements[start.element..=end.element].to_vec(),
        ))
    }

    // ---- split / merge ----

    /// Split the element at `at` into two, gated by `policy`. Text at or past
    /// the offset moves to a new element directly after.
    pub fn split_element(
        &mut self,
        at: &ElementCursor,
        reason: SplitReason,
        policy: &dyn SplitPolicy,
        ctx: &CursorAdjuster,
    ) -> Result<()> {
        if !policy.may_split(self, at, reason) {
            return Err(DocumentError::SplitRefused);
        }
        let offset = self.checked_offset(at)?;
        let block = self.block_at_mut(at)?;
        let tail = block.split_off(offset);
        self.elements.insert(at.element + 1, Element::Text(tail));
        ctx.element_split(at.element, offset);
        Ok(())
    }

    /// Merge the text block at `index + 1` into the one at `index`. Returns
    /// the char offset the joined text starts at, which undo needs to split
    /// there again.
    pub fn merge_with_next(&mut self, index: usize, ctx: &CursorAdjuster) -> Result<usize> {
        if index + 1 >= self.elements.len() {
            return Err(DocumentError::InvalidElement(index + 1));
        }
        let both_text = self.elements[index].as_text().is_some()
            && self.elements[index + 1].as_text().is_some();
        if !both_text {
            return Err(DocumentError::InvalidCursor);
        }
        let next = self.elements.remove(index + 1);
        let Element::Text(next_block) = next else {
            unreachable!("validated as a text block above");
        };
        let Some(block) = self.elements[index].as_text_mut() else {
            unreachable!("validated as a text block above");
        };
        let join_offset = block.append(next_block);
        ctx.elements_merged(index, join_offset);
        Ok(join_offset)
    }

    // ---- format setters ----

    /// Apply a character format patch over `[start, end)` of the block at
    /// `at`'s region. Returns the replaced runs for undo.
    pub fn set_char_format(
        &mut self,
        at: &ElementCursor,
        range: Range<usize>,
        patch: &CharFormatPatch,
    ) -> Result<Vec<(Range<usize>, CharFormat)>> {
        let block = self.block_at_mut(at)?;
        if range.start > range.end || range.end > block.char_len() {
            return Err(DocumentError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        Ok(block.runs_mut().set_format(range.start, range.end, patch))
    }

    /// Restore character format runs captured by
    /// [`set_char_format`](Self::set_char_format).
    pub fn restore_char_format(
        &mut self,
        at: &ElementCursor,
        saved: &[(Range<usize>, CharFormat)],
    ) -> Result<()> {
        let block = self.block_at_mut(at)?;
        block.runs_mut().restore(saved);
        Ok(())
    }

    /// Apply a block format patch to the block at `at`'s region. Returns the
    /// prior format for undo.
    pub fn set_block_format(
        &mut self,
        at: &ElementCursor,
        patch: &BlockFormatPatch,
    ) -> Result<BlockFormat> {
        let block = self.block_at_mut(at)?;
        let old = block.format.clone();
        patch.apply_to(&mut block.format);
        Ok(old)
    }

    /// Restore a block format captured by
    /// [`set_block_format`](Self::set_block_format).
    pub fn restore_block_format(&mut self, at: &ElementCursor, format: BlockFormat) -> Result<()> {
        let block = self.block_at_mut(at)?;
        block.format = format;
        Ok(())
    }

    /// Replace the page format, returning the prior one for undo.
    pub fn set_page_format(&mut self, format: PageFormat) -> PageFormat {
        std::mem::replace(&mut self.page_format, format)
    }

    // ---- table primitives ----

    fn table_mut(&mut self, index: usize) -> Result<&mut Table> {
        self.elements
            .get_mut(index)
            .ok_or(DocumentError::InvalidElement(index))?
            .as_table_mut()
            .ok_or(DocumentError::InvalidCursor)
    }

    /// Insert `count` empty rows before row `at` of the table at `element`.
    pub fn insert_rows(
        &mut self,
        element: usize,
        at: usize,
        count: usize,
        ctx: &CursorAdjuster,
    ) -> Result<()> {
        let table = self.table_mut(element)?;
        if at > table.row_count() {
            return Err(DocumentError::TableShape("row index out of range"));
        }
        table.insert_rows(at, count);
        ctx.rows_inserted(element, at, count);
        Ok(())
    }

    /// Remove `count` rows starting at `at`, returning the removed rows and
    /// the spans the removal touched, both for undo. At least one row must
    /// survive.
    pub fn remove_rows(
        &mut self,
        element: usize,
        at: usize,
        count: usize,
        ctx: &CursorAdjuster,
    ) -> Result<(Vec<Vec<TextBlock>>, Vec<CellSpan>)> {
        let table = self.table_mut(element)?;
        if count == 0 || at + count > table.row_count() {
            return Err(DocumentError::TableShape("row range out of range"));
        }
        if count == table.row_count() {
            return Err(DocumentError::TableShape("cannot remove every row"));
        }
        let removed = table.remove_rows(at, count);
        let remaining = table.row_count();
        ctx.rows_removed(element, at, count, remaining);
        Ok(removed)
    }

    /// Put rows removed by [`remove_rows`](Self::remove_rows) back, spans
    /// included.
    pub fn restore_rows(
        &mut self,
        element: usize,
        at: usize,
        rows: Vec<Vec<TextBlock>>,
        spans: Vec<CellSpan>,
        ctx: &CursorAdjuster,
    ) -> Result<()> {
        let count = rows.len();
        let table = self.table_mut(element)?;
        table.restore_rows(at, rows, spans);
        ctx.rows_inserted(element, at, count);
        Ok(())
    }

    /// Insert `count` empty columns before column `at`.
    pub fn insert_columns(
        &mut self,
        element: usize,
        at: usize,
        count: usize,
        ctx: &CursorAdjuster,
    ) -> Result<()> {
        let table = self.table_mut(element)?;
        if at > table.column_count() {
            return Err(DocumentError::TableShape("column index out of range"));
        }
        table.insert_columns(at, count);
        ctx.columns_inserted(element, at, count);
        Ok(())
    }

    /// Remove `count` columns starting at `at`, returning the removed cells
    /// per row and the spans the removal touched, both for undo. At least one
    /// column must survive.
    pub fn remove_columns(
        &mut self,
        element: usize,
        at: usize,
        count: usize,
        ctx: &CursorAdjuster,
    ) -> Result<(Vec<Vec<TextBlock>>, Vec<CellSpan>)> {
        let table = self.table_mut(element)?;
        if count == 0 || at + count > table.column_count() {
            return Err(DocumentError::TableShape("column range out of range"));
        }
        if count == table.column_count() {
            return Err(DocumentError::TableShape("cannot remove every column"));
        }
        let removed = table.remove_columns(at, count);
        let remaining = table.column_count();
        ctx.columns_removed(element, at, count, remaining);
        Ok(removed)
    }

    /// Put columns removed by [`remove_columns`](Self::remove_columns) back,
    /// spans included.
    pub fn restore_columns(
        &mut self,
        element: usize,
        at: usize,
        columns: Vec<Vec<TextBlock>>,
        spans: Vec<CellSpan>,
        ctx: &CursorAdjuster,
    ) -> Result<()> {
        let count = columns.first().map(Vec::len).unwrap_or(0);
        let table = self.table_mut(element)?;
        table.restore_columns(at, columns, spans);
        ctx.columns_inserted(element, at, count);
        Ok(())
    }

    /// Merge the cells covered by `span` in the table at `element`. Returns
    /// the cleared cell contents for undo. No cursor adjustment: the grid
    /// shape is unchanged.
    pub fn merge_cells(
        &mut self,
        element: usize,
        span: CellSpan,
    ) -> Result<Vec<((usize, usize), TextBlock)>> {
        let table = self.table_mut(element)?;
        if !table.span_is_free(&span) {
            return Err(DocumentError::TableShape("span does not fit"));
        }
        Ok(table.merge_cells(span))
    }

    /// Remove the merged-cell span anchored at `(row, col)`, returning it.
    pub fn split_cell(&mut self, element: usize, row: usize, col: usize) -> Result<CellSpan> {
        let table = self.table_mut(element)?;
        table
            .split_cell(row, col)
            .ok_or(DocumentError::TableShape("no span anchored at cell"))
    }

    /// Undo helpers for the merge/split pair.
    pub fn restore_merged_cells(
        &mut self,
        element: usize,
        span: CellSpan,
        cleared: Vec<((usize, usize), TextBlock)>,
    ) -> Result<()> {
        let table = self.table_mut(element)?;
        table.split_cell(span.row, span.col);
        table.restore_cells(cleared);
        Ok(())
    }

    /// Reinstate a span removed by [`split_cell`](Self::split_cell).
    pub fn restore_span(&mut self, element: usize, span: CellSpan) -> Result<()> {
        let table = self.table_mut(element)?;
        table.restore_span(span);
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
