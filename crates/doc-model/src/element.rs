//! Element tree node types and document fragments.

use crate::format::BlockFormat;
use crate::runs::RunMap;
use ropey::Rope;

/// A paragraph of rich text: rope storage plus a character format run map and
/// a block format.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    text: Rope,
    runs: RunMap,
    /// Paragraph format of this block.
    pub format: BlockFormat,
}

impl TextBlock {
    /// An empty block with default formats.
    pub fn new() -> Self {
        Self::from_str("")
    }

    /// A block initialized with `text`.
    pub fn from_str(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let len = rope.len_chars();
        Self {
            text: rope,
            runs: RunMap::with_len(len),
            format: BlockFormat::default(),
        }
    }

    /// Number of characters in the block.
    pub fn char_len(&self) -> usize {
        self.text.len_chars()
    }

    /// Block text as an owned string.
    pub fn to_text(&self) -> String {
        self.text.to_string()
    }

    /// Text of `[start, end)` as an owned string.
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.text.slice(start..end).to_string()
    }

    /// Character format run map of this block.
    pub fn runs(&self) -> &RunMap {
        &self.runs
    }

    /// Mutable character format run map. Callers altering formats must keep
    /// the map covering exactly `char_len()` characters.
    pub fn runs_mut(&mut self) -> &mut RunMap {
        &mut self.runs
    }

    /// Insert text at a char offset, keeping the run map in sync.
    pub fn insert(&mut self, offset: usize, text: &str) {
        self.text.insert(offset, text);
        self.runs.inserted(offset, text.chars().count());
    }

    /// Remove `[start, end)`, keeping the run map in sync. Returns the removed
    /// text.
    pub fn remove(&mut self, start: usize, end: usize) -> String {
        let removed = self.slice(start, end);
        self.text.remove(start..end);
        self.runs.removed(start, end);
        removed
    }

    /// Split the block at `offset`; `self` keeps `[0, offset)` and the
    /// returned block takes the rest, inheriting the block format.
    pub fn split_off(&mut self, offset: usize) -> TextBlock {
        let tail_text = self.slice(offset, self.char_len());
        let tail_len = tail_text.chars().count();
        self.text.remove(offset..self.char_len());
        self.runs.removed(offset, offset + tail_len);
        let mut tail = TextBlock::from_str(&tail_text);
        tail.format = self.format.clone();
        tail
    }

    /// Append another block's text to this one. Returns the char offset the
    /// joined text starts at.
    pub fn append(&mut self, other: TextBlock) -> usize {
        let join_offset = self.char_len();
        self.insert(join_offset, &other.to_text());
        join_offset
    }
}

impl Default for TextBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// An inline image placeholder. The bitmap itself lives outside the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Source identifier (path or resource key).
    pub source: String,
    /// Display width in twentieths of a point.
    pub width: u32,
    /// Display height in twentieths of a point.
    pub height: u32,
}

/// A merged-cell span anchored at its top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpan {
    /// Anchor row.
    pub row: usize,
    /// Anchor column.
    pub col: usize,
    /// Number of rows covered (at least 1).
    pub row_span: usize,
    /// Number of columns covered (at least 1).
    pub col_span: usize,
}

impl CellSpan {
    /// Whether the span covers the cell at `(row, col)`.
    pub fn covers(&self, row: usize, col: usize) -> bool {
        row >= self.row
            && row < self.row + self.row_span
            && col >= self.col
            && col < self.col + self.col_span
    }

    /// Whether two spans cover any common cell.
    pub fn overlaps(&self, other: &CellSpan) -> bool {
        self.row < other.row + other.row_span
            && other.row < self.row + self.row_span
            && self.col < other.col + other.col_span
            && other.col < self.col + self.col_span
    }
}

/// A table: a rectangular grid of text-block cells plus merged-cell spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    cells: Vec<Vec<TextBlock>>,
    cols: usize,
    spans: Vec<CellSpan>,
}

impl Table {
    /// A table of empty cells. `rows` and `cols` must both be non-zero.
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        let cells = (0..rows)
            .map(|_| (0..cols).map(|_| TextBlock::new()).collect())
            .collect();
        Self {
            cells,
            cols,
            spans: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.cols
    }

    /// Merged-cell spans, anchor-ordered as created.
    pub fn spans(&self) -> &[CellSpan] {
        &self.spans
    }

    /// Cell at `(row, col)`, if in range.
    pub fn cell(&self, row: usize, col: usize) -> Option<&TextBlock> {
        self.cells.get(row).and_then(|cells| cells.get(col))
    }

    /// Mutable cell at `(row, col)`, if in range.
    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut TextBlock> {
        self.cells.get_mut(row).and_then(|cells| cells.get_mut(col))
    }

    /// Insert `count` empty rows before row `at` (`at == row_count()` appends).
    /// Spans at or past `at` shift down.
    pub fn insert_rows(&mut self, at: usize, count: usize) {
        let at = at.min(self.row_count());
        for _ in 0..count {
            let row = (0..self.cols).map(|_| TextBlock::new()).collect();
            self.cells.insert(at, row);
        }
        for span in &mut self.spans {
            if span.row >= at {
                span.row += count;
            }
        }
    }

    /// Remove `count` rows starting at `at`, returning the removed rows and
    /// every span the removal touched (in pre-removal coordinates, for undo).
    /// Spans anchored in the removed rows are dropped; spans straddling them
    /// are clipped to the surviving rows. At least one row survives; the
    /// caller validates that before calling.
    pub fn remove_rows(&mut self, at: usize, count: usize) -> (Vec<Vec<TextBlock>>, Vec<CellSpan>) {
        let removed: Vec<Vec<TextBlock>> = self.cells.drain(at..at + count).collect();
        let end = at + count;
        let touched: Vec<CellSpan> = self
            .spans
            .iter()
            .copied()
            .filter(|span| span.row < end && span.row + span.row_span > at)
            .collect();
        self.spans.retain(|span| !(span.row >= at && span.row < end));
        for span in &mut self.spans {
            if span.row >= end {
                span.row -= count;
            } else if span.row + span.row_span > at {
                let overlap = (span.row + span.row_span).min(end) - at;
                span.row_span -= overlap;
            }
        }
        (removed, touched)
    }

    /// Put previously removed rows back at `at` (undo of
    /// [`remove_rows`](Self::remove_rows)). `touched` are the spans that
    /// removal returned; clipped remnants keep their anchor and are replaced
    /// by the originals.
    pub fn restore_rows(&mut self, at: usize, rows: Vec<Vec<TextBlock>>, touched: Vec<CellSpan>) {
        let count = rows.len();
        for (idx, row) in rows.into_iter().enumerate() {
            self.cells.insert(at + idx, row);
        }
        for span in &mut self.spans {
            if span.row >= at {
                span.row += count;
            }
        }
        for original in touched {
            self.spans
                .retain(|span| !(span.row == original.row && span.col == original.col));
            self.spans.push(original);
        }
    }

    /// Insert `count` empty columns before column `at`.
    pub fn insert_columns(&mut self, at: usize, count: usize) {
        let at = at.min(self.cols);
        for row in &mut self.cells {
            for _ in 0..count {
                row.insert(at, TextBlock::new());
            }
        }
        self.cols += count;
        for span in &mut self.spans {
            if span.col >= at {
                span.col += count;
            }
        }
    }

    /// Remove `count` columns starting at `at`, returning the removed cells
    /// per row and every span the removal touched (in pre-removal
    /// coordinates, for undo). Spans anchored in the removed columns are
    /// dropped; spans straddling them are clipped to the surviving columns.
    pub fn remove_columns(
        &mut self,
        at: usize,
        count: usize,
    ) -> (Vec<Vec<TextBlock>>, Vec<CellSpan>) {
        let removed = self
            .cells
            .iter_mut()
            .map(|row| row.drain(at..at + count).collect())
            .collect();
        self.cols -= count;
        let end = at + count;
        let touched: Vec<CellSpan> = self
            .spans
            .iter()
            .copied()
            .filter(|span| span.col < end && span.col + span.col_span > at)
            .collect();
        self.spans.retain(|span| !(span.col >= at && span.col < end));
        for span in &mut self.spans {
            if span.col >= end {
                span.col -= count;
            } else if span.col + span.col_span > at {
                let overlap = (span.col + span.col_span).min(end) - at;
                span.col_span -= overlap;
            }
        }
        (removed, touched)
    }

    /// Put previously removed columns back at `at` (undo of
    /// [`remove_columns`](Self::remove_columns)). `touched` are the spans
    /// that removal returned; clipped remnants keep their anchor and are
    /// replaced by the originals.
    pub fn restore_columns(
        &mut self,
        at: usize,
        columns: Vec<Vec<TextBlock>>,
        touched: Vec<CellSpan>,
    ) {
        let count = columns.first().map(Vec::len).unwrap_or(0);
        for (row, cells) in self.cells.iter_mut().zip(columns) {
            for (idx, cell) in cells.into_iter().enumerate() {
                row.insert(at + idx, cell);
            }
        }
        self.cols += count;
        for span in &mut self.spans {
            if span.col >= at {
                span.col += count;
            }
        }
        for original in touched {
            self.spans
                .retain(|span| !(span.row == original.row && span.col == original.col));
            self.spans.push(original);
        }
    }

    /// Whether `span` fits in the grid and overlaps no existing span.
    pub fn span_is_free(&self, span: &CellSpan) -> bool {
        span.row_span >= 1
            && span.col_span >= 1
            && span.row + span.row_span <= self.row_count()
            && span.col + span.col_span <= self.cols
            && !self.spans.iter().any(|existing| existing.overlaps(span))
    }

    /// Merge the cells covered by `span`. Covered non-anchor cells are
    /// emptied; their prior contents are returned row-major for undo. The
    /// caller validates the span with [`span_is_free`](Self::span_is_free).
    pub fn merge_cells(&mut self, span: CellSpan) -> Vec<((usize, usize), TextBlock)> {
        let mut cleared = Vec::new();
        for row in span.row..span.row + span.row_span {
            for col in span.col..span.col + span.col_span {
                if (row, col) == (span.row, span.col) {
                    continue;
                }
                let cell = std::mem::take(&mut self.cells[row][col]);
                cleared.push(((row, col), cell));
            }
        }
        self.spans.push(span);
        cleared
    }

    /// Remove the span anchored at `(row, col)`, returning it. Cell contents
    /// cleared by the merge are not restored here; that is the merge
    /// command's undo data.
    pub fn split_cell(&mut self, row: usize, col: usize) -> Option<CellSpan> {
        let idx = self
            .spans
            .iter()
            .position(|span| span.row == row && span.col == col)?;
        Some(self.spans.remove(idx))
    }

    /// Reinstate a span removed by [`split_cell`](Self::split_cell).
    pub fn restore_span(&mut self, span: CellSpan) {
        self.spans.push(span);
    }

    /// Put back cell contents cleared by [`merge_cells`](Self::merge_cells).
    pub fn restore_cells(&mut self, cells: Vec<((usize, usize), TextBlock)>) {
        for ((row, col), cell) in cells {
            if let Some(slot) = self.cell_mut(row, col) {
                *slot = cell;
            }
        }
    }
}

/// One node of the document's element sequence.
///
/// Cloning an element deep-copies its whole subtree, which is the model's
/// "clone subtree" primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A paragraph of rich text.
    Text(TextBlock),
    /// A table of text-block cells.
    Table(Table),
    /// An inline image.
    Image(Image),
    /// An explicit page break.
    PageBreak,
}

impl Element {
    /// Short human-readable kind name, used in command descriptions.
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Text(_) => "paragraph",
            Element::Table(_) => "table",
            Element::Image(_) => "image",
            Element::PageBreak => "page break",
        }
    }

    /// Borrow as a text block, if this is one.
    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            Element::Text(block) => Some(block),
            _ => None,
        }
    }

    /// Mutably borrow as a text block, if this is one.
    pub fn as_text_mut(&mut self) -> Option<&mut TextBlock> {
        match self {
            Element::Text(block) => Some(block),
            _ => None,
        }
    }

    /// Borrow as a table, if this is one.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Element::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Mutably borrow as a table, if this is one.
    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Element::Table(table) => Some(table),
            _ => None,
        }
    }
}

/// A deep-copied slice of document content, the currency of cut/copy/paste.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Plain text from within a single block or cell.
    Text(String),
    /// One or more whole elements.
    Elements(Vec<Element>),
}

impl Fragment {
    /// Char length for text fragments, element count for element fragments.
    pub fn len(&self) -> usize {
        match self {
            Fragment::Text(text) => text.chars().count(),
            Fragment::Elements(elements) => elements.len(),
        }
    }

    /// Whether the fragment carries nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
