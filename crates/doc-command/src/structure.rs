//! Whole-element insertion and deletion commands.

use crate::command::{Command, CommandType, CursorBinding};
use doc_model::{CursorAdjuster, CursorRef, CursorSnapshot, Document, Element};
use std::any::Any;

/// Insert one element at an index in the document's element sequence.
///
/// The element transfers between the command and the document: execute moves
/// it in, undo moves it back out, so redo reinserts the exact element rather
/// than a fresh template.
pub struct InsertElementCommand {
    binding: CursorBinding,
    index: usize,
    element: Option<Element>,
}

impl InsertElementCommand {
    /// A command inserting `element` at `index`.
    pub fn new(index: usize, element: Element) -> Self {
        Self {
            binding: CursorBinding::new(),
            index,
            element: Some(element),
        }
    }
}

impl Command for InsertElementCommand {
    fn command_type(&self) -> CommandType {
        CommandType::InsertElement
    }

    fn execute(&mut self, document: &mut Document, ctx: &CursorAdjuster) -> bool {
        // Validate before take() so a refused insert keeps the element.
        if self.index > document.element_count() {
            return false;
        }
        let Some(element) = self.element.take() else {
            return false;
        };
        document.insert_element(self.index, element, ctx).is_ok()
    }

    fn undo(&mut self, document: &mut Document, ctx: &CursorAdjuster) -> bool {
        match document.remove_element(self.index, ctx) {
            Ok(element) => {
                self.element = Some(element);
                true
            }
            Err(_) => false,
        }
    }

    fn description(&self) -> String {
        "insert element".to_string()
    }

    fn detailed_description(&self) -> String {
        match &self.element {
            Some(element) => format!("insert {} element", element.kind()),
            None => "insert element".to_string(),
        }
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

/// Remove one element from the document's element sequence, keeping it for
/// undo.
pub struct DeleteElementCommand {
    binding: CursorBinding,
    index: usize,
    removed: Option<Element>,
}

impl DeleteElementCommand {
    /// A command removing the element at `index`.
    pub fn new(index: usize) -> Self {
        Self {
            binding: CursorBinding::new(),
            index,
            removed: None,
        }
    }
}

impl Command for DeleteElementCommand {
    fn command_type(&self) -> CommandType {
        CommandType::DeleteElement
    }

    fn execute(&mut self, document: &mut Document, ctx: &CursorAdjuster) -> bool {
        match document.remove_element(self.index, ctx) {
            Ok(element) => {
                self.removed = Some(element);
                true
            }
            Err(_) => false,
        }
    }

    fn undo(&mut self, document: &mut Document, ctx: &CursorAdjuster) -> bool {
        if self.index > document.element_count() {
            return false;
        }
        let Some(element) = self.removed.take() else {
            return false;
        };
        document.insert_element(self.index, element, ctx).is_ok()
    }

    fn description(&self) -> String {
        "delete element".to_string()
    }

    fn detailed_description(&self) -> String {
        match &self.removed {
            Some(element) => format!("delete {} element", element.kind()),
            None => "delete element".to_string(),
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Cursor, ElementCursor, Table};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_element_round_trip() {
        let mut doc = Document::from_text("a\nb");
        let ctx = CursorAdjuster::empty();
        let mut command = InsertElementCommand::new(1, Element::Table(Table::new(2, 3)));
        let cursor = Cursor::new_ref(ElementCursor::body(0, 1));
        command.set_cursor(&cursor);

        assert!(command.execute(&mut doc, &ctx));
        assert_eq!(doc.element_count(), 3);
        assert_eq!(doc.element(1).unwrap().kind(), "table");

        assert!(command.undo(&mut doc, &ctx));
        assert_eq!(doc.element_count(), 2);

        assert!(command.redo(&mut doc, &ctx));
        assert_eq!(doc.element_count(), 3);
        assert_eq!(doc.element(1).unwrap().as_table().unwrap().row_count(), 2);
    }

    #[test]
    fn test_delete_element_restores_exact_content() {
        let mut doc = Document::from_text("first\nsecond");
        let ctx = CursorAdjuster::empty();
        let mut command = DeleteElementCommand::new(0);
        let cursor = Cursor::new_ref(ElementCursor::body(0, 0));
        command.set_cursor(&cursor);

        assert!(command.execute(&mut doc, &ctx));
        assert_eq!(doc.plain_text(), "second");

        assert!(command.undo(&mut doc, &ctx));
        assert_eq!(doc.plain_text(), "first\nsecond");
    }

    #[test]
    fn test_out_of_range_index_fails_cleanly() {
        let mut doc = Document::new();
        let ctx = CursorAdjuster::empty();
        let mut command = DeleteElementCommand::new(7);
        assert!(!command.execute(&mut doc, &ctx));
        assert!(!command.undo(&mut doc, &ctx));
        assert_eq!(doc.element_count(), 1);
    }
}
