//! The clipboard and the cut/copy/paste commands.
//!
//! # Overview
//!
//! The clipboard is application state shared by every view, so all three
//! commands hold an [`Rc`] handle to one [`Clipboard`]. Cut and copy replace
//! its contents and remember what they displaced, which makes even the
//! clipboard change undoable. Paste is the one command whose forward
//! operation is not replayable from its inputs: execute reads whatever the
//! *live* clipboard holds, so the command snapshots that fragment and
//! overrides [`redo`](crate::Command::redo) to replay the snapshot — by redo
//! time the clipboard may hold something else entirely.

use crate::command::{Command, CommandType, CursorBinding};
use doc_model::{CursorAdjuster, CursorRef, CursorSnapshot, Document, ElementCursor, Fragment};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Application-wide clipboard holding at most one fragment.
#[derive(Debug, Default)]
pub struct Clipboard {
    contents: Option<Fragment>,
}

/// Shared clipboard handle, one per application.
pub type ClipboardRef = Rc<RefCell<Clipboard>>;

impl Clipboard {
    /// An empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty shared clipboard.
    pub fn new_ref() -> ClipboardRef {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Current contents, if any.
    pub fn contents(&self) -> Option<&Fragment> {
        self.contents.as_ref()
    }

    /// Replace the contents, returning what was displaced.
    pub fn replace(&mut self, fragment: Option<Fragment>) -> Option<Fragment> {
        std::mem::replace(&mut self.contents, fragment)
    }
}

/// Cut the issuing cursor's selection to the clipboard.
///
/// The selection must lie within one element region; element-spanning cuts
/// are composed from element deletions by UI logic.
pub struct CutCommand {
    binding: CursorBinding,
    clipboard: ClipboardRef,
    /// Removal start plus removed text, set by execute.
    removed: Option<(ElementCursor, String)>,
    /// Clipboard contents displaced by execute, for undo.
    displaced: Option<Option<Fragment>>,
}

impl CutCommand {
    /// A command cutting the cursor's selection into `clipboard`.
    pub fn new(clipboard: &ClipboardRef) -> Self {
        Self {
            binding: CursorBinding::new(),
            clipboard: Rc::clone(clipboard),
            removed: None,
            displaced: None,
        }
    }
}

impl Command for CutCommand {
    fn command_type(&self) -> CommandType {
        CommandType::Cut
    }

    fn execute(&mut self, document: &mut Document, ctx: &CursorAdjuster) -> bool {
        let Some((start, end)) = self.binding.at_issue().selection_range() else {
            return false;
        };
        let Ok(Fragment::Text(text)) = document.remove_range(&start, &end, ctx) else {
            return false;
        };
        let displaced = self
            .clipboard
            .borrow_mut()
            .replace(Some(Fragment::Text(text.clone())));
        self.displaced = Some(displaced);
        self.removed = Some((start, text));
        true
    }

    fn undo(&mut self, document: &mut Document, ctx: &CursorAdjuster) -> bool {
        let Some((start, text)) = self.removed.take() else {
            return false;
        };
        if document.insert_text(&start, &text, ctx).is_err() {
            self.removed = Some((start, text));
            return false;
        }
        if let Some(displaced) = self.displaced.take() {
            self.clipboard.borrow_mut().replace(displaced);
        }
        true
    }

    fn description(&self) -> String {
        "cut".to_string()
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

/// Copy the issuing cursor's selection to the clipboard.
///
/// Never touches the document; undo restores the clipboard contents the
/// copy displaced.
pub struct CopyCommand {
    binding: CursorBinding,
    clipboard: ClipboardRef,
    displaced: Option<Option<Fragment>>,
}

impl CopyCommand {
    /// A command copying the cursor's selection into `clipboard`.
    pub fn new(clipboard: &ClipboardRef) -> Self {
        Self {
            binding: CursorBinding::new(),
            clipboard: Rc::clone(clipboard),
            displaced: None,
        }
    }
}

impl Command for CopyCommand {
    fn command_type(&self) -> CommandType {
        CommandType::Copy
    }

    fn execute(&mut self, document: &mut Document, _ctx: &CursorAdjuster) -> bool {
        let Some((start, end)) = self.binding.at_issue().selection_range() else {
            return false;
        };
        let Ok(fragment) = document.clone_range(&start, &end) else {
            return false;
        };
        let displaced = self.clipboard.borrow_mut().replace(Some(fragment));
        self.displaced = Some(displaced);
        true
    }

    fn undo(&mut self, _document: &mut Document, _ctx: &CursorAdjuster) -> bool {
        let Some(displaced) = self.displaced.take() else {
            return false;
        };
        self.clipboard.borrow_mut().replace(displaced);
        true
    }

    fn description(&self) -> String {
        "copy".to_string()
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

/// What a paste actually applied, for undo.
enum PasteUndo {
    /// Inserted `len` chars at a position, after removing selection text.
    Text {
        at: ElementCursor,
        len: usize,
        removed_selection: Option<String>,
    },
    /// Inserted `count` elements starting at an index.
    Elements { index: usize, count: usize },
}

/// Paste the clipboard at the issuing cursor.
///
/// Text fragments replace the cursor's selection; element fragments are
/// inserted after the cursor's element.
pub struct PasteCommand {
    binding: CursorBinding,
    clipboard: ClipboardRef,
    /// Fragment snapshot taken by the first execute; redo replays this even
    /// if the clipboard has changed since.
    fragment: Option<Fragment>,
    applied: Option<PasteUndo>,
}

impl PasteCommand {
    /// A command pasting `clipboard`'s contents at the cursor.
    pub fn new(clipboard: &ClipboardRef) -> Self {
        Self {
            binding: CursorBinding::new(),
            clipboard: Rc::clone(clipboard),
            fragment: None,
            applied: None,
        }
    }

    fn apply(&mut self, document: &mut Document, ctx: &CursorAdjuster, fragment: Fragment) -> bool {
        let snapshot = *self.binding.at_issue();
        match fragment {
            Fragment::Text(text) => {
                if text.is_empty() {
                    return false;
                }
                let (at, removed_selection) = match snapshot.selection_range() {
                    Some((start, end)) => {
                        let Ok(Fragment::Text(removed)) =
                            document.remove_range(&start, &end, ctx)
                        else {
                            return false;
                        };
                        (start, Some(removed))
                    }
                    None => (snapshot.position, None),
                };
                if document.insert_text(&at, &text, ctx).is_err() {
                    if let Some(removed) = removed_selection {
                        let _ = document.insert_text(&at, &removed, ctx);
                    }
                    return false;
                }
                self.applied = Some(PasteUndo::Text {
                    at,
                    len: text.chars().count(),
                    removed_selection,
                });
                true
            }
            Fragment::Elements(elements) => {
                if elements.is_empty() {
                    return false;
                }
                let index = snapshot.position.element + 1;
                if index > document.element_count() {
                    return false;
                }
                let count = elements.len();
                for (offset, element) in elements.into_iter().enumerate() {
                    if document.insert_element(index + offset, element, ctx).is_err() {
                        // Index was validated; later inserts cannot be out of
                        // range once the first succeeded.
                        return false;
                    }
                }
                self.applied = Some(PasteUndo::Elements { index, count });
                true
            }
        }
    }
}

impl Command for PasteCommand {
    fn command_type(&self) -> CommandType {
        CommandType::Paste
    }

    fn execute(&mut self, document: &mut Document, ctx: &CursorAdjuster) -> bool {
        let Some(fragment) = self.clipboard.borrow().contents().cloned() else {
            return false;
        };
        if !self.apply(document, ctx, fragment.clone()) {
            return false;
        }
        self.fragment = Some(fragment);
        true
    }

    fn undo(&mut self, document: &mut Document, ctx: &CursorAdjuster) -> bool {
        match self.applied.take() {
            Some(PasteUndo::Text {
                at,
                len,
                removed_selection,
            }) => {
                if document.remove_text(&at, len, ctx).is_err() {
                    self.applied = Some(PasteUndo::Text {
                        at,
                        len,
                        removed_selection,
                    });
                    return false;
                }
                if let Some(removed) = &removed_selection {
                    if document.insert_text(&at, removed, ctx).is_err() {
                        return false;
                    }
                }
                true
            }
            Some(PasteUndo::Elements { index, count }) => {
                for _ in 0..count {
                    if document.remove_element(index, ctx).is_err() {
                        return false;
                    }
                }
                true
            }
            None => false,
        }
    }

    /// Replays the fragment snapshotted at execute time. The live clipboard
    /// is deliberately not consulted.
    fn redo(&mut self, document: &mut Document, ctx: &CursorAdjuster) -> bool {
        let Some(fragment) = self.fragment.clone() else {
            return false;
        };
        self.apply(document, ctx, fragment)
    }

    fn description(&self) -> String {
        "paste".to_string()
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
