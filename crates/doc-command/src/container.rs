//! Value-semantic, shared-ownership holder for one command.
//!
//! [`CommandContainer`] gives commands copy/value semantics so the undo and
//! redo stacks can be ordinary sequences of a value type. The default
//! container is *invalid* (holds no command); every forwarding operation on
//! an invalid container returns a documented safe default instead of
//! faulting. This lets the queue hand out one dummy invalid container for
//! out-of-range stack lookups and "nothing to undo" failure events without
//! special-casing call sites.

use crate::command::{Command, CommandType};
use doc_model::{CursorAdjuster, CursorRef, CursorSnapshot, Document};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared holder for exactly one command, with an explicit invalid state.
///
/// Cloning shares the underlying command; no deep copy is implied.
#[derive(Clone, Default)]
pub struct CommandContainer {
    inner: Option<Rc<RefCell<dyn Command>>>,
}

impl CommandContainer {
    /// Wrap a command.
    pub fn new(command: impl Command + 'static) -> Self {
        Self {
            inner: Some(Rc::new(RefCell::new(command))),
        }
    }

    /// The invalid container: holds no command.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Whether a command is held.
    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    /// Whether no command is held.
    pub fn is_invalid(&self) -> bool {
        self.inner.is_none()
    }

    /// Whether two containers share the same underlying command.
    pub fn shares_command_with(&self, other: &CommandContainer) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The held command's variant tag, `None` when invalid.
    pub fn command_type(&self) -> Option<CommandType> {
        self.inner
            .as_ref()
            .map(|command| command.borrow().command_type())
    }

    /// Forward `execute`; `false` when invalid.
    pub fn execute(&self, document: &mut Document, ctx: &CursorAdjuster) -> bool {
        match &self.inner {
            Some(command) => command.borrow_mut().execute(document, ctx),
            None => false,
        }
    }

    /// Forward `undo`; `false` when invalid.
    pub fn undo(&self, document: &mut Document, ctx: &CursorAdjuster) -> bool {
        match &self.inner {
            Some(command) => command.borrow_mut().undo(document, ctx),
            None => false,
        }
    }

    /// Forward `redo`; `false` when invalid.
    pub fn redo(&self, document: &mut Document, ctx: &CursorAdjuster) -> bool {
        match &self.inner {
            Some(command) => command.borrow_mut().redo(document, ctx),
            None => false,
        }
    }

    /// Offer `other`'s command to this container's command for absorption.
    /// `false` when either container is invalid or the containers share one
    /// command.
    pub fn merge(&self, other: &CommandContainer) -> bool {
        let (Some(mine), Some(theirs)) = (&self.inner, &other.inner) else {
            return false;
        };
        if Rc::ptr_eq(mine, theirs) {
            return false;
        }
        mine.borrow_mut().merge(&mut *theirs.borrow_mut())
    }

    /// Forward `description`; empty when invalid.
    pub fn description(&self) -> String {
        match &self.inner {
            Some(command) => command.borrow().description(),
            None => String::new(),
        }
    }

    /// Forward `detailed_description`; empty when invalid.
    pub fn detailed_description(&self) -> String {
        match &self.inner {
            Some(command) => command.borrow().detailed_description(),
            None => String::new(),
        }
    }

    /// Forward `set_cursor`; no-op when invalid.
    pub fn set_cursor(&self, cursor: &CursorRef) {
        if let Some(command) = &self.inner {
            command.borrow_mut().set_cursor(cursor);
        }
    }

    /// Forward `cursor`; `None` when invalid or the cursor is gone.
    pub fn cursor(&self) -> Option<CursorRef> {
        self.inner.as_ref().and_then(|command| command.borrow().cursor())
    }

    /// Forward `cursor_at_issue`; [`CursorSnapshot::INVALID`] when invalid.
    pub fn cursor_at_issue(&self) -> CursorSnapshot {
        match &self.inner {
            Some(command) => *command.borrow().cursor_at_issue(),
            None => CursorSnapshot::INVALID,
        }
    }
}

impl std::fmt::Debug for CommandContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.command_type() {
            Some(kind) => f
                .debug_struct("CommandContainer")
                .field("command_type", &kind)
                .field("description", &self.description())
                .finish(),
            None => f.write_str("CommandContainer(invalid)"),
        }
    }
}
