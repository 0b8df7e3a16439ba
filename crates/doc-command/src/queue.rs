//! The undo/redo stack-management engine.
//!
//! # Overview
//!
//! [`CommandQueue`] owns the undo and redo stacks, executes newly issued
//! commands, coalesces adjacent edits through the merge protocol, and keeps
//! every tracked cursor consistent across mutations.
//!
//! The engine is single-threaded and synchronous: every operation completes
//! on the caller's thread before returning, and each call is atomic from the
//! caller's point of view — it either performs exactly one stack transition
//! or none.
//!
//! # Example
//!
//! ```rust
//! use doc_command::{CommandContainer, CommandQueue, InsertTextCommand};
//! use doc_model::{Cursor, Document, ElementCursor};
//!
//! let mut document = Document::new();
//! let mut queue = CommandQueue::new();
//! let cursor = Cursor::new_ref(ElementCursor::body(0, 0));
//! queue.add_cursor(&cursor);
//!
//! let command = CommandContainer::new(InsertTextCommand::new("Hi"));
//! command.set_cursor(&cursor);
//! assert!(queue.insert_command(&mut document, command));
//!
//! assert_eq!(document.block_text(0).unwrap(), "Hi");
//! assert!(queue.can_undo());
//!
//! queue.undo(&mut document);
//! assert_eq!(document.block_text(0).unwrap(), "");
//! assert!(queue.can_redo());
//! ```

use crate::container::CommandContainer;
use crate::events::{QueueEvent, QueueEventCallback};
use doc_model::{CursorAdjuster, CursorHandle, CursorRef, Document};
use std::collections::VecDeque;
use std::rc::Rc;

/// The undo/redo engine.
///
/// Both stacks are most-recent-first: index 0 of the undo stack is the command
/// the next [`undo`](Self::undo) will reverse. A configurable depth bound
/// caps `undo + redo` entries (0 means unbounded); the oldest undo entries
/// are evicted first when the bound would be exceeded.
pub struct CommandQueue {
    undo_stack: VecDeque<CommandContainer>,
    redo_stack: VecDeque<CommandContainer>,
    max_depth: usize,
    cursors: Vec<CursorHandle>,
    callbacks: Vec<QueueEventCallback>,
}

impl CommandQueue {
    /// An unbounded queue.
    pub fn new() -> Self {
        Self::with_max_depth(0)
    }

    /// A queue capping `undo + redo` entries at `max_depth` (0 = unbounded).
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth,
            cursors: Vec::new(),
            callbacks: Vec::new(),
        }
    }

    /// Register a callback invoked on every queue event.
    pub fn subscribe(&mut self, callback: impl FnMut(&QueueEvent) + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Whether the undo stack is non-empty.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether the redo stack is non-empty.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Current undo stack size.
    pub fn undo_stack_size(&self) -> usize {
        self.undo_stack.len()
    }

    /// Current redo stack size.
    pub fn redo_stack_size(&self) -> usize {
        self.redo_stack.len()
    }

    /// Current depth bound (0 = unbounded).
    pub fn maximum_stack_depth(&self) -> usize {
        self.max_depth
    }

    /// Stack introspection for history views.
    ///
    /// Index 0 is the most recently executed command (top of the undo
    /// stack); negative indices walk further back in the undo stack;
    /// positive indices walk forward into the redo stack (1 is the top of
    /// the redo stack). Out-of-range indices return an invalid container, so
    /// UI can probe speculatively.
    pub fn at(&self, index: isize) -> CommandContainer {
        let found = if index > 0 {
            self.redo_stack.get(index as usize - 1)
        } else {
            self.undo_stack.get(index.unsigned_abs())
        };
        found.cloned().unwrap_or_default()
    }

    // ---- cursor tracking ----

    /// Track `cursor` for adjustment during command execution. Idempotent;
    /// returns whether the set changed.
    pub fn add_cursor(&mut self, cursor: &CursorRef) -> bool {
        self.prune_cursors();
        let already = self
            .cursors
            .iter()
            .any(|handle| handle.upgrade().is_some_and(|live| Rc::ptr_eq(&live, cursor)));
        if already {
            return false;
        }
        self.cursors.push(Rc::downgrade(cursor));
        true
    }

    /// Stop tracking `cursor`. Returns whether the set changed.
    pub fn remove_cursor(&mut self, cursor: &CursorRef) -> bool {
        let before = self.cursors.len();
        self.cursors.retain(|handle| {
            handle
                .upgrade()
                .is_some_and(|live| !Rc::ptr_eq(&live, cursor))
        });
        self.cursors.len() != before
    }

    /// The currently tracked cursors that are still alive.
    pub fn cursors(&self) -> Vec<CursorRef> {
        self.cursors
            .iter()
            .filter_map(CursorHandle::upgrade)
            .collect()
    }

    fn prune_cursors(&mut self) {
        self.cursors.retain(|handle| handle.upgrade().is_some());
    }

    fn adjuster(&self) -> CursorAdjuster {
        CursorAdjuster::from_handles(&self.cursors)
    }

    // ---- the state machine ----

    /// Execute a new command and, on success, record it for undo.
    ///
    /// A successful insertion clears the redo stack (new forward progress
    /// invalidates redo history), then offers the command to the top of the
    /// undo stack for merging; only if the merge is refused does the command
    /// get its own stack entry. A failed execute leaves both stacks
    /// untouched and emits [`QueueEvent::CommandFailed`].
    pub fn insert_command(&mut self, document: &mut Document, command: CommandContainer) -> bool {
        let ctx = self.adjuster();
        if !command.execute(document, &ctx) {
            self.emit(QueueEvent::CommandFailed(command));
            return false;
        }

        let old_sizes = self.sizes();
        self.redo_stack.clear();

        let merged = match self.undo_stack.front() {
            Some(top) => top.merge(&command),
            None => false,
        };

        if !merged {
            self.undo_stack.push_front(command);
            if self.max_depth != 0 && self.undo_stack.len() > self.max_depth {
                self.undo_stack.pop_back();
            }
        }

        // A merge can leave both sizes unchanged; force the notification so
        // history views still refresh.
        self.generate_change_signals(old_sizes, merged);
        true
    }

    /// Reverse the most recent command.
    ///
    /// On success the issuing cursor is restored to its at-issue snapshot and
    /// the command moves to the redo stack. On failure the command stays on
    /// the undo stack and [`QueueEvent::UndoFailed`] fires — with an invalid
    /// container when there was nothing to undo.
    pub fn undo(&mut self, document: &mut Document) -> bool {
        let Some(command) = self.undo_stack.front().cloned() else {
            self.emit(QueueEvent::UndoFailed(CommandContainer::invalid()));
            return false;
        };

        let ctx = self.adjuster();
        if !command.undo(document, &ctx) {
            self.emit(QueueEvent::UndoFailed(command));
            return false;
        }

        Self::restore_cursor(&command);

        let old_sizes = self.sizes();
        self.undo_stack.pop_front();
        self.redo_stack.push_front(command);
        self.generate_change_signals(old_sizes, false);
        true
    }

    /// Replay the most recently undone command.
    ///
    /// The issuing cursor is restored to its at-issue snapshot *before*
    /// replay, because redo logic may depend on the cursor being positioned
    /// as it originally was. On success the command moves back to the undo
    /// stack; on failure it stays put and [`QueueEvent::RedoFailed`] fires.
    pub fn redo(&mut self, document: &mut Document) -> bool {
        let Some(command) = self.redo_stack.front().cloned() else {
            self.emit(QueueEvent::RedoFailed(CommandContainer::invalid()));
            return false;
        };

        Self::restore_cursor(&command);

        let ctx = self.adjuster();
        if !command.redo(document, &ctx) {
            self.emit(QueueEvent::RedoFailed(command));
            return false;
        }

        let old_sizes = self.sizes();
        self.redo_stack.pop_front();
        self.undo_stack.push_front(command);
        self.generate_change_signals(old_sizes, false);
        true
    }

    /// Change the depth bound. 0 means unbounded.
    ///
    /// When shrinking: if the redo stack alone already meets or exceeds the
    /// new bound, the undo stack is cleared entirely and the redo stack is
    /// trimmed from its tail; otherwise the undo stack is trimmed from its
    /// tail to the remaining budget. The most recently undone entries are
    /// deliberately favored over deep undo history.
    pub fn set_maximum_stack_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
        if max_depth == 0 {
            return;
        }

        let old_sizes = self.sizes();
        if self.redo_stack.len() >= max_depth {
            self.undo_stack.clear();
            self.redo_stack.truncate(max_depth);
        } else {
            self.undo_stack.truncate(max_depth - self.redo_stack.len());
        }

        if self.sizes() != old_sizes {
            self.generate_change_signals(old_sizes, false);
        }
    }

    // ---- notifications ----

    fn sizes(&self) -> (usize, usize) {
        (self.undo_stack.len(), self.redo_stack.len())
    }

    /// Compare pre- and post-operation stack sizes and fire the three-tier
    /// notifications. `force` covers merges, where sizes alone would not
    /// reveal that anything changed.
    fn generate_change_signals(&mut self, old_sizes: (usize, usize), force: bool) {
        let (old_undo, old_redo) = old_sizes;
        let (new_undo, new_redo) = self.sizes();

        if force || old_undo != new_undo || old_redo != new_redo {
            self.emit(QueueEvent::StackChanged {
                undo_size: new_undo,
                redo_size: new_redo,
            });
        }
        if force || (old_undo == 0) != (new_undo == 0) {
            self.emit(QueueEvent::UndoAvailable(new_undo > 0));
        }
        if force || (old_redo == 0) != (new_redo == 0) {
            self.emit(QueueEvent::RedoAvailable(new_redo > 0));
        }
    }

    fn emit(&mut self, event: QueueEvent) {
        for callback in &mut self.callbacks {
            callback(&event);
        }
    }

    /// Restore the issuing cursor to the command's at-issue snapshot. A
    /// cursor that no longer exists is skipped; that is expected, not an
    /// error.
    fn restore_cursor(command: &CommandContainer) {
        if let Some(cursor) = command.cursor() {
            let snapshot = command.cursor_at_issue();
            cursor.borrow_mut().restore(&snapshot);
        }
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
