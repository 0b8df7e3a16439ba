//! Queue change and failure notifications.
//!
//! The queue notifies subscribers through a registered callback list. Three
//! change tiers let UI bind cheaply: the generic [`StackChanged`] event backs
//! full history views, while the two availability events are enough to
//! enable/disable undo/redo menu items without inspecting stack contents.
//! Failure events carry the offending command, or an invalid container when
//! the failure was "nothing to do".
//!
//! [`StackChanged`]: QueueEvent::StackChanged

use crate::container::CommandContainer;

/// A change or failure notification from the command queue.
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// Stack contents changed (sizes may be unchanged after a merge).
    StackChanged {
        /// New undo stack size.
        undo_size: usize,
        /// New redo stack size.
        redo_size: usize,
    },
    /// Undo availability transitioned (or a merge forced re-evaluation).
    UndoAvailable(bool),
    /// Redo availability transitioned (or a merge forced re-evaluation).
    RedoAvailable(bool),
    /// A newly inserted command's execute failed; the stacks are untouched.
    CommandFailed(CommandContainer),
    /// Undo failed. The container is invalid when the undo stack was empty,
    /// otherwise it carries the command whose undo returned false.
    UndoFailed(CommandContainer),
    /// Redo failed. The container is invalid when the redo stack was empty,
    /// otherwise it carries the command whose redo returned false.
    RedoFailed(CommandContainer),
}

/// Callback type for queue event subscription.
pub type QueueEventCallback = Box<dyn FnMut(&QueueEvent)>;
