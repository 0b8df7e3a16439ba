#![warn(missing_docs)]

//! Command execution and undo/redo for docforge documents.
//!
//! # Overview
//!
//! This crate is the editing engine that sits between UI actions and the
//! document model. A UI action constructs a concrete [`Command`], wraps it
//! in a [`CommandContainer`], and hands it to the [`CommandQueue`], which
//! executes it immediately, coalesces it into the previous undo step when
//! the merge protocol allows, and otherwise records it for undo. The queue
//! also keeps every registered cursor consistent across mutations and emits
//! [`QueueEvent`] notifications UI state (menu enablement, history views)
//! is driven from.
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
//! // Typing: the queue shifts the tracked cursor past each insertion.
//! for ch in ["H", "i"] {
//!     let command = CommandContainer::new(InsertTextCommand::new(ch));
//!     command.set_cursor(&cursor);
//!     queue.insert_command(&mut document, command);
//! }
//!
//! // Contiguous typing coalesced into one undo step.
//! assert_eq!(queue.undo_stack_size(), 1);
//! assert_eq!(document.block_text(0).unwrap(), "Hi");
//!
//! queue.undo(&mut document);
//! assert_eq!(document.block_text(0).unwrap(), "");
//! ```
//!
//! # Modules
//!
//! - [`command`] - the [`Command`] trait and shared cursor binding
//! - [`container`] - the shared-ownership command wrapper
//! - [`queue`] - the undo/redo stack engine
//! - [`events`] - queue notification events
//! - [`edit`] - text insertion and deletion commands
//! - [`structure`] - whole-element insertion and deletion commands
//! - [`table`] - table structure commands
//! - [`format`] - character/block/page format commands
//! - [`clipboard`] - the clipboard and cut/copy/paste commands

pub mod clipboard;
pub mod command;
pub mod container;
pub mod edit;
pub mod events;
pub mod format;
pub mod queue;
pub mod structure;
pub mod table;

pub use clipboard::{Clipboard, ClipboardRef, CopyCommand, CutCommand, PasteCommand};
pub use command::{Command, CommandType, CursorBinding};
pub use container::CommandContainer;
pub use edit::{DeleteTextCommand, InsertTextCommand, MAX_MERGE_TEXT_LEN};
pub use events::{QueueEvent, QueueEventCallback};
pub use format::{FormatCommand, FormatEdit};
pub use queue::CommandQueue;
pub use structure::{DeleteElementCommand, InsertElementCommand};
pub use table::{TableCommand, TableEdit};
