//! End-to-end tests of the command queue: stack discipline, merging,
//! bounded depth, cursor tracking, and notifications.

use doc_command::{
    CommandContainer, CommandQueue, DeleteTextCommand, InsertTextCommand, QueueEvent,
};
use doc_model::{Cursor, CursorRef, Document, ElementCursor};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

/// Issue a text insertion through the queue, bound to `cursor`.
fn type_text(
    queue: &mut CommandQueue,
    document: &mut Document,
    cursor: &CursorRef,
    text: &str,
) -> bool {
    let command = CommandContainer::new(InsertTextCommand::new(text));
    command.set_cursor(cursor);
    queue.insert_command(document, command)
}

/// Issue a text insertion from a fresh, untracked cursor at `at`. Fresh
/// cursors never sit at the end of the previous insertion, so these commands
/// never merge.
fn insert_at(
    queue: &mut CommandQueue,
    document: &mut Document,
    at: ElementCursor,
    text: &str,
) -> bool {
    type_text(queue, document, &Cursor::new_ref(at), text)
}

fn record_events(queue: &mut CommandQueue) -> Rc<RefCell<Vec<QueueEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    queue.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    events
}

#[test]
fn test_empty_queue_state() {
    let queue = CommandQueue::new();
    assert!(!queue.can_undo());
    assert!(!queue.can_redo());
    assert_eq!(queue.undo_stack_size(), 0);
    assert_eq!(queue.redo_stack_size(), 0);
    assert_eq!(queue.maximum_stack_depth(), 0);
}

#[test]
fn test_undo_redo_walk_restores_every_intermediate_state() {
    let mut doc = Document::new();
    let mut queue = CommandQueue::new();

    assert!(insert_at(&mut queue, &mut doc, ElementCursor::body(0, 0), "c"));
    assert!(insert_at(&mut queue, &mut doc, ElementCursor::body(0, 0), "b"));
    assert!(insert_at(&mut queue, &mut doc, ElementCursor::body(0, 0), "a"));
    assert_eq!(queue.undo_stack_size(), 3);
    assert_eq!(doc.block_text(0).unwrap(), "abc");

    // Walk all the way back.
    assert!(queue.undo(&mut doc));
    assert_eq!(doc.block_text(0).unwrap(), "bc");
    assert!(queue.undo(&mut doc));
    assert_eq!(doc.block_text(0).unwrap(), "c");
    assert!(queue.undo(&mut doc));
    assert_eq!(doc.block_text(0).unwrap(), "");
    assert!(!queue.can_undo());
    assert_eq!(queue.redo_stack_size(), 3);

    // And forward again, command by command.
    assert!(queue.redo(&mut doc));
    assert_eq!(doc.block_text(0).unwrap(), "c");
    assert!(queue.redo(&mut doc));
    assert_eq!(doc.block_text(0).unwrap(), "bc");
    assert!(queue.redo(&mut doc));
    assert_eq!(doc.block_text(0).unwrap(), "abc");
    assert!(!queue.can_redo());
}

#[test]
fn test_new_command_clears_redo_stack() {
    let mut doc = Document::new();
    let mut queue = CommandQueue::new();

    assert!(insert_at(&mut queue, &mut doc, ElementCursor::body(0, 0), "a"));
    assert!(insert_at(&mut queue, &mut doc, ElementCursor::body(0, 0), "b"));
    assert!(queue.undo(&mut doc));
    assert_eq!(queue.redo_stack_size(), 1);

    assert!(insert_at(&mut queue, &mut doc, ElementCursor::body(0, 0), "c"));
    assert_eq!(queue.redo_stack_size(), 0);

    let events = record_events(&mut queue);
    assert!(!queue.redo(&mut doc));
    let events = events.borrow();
    assert_eq!(events.len(), 1);
    let QueueEvent::RedoFailed(container) = &events[0] else {
        panic!("expected RedoFailed, got {:?}", events[0]);
    };
    assert!(container.is_invalid());
}

#[test]
fn test_contiguous_typing_coalesces_to_one_entry() {
    let mut doc = Document::new();
    let mut queue = CommandQueue::new();
    let cursor = Cursor::new_ref(ElementCursor::body(0, 0));
    queue.add_cursor(&cursor);

    // The queue shifts the tracked cursor past each insertion, so every
    // keystroke is issued exactly at the end of the previous one.
    for ch in ["w", "o", "r", "d"] {
        assert!(type_text(&mut queue, &mut doc, &cursor, ch));
    }
    assert_eq!(doc.block_text(0).unwrap(), "word");
    assert_eq!(queue.undo_stack_size(), 1);

    // One undo removes the whole coalesced word.
    assert!(queue.undo(&mut doc));
    assert_eq!(doc.block_text(0).unwrap(), "");

    assert!(queue.redo(&mut doc));
    assert_eq!(doc.block_text(0).unwrap(), "word");
}

#[test]
fn test_newline_is_its_own_undo_step() {
    let mut doc = Document::new();
    let mut queue = CommandQueue::new();
    let cursor = Cursor::new_ref(ElementCursor::body(0, 0));
    queue.add_cursor(&cursor);

    assert!(type_text(&mut queue, &mut doc, &cursor, "a"));
    assert!(type_text(&mut queue, &mut doc, &cursor, "\n"));
    assert_eq!(queue.undo_stack_size(), 2);

    // And nothing merges into a newline either.
    assert!(type_text(&mut queue, &mut doc, &cursor, "b"));
    assert_eq!(queue.undo_stack_size(), 3);
}

#[test]
fn test_bounded_depth_evicts_oldest_undo_entries() {
    let mut doc = Document::new();
    let mut queue = CommandQueue::with_max_depth(2);

    for text in ["1", "2", "3", "4"] {
        assert!(insert_at(&mut queue, &mut doc, ElementCursor::body(0, 0), text));
        assert!(queue.undo_stack_size() + queue.redo_stack_size() <= 2);
    }
    assert_eq!(queue.undo_stack_size(), 2);
    assert_eq!(doc.block_text(0).unwrap(), "4321");

    // Only the two newest entries survive; the early edits are permanent.
    assert!(queue.undo(&mut doc));
    assert!(queue.undo(&mut doc));
    assert!(!queue.can_undo());
    assert_eq!(doc.block_text(0).unwrap(), "21");
}

#[test]
fn test_invalid_container_is_safe_everywhere() {
    let container = CommandContainer::default();
    let mut doc = Document::new();
    let ctx = doc_model::CursorAdjuster::empty();

    assert!(container.is_invalid());
    assert!(!container.execute(&mut doc, &ctx));
    assert!(!container.undo(&mut doc, &ctx));
    assert!(!container.redo(&mut doc, &ctx));
    assert!(!container.merge(&CommandContainer::invalid()));
    assert_eq!(container.description(), "");
    assert_eq!(container.detailed_description(), "");
    assert!(container.cursor().is_none());
    assert_eq!(container.cursor_at_issue(), doc_model::CursorSnapshot::INVALID);
    assert_eq!(container.command_type(), None);
}

#[test]
fn test_failed_execute_leaves_stacks_untouched() {
    let mut doc = Document::from_text("ab");
    let mut queue = CommandQueue::new();
    assert!(insert_at(&mut queue, &mut doc, ElementCursor::body(0, 0), "x"));

    let events = record_events(&mut queue);
    let doomed = CommandContainer::new(DeleteTextCommand::new(ElementCursor::body(0, 0), 99));
    doomed.set_cursor(&Cursor::new_ref(ElementCursor::body(0, 0)));
    assert!(!queue.insert_command(&mut doc, doomed));

    assert_eq!(queue.undo_stack_size(), 1);
    assert_eq!(queue.redo_stack_size(), 0);
    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], QueueEvent::CommandFailed(c) if c.is_valid()));
}

#[test]
fn test_undo_survives_destroyed_cursor() {
    let mut doc = Document::new();
    let mut queue = CommandQueue::new();
    let cursor = Cursor::new_ref(ElementCursor::body(0, 0));
    queue.add_cursor(&cursor);

    assert!(type_text(&mut queue, &mut doc, &cursor, "gone"));
    drop(cursor);
    assert!(queue.cursors().is_empty());

    // The command referenced the destroyed cursor; undo still mutates.
    assert!(queue.undo(&mut doc));
    assert_eq!(doc.block_text(0).unwrap(), "");
    assert!(queue.redo(&mut doc));
    assert_eq!(doc.block_text(0).unwrap(), "gone");
}

#[test]
fn test_at_is_safe_for_any_index() {
    let mut doc = Document::new();
    let mut queue = CommandQueue::new();
    assert!(insert_at(&mut queue, &mut doc, ElementCursor::body(0, 0), "a"));
    assert!(insert_at(&mut queue, &mut doc, ElementCursor::body(0, 0), "b"));
    assert!(queue.undo(&mut doc));

    // Index 0 is the undo top, 1 the redo top.
    assert!(queue.at(0).is_valid());
    assert!(queue.at(1).is_valid());
    assert!(queue.at(-1).is_invalid());
    assert!(queue.at(2).is_invalid());
    assert!(queue.at(100).is_invalid());
    assert!(queue.at(-100).is_invalid());
    assert!(queue.at(isize::MAX).is_invalid());
    assert!(queue.at(isize::MIN + 1).is_invalid());
}

#[test]
fn test_scenario_typing_hi() {
    let mut doc = Document::new();
    let mut queue = CommandQueue::new();
    let cursor = Cursor::new_ref(ElementCursor::body(0, 0));
    queue.add_cursor(&cursor);

    assert_eq!(queue.undo_stack_size(), 0);
    assert!(!queue.can_undo());

    assert!(type_text(&mut queue, &mut doc, &cursor, "H"));
    assert_eq!(queue.undo_stack_size(), 1);

    assert!(type_text(&mut queue, &mut doc, &cursor, "i"));
    assert_eq!(queue.undo_stack_size(), 1);
    assert_eq!(doc.block_text(0).unwrap(), "Hi");

    assert!(queue.undo(&mut doc));
    assert_eq!(doc.block_text(0).unwrap(), "");
    assert_eq!(queue.undo_stack_size(), 0);
    assert_eq!(queue.redo_stack_size(), 1);

    assert!(queue.redo(&mut doc));
    assert_eq!(doc.block_text(0).unwrap(), "Hi");
    assert_eq!(queue.undo_stack_size(), 1);
    assert_eq!(queue.redo_stack_size(), 0);
}

#[test]
fn test_shrinking_depth_favors_redo_entries() {
    let mut doc = Document::new();
    let mut queue = CommandQueue::new();
    for text in ["1", "2", "3", "4", "5", "6"] {
        assert!(insert_at(&mut queue, &mut doc, ElementCursor::body(0, 0), text));
    }
    for _ in 0..3 {
        assert!(queue.undo(&mut doc));
    }
    assert_eq!(queue.undo_stack_size(), 3);
    assert_eq!(queue.redo_stack_size(), 3);

    // Redo alone already exceeds the new bound: all undo history goes,
    // the redo stack keeps its newest entries.
    queue.set_maximum_stack_depth(2);
    assert_eq!(queue.undo_stack_size(), 0);
    assert_eq!(queue.redo_stack_size(), 2);
    assert!(queue.redo(&mut doc));
    assert!(queue.redo(&mut doc));
    assert!(!queue.can_redo());
}

#[test]
fn test_shrinking_depth_trims_undo_to_remaining_budget() {
    let mut doc = Document::new();
    let mut queue = CommandQueue::new();
    for text in ["1", "2", "3", "4", "5"] {
        assert!(insert_at(&mut queue, &mut doc, ElementCursor::body(0, 0), text));
    }
    assert!(queue.undo(&mut doc));
    assert_eq!(queue.undo_stack_size(), 4);
    assert_eq!(queue.redo_stack_size(), 1);

    queue.set_maximum_stack_depth(3);
    assert_eq!(queue.undo_stack_size(), 2);
    assert_eq!(queue.redo_stack_size(), 1);

    // Zero lifts the bound without trimming anything.
    queue.set_maximum_stack_depth(0);
    assert_eq!(queue.undo_stack_size(), 2);
    assert_eq!(queue.redo_stack_size(), 1);
}

#[test]
fn test_undo_restores_cursor_to_issue_position() {
    let mut doc = Document::from_text("xxxx");
    let mut queue = CommandQueue::new();
    let cursor = Cursor::new_ref(ElementCursor::body(0, 0));
    queue.add_cursor(&cursor);

    assert!(type_text(&mut queue, &mut doc, &cursor, "ab"));
    assert_eq!(cursor.borrow().position(), ElementCursor::body(0, 2));

    // The user navigates away; undo snaps the cursor back to where the
    // edit was issued.
    cursor.borrow_mut().set_position(ElementCursor::body(0, 5));
    assert!(queue.undo(&mut doc));
    assert_eq!(cursor.borrow().position(), ElementCursor::body(0, 0));
}

#[test]
fn test_redo_restores_cursor_before_replaying() {
    let mut doc = Document::from_text("xxxx");
    let mut queue = CommandQueue::new();
    let cursor = Cursor::new_ref(ElementCursor::body(0, 0));
    queue.add_cursor(&cursor);

    assert!(type_text(&mut queue, &mut doc, &cursor, "ab"));
    assert!(queue.undo(&mut doc));

    cursor.borrow_mut().set_position(ElementCursor::body(0, 3));
    assert!(queue.redo(&mut doc));
    assert_eq!(doc.block_text(0).unwrap(), "abxxxx");
    // Restored to the issue position first, then shifted past the
    // reinserted text; not left where the user had navigated to.
    assert_eq!(cursor.borrow().position(), ElementCursor::body(0, 2));
}

#[test]
fn test_undo_restores_selection_from_snapshot() {
    let mut doc = Document::from_text("hello world");
    let mut queue = CommandQueue::new();
    let cursor = Cursor::new_ref(ElementCursor::body(0, 0));
    queue.add_cursor(&cursor);
    cursor
        .borrow_mut()
        .select(ElementCursor::body(0, 6), ElementCursor::body(0, 11));

    assert!(type_text(&mut queue, &mut doc, &cursor, "there"));
    assert_eq!(doc.block_text(0).unwrap(), "hello there");

    assert!(queue.undo(&mut doc));
    assert_eq!(doc.block_text(0).unwrap(), "hello world");
    assert_eq!(cursor.borrow().anchor(), Some(ElementCursor::body(0, 6)));
    assert_eq!(cursor.borrow().position(), ElementCursor::body(0, 11));
}

#[test]
fn test_cursor_registration_is_idempotent() {
    let mut queue = CommandQueue::new();
    let cursor = Cursor::new_ref(ElementCursor::body(0, 0));
    assert!(queue.add_cursor(&cursor));
    assert!(!queue.add_cursor(&cursor));
    assert_eq!(queue.cursors().len(), 1);

    assert!(queue.remove_cursor(&cursor));
    assert!(!queue.remove_cursor(&cursor));
    assert!(queue.cursors().is_empty());
}

#[test]
fn test_undo_on_empty_stack_reports_invalid_failure() {
    let mut doc = Document::new();
    let mut queue = CommandQueue::new();
    let events = record_events(&mut queue);

    assert!(!queue.undo(&mut doc));
    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], QueueEvent::UndoFailed(c) if c.is_invalid()));
}

#[test]
fn test_change_notifications_fire_on_transitions() {
    let mut doc = Document::new();
    let mut queue = CommandQueue::new();
    let cursor = Cursor::new_ref(ElementCursor::body(0, 0));
    queue.add_cursor(&cursor);
    let events = record_events(&mut queue);

    assert!(type_text(&mut queue, &mut doc, &cursor, "a"));
    {
        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            QueueEvent::StackChanged {
                undo_size: 1,
                redo_size: 0
            }
        ));
        assert!(matches!(events[1], QueueEvent::UndoAvailable(true)));
    }
    events.borrow_mut().clear();

    // A merge leaves the sizes unchanged but forces all three events so
    // history views refresh.
    assert!(type_text(&mut queue, &mut doc, &cursor, "b"));
    assert_eq!(queue.undo_stack_size(), 1);
    {
        let events = events.borrow();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0],
            QueueEvent::StackChanged {
                undo_size: 1,
                redo_size: 0
            }
        ));
        assert!(matches!(events[1], QueueEvent::UndoAvailable(true)));
        assert!(matches!(events[2], QueueEvent::RedoAvailable(false)));
    }
    events.borrow_mut().clear();

    assert!(queue.undo(&mut doc));
    {
        let events = events.borrow();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[0],
            QueueEvent::StackChanged {
                undo_size: 0,
                redo_size: 1
            }
        ));
        assert!(matches!(events[1], QueueEvent::UndoAvailable(false)));
        assert!(matches!(events[2], QueueEvent::RedoAvailable(true)));
    }
}

#[test]
fn test_stack_introspection_reports_descriptions() {
    let mut doc = Document::new();
    let mut queue = CommandQueue::new();
    assert!(insert_at(&mut queue, &mut doc, ElementCursor::body(0, 0), "a"));
    assert!(insert_at(&mut queue, &mut doc, ElementCursor::body(0, 0), "b"));
    assert!(queue.undo(&mut doc));

    assert_eq!(queue.at(0).description(), "insert text");
    assert_eq!(queue.at(1).detailed_description(), "insert \"b\"");
    assert_eq!(queue.at(5).description(), "");
}
