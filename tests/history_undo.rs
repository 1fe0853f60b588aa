use std::cell::RefCell;
use std::rc::Rc;

use pixel_paint::{
    CanvasEvent, Command, EditorContext, EditorEvent, EditorSettings, PixelCoordinates, PointerEvent, RgbaColor, ToolId,
};

fn editor(history_depth: usize) -> EditorContext {
    let settings = EditorSettings {
        canvas_width: 4,
        canvas_height: 4,
        history_depth,
        palette: vec!["#000000ff".to_string()],
        ..Default::default()
    };
    EditorContext::new(&settings).unwrap()
}

fn click(editor: &mut EditorContext, x: i32) {
    let pointer = PointerEvent::new(PixelCoordinates::new(x, 0));
    editor.handle_canvas_event(CanvasEvent::DragStart(pointer));
    editor.handle_canvas_event(CanvasEvent::DragStop(pointer));
}

fn painted(editor: &EditorContext) -> Vec<i32> {
    (0..4)
        .filter(|&x| !editor.grid().get_pixel(PixelCoordinates::new(x, 0)).is_empty())
        .collect()
}

#[test]
fn test_undo_and_redo_walk_the_history() {
    let mut editor = editor(10);
    click(&mut editor, 0);
    click(&mut editor, 1);
    click(&mut editor, 2);
    assert_eq!(painted(&editor), vec![0, 1, 2]);

    editor.undo();
    editor.undo();
    assert_eq!(painted(&editor), vec![0]);
    assert_eq!(editor.history().redo_depth(), 2);

    editor.redo();
    assert_eq!(painted(&editor), vec![0, 1]);
}

#[test]
fn test_undo_past_the_start_is_a_no_op() {
    let mut editor = editor(10);
    editor.undo();
    click(&mut editor, 3);
    editor.undo();
    editor.undo();
    assert!(painted(&editor).is_empty());
    assert!(!editor.history().can_undo());
    assert!(editor.history().can_redo());
}

#[test]
fn test_new_commit_clears_redo() {
    let mut editor = editor(10);
    click(&mut editor, 0);
    editor.undo();
    click(&mut editor, 1);
    assert!(!editor.history().can_redo());
    editor.redo();
    assert_eq!(painted(&editor), vec![1]);
}

#[test]
fn test_history_depth_drops_oldest_entries() {
    let mut editor = editor(3);
    for x in 0..4 {
        click(&mut editor, x);
    }
    editor.undo();
    editor.undo();
    editor.undo();
    // Only two steps back are kept
    assert_eq!(painted(&editor), vec![0, 1]);
}

#[test]
fn test_commands_drive_history() {
    let mut editor = editor(10);
    click(&mut editor, 0);
    editor.execute(Command::Undo);
    assert!(painted(&editor).is_empty());
    editor.execute(Command::Redo);
    assert_eq!(painted(&editor), vec![0]);
}

#[test]
fn test_adding_a_layer_starts_history_over() {
    let mut editor = editor(10);
    click(&mut editor, 0);
    editor.add_layer("Top");
    assert!(!editor.history().can_undo());
    editor.undo();
    assert_eq!(editor.grid().layers().len(), 2);
}

#[test]
fn test_history_events() {
    let mut editor = editor(10);
    let depths = Rc::new(RefCell::new(Vec::new()));
    let sink = depths.clone();
    editor
        .event_bus
        .subscribe("history", move |event: &EditorEvent| {
            if let EditorEvent::HistoryChanged { undo_depth, redo_depth } = event {
                sink.borrow_mut().push((*undo_depth, *redo_depth));
            }
        })
        .unwrap();

    click(&mut editor, 0);
    editor.undo();
    editor.redo();
    assert_eq!(*depths.borrow(), vec![(1, 0), (0, 1), (1, 0)]);
}

#[test]
fn test_undo_puts_a_cut_selection_back() {
    let mut editor = editor(10);
    let pointer = PointerEvent::new(PixelCoordinates::new(1, 1));
    editor.handle_canvas_event(CanvasEvent::DragStart(pointer));
    editor.handle_canvas_event(CanvasEvent::DragStop(pointer));
    editor.select_tool(ToolId::Select);

    let corner = |x, y| PointerEvent::new(PixelCoordinates::new(x, y));
    editor.handle_canvas_event(CanvasEvent::DragStart(corner(0, 0)));
    editor.handle_canvas_event(CanvasEvent::Move(corner(2, 2)));
    editor.handle_canvas_event(CanvasEvent::DragStop(corner(2, 2)));
    assert!(editor.grid().get_pixel(PixelCoordinates::new(1, 1)).is_empty());

    editor.undo();
    assert_eq!(editor.grid().get_pixel(PixelCoordinates::new(1, 1)), RgbaColor::BLACK);
    // The pencil dot is still there to undo
    editor.undo();
    assert!(editor.grid().get_pixel(PixelCoordinates::new(1, 1)).is_empty());
}
