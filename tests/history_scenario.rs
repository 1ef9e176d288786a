use blurpad::{HistoryManager, MAX_HISTORY_LENGTH, PixelSurface, Session, Surface};
use image::Rgba;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

fn stroke(session: &mut Session, color: Rgba<u8>, from: (f32, f32), to: (f32, f32)) {
    session.tools_mut().set_color(color);
    session.pointer_down(from.0, from.1);
    session.pointer_move(to.0, to.1);
    session.pointer_up();
}

#[test]
fn four_by_four_walkthrough() {
    let mut session = Session::new(4, 4);
    session.tools_mut().set_size(1);
    let b0 = session.surface().get_full();
    assert_eq!(b0, vec![0u8; 4 * 4 * 4]);

    stroke(&mut session, RED, (0.5, 0.5), (3.5, 0.5));
    let b1 = session.surface().get_full();
    stroke(&mut session, BLUE, (0.5, 3.5), (3.5, 3.5));
    let b2 = session.surface().get_full();
    assert_ne!(b0, b1);
    assert_ne!(b1, b2);
    assert_eq!(session.history().undo_count(), 3);

    assert!(session.undo());
    assert_eq!(session.surface().get_full(), b1);
    assert!(session.undo());
    assert_eq!(session.surface().get_full(), b0);
    assert!(!session.undo());
    assert_eq!(session.surface().get_full(), b0);

    assert!(session.redo());
    assert!(session.redo());
    assert_eq!(session.surface().get_full(), b2);
    assert!(!session.redo());
}

#[test]
fn history_never_exceeds_its_cap() {
    let mut surface = PixelSurface::new(2, 2);
    let mut history = HistoryManager::new(MAX_HISTORY_LENGTH);
    for i in 0..=MAX_HISTORY_LENGTH {
        surface.fill(Rgba([i as u8, 0, 0, 255]));
        history.checkpoint(&surface);
    }
    assert_eq!(history.undo_count(), MAX_HISTORY_LENGTH);
    // The first checkpoint (value 0) is gone; the second is now the oldest.
    assert_eq!(history.oldest().map(|s| s.pixels()[0]), Some(1));

    while history.undo(&mut surface) {}
    assert_eq!(surface.get_pixel(0, 0), Rgba([1, 0, 0, 255]));
    assert_eq!(history.undo_count(), 1);
    assert_eq!(history.redo_count(), MAX_HISTORY_LENGTH - 1);
}

#[test]
fn new_stroke_after_undo_drops_redo() {
    let mut session = Session::new(8, 8);
    session.tools_mut().set_size(2);
    stroke(&mut session, RED, (1.0, 1.0), (6.0, 1.0));
    assert!(session.undo());
    stroke(&mut session, BLUE, (1.0, 6.0), (6.0, 6.0));
    let after = session.surface().get_full();
    assert!(!session.redo());
    assert_eq!(session.surface().get_full(), after);
}
