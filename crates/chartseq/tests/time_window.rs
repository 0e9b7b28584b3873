mod common;

use chartseq::{DataProvider, DataSequence, Document, ErrorKind, TimeWindow};
use common::{EventCollector, put};

const MONTHS: [&str; 6] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];

/// Six sheets, each holding its own index in A1.
fn monthly() -> Document {
    let doc = Document::with_sheets(&MONTHS).unwrap();
    for sheet in 0..6u16 {
        put(&doc, sheet, 0, 0, f64::from(sheet));
    }
    doc
}

fn current_value(seq: &DataSequence) -> f64 {
    seq.numerical_data().unwrap()[0]
}

#[test]
fn window_from_two_to_five() {
    let doc = monthly();
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("Jan:Jun!A1", true)
        .unwrap();
    assert_eq!(seq.data().unwrap().len(), 6);

    seq.set_time_based(true).unwrap();
    assert_eq!(seq.time_window(), Some(TimeWindow::new(0, 5)));
    assert_eq!(seq.numerical_data().unwrap(), vec![0.0]);

    let events = EventCollector::attach(&seq);
    seq.set_range(2, 5).unwrap();
    assert_eq!(events.count(), 1);
    assert_eq!(current_value(&seq), 2.0);

    assert!(!seq.set_to_point_in_time(10));
    assert_eq!(seq.time_window().unwrap().current, 2);
    assert_eq!(events.count(), 1);

    assert!(seq.set_to_point_in_time(3));
    assert_eq!(seq.time_window().unwrap().current, 5);
    assert_eq!(current_value(&seq), 5.0);
    assert_eq!(events.count(), 2);

    assert!(!seq.switch_to_next(false));
    assert_eq!(seq.time_window().unwrap().current, 5);
    assert_eq!(events.count(), 2);

    assert!(seq.switch_to_next(true));
    assert_eq!(seq.time_window().unwrap().current, 2);
    assert_eq!(current_value(&seq), 2.0);
    assert_eq!(events.count(), 3);

    assert!(seq.switch_to_next(false));
    assert_eq!(current_value(&seq), 3.0);
}

#[test]
fn cursor_moves_rebuild_eagerly() {
    let doc = monthly();
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("Jan:Jun!A1", true)
        .unwrap();
    seq.set_time_based(true).unwrap();
    let generation = seq.generation();

    assert!(seq.switch_to_next(false));
    assert!(!seq.is_dirty());
    assert_eq!(seq.generation(), generation + 1);
    assert_eq!(current_value(&seq), 1.0);
    assert_eq!(seq.generation(), generation + 1);
}

#[test]
fn set_range_clamps_the_cursor() {
    let doc = monthly();
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("Jan:Jun!A1", true)
        .unwrap();
    seq.set_time_based(true).unwrap();
    let events = EventCollector::attach(&seq);

    seq.set_range(0, 3).unwrap();
    assert_eq!(events.count(), 0);
    assert_eq!(seq.time_window(), Some(TimeWindow::new(0, 3)));

    let err = seq.set_range(4, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
    assert_eq!(seq.time_window(), Some(TimeWindow::new(0, 3)));
}

#[test]
fn sequences_without_a_window_refuse_cursor_moves() {
    let doc = monthly();
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("Jan!A1", true)
        .unwrap();
    assert!(!seq.is_time_based());
    assert!(!seq.switch_to_next(true));
    assert!(!seq.set_to_point_in_time(0));
    assert_eq!(seq.set_range(0, 1).unwrap_err().kind(), ErrorKind::Argument);
}

#[test]
fn window_follows_sheet_insertion() {
    let doc = monthly();
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("Feb:Apr!A1", true)
        .unwrap();
    seq.set_time_based(true).unwrap();
    assert_eq!(current_value(&seq), 1.0);

    doc.insert_sheet(0, "Dec").unwrap();
    assert_eq!(seq.time_window(), Some(TimeWindow::new(2, 4)));
    assert_eq!(current_value(&seq), 1.0);
    assert_eq!(seq.source_range_representation().unwrap(), "Feb:Apr!$A$1");

    seq.set_time_based(false).unwrap();
    assert_eq!(seq.numerical_data().unwrap(), vec![1.0, 2.0, 3.0]);
}
