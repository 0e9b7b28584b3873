mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chartseq::{CellValue, ChartError, DataProvider, DataSequence, ModifyEvent, Result};
use common::{EventCollector, numbered_column, put};

#[test]
fn dropping_the_last_handle_releases_every_registration() {
    let doc = numbered_column(3);
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("A1:A3;[Book.xlsx]Data!A1", false)
        .unwrap();
    let file = doc.external_links().file_id("Book.xlsx").unwrap();
    assert_eq!(doc.edit_listener_count(), 1);
    assert_eq!(doc.visibility_listener_count(), 1);
    assert_eq!(doc.external_links().listener_count(file), 1);

    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    seq.on_modified(move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });
    drop(seq);

    assert_eq!(doc.edit_listener_count(), 0);
    assert_eq!(doc.visibility_listener_count(), 0);
    assert_eq!(doc.external_links().listener_count(file), 0);

    put(&doc, 0, 0, 0, 10.0);
    doc.set_rows_hidden(0, 1, 1, true).unwrap();
    doc.external_links()
        .load_sheet(file, "Data", [(0, 0, CellValue::Number(1.0))])
        .unwrap();
    doc.insert_rows(0, 0, 1).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn shared_handles_keep_the_sequence_alive() {
    let doc = numbered_column(2);
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("A1:A2", true)
        .unwrap();
    let handle = seq.clone();
    assert_eq!(handle.id(), seq.id());
    let events = EventCollector::attach(&handle);

    drop(seq);
    assert_eq!(doc.edit_listener_count(), 1);
    put(&doc, 0, 0, 0, 4.0);
    assert_eq!(events.count(), 1);
    assert_eq!(handle.numerical_data().unwrap(), vec![4.0, 2.0]);

    drop(handle);
    assert_eq!(doc.edit_listener_count(), 0);
}

#[test]
fn listeners_can_be_removed() {
    let doc = numbered_column(2);
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("A1:A2", true)
        .unwrap();
    let events = EventCollector::attach(&seq);
    let extra = seq.on_modified(|_| {});
    assert_eq!(seq.modify_listener_count(), 2);
    assert!(seq.remove_modify_listener(extra));
    assert!(!seq.remove_modify_listener(extra));

    put(&doc, 0, 1, 0, 9.0);
    assert_eq!(events.count(), 1);
    assert_eq!(seq.modify_listener_count(), 1);
}

#[test]
fn failing_listeners_do_not_stop_delivery() {
    let doc = numbered_column(2);
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("A1:A2", true)
        .unwrap();
    seq.add_modify_listener(Arc::new(|_: &ModifyEvent| -> Result<()> {
        Err(ChartError::Runtime("listener gave up".into()))
    }));
    let events = EventCollector::attach(&seq);

    put(&doc, 0, 0, 0, 1.5);
    assert_eq!(events.count(), 1);
    assert_eq!(seq.numerical_data().unwrap(), vec![1.5, 2.0]);
}

#[test]
fn listeners_may_read_the_sequence_during_notification() {
    let doc = numbered_column(2);
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("A1:A2", true)
        .unwrap();
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let handle = seq.clone();
    let s = seen.clone();
    seq.on_modified(move |event| {
        assert_eq!(event.source, handle.id());
        s.lock().push(handle.numerical_data().unwrap());
    });

    put(&doc, 0, 1, 0, 6.0);
    assert_eq!(*seen.lock(), vec![vec![1.0, 6.0]]);
}

#[test]
fn sequences_are_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DataSequence>();
    assert_send_sync::<chartseq::Document>();
    assert_send_sync::<DataProvider>();
}
