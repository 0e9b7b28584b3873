mod common;

use std::sync::Arc;

use chartseq::{
    CellAddress, ChartError, DataProvider, Document, ErrorKind, LabelOrigin, ProviderConfig,
    RangeAddress, ReferenceToken, SequenceValue,
};
use common::{EventCollector, numbered_column, put};

#[test]
fn slots_follow_token_order_regardless_of_content() {
    let doc = Document::with_sheets(&["Sheet1"]).unwrap();
    put(&doc, 0, 1, 0, "x");
    put(&doc, 0, 0, 1, 10.0);
    doc.set_rows_hidden(0, 2, 2, true).unwrap();

    let provider = DataProvider::new(&doc);
    for include_hidden in [true, false] {
        let seq = provider
            .create_sequence_by_range("A1:A3;B1:B2", include_hidden)
            .unwrap();
        let data = seq.data().unwrap();
        assert_eq!(
            data,
            vec![
                SequenceValue::Text(String::new()),
                SequenceValue::Text("x".into()),
                SequenceValue::Text(String::new()),
                SequenceValue::Number(10.0),
                SequenceValue::Text(String::new()),
            ]
        );
        let origins: Vec<_> = seq
            .snapshot()
            .unwrap()
            .items()
            .iter()
            .map(|item| item.origin)
            .collect();
        assert_eq!(
            origins,
            [(0, 0), (1, 0), (2, 0), (0, 1), (1, 1)]
                .map(|(r, c)| chartseq::ItemOrigin::Local(CellAddress::new(0, r, c)))
        );
    }
}

#[test]
fn rebuild_is_idempotent() {
    let doc = numbered_column(50);
    put(&doc, 0, 7, 0, "seven");
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("Sheet1!A1:A50", false)
        .unwrap();
    assert_eq!(seq.generation(), 1);

    let first = seq.snapshot().unwrap();
    seq.build().unwrap();
    let second = seq.snapshot().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(first.bit_identical(&second));
    assert_eq!(seq.generation(), 2);
}

#[test]
fn reads_rebuild_only_when_dirty() {
    let doc = numbered_column(3);
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("A1:A3", true)
        .unwrap();
    let events = EventCollector::attach(&seq);

    seq.numerical_data().unwrap();
    seq.textual_data().unwrap();
    assert_eq!(seq.generation(), 1);

    put(&doc, 0, 0, 0, 9.0);
    put(&doc, 0, 1, 0, 8.0);
    doc.notify_recalculated();
    assert_eq!(events.count(), 1);
    assert!(seq.is_dirty());
    assert_eq!(seq.numerical_data().unwrap(), vec![9.0, 8.0, 3.0]);
    assert_eq!(seq.generation(), 2);
    assert_eq!(seq.textual_data().unwrap(), vec!["9", "8", "3"]);
    assert_eq!(seq.generation(), 2);
}

#[test]
fn edits_outside_the_range_are_ignored() {
    let doc = numbered_column(3);
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("A1:A3", true)
        .unwrap();
    let events = EventCollector::attach(&seq);
    put(&doc, 0, 10, 0, 1.0);
    put(&doc, 0, 0, 3, 1.0);
    doc.insert_rows(0, 20, 2).unwrap();
    assert_eq!(events.count(), 0);
    assert!(!seq.is_dirty());
}

#[test]
fn number_format_keys() {
    let doc = Document::with_sheets(&["Sheet1"]).unwrap();
    put(&doc, 0, 1, 0, 44_000.0);
    put(&doc, 0, 2, 0, 0.25);
    doc.set_number_format(CellAddress::new(0, 1, 0), 14).unwrap();
    doc.set_number_format(CellAddress::new(0, 2, 0), 10).unwrap();
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("A1:A3", true)
        .unwrap();

    assert_eq!(seq.number_format_key_by_index(-1).unwrap(), 14);
    assert_eq!(seq.number_format_key_by_index(2).unwrap(), 10);
    assert_eq!(seq.number_format_key_by_index(0).unwrap(), 0);

    let err = seq.number_format_key_by_index(3).unwrap_err();
    assert_eq!(err, ChartError::OutOfRange { index: 3, len: 3 });
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
    assert!(seq.number_format_key_by_index(-2).is_err());

    let blank = DataProvider::new(&doc)
        .create_sequence_by_range("C1:C3", true)
        .unwrap();
    assert_eq!(blank.number_format_key_by_index(-1).unwrap(), 0);
}

#[test]
fn representation_and_labels_come_from_tokens() {
    let doc = Document::with_sheets(&["Sheet1", "My Data"]).unwrap();
    let provider = DataProvider::new(&doc);
    let seq = provider
        .create_sequence_by_range("'my data'!b1:c10", true)
        .unwrap();
    assert_eq!(
        seq.source_range_representation().unwrap(),
        "'My Data'!$B$1:$C$10"
    );
    assert_eq!(
        seq.generate_label(LabelOrigin::ShortSide).unwrap(),
        vec!["Column B", "Column C"]
    );
    assert_eq!(seq.generate_label(LabelOrigin::LongSide).unwrap().len(), 10);
    assert_eq!(
        seq.generate_label(LabelOrigin::Row).unwrap().first().map(String::as_str),
        Some("Row 1")
    );
}

#[test]
fn clones_are_independent() {
    let doc = numbered_column(2);
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("A1:A2", true)
        .unwrap();
    let clone = seq.create_clone().unwrap();
    assert_ne!(clone.id(), seq.id());
    assert_eq!(clone.tokens(), seq.tokens());
    assert_eq!(clone.role(), seq.role());
    assert_eq!(doc.edit_listener_count(), 2);

    let original_events = EventCollector::attach(&seq);
    let clone_events = EventCollector::attach(&clone);
    put(&doc, 0, 0, 0, 5.0);
    assert_eq!((original_events.count(), clone_events.count()), (1, 1));

    clone.numerical_data().unwrap();
    drop(seq);
    assert_eq!(doc.edit_listener_count(), 1);
    put(&doc, 0, 1, 0, 6.0);
    assert_eq!(clone.numerical_data().unwrap(), vec![5.0, 6.0]);
}

#[test]
fn replacing_tokens_resubscribes_and_notifies() {
    let doc = numbered_column(5);
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("A1:A2", true)
        .unwrap();
    let events = EventCollector::attach(&seq);

    seq.set_tokens(vec![ReferenceToken::Area(
        RangeAddress::new(0, 3, 0, 4, 0).unwrap(),
    )])
    .unwrap();
    assert_eq!(events.count(), 1);
    assert_eq!(seq.numerical_data().unwrap(), vec![4.0, 5.0]);

    put(&doc, 0, 0, 0, 100.0);
    assert_eq!(events.count(), 1);
    put(&doc, 0, 4, 0, 50.0);
    assert_eq!(events.count(), 2);

    let bad = vec![ReferenceToken::Cell(CellAddress::new(3, 0, 0))];
    assert_eq!(seq.set_tokens(bad).unwrap_err().kind(), ErrorKind::Argument);
}

#[test]
fn structural_edits_adjust_references() {
    let doc = numbered_column(4);
    doc.add_sheet("Other").unwrap();
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("Sheet1!A2:A3;Other!B1", true)
        .unwrap();
    let events = EventCollector::attach(&seq);

    doc.delete_rows(0, 0, 1).unwrap();
    assert_eq!(events.count(), 1);
    assert_eq!(
        seq.source_range_representation().unwrap(),
        "Sheet1!$A$1:$A$2;Other!$B$1"
    );
    assert_eq!(seq.numerical_data().unwrap(), vec![2.0, 3.0, 0.0]);

    doc.remove_sheet(1).unwrap();
    assert_eq!(
        seq.source_range_representation().unwrap(),
        "Sheet1!$A$1:$A$2;#REF!"
    );
    assert_eq!(seq.data().unwrap().len(), 2);
}

#[test]
fn named_ranges_resolve_live() {
    let doc = numbered_column(6);
    doc.define_name("Sales", vec![RangeAddress::new(0, 0, 0, 1, 0).unwrap()])
        .unwrap();
    let seq = DataProvider::new(&doc)
        .create_sequence_by_range("Sales", true)
        .unwrap();
    assert_eq!(seq.numerical_data().unwrap(), vec![1.0, 2.0]);
    let events = EventCollector::attach(&seq);

    doc.define_name("Sales", vec![RangeAddress::new(0, 4, 0, 5, 0).unwrap()])
        .unwrap();
    assert_eq!(events.count(), 1);
    assert_eq!(seq.numerical_data().unwrap(), vec![5.0, 6.0]);

    put(&doc, 0, 5, 0, 60.0);
    assert_eq!(events.count(), 2);
    assert_eq!(seq.source_range_representation().unwrap(), "Sales");
}

#[test]
fn oversized_rebuild_keeps_previous_snapshot() {
    let doc = numbered_column(4);
    let provider = DataProvider::with_config(
        &doc,
        ProviderConfig {
            max_cells_per_sequence: 4,
            ..ProviderConfig::default()
        },
    );
    let seq = provider.create_sequence_by_range("A1:A4", true).unwrap();
    let before = seq.snapshot().unwrap();

    doc.insert_rows(0, 2, 2).unwrap();
    let err = seq.data().unwrap_err();
    assert!(matches!(err, ChartError::OutOfRange { index: 6, len: 4 }));
    assert!(seq.is_dirty());
    assert_eq!(seq.generation(), 1);

    doc.delete_rows(0, 2, 2).unwrap();
    let after = seq.snapshot().unwrap();
    assert!(before.bit_identical(&after));

    assert!(provider.create_sequence_by_range("A1:B3", true).is_err());
}

#[test]
fn disposed_document_is_a_runtime_error() {
    let doc = numbered_column(2);
    let provider = DataProvider::new(&doc);
    let seq = provider.create_sequence_by_range("A1:A2", true).unwrap();
    assert_eq!(seq.numerical_data().unwrap(), vec![1.0, 2.0]);

    drop(doc);
    let err = seq.numerical_data().unwrap_err();
    assert_eq!(err, ChartError::DocumentDisposed);
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert!(seq.is_dirty());
    assert!(seq.source_range_representation().is_err());
    assert!(seq.create_clone().is_err());
    assert!(!seq.switch_to_next(true));
    assert_eq!(
        provider.create_sequence_by_range("A1", true).unwrap_err(),
        ChartError::DocumentDisposed
    );
}
