mod common;

use chartseq::common::MAX_ROWS;
use chartseq::{
    CellAddress, DataProvider, DataSource, Document, ErrorKind, ExternalArea, RangeAddress,
    ReferenceToken, Role, RowSource, SequenceValue, SourceArguments,
};
use common::put;

/// Categories down A, two series in B and C, headers in row 1.
fn sales_grid() -> Document {
    let doc = Document::with_sheets(&["Sheet1"]).unwrap();
    for (col, header) in ["Cat", "North", "South"].into_iter().enumerate() {
        put(&doc, 0, 0, col as u32, header);
    }
    for (row, quarter) in ["Q1", "Q2", "Q3"].into_iter().enumerate() {
        let row = row as u32 + 1;
        put(&doc, 0, row, 0, quarter);
        put(&doc, 0, row, 1, f64::from(row));
        put(&doc, 0, row, 2, f64::from(row + 3));
    }
    doc
}

fn labels(source: &DataSource) -> Vec<String> {
    source
        .iter()
        .map(|l| l.label.as_ref().unwrap().textual_data().unwrap().concat())
        .collect()
}

fn grid_args() -> SourceArguments {
    SourceArguments {
        first_cell_as_label: true,
        has_categories: true,
        ..SourceArguments::new("A1:C4")
    }
}

#[test]
fn source_splits_columns_into_labeled_series() {
    let doc = sales_grid();
    let provider = DataProvider::new(&doc);
    let source = provider.create_source(&grid_args()).unwrap();
    assert_eq!(source.len(), 3);
    assert_eq!(labels(&source), vec!["Cat", "North", "South"]);

    let categories = source.sequences()[0].values.as_ref().unwrap();
    assert_eq!(*categories.role(), Role::Categories);
    assert_eq!(categories.textual_data().unwrap(), vec!["Q1", "Q2", "Q3"]);
    assert_eq!(
        *source.sequences()[0].label.as_ref().unwrap().role(),
        Role::Label
    );

    let north = source.sequences()[1].values.as_ref().unwrap();
    assert_eq!(*north.role(), Role::ValuesY);
    assert_eq!(north.numerical_data().unwrap(), vec![1.0, 2.0, 3.0]);
    assert_eq!(
        north.source_range_representation().unwrap(),
        "Sheet1!$B$2:$B$4"
    );
    assert_eq!(
        source.sequences()[2].values.as_ref().unwrap().numerical_data().unwrap(),
        vec![4.0, 5.0, 6.0]
    );
    assert_eq!(doc.edit_listener_count(), 6);
}

#[test]
fn detected_arguments_recreate_the_source() {
    let doc = sales_grid();
    let provider = DataProvider::new(&doc);
    let source = provider.create_source(&grid_args()).unwrap();
    let detected = provider.detect_arguments(&source).unwrap();
    assert_eq!(detected.cell_range_representation, "Sheet1!$A$1:$C$4");
    assert_eq!(detected.row_source, RowSource::Columns);
    assert!(detected.first_cell_as_label);
    assert!(detected.has_categories);
    assert!(detected.sequence_mapping.is_empty());
    assert_eq!(detected.include_hidden_cells, Some(true));

    let again = provider.create_source(&detected).unwrap();
    assert_eq!(labels(&again), labels(&source));
}

#[test]
fn mapping_reorders_value_series() {
    let doc = sales_grid();
    let provider = DataProvider::new(&doc);
    let args = SourceArguments {
        sequence_mapping: vec![1, 0],
        ..grid_args()
    };
    let source = provider.create_source(&args).unwrap();
    assert_eq!(labels(&source), vec!["Cat", "South", "North"]);

    let bad = SourceArguments {
        sequence_mapping: vec![0, 0],
        ..grid_args()
    };
    assert_eq!(
        provider.create_source(&bad).unwrap_err().kind(),
        ErrorKind::Argument
    );
    assert!(!provider.create_source_possible(&bad));
}

#[test]
fn rows_orientation_reads_across() {
    let doc = sales_grid();
    let provider = DataProvider::new(&doc);
    let args = SourceArguments {
        row_source: RowSource::Rows,
        first_cell_as_label: true,
        ..SourceArguments::new("A2:C3")
    };
    let source = provider.create_source(&args).unwrap();
    assert_eq!(labels(&source), vec!["Q1", "Q2"]);
    assert_eq!(
        source.sequences()[1].values.as_ref().unwrap().numerical_data().unwrap(),
        vec![2.0, 5.0]
    );

    let detected = provider.detect_arguments(&source).unwrap();
    assert_eq!(detected.row_source, RowSource::Rows);
    assert_eq!(detected.cell_range_representation, "Sheet1!$A$2:$C$3");
    assert!(detected.first_cell_as_label);
    assert!(!detected.has_categories);
}

#[test]
fn hidden_and_time_flags_reach_every_sequence() {
    let doc = Document::with_sheets(&["A", "B"]).unwrap();
    put(&doc, 0, 0, 0, 1.0);
    put(&doc, 1, 0, 0, 2.0);
    let provider = DataProvider::new(&doc);
    let args = SourceArguments {
        include_hidden_cells: Some(false),
        time_based: true,
        ..SourceArguments::new("A:B!A1:B1")
    };
    let source = provider.create_source(&args).unwrap();
    assert_eq!(source.len(), 2);
    for labeled in &source {
        let values = labeled.values.as_ref().unwrap();
        assert!(values.is_time_based());
        assert!(!values.include_hidden_cells());
    }
    assert_eq!(
        source.sequences()[0].values.as_ref().unwrap().numerical_data().unwrap(),
        vec![1.0]
    );

    let detected = provider.detect_arguments(&source).unwrap();
    assert!(detected.time_based);
    assert_eq!(detected.include_hidden_cells, Some(false));
}

#[test]
fn irregular_sources_fall_back_to_listing_each_sequence() {
    let doc = sales_grid();
    let provider = DataProvider::new(&doc);
    let err = provider
        .create_source(&SourceArguments::new("B2:B4;Sales"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);

    doc.define_name("Sales", vec![chartseq::RangeAddress::new(0, 1, 2, 3, 2).unwrap()])
        .unwrap();
    let left = provider.create_sequence_by_range("B2:B4", true).unwrap();
    let named = provider.create_sequence_by_range("Sales", true).unwrap();
    let source: DataSource = [left, named]
        .into_iter()
        .map(chartseq::LabeledDataSequence::values_only)
        .collect();
    let detected = provider.detect_arguments(&source).unwrap();
    assert_eq!(detected.cell_range_representation, "Sheet1!$B$2:$B$4;Sales");
    assert!(!detected.first_cell_as_label);
}

#[test]
fn probes_never_register_external_files() {
    let doc = sales_grid();
    let provider = DataProvider::new(&doc);
    assert!(provider.create_sequence_by_range_possible("[New.xlsx]Data!A1:A3"));
    assert!(provider.create_source_possible(&SourceArguments::new("[New.xlsx]Data!A1:B3")));
    assert_eq!(doc.external_links().file_count(), 0);

    provider
        .create_sequence_by_range("[New.xlsx]Data!A1:A3", true)
        .unwrap();
    assert_eq!(doc.external_links().file_count(), 1);
}

#[test]
fn malformed_ranges_are_argument_errors() {
    let doc = sales_grid();
    let provider = DataProvider::new(&doc);
    for repr in ["Nope!A1", "A1:", "Sheet1!", "'Sheet1!A1", "A1;;B2"] {
        assert!(!provider.create_sequence_by_range_possible(repr), "{repr}");
    }
    let err = provider.create_sequence_by_range("Nope!A1", true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
    assert!(
        provider
            .create_source(&SourceArguments::new("#REF!"))
            .is_err()
    );
    assert!(provider.create_source(&SourceArguments::new("A1;Unknown")).is_err());
}

#[test]
fn token_sequences_are_validated() {
    let doc = sales_grid();
    let provider = DataProvider::new(&doc);
    let good = vec![ReferenceToken::Cell(CellAddress::new(0, 1, 1))];
    let bad = vec![ReferenceToken::Cell(CellAddress::new(4, 0, 0))];
    assert!(provider.create_sequence_by_tokens_possible(&good));
    assert!(!provider.create_sequence_by_tokens_possible(&bad));
    assert!(provider.create_sequence_by_tokens(bad, true).is_err());

    let seq = provider.create_sequence_by_tokens(good, false).unwrap();
    assert_eq!(seq.numerical_data().unwrap(), vec![1.0]);
    assert_eq!(*seq.role(), Role::ValuesY);
}

#[test]
fn inverted_and_oversized_tokens_are_argument_errors() {
    let doc = sales_grid();
    let file = doc.external_links().register_file("Book.xlsx").unwrap();
    let provider = DataProvider::new(&doc);
    let area = |start_row, end_row| RangeAddress {
        first_sheet: 0,
        last_sheet: 0,
        start_row,
        start_col: 0,
        end_row,
        end_col: 1,
    };
    let bad = [
        ReferenceToken::Area(area(5, 2)),
        ReferenceToken::Area(RangeAddress { start_col: 3, ..area(0, 1) }),
        ReferenceToken::Area(RangeAddress { first_sheet: 1, ..area(0, 1) }),
        ReferenceToken::Area(area(0, MAX_ROWS)),
        ReferenceToken::Cell(CellAddress::new(0, MAX_ROWS, 0)),
        ReferenceToken::External(ExternalArea {
            file,
            sheet: "Data".into(),
            start_row: 3,
            start_col: 0,
            end_row: 1,
            end_col: 0,
            single_cell: false,
        }),
    ];
    for token in bad {
        assert!(!provider.create_sequence_by_tokens_possible(std::slice::from_ref(&token)));
        let err = provider.create_sequence_by_tokens(vec![token], true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    let seq = provider
        .create_sequence_by_tokens(vec![ReferenceToken::Area(area(1, 3))], true)
        .unwrap();
    let err = seq.set_tokens(vec![ReferenceToken::Area(area(3, 1))]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
    assert_eq!(seq.numerical_data().unwrap().len(), 6);
}

#[test]
fn value_arrays_are_literal_and_unsubscribed() {
    let doc = sales_grid();
    let provider = DataProvider::new(&doc);
    let seq = provider
        .create_sequence_by_value_array("label", r#"{"Total";2;TRUE}"#)
        .unwrap();
    assert_eq!(doc.edit_listener_count(), 0);
    assert_eq!(*seq.role(), Role::Label);
    assert!(seq.is_literal());
    assert_eq!(
        seq.data().unwrap(),
        vec![
            SequenceValue::Text("Total".into()),
            SequenceValue::Number(2.0),
            SequenceValue::Number(1.0),
        ]
    );
    assert_eq!(
        seq.source_range_representation().unwrap(),
        r#"{"Total";2;TRUE}"#
    );
    assert!(provider.create_sequence_by_value_array("label", "{1;\"open").is_err());
}

#[test]
fn representations_are_canonicalised() {
    let doc = Document::with_sheets(&["Sheet1", "My Sheet"]).unwrap();
    let provider = DataProvider::new(&doc);
    assert_eq!(
        provider.canonical_representation("a1:b2;'my sheet'!c3").unwrap(),
        "Sheet1!$A$1:$B$2;'My Sheet'!$C$3"
    );
    assert_eq!(
        provider.convert_range_to_xml("A1:B2;'My Sheet'!C3").unwrap(),
        "Sheet1.A1:Sheet1.B2 'My Sheet'.C3"
    );
    assert_eq!(
        provider
            .convert_range_from_xml("Sheet1.A1:Sheet1.B2 'My Sheet'.C3")
            .unwrap(),
        "Sheet1!$A$1:$B$2;'My Sheet'!$C$3"
    );
}
