#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chartseq::{CellAddress, CellValue, DataSequence, Document};

/// Counts modify notifications delivered to one sequence.
#[derive(Clone, Default)]
pub struct EventCollector {
    hits: Arc<AtomicUsize>,
}

impl EventCollector {
    pub fn attach(seq: &DataSequence) -> Self {
        let collector = Self::default();
        let hits = collector.hits.clone();
        seq.on_modified(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
        collector
    }

    pub fn count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub fn put(doc: &Document, sheet: u16, row: u32, col: u32, value: impl Into<CellValue>) {
    doc.set_value(CellAddress::new(sheet, row, col), value).unwrap();
}

/// `Sheet1` with 1..=n down column A.
pub fn numbered_column(n: u32) -> Document {
    let doc = Document::with_sheets(&["Sheet1"]).unwrap();
    for row in 0..n {
        put(&doc, 0, row, 0, f64::from(row + 1));
    }
    doc
}
