use crate::sequence::DataSequence;

/// A values sequence with its optional label sequence.
#[derive(Debug, Clone)]
pub struct LabeledDataSequence {
    pub label: Option<DataSequence>,
    pub values: Option<DataSequence>,
}

impl LabeledDataSequence {
    pub fn new(label: Option<DataSequence>, values: Option<DataSequence>) -> Self {
        Self { label, values }
    }

    pub fn values_only(values: DataSequence) -> Self {
        Self::new(None, Some(values))
    }
}

/// Ordered set of labeled sequences produced by a provider.
#[derive(Debug, Clone, Default)]
pub struct DataSource {
    sequences: Vec<LabeledDataSequence>,
}

impl DataSource {
    pub fn new(sequences: Vec<LabeledDataSequence>) -> Self {
        Self { sequences }
    }

    pub fn sequences(&self) -> &[LabeledDataSequence] {
        &self.sequences
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabeledDataSequence> {
        self.sequences.iter()
    }
}

impl<'a> IntoIterator for &'a DataSource {
    type Item = &'a LabeledDataSequence;
    type IntoIter = std::slice::Iter<'a, LabeledDataSequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.iter()
    }
}

impl FromIterator<LabeledDataSequence> for DataSource {
    fn from_iter<I: IntoIterator<Item = LabeledDataSequence>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
