use crate::model::Sample;

/// Append-only, in-memory holder of every sample in a batch.
#[derive(Debug, Clone, Default)]
pub struct SampleStore {
    samples: Vec<Sample>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append; duplicates of (extension, run_index) are kept.
    pub fn record(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Non-failed samples for `extension_name`, in insertion order.
    pub fn samples_for(&self, extension_name: &str) -> Vec<&Sample> {
        self.samples
            .iter()
            .filter(|s| s.extension_name == extension_name && !s.failed)
            .collect()
    }

    /// All samples for `extension_name`, failed ones included.
    pub fn all_for(&self, extension_name: &str) -> Vec<&Sample> {
        self.samples
            .iter()
            .filter(|s| s.extension_name == extension_name)
            .collect()
    }

    pub fn failed_count(&self, extension_name: &str) -> usize {
        self.samples
            .iter()
            .filter(|s| s.extension_name == extension_name && s.failed)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Extend<Sample> for SampleStore {
    fn extend<T: IntoIterator<Item = Sample>>(&mut self, iter: T) {
        self.samples.extend(iter);
    }
}

impl FromIterator<Sample> for SampleStore {
    fn from_iter<T: IntoIterator<Item = Sample>>(iter: T) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}
