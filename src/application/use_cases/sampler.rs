use crate::domain::dataset::{Dataset, Sample};

/// Contiguous window of at most `max` records starting at `offset`.
///
/// Clamped to the dataset end; an offset past the end yields an empty sample.
pub fn sample_window(dataset: &Dataset, offset: usize, max: usize) -> Sample<'_> {
    let records = dataset.records();
    let start = offset.min(records.len());
    let end = start.saturating_add(max).min(records.len());
    Sample {
        offset: start,
        columns: dataset.columns(),
        records: &records[start..end],
    }
}
