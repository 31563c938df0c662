//! Representative-sample selection by discrete median.

use crate::errors::ExthouseError;
use crate::metrics::RankingMetric;
use crate::model::{RepresentativeResult, Sample};

/// Pick the typical sample for `extension` from `samples`.
///
/// Failed samples are skipped. A single valid sample is returned as is.
/// Otherwise the ranking values are sorted and `sorted[count / 2]` is taken, so
/// even counts resolve to the upper of the two middle values. The result maps
/// back to the first sample (in input order) carrying that value; it is always
/// an observed sample.
pub fn select_representative<'a>(
    extension: &str,
    samples: &[&'a Sample],
    metric: RankingMetric,
) -> Result<RepresentativeResult<'a>, ExthouseError> {
    let valid: Vec<&'a Sample> = samples.iter().copied().filter(|s| !s.failed).collect();

    let no_samples = || ExthouseError::NoValidSamples {
        extension: extension.to_string(),
    };

    if let [only] = valid[..] {
        return Ok(RepresentativeResult {
            extension_name: &only.extension_name,
            sample: only,
            ranking_value: metric.extract(only),
            sample_count: 1,
        });
    }

    let values: Vec<f64> = valid.iter().map(|s| metric.extract(s)).collect();
    let mut sorted = values.clone();
    sorted.sort_by(f64::total_cmp);
    let selected = *sorted.get(sorted.len() / 2).ok_or_else(no_samples)?;

    let idx = values
        .iter()
        .position(|v| v.total_cmp(&selected).is_eq())
        .ok_or_else(no_samples)?;
    let sample = valid[idx];

    Ok(RepresentativeResult {
        extension_name: &sample.extension_name,
        sample,
        ranking_value: selected,
        sample_count: valid.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MAX_POTENTIAL_FID;
    use crate::model::{MetricValue, Metrics};

    fn fid_samples(values: &[f64]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut m = Metrics::new();
                m.insert(MAX_POTENTIAL_FID.into(), MetricValue::Number(*v));
                Sample::new("ext", i as u32 + 1, m)
            })
            .collect()
    }

    fn select(samples: &[Sample]) -> Result<RepresentativeResult<'_>, ExthouseError> {
        let refs: Vec<&Sample> = samples.iter().collect();
        select_representative("ext", &refs, RankingMetric::MaxPotentialFid)
    }

    #[test]
    fn odd_count_takes_middle() {
        let samples = fid_samples(&[30.0, 10.0, 20.0]);
        let rep = select(&samples).unwrap();
        assert_eq!(rep.ranking_value, 20.0);
        assert_eq!(rep.sample.run_index, 3);
        assert_eq!(rep.sample_count, 3);
    }

    #[test]
    fn even_count_takes_upper_middle() {
        let samples = fid_samples(&[10.0, 20.0, 30.0, 40.0]);
        let rep = select(&samples).unwrap();
        assert_eq!(rep.ranking_value, 30.0);
        assert_eq!(rep.sample.run_index, 3);
    }

    #[test]
    fn repeated_selection_is_stable() {
        let samples = fid_samples(&[55.0, 12.0, 98.0, 12.0, 40.0, 71.0]);
        let first = select(&samples).unwrap().sample.run_index;
        for _ in 0..10 {
            assert_eq!(select(&samples).unwrap().sample.run_index, first);
        }
    }

    #[test]
    fn ties_resolve_to_first_in_input_order() {
        let samples = fid_samples(&[50.0, 10.0, 50.0, 90.0, 50.0]);
        let rep = select(&samples).unwrap();
        assert_eq!(rep.ranking_value, 50.0);
        assert_eq!(rep.sample.run_index, 1);
    }

    #[test]
    fn single_sample_is_selected_unconditionally() {
        let samples = fid_samples(&[0.0]);
        let rep = select(&samples).unwrap();
        assert_eq!(rep.sample.run_index, 1);
        assert_eq!(rep.sample_count, 1);

        let samples = fid_samples(&[-5.0]);
        assert_eq!(select(&samples).unwrap().ranking_value, -5.0);
    }

    #[test]
    fn missing_metric_ranks_as_zero() {
        let mut samples = fid_samples(&[40.0, 20.0]);
        samples.push(Sample::new("ext", 3, Metrics::new()));
        // values [40, 20, 0] -> sorted [0, 20, 40] -> 20
        let rep = select(&samples).unwrap();
        assert_eq!(rep.sample.run_index, 2);
    }

    #[test]
    fn failed_samples_are_skipped() {
        let mut samples = fid_samples(&[10.0, 20.0]);
        samples.push(Sample::failed("ext", 3, "crash"));
        // Two valid samples remain: sorted [10, 20], half = 1 -> 20
        let rep = select(&samples).unwrap();
        assert_eq!(rep.ranking_value, 20.0);
        assert_eq!(rep.sample_count, 2);
    }

    #[test]
    fn all_failed_is_no_valid_samples() {
        let samples = vec![Sample::failed("ext", 1, "a"), Sample::failed("ext", 2, "b")];
        let err = select(&samples).unwrap_err();
        assert_eq!(
            err,
            ExthouseError::NoValidSamples {
                extension: "ext".into()
            }
        );
        assert!(matches!(
            select(&[]),
            Err(ExthouseError::NoValidSamples { .. })
        ));
    }
}
