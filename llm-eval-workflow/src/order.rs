use llm_eval_core::{CoreError, Result, Sample};

/// Sorts gathered samples back into dataset order and checks that the
/// indices are exactly `0..expected`.
pub fn restore_order(mut samples: Vec<Sample>, expected: usize) -> Result<Vec<Sample>> {
    samples.sort_unstable_by_key(|s| s.index);

    for (position, sample) in samples.iter().enumerate() {
        if sample.index == position {
            continue;
        }
        let message = if position > 0 && samples[position - 1].index == sample.index {
            format!("index {} appears more than once", sample.index)
        } else {
            format!("index {} is missing", position)
        };
        return Err(CoreError::IndexIntegrity(message));
    }

    if samples.len() != expected {
        return Err(CoreError::GatherMismatch {
            expected,
            actual: samples.len(),
        });
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(index: usize) -> Sample {
        Sample::new(index, format!("q{index}"), format!("r{index}"), format!("h{index}"))
    }

    #[test]
    fn test_restores_interleaved_order() {
        let gathered = [0, 2, 4, 1, 3].into_iter().map(sample).collect();
        let ordered = restore_order(gathered, 5).unwrap();
        let indices: Vec<_> = ordered.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(ordered[3].hypothesis, "h3");
    }

    #[test]
    fn test_duplicate_index() {
        let gathered = [0, 1, 1].into_iter().map(sample).collect();
        let err = restore_order(gathered, 3).unwrap_err();
        assert!(err.to_string().contains("index 1 appears more than once"));
    }

    #[test]
    fn test_missing_index() {
        let gathered = [0, 2, 3].into_iter().map(sample).collect();
        let err = restore_order(gathered, 3).unwrap_err();
        assert!(err.to_string().contains("index 1 is missing"));
    }

    #[test]
    fn test_truncated_tail() {
        let gathered = [1, 0].into_iter().map(sample).collect();
        assert!(matches!(
            restore_order(gathered, 3),
            Err(CoreError::GatherMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_empty() {
        assert!(restore_order(Vec::new(), 0).unwrap().is_empty());
    }
}
