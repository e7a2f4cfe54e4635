//! Scalar statistics over sample and measurement slices.
//!
//! All functions return `None` on empty input; the caller decides the
//! default policy (the extractor substitutes `0`).

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (ddof = 0).
pub(crate) fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Median with the two middle values averaged for even-length input.
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

pub(crate) fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub(crate) fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(std_dev(&[]), None);
        assert_eq!(median(&[]), None);
        assert_eq!(min(&[]), None);
        assert_eq!(max(&[]), None);
    }

    #[test]
    fn basic_stats() {
        let v = [110.0, 130.0];
        assert_eq!(mean(&v), Some(120.0));
        assert_eq!(median(&v), Some(120.0));
        assert_eq!(min(&v), Some(110.0));
        assert_eq!(max(&v), Some(130.0));
        assert_eq!(std_dev(&v), Some(10.0));
    }

    #[test]
    fn median_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
    }

    #[test]
    fn std_dev_population() {
        // np.std([1, 2, 3, 4]) = sqrt(1.25)
        let got = std_dev(&[1.0, 2.0, 3.0, 4.0]).expect("non-empty");
        assert!((got - 1.25f64.sqrt()).abs() < 1e-12);
    }
}
