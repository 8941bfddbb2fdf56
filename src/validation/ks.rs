//! Two-sample Kolmogorov-Smirnov test.

use crate::error::{PipelineError, Result};

/// Outcome of a two-sample KS test.
#[derive(Debug, Clone, Copy)]
pub struct KsTest {
    /// Maximum distance between the two empirical CDFs
    pub statistic: f64,
    /// Asymptotic two-sided p-value
    pub p_value: f64,
}

/// Two-sample KS test with the asymptotic p-value approximation.
///
/// The statistic is the supremum distance between the empirical CDFs of the
/// two samples; the p-value uses the Kolmogorov distribution with the small
/// sample correction `(en + 0.12 + 0.11/en) * d`.
pub fn ks_2samp(sample1: &[f64], sample2: &[f64]) -> Result<KsTest> {
    if sample1.is_empty() || sample2.is_empty() {
        return Err(PipelineError::InvalidInput(
            "KS test requires non-empty samples".to_string(),
        ));
    }

    let mut a = sample1.to_vec();
    let mut b = sample2.to_vec();
    a.sort_by(|x, y| x.total_cmp(y));
    b.sort_by(|x, y| x.total_cmp(y));

    let n1 = a.len();
    let n2 = b.len();
    let mut i = 0;
    let mut j = 0;
    let mut statistic: f64 = 0.0;

    // Walk both sorted samples, tracking the ECDF gap at every data point.
    while i < n1 && j < n2 {
        let x = a[i].min(b[j]);
        while i < n1 && a[i] <= x {
            i += 1;
        }
        while j < n2 && b[j] <= x {
            j += 1;
        }
        let cdf1 = i as f64 / n1 as f64;
        let cdf2 = j as f64 / n2 as f64;
        statistic = statistic.max((cdf1 - cdf2).abs());
    }

    let en = ((n1 * n2) as f64 / (n1 + n2) as f64).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * statistic;
    let p_value = kolmogorov_sf(lambda);

    Ok(KsTest { statistic, p_value })
}

/// Survival function of the Kolmogorov distribution,
/// `Q(x) = 2 * sum_{k=1..} (-1)^(k-1) exp(-2 k^2 x^2)`.
fn kolmogorov_sf(x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    let mut sum = 0.0;
    let mut sign = 1.0;
    for k in 1..=100 {
        let term = sign * (-2.0 * (k as f64).powi(2) * x * x).exp();
        sum += term;
        if term.abs() < 1e-10 {
            break;
        }
        sign = -sign;
    }
    (2.0 * sum).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_samples_no_drift() {
        let sample: Vec<f64> = (0..200).map(|i| i as f64 / 10.0).collect();
        let result = ks_2samp(&sample, &sample).unwrap();
        assert!(result.statistic.abs() < 1e-12);
        assert!(result.p_value > 0.99);
    }

    #[test]
    fn test_shifted_samples_drift() {
        let a: Vec<f64> = (0..300).map(|i| (i % 100) as f64).collect();
        let b: Vec<f64> = a.iter().map(|v| v + 50.0).collect();
        let result = ks_2samp(&a, &b).unwrap();
        assert!(result.statistic > 0.4);
        assert!(result.p_value < 0.001);
    }

    #[test]
    fn test_same_distribution_high_p() {
        // Interleaved halves of the same deterministic sequence.
        let all: Vec<f64> = (0..400).map(|i| ((i * 37) % 101) as f64).collect();
        let a: Vec<f64> = all.iter().step_by(2).copied().collect();
        let b: Vec<f64> = all.iter().skip(1).step_by(2).copied().collect();
        let result = ks_2samp(&a, &b).unwrap();
        assert!(result.p_value > 0.05, "p = {}", result.p_value);
    }

    #[test]
    fn test_empty_sample_rejected() {
        assert!(ks_2samp(&[], &[1.0]).is_err());
    }

    #[test]
    fn test_statistic_bounds() {
        let a = [0.0, 1.0, 2.0];
        let b = [10.0, 11.0, 12.0];
        let result = ks_2samp(&a, &b).unwrap();
        assert!((result.statistic - 1.0).abs() < 1e-12);
    }
}
