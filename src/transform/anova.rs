//! One-way ANOVA F-test.

use crate::error::{PipelineError, Result};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

/// Outcome of a one-way ANOVA test over class-conditioned groups.
#[derive(Debug, Clone, Copy)]
pub struct AnovaTest {
    pub f_statistic: f64,
    pub p_value: f64,
}

/// One-way ANOVA across `groups`, one group per class label.
///
/// Small p-values mean the group means differ, i.e. the feature separates
/// the classes.
pub fn f_oneway(groups: &[Vec<f64>]) -> Result<AnovaTest> {
    if groups.len() < 2 {
        return Err(PipelineError::InvalidInput(
            "ANOVA requires at least two groups".to_string(),
        ));
    }
    if groups.iter().any(|g| g.is_empty()) {
        return Err(PipelineError::InvalidInput(
            "ANOVA groups must be non-empty".to_string(),
        ));
    }

    let k = groups.len();
    let n_total: usize = groups.iter().map(|g| g.len()).sum();
    if n_total <= k {
        return Err(PipelineError::InvalidInput(
            "ANOVA requires more observations than groups".to_string(),
        ));
    }

    let grand_sum: f64 = groups.iter().flatten().sum();
    let grand_mean = grand_sum / n_total as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in groups {
        let n = group.len() as f64;
        let mean = group.iter().sum::<f64>() / n;
        ss_between += n * (mean - grand_mean).powi(2);
        ss_within += group.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    }

    let df_between = (k - 1) as f64;
    let df_within = (n_total - k) as f64;

    if ss_within <= f64::EPSILON {
        // Degenerate: zero within-group variance.
        return Ok(if ss_between <= f64::EPSILON {
            AnovaTest {
                f_statistic: 0.0,
                p_value: 1.0,
            }
        } else {
            AnovaTest {
                f_statistic: f64::INFINITY,
                p_value: 0.0,
            }
        });
    }

    let f_statistic = (ss_between / df_between) / (ss_within / df_within);
    let dist = FisherSnedecor::new(df_between, df_within)
        .map_err(|e| PipelineError::InvalidInput(e.to_string()))?;
    let p_value = 1.0 - dist.cdf(f_statistic);

    Ok(AnovaTest {
        f_statistic,
        p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separated_groups_significant() {
        let a: Vec<f64> = (0..50).map(|i| 10.0 + (i % 5) as f64 * 0.1).collect();
        let b: Vec<f64> = (0..50).map(|i| 20.0 + (i % 5) as f64 * 0.1).collect();
        let result = f_oneway(&[a, b]).unwrap();
        assert!(result.f_statistic > 100.0);
        assert!(result.p_value < 1e-6);
    }

    #[test]
    fn test_identical_groups_insignificant() {
        let g: Vec<f64> = (0..40).map(|i| (i % 10) as f64).collect();
        let result = f_oneway(&[g.clone(), g]).unwrap();
        assert!(result.f_statistic < 1e-10);
        assert!(result.p_value > 0.99);
    }

    #[test]
    fn test_constant_but_distinct_groups() {
        let result = f_oneway(&[vec![1.0; 10], vec![2.0; 10]]).unwrap();
        assert_eq!(result.p_value, 0.0);
    }

    #[test]
    fn test_single_group_rejected() {
        assert!(f_oneway(&[vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_known_f_value() {
        // Hand-checked: groups (1,2,3) and (4,5,6) give F = 13.5, p ~ 0.0213.
        let result = f_oneway(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert!((result.f_statistic - 13.5).abs() < 1e-9);
        assert!((result.p_value - 0.02131164).abs() < 1e-4);
    }
}
