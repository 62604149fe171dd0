//! Volume/price correlation over a trailing window

use super::features::FeatureRecord;

pub struct CorrelationEngine;

impl CorrelationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Pearson correlation of volume % change against price % change
    ///
    /// Only rows where both changes are present take part. Returns None with
    /// fewer than two such rows or when either series has zero variance.
    pub fn volume_price_correlation(&self, records: &[FeatureRecord]) -> Option<f64> {
        let pairs: Vec<(f64, f64)> = records
            .iter()
            .filter_map(|r| match (r.volume_change_pct, r.price_change_pct) {
                (Some(v), Some(p)) if v.is_finite() && p.is_finite() => Some((v, p)),
                _ => None,
            })
            .collect();

        pearson(&pairs)
    }
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self::new()
    }
}

pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let x_mean = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let y_mean = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut x_var = 0.0;
    let mut y_var = 0.0;
    for (x, y) in pairs {
        let dx = x - x_mean;
        let dy = y - y_mean;
        cov += dx * dy;
        x_var += dx * dx;
        y_var += dy * dy;
    }

    if x_var <= 0.0 || y_var <= 0.0 {
        return None;
    }

    let r = cov / (x_var.sqrt() * y_var.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_positive() {
        let pairs = vec![(1.0, 2.0), (2.0, 4.0), (3.0, 6.0), (4.0, 8.0)];
        assert!((pearson(&pairs).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_negative() {
        let pairs = vec![(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)];
        assert!((pearson(&pairs).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_is_undefined() {
        let pairs = vec![(1.0, 5.0), (2.0, 5.0), (3.0, 5.0)];
        assert_eq!(pearson(&pairs), None);
    }

    #[test]
    fn test_too_few_pairs() {
        assert_eq!(pearson(&[(1.0, 1.0)]), None);
        assert_eq!(pearson(&[]), None);
    }
}
