//! Small statistical helpers shared by the classifier and the scorers

/// Arithmetic mean, `None` for an empty slice
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation, `None` for an empty slice
pub(crate) fn population_std_dev(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let variance = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Coefficient of variation (sigma / mu), `None` when the mean is zero
pub(crate) fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    if mu == 0.0 {
        return None;
    }
    let sigma = population_std_dev(values)?;
    Some(sigma / mu.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0, 6.0]), Some(4.0));
    }

    #[test]
    fn test_population_std_dev() {
        // Population std dev of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std_dev(&values).unwrap() - 2.0).abs() < 1e-12);
        // Constant history has zero spread
        assert_eq!(population_std_dev(&[5.0, 5.0, 5.0]), Some(0.0));
    }

    #[test]
    fn test_coefficient_of_variation() {
        let values = [90.0, 100.0, 110.0];
        let cv = coefficient_of_variation(&values).unwrap();
        assert!(cv > 0.0 && cv < 0.1);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), None);
    }
}
