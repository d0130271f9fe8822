//! Descriptive statistics behind the charts: histograms, KDE, box-plot
//! summaries and Pearson correlation.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `bins + 1` edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        if self.edges.len() < 2 {
            1.0
        } else {
            self.edges[1] - self.edges[0]
        }
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Sturges' rule.
pub fn sturges_bins(n: usize) -> usize {
    if n <= 1 {
        1
    } else {
        (n as f64).log2().ceil() as usize + 1
    }
}

pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    let bins = bins.max(1);
    let (lo, hi) = min_max(values).unwrap_or((0.0, 1.0));
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
    let width = (hi - lo) / bins as f64;

    let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0; bins];
    for v in values {
        // The last bin is closed on the right.
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Histogram { edges, counts }
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Gaussian kernel density estimate using Scott's bandwidth, evaluated on
/// `points` evenly spaced positions across `[lo, hi]`.
pub fn kde(values: &[f64], lo: f64, hi: f64, points: usize) -> Vec<(f64, f64)> {
    let n = values.len();
    let sigma = std_dev(values);
    if n == 0 || sigma == 0.0 || points < 2 {
        return Vec::new();
    }
    let h = sigma * (n as f64).powf(-0.2);
    let norm = 1.0 / (n as f64 * h * (2.0 * std::f64::consts::PI).sqrt());

    (0..points)
        .map(|i| {
            let x = lo + (hi - lo) * i as f64 / (points - 1) as f64;
            let density: f64 = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / h).powi(2)).exp())
                .sum();
            (x, density * norm)
        })
        .collect()
}

/// Quantile with linear interpolation between closest ranks.
/// `sorted` must be ascending and non-empty.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let below = pos.floor() as usize;
    let above = pos.ceil() as usize;
    sorted[below] + (sorted[above] - sorted[below]) * (pos - below as f64)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile(&sorted, 0.25);
    let median = quantile(&sorted, 0.5);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

    let inside = sorted.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
    let lower_whisker = inside.clone().next().unwrap_or(q1);
    let upper_whisker = inside.last().unwrap_or(q3);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < lo_fence || *v > hi_fence)
        .collect();

    Some(BoxSummary {
        q1,
        median,
        q3,
        lower_whisker,
        upper_whisker,
        outliers,
    })
}

/// Groups `values` by the matching `keys`, ordered by key.
pub fn group_by(keys: &[f64], values: &[f64]) -> Vec<(f64, Vec<f64>)> {
    let mut groups: BTreeMap<i64, (f64, Vec<f64>)> = BTreeMap::new();
    for (k, v) in keys.iter().zip(values).filter(|(k, _)| k.is_finite()) {
        // Keys are whole-number categories; scaling keeps fractional keys distinct.
        let slot = (k * 1000.0).round() as i64;
        groups.entry(slot).or_insert_with(|| (*k, Vec::new())).1.push(*v);
    }
    groups.into_values().collect()
}

/// Pearson correlation; zero variance on either side yields NaN.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let (mx, my) = (mean(x), mean(y));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    sxy / (sxx * syy).sqrt()
}

pub fn correlation_matrix(columns: &[Vec<f64>]) -> Vec<Vec<f64>> {
    columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_counts_every_value() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 4.0];
        let hist = histogram(&values, 4);
        assert_eq!(hist.edges.len(), 5);
        assert_eq!(hist.counts.iter().sum::<usize>(), values.len());
        assert_eq!(hist.counts[3], 3);
        assert_eq!(hist.bin_width(), 1.0);
    }

    #[test]
    fn test_histogram_constant_input() {
        let hist = histogram(&[5.0, 5.0], 3);
        assert_eq!(hist.counts.iter().sum::<usize>(), 2);
    }

    #[test]
    fn test_sturges() {
        assert_eq!(sturges_bins(1), 1);
        assert_eq!(sturges_bins(8), 4);
        assert_eq!(sturges_bins(395), 10);
    }

    #[test]
    fn test_kde_integrates_to_about_one() {
        let values = [8.0, 10.0, 10.0, 11.0, 12.0, 14.0];
        let curve = kde(&values, -10.0, 30.0, 401);
        let step = 40.0 / 400.0;
        let area: f64 = curve.iter().map(|(_, d)| d * step).sum();
        assert!((area - 1.0).abs() < 0.01);
        assert!(kde(&[3.0, 3.0], 0.0, 5.0, 10).is_empty());
    }

    #[test]
    fn test_quantiles_and_box() {
        let summary = box_summary(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.q3, 4.0);
        assert_eq!(summary.upper_whisker, 4.0);
        assert_eq!(summary.lower_whisker, 1.0);
        assert_eq!(summary.outliers, vec![100.0]);
        assert!(box_summary(&[]).is_none());
    }

    #[test]
    fn test_group_by_orders_keys() {
        let groups = group_by(&[2.0, 1.0, 2.0], &[10.0, 5.0, 12.0]);
        assert_eq!(groups, vec![(1.0, vec![5.0]), (2.0, vec![10.0, 12.0])]);
    }

    #[test]
    fn test_group_by_drops_non_finite_keys() {
        let groups = group_by(&[0.0, f64::NAN, f64::INFINITY, 0.0], &[7.0, 9.0, 11.0, 8.0]);
        assert_eq!(groups, vec![(0.0, vec![7.0, 8.0])]);
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&x, &[2.0, 4.0, 6.0, 8.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &[8.0, 6.0, 4.0, 2.0]) + 1.0).abs() < 1e-12);
        assert!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]).is_nan());

        let m = correlation_matrix(&[x.to_vec(), vec![4.0, 3.0, 2.0, 1.0]]);
        assert!((m[0][0] - 1.0).abs() < 1e-12);
        assert!((m[0][1] + 1.0).abs() < 1e-12);
    }
}
