//! Equal-width histograms stacked by outcome

use std::collections::BTreeMap;

/// Counts per bin, one series per outcome value
///
/// Bins span `[min, max]` of the data. Every bin is half-open except the
/// last, which also holds the maximum. A constant input is widened by 0.5
/// on each side so it still has a non-empty range.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedHistogram {
    edges: Vec<f64>,
    series: BTreeMap<i64, Vec<usize>>,
}

impl StackedHistogram {
    pub fn build(values: &[(f64, i64)], bins: usize) -> Self {
        let bins = bins.max(1);
        let finite = values.iter().filter(|(v, _)| v.is_finite());

        let (mut lo, mut hi) = finite
            .clone()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (v, _)| {
                (lo.min(*v), hi.max(*v))
            });
        if lo > hi {
            return Self {
                edges: Vec::new(),
                series: BTreeMap::new(),
            };
        }
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut series: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (value, outcome) in finite {
            let idx = (((value - lo) / width) as usize).min(bins - 1);
            series.entry(*outcome).or_insert_with(|| vec![0; bins])[idx] += 1;
        }

        Self { edges, series }
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn series(&self) -> &BTreeMap<i64, Vec<usize>> {
        &self.series
    }

    pub fn bins(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    /// Stacked height of one bin
    pub fn bin_total(&self, bin: usize) -> usize {
        self.series
            .values()
            .filter_map(|counts| counts.get(bin))
            .sum()
    }

    pub fn total(&self) -> usize {
        self.series.values().flatten().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
