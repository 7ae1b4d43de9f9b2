//! Run-history aggregation and derived metrics.
//!
//! The log holds one bounded slice per submission, in submission order.
//! Every metric here is computed from the log on each call; nothing is
//! cached, so clearing or reloading the log can never leave stale numbers.

use crate::models::{top_n, LatestRun, MaterialResult, Run};
use std::collections::HashMap;

/// Materials kept per run for display and charting.
pub const DISPLAY_LIMIT: usize = 3;

/// Materials kept from the latest run for export.
pub const EXPORT_LIMIT: usize = 10;

/// One point of a per-run trend series.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    /// `Run k`, with k the 1-based position of the run in the log.
    pub label: String,
    pub value: f64,
}

/// A per-material average over a pool of results.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialStat {
    pub material: String,
    pub value: f64,
    /// Number of results that contributed.
    pub count: usize,
}

/// Ordered, append-only log of recommendation runs.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    runs: Vec<Run>,
    display_limit: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DISPLAY_LIMIT)
    }
}

impl HistoryLog {
    /// Create an empty log keeping `display_limit` materials per run.
    pub fn new(display_limit: usize) -> Self {
        Self {
            runs: Vec::new(),
            display_limit: display_limit.max(1),
        }
    }

    /// Append a run, truncated to its top entries.
    pub fn append(&mut self, run: &[MaterialResult]) {
        self.runs.push(top_n(run, self.display_limit));
    }

    /// Empty the local log.
    pub fn clear(&mut self) {
        self.runs.clear();
    }

    /// Replace the log with the server's history.
    ///
    /// Each run is truncated for charting. The most recent run is also
    /// returned with a longer `export_limit` slice; `None` when the history
    /// is empty or its last run has no materials.
    pub fn load(&mut self, server_history: Vec<Run>, export_limit: usize) -> Option<LatestRun> {
        let latest = server_history
            .last()
            .filter(|run| !run.is_empty())
            .map(|run| LatestRun {
                display: top_n(run, self.display_limit),
                ranking: top_n(run, export_limit),
                inputs: None,
            });

        self.runs = server_history
            .iter()
            .map(|run| top_n(run, self.display_limit))
            .collect();

        latest
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn display_limit(&self) -> usize {
        self.display_limit
    }

    /// All retained results across runs, oldest first.
    pub fn flattened(&self) -> impl Iterator<Item = &MaterialResult> {
        self.runs.iter().flatten()
    }

    /// Results to chart: the whole log, or `fallback` while the log is empty.
    pub fn chart_pool<'a>(&'a self, fallback: &'a [MaterialResult]) -> Vec<&'a MaterialResult> {
        let pool: Vec<&MaterialResult> = self.flattened().collect();
        if pool.is_empty() {
            fallback.iter().collect()
        } else {
            pool
        }
    }

    /// Per-run CO2 reduction against `baseline`, in percent.
    pub fn co2_trend(&self, baseline: f64) -> Vec<TrendPoint> {
        self.trend(|run| {
            run_average(run, |m| m.predicted_co2).map(|avg| co2_reduction_percent(baseline, avg))
        })
    }

    /// Per-run cost savings against `baseline`.
    pub fn cost_trend(&self, baseline: f64) -> Vec<TrendPoint> {
        self.trend(|run| {
            run_average(run, |m| m.predicted_cost).map(|avg| cost_saving(baseline, avg))
        })
    }

    /// Mean of the per-run CO2 reductions, each run weighted equally.
    ///
    /// Returns 0.0 for an empty log.
    pub fn co2_reduction(&self, baseline: f64) -> f64 {
        mean(self.co2_trend(baseline).iter().map(|p| p.value))
    }

    /// Mean of the per-run cost savings, each run weighted equally.
    ///
    /// Returns 0.0 for an empty log.
    pub fn cost_savings(&self, baseline: f64) -> f64 {
        mean(self.cost_trend(baseline).iter().map(|p| p.value))
    }

    fn trend<F>(&self, per_run: F) -> Vec<TrendPoint>
    where
        F: Fn(&[MaterialResult]) -> Option<f64>,
    {
        self.runs
            .iter()
            .enumerate()
            .filter_map(|(index, run)| {
                // Runs without materials have no average.
                per_run(run).map(|value| TrendPoint {
                    label: format!("Run {}", index + 1),
                    value,
                })
            })
            .collect()
    }
}

/// Average one field over a run. `None` for an empty run.
pub fn run_average<F>(run: &[MaterialResult], field: F) -> Option<f64>
where
    F: Fn(&MaterialResult) -> f64,
{
    if run.is_empty() {
        return None;
    }
    Some(run.iter().map(field).sum::<f64>() / run.len() as f64)
}

/// `(baseline - value) / baseline * 100`, or 0.0 when the baseline is unusable.
pub fn co2_reduction_percent(baseline: f64, value: f64) -> f64 {
    if !baseline.is_finite() || baseline <= 0.0 {
        return 0.0;
    }
    (baseline - value) / baseline * 100.0
}

/// `baseline - value`, or 0.0 when the baseline is unusable.
pub fn cost_saving(baseline: f64, value: f64) -> f64 {
    if !baseline.is_finite() || baseline <= 0.0 {
        return 0.0;
    }
    baseline - value
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Average a field per material, keeping materials in first-seen order.
pub fn average_by_material<'a, I, F>(items: I, field: F) -> Vec<MaterialStat>
where
    I: IntoIterator<Item = &'a MaterialResult>,
    F: Fn(&MaterialResult) -> f64,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<(&str, f64, usize)> = Vec::new();

    for item in items {
        match index.get(item.material.as_str()) {
            Some(&i) => {
                totals[i].1 += field(item);
                totals[i].2 += 1;
            }
            None => {
                index.insert(item.material.as_str(), totals.len());
                totals.push((item.material.as_str(), field(item), 1));
            }
        }
    }

    totals
        .into_iter()
        .map(|(material, total, count)| MaterialStat {
            material: material.to_string(),
            value: total / count as f64,
            count,
        })
        .collect()
}

/// Mean suitability score per material.
pub fn material_comparison(pool: &[&MaterialResult]) -> Vec<MaterialStat> {
    average_by_material(pool.iter().copied(), |m| m.suitability_score)
}

/// Materials ordered by mean suitability score, best first.
pub fn material_ranking(pool: &[&MaterialResult]) -> Vec<MaterialStat> {
    let mut stats = material_comparison(pool);
    stats.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    stats
}

/// CO2 reduction per material, from each material's mean predicted CO2.
pub fn material_co2_reduction(pool: &[&MaterialResult], baseline: f64) -> Vec<MaterialStat> {
    average_by_material(pool.iter().copied(), |m| m.predicted_co2)
        .into_iter()
        .map(|stat| MaterialStat {
            value: co2_reduction_percent(baseline, stat.value),
            ..stat
        })
        .collect()
}

/// Cost savings per material, from each material's mean predicted cost.
pub fn material_cost_savings(pool: &[&MaterialResult], baseline: f64) -> Vec<MaterialStat> {
    average_by_material(pool.iter().copied(), |m| m.predicted_cost)
        .into_iter()
        .map(|stat| MaterialStat {
            value: cost_saving(baseline, stat.value),
            ..stat
        })
        .collect()
}
