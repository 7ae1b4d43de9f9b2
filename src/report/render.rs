//! Terminal rendering of results, metrics and charts.

use crate::history::{MaterialStat, TrendPoint};
use crate::models::{MaterialResult, UsageEntry};

/// Width of the longest bar, in cells.
pub const BAR_WIDTH: usize = 40;

/// Render the ranked results as a text table.
pub fn results_table(rows: &[MaterialResult]) -> String {
    if rows.is_empty() {
        return "   Submit details to view recommendations\n".to_string();
    }

    let name_width = rows
        .iter()
        .map(|r| r.material.chars().count())
        .max()
        .unwrap_or(0)
        .max("Material".len());

    let mut table = String::new();
    table.push_str(&format!(
        "   {:>3}  {:<w$}  {:>8}  {:>8}  {:>6}\n",
        "#",
        "Material",
        "Cost",
        "CO₂",
        "Score",
        w = name_width
    ));
    table.push_str(&format!("   {}\n", "-".repeat(name_width + 35)));

    for (i, row) in rows.iter().enumerate() {
        table.push_str(&format!(
            "   {:>3}  {:<w$}  {:>8.2}  {:>8.2}  {:>6.2}\n",
            format!("#{}", i + 1),
            row.material,
            row.predicted_cost,
            row.predicted_co2,
            row.suitability_score,
            w = name_width
        ));
    }

    table
}

/// Render the two metric cards.
pub fn metric_cards(runs: usize, co2_reduction: f64, cost_savings: f64) -> String {
    if runs == 0 {
        return "   🌱 CO₂ Reduction: -  (Run recommendation)\n   💰 Cost Savings: -  (Run recommendation)\n"
            .to_string();
    }

    format!(
        "   🌱 CO₂ Reduction: {:.2}%  (Average across {} runs)\n   💰 Cost Savings: {:.2}  (Average across {} runs)\n",
        co2_reduction, runs, cost_savings, runs
    )
}

/// Render labelled values as a horizontal bar chart.
///
/// Bars scale to the largest magnitude; negative values are drawn with a
/// lighter block so savings below the baseline stay visible.
pub fn bar_chart(title: &str, bars: &[(String, f64)], unit: &str) -> String {
    let mut chart = format!("   {}\n\n", title);

    if bars.is_empty() {
        chart.push_str("   (no data)\n");
        return chart;
    }

    let label_width = bars.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max = bars
        .iter()
        .map(|(_, v)| v.abs())
        .fold(0.0_f64, f64::max);

    for (label, value) in bars {
        let cells = if max > 0.0 {
            ((value.abs() / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let block = if *value < 0.0 { "░" } else { "█" };
        chart.push_str(&format!(
            "   {:<w$} │{:<bw$} {:.2}{}\n",
            label,
            block.repeat(cells),
            value,
            unit,
            w = label_width,
            bw = BAR_WIDTH
        ));
    }

    chart
}

/// Bar chart over per-material statistics, each label with its sample count.
pub fn material_chart(title: &str, stats: &[MaterialStat], unit: &str) -> String {
    let bars: Vec<(String, f64)> = stats
        .iter()
        .map(|s| (format!("{} ×{}", s.material, s.count), s.value))
        .collect();
    bar_chart(title, &bars, unit)
}

/// Bar chart over a per-run trend.
pub fn trend_chart(title: &str, points: &[TrendPoint], unit: &str) -> String {
    let bars: Vec<(String, f64)> = points.iter().map(|p| (p.label.clone(), p.value)).collect();
    bar_chart(title, &bars, unit)
}

/// Usage distribution with each material's share of the total.
pub fn usage_chart(entries: &[UsageEntry]) -> String {
    let total: u64 = entries.iter().map(|e| e.count).sum();
    let bars: Vec<(String, f64)> = entries
        .iter()
        .map(|e| {
            let share = if total > 0 {
                e.count as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            (format!("{} ({})", e.material, e.count), share)
        })
        .collect();
    bar_chart("Material Usage Share", &bars, "%")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str) -> MaterialResult {
        MaterialResult {
            material: name.to_string(),
            predicted_cost: 3.5,
            predicted_co2: 1.25,
            suitability_score: 0.5,
        }
    }

    #[test]
    fn test_results_table() {
        let table = results_table(&[row("Molded Pulp"), row("PLA")]);
        assert!(table.contains("Material"));
        assert!(table.contains("#1"));
        assert!(table.contains("Molded Pulp"));
        assert!(table.contains("3.50"));
        assert!(table.contains("1.25"));
    }

    #[test]
    fn test_results_table_empty() {
        assert!(results_table(&[]).contains("Submit details"));
    }

    #[test]
    fn test_metric_cards() {
        let cards = metric_cards(2, 30.0, 4.5);
        assert!(cards.contains("30.00%"));
        assert!(cards.contains("4.50"));
        assert!(cards.contains("Average across 2 runs"));

        assert!(metric_cards(0, 0.0, 0.0).contains("Run recommendation"));
    }

    #[test]
    fn test_bar_chart_scales_to_largest() {
        let chart = bar_chart(
            "Test",
            &[("a".to_string(), 10.0), ("b".to_string(), -5.0)],
            "",
        );
        let lines: Vec<&str> = chart.lines().filter(|l| l.contains('│')).collect();
        assert_eq!(lines[0].matches('█').count(), BAR_WIDTH);
        assert_eq!(lines[1].matches('░').count(), BAR_WIDTH / 2);
        assert!(lines[1].contains("-5.00"));
    }

    #[test]
    fn test_material_chart_shows_counts() {
        let chart = material_chart(
            "Comparison",
            &[
                MaterialStat {
                    material: "Molded Pulp".to_string(),
                    value: 0.8,
                    count: 2,
                },
                MaterialStat {
                    material: "PLA".to_string(),
                    value: 0.4,
                    count: 1,
                },
            ],
            "",
        );
        assert!(chart.contains("Molded Pulp ×2"));
        assert!(chart.contains("PLA ×1"));
        assert!(chart.contains("0.80"));
    }

    #[test]
    fn test_usage_chart_shares() {
        let chart = usage_chart(&[
            UsageEntry {
                material: "Kraft".to_string(),
                count: 3,
            },
            UsageEntry {
                material: "PLA".to_string(),
                count: 1,
            },
        ]);
        assert!(chart.contains("Kraft (3)"));
        assert!(chart.contains("75.00%"));
        assert!(chart.contains("25.00%"));
    }
}
