use std::fmt::Write;

use serde::Serialize;

use crate::aggregate::{self, Dimension, CHURNED, RETAINED};
use crate::models::{CustomerRecord, GroupRate};

/// Fixed series palette; each chart is assigned its slot below.
pub const PALETTE: [&str; 6] = [
    "#00C9A7", "#845EC2", "#FFC75F", "#FF6F91", "#0081CF", "#F9F871",
];

#[derive(Debug, Clone, Serialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub share: f64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bar {
    pub label: String,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Chart {
    Pie { slices: Vec<PieSlice> },
    Bar { color: String, bars: Vec<Bar> },
}

/// One cell of the 2x2 dashboard grid.
#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub title: String,
    pub row: u8,
    pub col: u8,
    pub chart: Chart,
}

/// The full output surface handed to the presentation layer. Contains no
/// timestamps, so the same upload always serializes to the same bytes.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub row_count: usize,
    pub metrics: Vec<Metric>,
    pub top_payment_methods: Vec<GroupRate>,
    pub panels: Vec<Panel>,
}

/// Map a normalized table onto the fixed dashboard schema.
pub fn assemble(records: &[CustomerRecord]) -> Dashboard {
    let churn_rate = aggregate::overall_churn_rate(records);
    let revenue_lost = aggregate::total_revenue_lost(records);

    let contract = aggregate::churn_rate_by_dimension(records, Dimension::Contract);
    let internet = aggregate::churn_rate_by_dimension(records, Dimension::InternetService);
    let payment = aggregate::churn_rate_by_dimension(records, Dimension::PaymentMethod);

    Dashboard {
        row_count: records.len(),
        metrics: vec![
            Metric {
                name: "Overall Churn Rate".to_string(),
                value: churn_rate,
                display: format_percent(churn_rate),
            },
            Metric {
                name: "Total Revenue Lost".to_string(),
                value: revenue_lost,
                display: format_currency(revenue_lost),
            },
        ],
        top_payment_methods: aggregate::top_payment_methods_by_churn(records, 5),
        panels: vec![
            Panel {
                title: "Overall Churn".to_string(),
                row: 1,
                col: 1,
                chart: Chart::Pie {
                    slices: churn_slices(records),
                },
            },
            Panel {
                title: "Churn by Contract".to_string(),
                row: 1,
                col: 2,
                chart: bar_chart(contract, PALETTE[1]),
            },
            Panel {
                title: "Churn by Internet".to_string(),
                row: 2,
                col: 1,
                chart: bar_chart(internet, PALETTE[2]),
            },
            Panel {
                title: "Churn by Payment".to_string(),
                row: 2,
                col: 2,
                chart: bar_chart(payment, PALETTE[4]),
            },
        ],
    }
}

fn churn_slices(records: &[CustomerRecord]) -> Vec<PieSlice> {
    let total = records.len();
    let share = |count: usize| {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64 * 100.0
        }
    };

    let churned = records.iter().filter(|r| r.churn == CHURNED).count();
    let retained = records.iter().filter(|r| r.churn == RETAINED).count();

    vec![
        PieSlice {
            label: CHURNED.to_string(),
            share: share(churned),
            color: PALETTE[3].to_string(),
        },
        PieSlice {
            label: RETAINED.to_string(),
            share: share(retained),
            color: PALETTE[0].to_string(),
        },
    ]
}

fn bar_chart(groups: Vec<GroupRate>, color: &str) -> Chart {
    Chart::Bar {
        color: color.to_string(),
        bars: groups
            .into_iter()
            .map(|group| Bar {
                label: group.label,
                rate: group.rate,
            })
            .collect(),
    }
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

/// Currency string with two decimals and thousands separators.
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let grouped = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap())
        .collect::<Vec<_>>()
        .join(",");

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac_part}")
}

/// Render the dashboard as a markdown report.
pub fn build_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Customer Churn Dashboard");
    let _ = writeln!(output, "Built from {} customer rows", dashboard.row_count);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Key Metrics");

    for metric in dashboard.metrics.iter() {
        let _ = writeln!(output, "- {}: {}", metric.name, metric.display);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top 5 Payment Methods by Churn Rate");

    if dashboard.top_payment_methods.is_empty() {
        let _ = writeln!(output, "No payment methods present in this upload.");
    } else {
        for entry in dashboard.top_payment_methods.iter() {
            let _ = writeln!(
                output,
                "- {}: {} ({} churned of {} customers)",
                entry.label,
                format_percent(entry.rate),
                entry.churned,
                entry.row_count
            );
        }
    }

    for panel in dashboard.panels.iter() {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "## {} (row {}, col {})",
            panel.title, panel.row, panel.col
        );
        match &panel.chart {
            Chart::Pie { slices } => {
                for slice in slices.iter() {
                    let _ = writeln!(output, "- {}: {}", slice.label, format_percent(slice.share));
                }
            }
            Chart::Bar { bars, .. } => {
                if bars.is_empty() {
                    let _ = writeln!(output, "No groups present in this upload.");
                } else {
                    for bar in bars.iter() {
                        let _ = writeln!(output, "- {}: {}", bar.label, format_percent(bar.rate));
                    }
                }
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(churn: &str, contract: &str, payment_method: &str) -> CustomerRecord {
        CustomerRecord {
            churn: churn.to_string(),
            contract: contract.to_string(),
            internet_service: "DSL".to_string(),
            payment_method: payment_method.to_string(),
            total_charges: 100.0,
        }
    }

    #[test]
    fn panels_follow_the_fixed_layout() {
        let records = vec![sample_record("Yes", "Month-to-month", "Electronic check")];
        let dashboard = assemble(&records);

        assert_eq!(dashboard.panels.len(), 4);

        let positions: Vec<(&str, u8, u8)> = dashboard
            .panels
            .iter()
            .map(|p| (p.title.as_str(), p.row, p.col))
            .collect();
        assert_eq!(
            positions,
            vec![
                ("Overall Churn", 1, 1),
                ("Churn by Contract", 1, 2),
                ("Churn by Internet", 2, 1),
                ("Churn by Payment", 2, 2),
            ]
        );

        assert!(matches!(dashboard.panels[0].chart, Chart::Pie { .. }));
        match &dashboard.panels[1].chart {
            Chart::Bar { color, .. } => assert_eq!(color, PALETTE[1]),
            other => panic!("expected a bar chart, got {other:?}"),
        }
        match &dashboard.panels[3].chart {
            Chart::Bar { color, .. } => assert_eq!(color, PALETTE[4]),
            other => panic!("expected a bar chart, got {other:?}"),
        }
    }

    #[test]
    fn pie_shares_split_between_churned_and_retained() {
        let records = vec![
            sample_record("Yes", "Month-to-month", "Electronic check"),
            sample_record("No", "Two year", "Mailed check"),
            sample_record("No", "Two year", "Mailed check"),
            sample_record("No", "Two year", "Mailed check"),
        ];

        let dashboard = assemble(&records);
        match &dashboard.panels[0].chart {
            Chart::Pie { slices } => {
                assert_eq!(slices.len(), 2);
                assert_eq!(slices[0].label, "Yes");
                assert!((slices[0].share - 25.0).abs() < 0.001);
                assert_eq!(slices[0].color, PALETTE[3]);
                assert_eq!(slices[1].label, "No");
                assert!((slices[1].share - 75.0).abs() < 0.001);
                assert_eq!(slices[1].color, PALETTE[0]);
            }
            other => panic!("expected a pie chart, got {other:?}"),
        }
    }

    #[test]
    fn empty_table_produces_a_zeroed_dashboard() {
        let dashboard = assemble(&[]);

        assert_eq!(dashboard.row_count, 0);
        assert_eq!(dashboard.metrics[0].display, "0.00%");
        assert_eq!(dashboard.metrics[1].display, "$0.00");
        assert!(dashboard.top_payment_methods.is_empty());

        match &dashboard.panels[0].chart {
            Chart::Pie { slices } => {
                assert_eq!(slices[0].share, 0.0);
                assert_eq!(slices[1].share, 0.0);
            }
            other => panic!("expected a pie chart, got {other:?}"),
        }
    }

    #[test]
    fn metrics_carry_formatted_displays() {
        let records = vec![
            sample_record("Yes", "Month-to-month", "Electronic check"),
            sample_record("Yes", "Month-to-month", "Electronic check"),
            sample_record("No", "Two year", "Mailed check"),
        ];

        let dashboard = assemble(&records);
        assert_eq!(dashboard.metrics[0].name, "Overall Churn Rate");
        assert_eq!(dashboard.metrics[0].display, "66.67%");
        assert_eq!(dashboard.metrics[1].name, "Total Revenue Lost");
        assert_eq!(dashboard.metrics[1].display, "$200.00");
    }

    #[test]
    fn currency_formatting_groups_thousands() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(50.0), "$50.00");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_currency(-1234.5), "-$1,234.50");
    }

    #[test]
    fn percent_formatting_uses_two_decimals() {
        assert_eq!(format_percent(0.0), "0.00%");
        assert_eq!(format_percent(66.666_666), "66.67%");
        assert_eq!(format_percent(100.0), "100.00%");
    }

    #[test]
    fn full_pipeline_handles_malformed_charges() {
        let csv = "\
Churn,Contract,InternetService,PaymentMethod,TotalCharges
Yes,Month-to-month,DSL,Electronic check,100
No,Two year,DSL,Mailed check,50
Yes,One year,DSL,Electronic check,bad
";
        let records = crate::dataset::load_table(csv.as_bytes()).unwrap();
        let dashboard = assemble(&records);

        assert_eq!(dashboard.metrics[0].display, "66.67%");
        assert_eq!(dashboard.metrics[1].display, "$100.00");
    }

    #[test]
    fn identical_input_serializes_identically() {
        let records = vec![
            sample_record("Yes", "Month-to-month", "Electronic check"),
            sample_record("No", "One year", "Credit card"),
        ];

        let first = serde_json::to_string(&assemble(&records)).unwrap();
        let second = serde_json::to_string(&assemble(&records)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn report_lists_metrics_ranking_and_panels() {
        let records = vec![
            sample_record("Yes", "Month-to-month", "Electronic check"),
            sample_record("No", "Two year", "Mailed check"),
        ];

        let report = build_report(&assemble(&records));
        assert!(report.contains("# Customer Churn Dashboard"));
        assert!(report.contains("- Overall Churn Rate: 50.00%"));
        assert!(report.contains("- Total Revenue Lost: $100.00"));
        assert!(report.contains("## Top 5 Payment Methods by Churn Rate"));
        assert!(report.contains("- Electronic check: 100.00% (1 churned of 1 customers)"));
        assert!(report.contains("## Churn by Payment (row 2, col 2)"));
    }

    #[test]
    fn empty_report_spells_out_missing_groups() {
        let report = build_report(&assemble(&[]));
        assert!(report.contains("Built from 0 customer rows"));
        assert!(report.contains("No payment methods present in this upload."));
        assert!(report.contains("No groups present in this upload."));
    }
}
