use serde::Serialize;

use crate::process::{Comparison, Insight, LongRecord, MeanComparison, Mode, ValueCount};
use crate::table::Cell;

/// Everything a presentation layer needs to draw one dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub dashboard: String,
    pub title: String,
    pub rows: usize,
    /// Values offered by the entity selector, first-seen order.
    pub entities: Vec<Cell>,
    pub records: Vec<LongRecord>,
    pub insight: Option<Insight>,
    /// Distribution chart data.
    pub category_counts: Vec<ValueCount>,
}

impl DashboardReport {
    /// User-facing lines, in display order.
    pub fn messages(&self) -> Vec<String> {
        let mut out = vec!["File successfully uploaded and validated!".to_string()];
        if self.rows == 0 {
            out.push("No data rows in the uploaded file.".to_string());
        }
        if let Some(insight) = &self.insight {
            out.push(mode_message(&insight.most_frequent));
            out.extend(mean_messages(&insight.means));
        }
        out
    }
}

fn mode_message(mode: &Mode) -> String {
    format!(
        "The most common {} is {} with {} entries.",
        mode.column.to_lowercase(),
        mode.value,
        mode.count
    )
}

fn mean_messages(means: &MeanComparison) -> [String; 2] {
    let a = means.column_a.to_lowercase();
    let summary = format!(
        "The average {} is {}, while the average {} is {}.",
        a,
        means.mean_a,
        means.column_b.to_lowercase(),
        means.mean_b
    );
    let verdict = match means.comparison {
        Comparison::Above => format!("Great! The {} is above the standard.", a),
        Comparison::Below => format!(
            "Warning: the {} is below the standard. Improvements are needed!",
            a
        ),
        Comparison::Equal => format!("The {} is matching the standard perfectly.", a),
    };
    [summary, verdict]
}

pub fn missing_columns_message(missing: &[String]) -> String {
    format!(
        "Missing columns: {}. Please upload a file with all required columns.",
        missing.join(", ")
    )
}
