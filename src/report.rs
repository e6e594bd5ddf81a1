//! Human-facing rendering of pipeline diagnostics. The engine never formats
//! text; everything printable comes through here (or through the caller's
//! own consumption of the serialized reports).

use crate::pipeline::StageReport;
use itertools::Itertools;
use tracing::info;

/// Renders one report as a short block of text.
pub fn render_report(report: &StageReport) -> String {
    let dtypes = report
        .dtypes
        .iter()
        .map(|(name, dtype)| format!("{}={}", name, dtype))
        .join(", ");
    let nulls = report
        .null_counts
        .iter()
        .map(|(name, count)| format!("{}={}", name, count))
        .join(", ");
    format!(
        "== stage '{}' ==\nrows:   {}\ndtypes: {}\nnulls:  {}",
        report.stage, report.row_count, dtypes, nulls
    )
}

/// Renders the full run, one block per stage in execution order.
pub fn render_reports(reports: &[StageReport]) -> String {
    reports.iter().map(render_report).join("\n\n")
}

/// Logs a one-line summary per stage.
pub fn log_reports(reports: &[StageReport]) {
    for report in reports {
        let total_nulls: usize = report.null_counts.values().sum();
        info!(
            "stage '{}': {} row(s), {} missing cell(s)",
            report.stage, report.row_count, total_nulls
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Column, ColumnStore};
    use crate::pipeline::Pipeline;

    #[test]
    fn test_render_lists_stages_in_order() {
        let store = ColumnStore::from_columns(vec![(
            "v".to_string(),
            Column::Int64(vec![Some(1), None]),
        )])
        .unwrap();
        let (_, reports) = Pipeline::new()
            .stage("first", Ok)
            .stage("second", Ok)
            .run(&store)
            .unwrap();
        let text = render_reports(&reports);
        let first = text.find("stage 'first'").unwrap();
        let second = text.find("stage 'second'").unwrap();
        assert!(first < second);
        assert!(text.contains("v=int64"));
        assert!(text.contains("nulls:  v=1"));
    }
}
