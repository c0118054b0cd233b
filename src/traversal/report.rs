use serde::Serialize;

#[cfg(feature = "telemetry")]
use crate::traversal::telemetry::TypeUsage;
use crate::traversal::stats::TraversalStats;

/// Result of one deep size computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepSizeReport {
    pub total_bytes: u64,
    pub stats: TraversalStats,
    /// Largest contributors first.
    #[cfg(feature = "telemetry")]
    pub by_type: Vec<TypeUsage>,
}

/// Renders a report as a fixed-width text table.
pub fn format_report(report: &DeepSizeReport) -> String {
    let stats = &report.stats;
    let mut out = String::from("=== Deep Size ===\n");
    out.push_str(&format!("Total bytes:        {}\n", report.total_bytes));
    out.push_str(&format!("Objects:            {}\n", stats.objects));
    out.push_str(&format!("Arrays scanned:     {}\n", stats.arrays_scanned));
    out.push_str(&format!("Fields read:        {}\n", stats.fields_read));
    out.push_str(&format!("References pushed:  {}\n", stats.references_pushed));
    out.push_str(&format!("Null pops:          {}\n", stats.null_pops));
    out.push_str(&format!("Revisits:           {}\n", stats.revisits));
    out.push_str(&format!("Peak frontier:      {}\n", stats.peak_frontier));

    #[cfg(feature = "telemetry")]
    if !report.by_type.is_empty() {
        out.push_str("\nBreakdown by type:\n");
        out.push_str(&format!("{:<18} {:>8} {:>12}\n", "Type", "Count", "Bytes"));
        out.push_str(&"-".repeat(40));
        out.push('\n');
        for usage in &report.by_type {
            out.push_str(&format!(
                "{:<18} {:>8} {:>12}\n",
                usage.type_name, usage.count, usage.bytes
            ));
        }
    }

    out
}

#[cfg(all(test, feature = "telemetry"))]
mod tests {
    use super::*;

    #[test]
    fn test_format_report_with_breakdown() {
        let report = DeepSizeReport {
            total_bytes: 88,
            stats: TraversalStats {
                objects: 4,
                arrays_scanned: 1,
                fields_read: 6,
                references_pushed: 7,
                null_pops: 1,
                revisits: 2,
                peak_frontier: 3,
            },
            by_type: vec![
                TypeUsage {
                    type_name: "Node".to_string(),
                    count: 3,
                    bytes: 72,
                },
                TypeUsage {
                    type_name: "Object[]".to_string(),
                    count: 1,
                    bytes: 16,
                },
            ],
        };

        insta::assert_snapshot!(format_report(&report), @r"
        === Deep Size ===
        Total bytes:        88
        Objects:            4
        Arrays scanned:     1
        Fields read:        6
        References pushed:  7
        Null pops:          1
        Revisits:           2
        Peak frontier:      3

        Breakdown by type:
        Type                  Count        Bytes
        ----------------------------------------
        Node                      3           72
        Object[]                  1           16
        ");
    }

    #[test]
    fn test_format_report_without_objects() {
        let report = DeepSizeReport {
            total_bytes: 0,
            stats: TraversalStats::default(),
            by_type: Vec::new(),
        };
        let rendered = format_report(&report);
        assert!(rendered.contains("Total bytes:        0"));
        assert!(!rendered.contains("Breakdown by type"));
    }
}
