//! Report grouping shared by stores that aggregate outside the database.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::store::{ReportGroup, ReportRow};

#[derive(Default)]
struct Sum {
    total: f64,
    count: u64,
}

/// Parse a stored string as a finite number.
fn numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Group rows by numeric input value and unit, then average each group.
///
/// `"5"`, `"05"` and `"+5"` land in one group. Rows whose input or value is
/// not a finite number are skipped. Output is ascending by input, then unit.
pub fn aggregate(rows: &[ReportRow]) -> Vec<ReportGroup> {
    let mut sums: HashMap<(u64, Option<String>), (f64, Sum)> = HashMap::new();

    for row in rows {
        let Some(input) = numeric(&row.input_value) else {
            continue;
        };
        let Some(value) = row.value.as_deref().and_then(numeric) else {
            continue;
        };
        // -0 and 0 are one input.
        let input = if input == 0.0 { 0.0 } else { input };

        let (_, sum) = sums
            .entry((input.to_bits(), row.unit.clone()))
            .or_insert_with(|| (input, Sum::default()));
        sum.total += value;
        sum.count += 1;
    }

    let mut groups: Vec<ReportGroup> = sums
        .into_iter()
        .map(|((_, unit), (input, sum))| ReportGroup {
            input,
            average: sum.total / sum.count as f64,
            unit,
        })
        .collect();
    groups.sort_by(|a, b| {
        a.input
            .partial_cmp(&b.input)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.unit.cmp(&b.unit))
    });
    groups
}
