use std::cmp::Ordering;

use csv::StringRecord;
use map_core::source::Table;

/// Lower-cased values that mean "not available" rather than a real value.
pub const NOT_AVAILABLE_TOKENS: [&str; 6] = ["nd", "n/d", "non disponible", "na", "n.a.", "n.a"];

pub const DEFAULT_TOP_N: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    NotAvailable,
    Filled,
}

pub fn classify(raw: Option<&str>) -> Cell {
    let Some(v) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Cell::Empty;
    };
    if NOT_AVAILABLE_TOKENS.contains(&v.to_lowercase().as_str()) {
        Cell::NotAvailable
    } else {
        Cell::Filled
    }
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnStat {
    pub name: String,
    pub pct_empty: f64,
    pub pct_not_available: f64,
    pub pct_filled: f64,
}

/// Completion of every column, emptiest first.
pub fn column_stats(table: &Table) -> Vec<ColumnStat> {
    let rows = table.len();
    let mut stats: Vec<ColumnStat> = table
        .header_names()
        .enumerate()
        .map(|(idx, name)| {
            let (mut empty, mut nd) = (0, 0);
            for record in table.records() {
                match classify(record.get(idx)) {
                    Cell::Empty => empty += 1,
                    Cell::NotAvailable => nd += 1,
                    Cell::Filled => {}
                }
            }
            ColumnStat {
                name: name.to_string(),
                pct_empty: pct(empty, rows),
                pct_not_available: pct(nd, rows),
                pct_filled: pct(rows - empty - nd, rows),
            }
        })
        .collect();
    stats.sort_by(|a, b| {
        b.pct_empty
            .total_cmp(&a.pct_empty)
            .then(b.pct_not_available.total_cmp(&a.pct_not_available))
    });
    stats
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowStat<'a> {
    pub record: &'a StringRecord,
    pub filled: usize,
    pub pct_complete: f64,
}

/// Completion of every data row, in source order.
pub fn row_stats(table: &Table) -> Vec<RowStat<'_>> {
    let columns = table.header_names().count();
    table
        .records()
        .iter()
        .map(|record| {
            let filled = (0..columns)
                .filter(|&i| classify(record.get(i)) == Cell::Filled)
                .count();
            RowStat {
                record,
                filled,
                pct_complete: pct(filled, columns),
            }
        })
        .collect()
}

/// The `n` least complete rows, ties kept in source order.
pub fn least_complete<'a>(rows: &[RowStat<'a>], n: usize) -> Vec<RowStat<'a>> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| a.pct_complete.total_cmp(&b.pct_complete));
    sorted.truncate(n);
    sorted
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Distribution {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Linear interpolation between closest ranks on sorted input.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn distribution(values: &[f64]) -> Option<Distribution> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
    Some(Distribution {
        count: sorted.len(),
        mean: round1(mean),
        min: sorted[0],
        q1: round1(quantile(&sorted, 0.25)),
        median: round1(quantile(&sorted, 0.5)),
        q3: round1(quantile(&sorted, 0.75)),
        max: sorted[sorted.len() - 1],
    })
}
