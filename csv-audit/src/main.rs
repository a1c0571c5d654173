//! Completeness audit of a CSV extract: share of empty, "not available" and
//! filled cells per column, and the least complete rows.

use std::env;
use std::fs;

use map_core::source::{Table, decode_source, sniff_delimiter};

mod report;

use report::{DEFAULT_TOP_N, column_stats, distribution, least_complete, row_stats};

const DEFAULT_COLUMNS_OUT: &str = "taux_completion_colonnes.csv";
const DEFAULT_ROWS_OUT: &str = "lignes_les_plus_vierges.csv";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: csv-audit <input.csv> [columns_out.csv] [rows_out.csv] [top_n]");
        std::process::exit(2);
    }
    let input = &args[1];
    let columns_out = args.get(2).map_or(DEFAULT_COLUMNS_OUT, String::as_str);
    let rows_out = args.get(3).map_or(DEFAULT_ROWS_OUT, String::as_str);
    let top_n = match args.get(4) {
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                eprintln!("top_n must be a non-negative integer, got {raw:?}");
                std::process::exit(2);
            }
        },
        None => DEFAULT_TOP_N,
    };

    let bytes = fs::read(input)?;
    let text = decode_source(&bytes);
    println!(
        "Reading {input} (delimiter {:?})",
        char::from(sniff_delimiter(&text))
    );
    let table = Table::parse_str(&text)?;
    let headers: Vec<&str> = table.header_names().collect();
    println!("{} rows, {} columns", table.len(), headers.len());

    let mut out = csv::Writer::from_path(columns_out)?;
    out.write_record(["colonne", "% vides", "% ND", "% renseignées"])?;
    for stat in column_stats(&table) {
        out.write_record([
            stat.name,
            format!("{:.1}", stat.pct_empty),
            format!("{:.1}", stat.pct_not_available),
            format!("{:.1}", stat.pct_filled),
        ])?;
    }
    out.flush()?;
    println!("-> columns: {columns_out}");

    let rows = row_stats(&table);
    let pcts: Vec<f64> = rows.iter().map(|r| r.pct_complete).collect();
    if let Some(d) = distribution(&pcts) {
        println!("\nRow completion (%):");
        println!("count  {}", d.count);
        println!("mean   {:.1}", d.mean);
        println!("min    {:.1}", d.min);
        println!("25%    {:.1}", d.q1);
        println!("50%    {:.1}", d.median);
        println!("75%    {:.1}", d.q3);
        println!("max    {:.1}", d.max);
    }

    let mut out = csv::Writer::from_path(rows_out)?;
    let mut header = headers.clone();
    header.extend(["nb_champs_renseignes", "pct_complet_ligne"]);
    out.write_record(&header)?;
    let worst = least_complete(&rows, top_n);
    for row in &worst {
        let mut fields: Vec<String> = (0..headers.len())
            .map(|i| row.record.get(i).unwrap_or("").to_string())
            .collect();
        fields.push(row.filled.to_string());
        fields.push(format!("{:.1}", row.pct_complete));
        out.write_record(&fields)?;
    }
    out.flush()?;
    println!("-> {} least complete rows: {rows_out}", worst.len());
    Ok(())
}
