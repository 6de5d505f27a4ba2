use crate::error::AppError;
use crate::types::{Aggregate, AggregateRow, KpiSummary, ResidentTable};
use crate::util::format_percent;
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};
use tracing::info;

pub fn write_bytes<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<(), AppError> {
    std::fs::write(path.as_ref(), bytes).map_err(|source| AppError::Write {
        path: path.as_ref().to_path_buf(),
        source,
    })?;
    info!(path = %path.as_ref().display(), bytes = bytes.len(), "file written");
    Ok(())
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn kpi_json(kpis: &KpiSummary) -> Result<String, AppError> {
    to_json(kpis)
}

pub fn aggregate_rows(agg: &Aggregate) -> Vec<AggregateRow> {
    agg.entries
        .iter()
        .map(|e| AggregateRow {
            category: e.label.clone(),
            count: e.count,
            share: format_percent(agg.percentage(e.count)),
        })
        .collect()
}

/// Markdown rendering of the first `max_rows` rows of a loaded table.
pub fn render_table(table: &ResidentTable, max_rows: usize) -> String {
    if table.is_empty() {
        return "(keine Zeilen)".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(table.columns().iter().cloned());
    for row in table.rows().iter().take(max_rows) {
        builder.push_record(row.iter().map(|c| c.to_string()));
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn preview_table(table: &ResidentTable, max_rows: usize) {
    println!("{}", render_table(table, max_rows));
    if table.len() > max_rows {
        println!("... {} weitere Zeilen", table.len() - max_rows);
    }
    println!();
}

pub fn render_rows<T>(rows: &[T]) -> String
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return "(keine Zeilen)".to_string();
    }
    Table::new(rows.to_vec()).with(Style::markdown()).to_string()
}

pub fn preview_rows<T>(title: &str, rows: &[T])
where
    T: Tabled + Clone,
{
    println!("{}\n", title);
    println!("{}\n", render_rows(rows));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryCount, CellValue, Dimension};

    #[test]
    fn test_aggregate_rows_format_shares() {
        let agg = Aggregate::new(
            Dimension::Department,
            vec![
                CategoryCount {
                    label: "Nord".to_string(),
                    count: 3,
                },
                CategoryCount {
                    label: "Süd".to_string(),
                    count: 1,
                },
            ],
        );
        let rows = aggregate_rows(&agg);
        assert_eq!(rows[0].share, "75,0 %");
        assert_eq!(rows[1].share, "25,0 %");
        let rendered = render_rows(&rows);
        assert!(rendered.contains("Kategorie"));
        assert!(rendered.contains("Nord"));
    }

    #[test]
    fn test_render_table_limits_rows() {
        let table = ResidentTable::new(
            vec!["Name".to_string(), "Alter".to_string()],
            vec![
                vec![CellValue::Text("Anna".to_string()), CellValue::Float(84.0)],
                vec![CellValue::Text("Bernd".to_string()), CellValue::Int(90)],
                vec![CellValue::Text("Clara".to_string()), CellValue::Empty],
            ],
        );
        let rendered = render_table(&table, 2);
        assert!(rendered.contains("Alter"));
        assert!(rendered.contains("84"));
        assert!(!rendered.contains("84.0"));
        assert!(rendered.contains("Bernd"));
        assert!(!rendered.contains("Clara"));
    }

    #[test]
    fn test_kpi_json() {
        let json = kpi_json(&KpiSummary {
            residents: 2,
            mean_age: None,
            high_care: Some(1),
            single_rooms: None,
        })
        .unwrap();
        assert!(json.contains("\"residents\": 2"));
        assert!(json.contains("\"mean_age\": null"));
    }

    #[test]
    fn test_write_error_keeps_io_source() {
        let err = write_bytes("/nonexistent-dir/pflegeheim_report.docx", b"PK").unwrap_err();
        assert!(matches!(err, AppError::Write { .. }));
        assert!(err.to_string().contains("pflegeheim_report.docx"));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.downcast_ref::<std::io::Error>().is_some());
    }
}
