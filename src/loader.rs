use crate::error::LoadError;
use crate::types::{CellValue, Dimension, ResidentTable};
use calamine::{Data, Reader, Xlsx};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub sheet_name: String,
    pub total_rows: usize,
    pub skipped_empty_rows: usize,
    pub recognised_columns: Vec<&'static str>,
}

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<(ResidentTable, LoadReport), LoadError> {
    let bytes = std::fs::read(path.as_ref())?;
    debug!(path = %path.as_ref().display(), size = bytes.len(), "read spreadsheet");
    load_from_bytes(&bytes)
}

/// Parse the first worksheet of an xlsx workbook. The first row is the
/// header; every following row that is not completely empty is a record.
pub fn load_from_bytes(bytes: &[u8]) -> Result<(ResidentTable, LoadReport), LoadError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LoadError::NoSheet)?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|source| LoadError::Sheet {
            name: sheet_name.clone(),
            source,
        })?;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                let name = cell.to_string().trim().to_string();
                if name.is_empty() {
                    format!("Unnamed: {}", idx)
                } else {
                    name
                }
            })
            .collect(),
        None => Vec::new(),
    };

    let mut total_rows = 0usize;
    let mut skipped_empty_rows = 0usize;
    let mut records: Vec<Vec<CellValue>> = Vec::new();
    for row in rows {
        total_rows += 1;
        let record: Vec<CellValue> = row.iter().map(convert_cell).collect();
        if record.iter().all(CellValue::is_null) {
            skipped_empty_rows += 1;
            continue;
        }
        records.push(record);
    }

    let table = ResidentTable::new(columns, records);
    let recognised_columns: Vec<&'static str> = Dimension::ALL
        .iter()
        .map(|d| d.column())
        .filter(|c| table.has_column(c))
        .collect();

    info!(
        sheet = %sheet_name,
        rows = table.len(),
        skipped = skipped_empty_rows,
        columns = ?recognised_columns,
        "spreadsheet loaded"
    );

    let report = LoadReport {
        sheet_name,
        total_rows,
        skipped_empty_rows,
        recognised_columns,
    };
    Ok((table, report))
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::Int(v) => CellValue::Int(*v),
        Data::Float(v) => CellValue::Float(*v),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => CellValue::Text(s.clone()),
        other => CellValue::Text(other.to_string()),
    }
}
