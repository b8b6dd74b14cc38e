use crate::analytics::created_month;
use crate::errors::{AppError, AppResult};
use crate::models::{ExportResponse, ServiceRequest};
use serde::{Deserialize, Serialize};
use rust_xlsxwriter::Workbook;
use std::path::Path;

pub const EXPORT_HEADERS: [&str; 4] = ["Date", "Name", "City", "Request type"];
pub const UNKNOWN_SHEET: &str = "unknown";
pub const EXPORT_FILE_NAME: &str = "requests.xlsx";
const COLUMN_PADDING: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub date: String,
    pub name: String,
    pub city: String,
    pub request_type: String,
}

impl ExportRow {
    fn cells(&self) -> [&str; 4] {
        [
            self.date.as_str(),
            self.name.as_str(),
            self.city.as_str(),
            self.request_type.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<ExportRow>,
    pub column_widths: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportWorkbook {
    pub sheets: Vec<ExportSheet>,
}

/// One sheet per creation month, in order of first appearance.
pub fn group_by_month(records: &[ServiceRequest]) -> ExportWorkbook {
    let mut groups: Vec<(String, Vec<ExportRow>)> = Vec::new();
    for request in records {
        let sheet_name = created_month(request)
            .map(|month| month.to_string())
            .unwrap_or_else(|| UNKNOWN_SHEET.to_string());
        let row = ExportRow {
            date: request.created_at.clone(),
            name: request.name.clone(),
            city: request.city.clone(),
            request_type: request.request_type.clone(),
        };
        match groups.iter_mut().find(|(name, _)| *name == sheet_name) {
            Some((_, rows)) => rows.push(row),
            None => groups.push((sheet_name, vec![row])),
        }
    }

    ExportWorkbook {
        sheets: groups
            .into_iter()
            .map(|(name, rows)| ExportSheet {
                column_widths: column_widths(&rows),
                headers: EXPORT_HEADERS.iter().map(|header| header.to_string()).collect(),
                name,
                rows,
            })
            .collect(),
    }
}

fn column_widths(rows: &[ExportRow]) -> Vec<usize> {
    EXPORT_HEADERS
        .iter()
        .enumerate()
        .map(|(index, header)| {
            let widest = rows
                .iter()
                .map(|row| row.cells()[index].chars().count())
                .max()
                .unwrap_or(0);
            widest.max(header.chars().count()) + COLUMN_PADDING
        })
        .collect()
}

/// Writes `requests.xlsx`: one worksheet per sheet, header row first, column
/// widths from the projection.
pub fn write_workbook(export_dir: &Path, workbook: &ExportWorkbook) -> AppResult<ExportResponse> {
    std::fs::create_dir_all(export_dir).map_err(|error| AppError::Io(error.to_string()))?;
    let output_path = export_dir.join(EXPORT_FILE_NAME);

    let mut xlsx = Workbook::new();
    for sheet in &workbook.sheets {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet.write_string(0, col as u16, header)?;
        }
        for (index, row) in sheet.rows.iter().enumerate() {
            let row_num = index as u32 + 1;
            for (col, cell) in row.cells().iter().enumerate() {
                worksheet.write_string(row_num, col as u16, *cell)?;
            }
        }
        for (col, width) in sheet.column_widths.iter().enumerate() {
            worksheet.set_column_width(col as u16, *width as f64)?;
        }
    }
    xlsx.save(&output_path)?;

    tracing::info!(path = %output_path.display(), sheets = workbook.sheets.len(), "requests exported");
    Ok(ExportResponse {
        path: output_path.to_string_lossy().to_string(),
        sheet_count: workbook.sheets.len(),
    })
}
