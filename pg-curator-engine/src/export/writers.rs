//! File writers for the two export formats.
//!
//! Pure functions over materialised result sets; no database access. The
//! spreadsheet side goes through `rust_xlsxwriter`, the JSON side through
//! `serde_json` with column order preserved.

use std::path::Path;

use pg_curator_api::prelude::{ExportError, ResultSet, SqlValue};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

/// Hard sheet-name limit of the workbook format.
const MAX_SHEET_NAME: usize = 31;

/// Largest integer magnitude a spreadsheet number cell stores exactly
/// (cells are IEEE 754 doubles).
const MAX_EXACT_INT: i64 = 1 << 53;

/// Truncates a table name to a legal worksheet name.
pub(crate) fn sheet_name(table: &str) -> String {
    table.chars().take(MAX_SHEET_NAME).collect()
}

/// The value as a number cell, unless the double would round it.
fn exact_number(value: i64) -> Option<f64> {
    (-MAX_EXACT_INT..=MAX_EXACT_INT)
        .contains(&value)
        .then_some(value as f64)
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &SqlValue,
) -> Result<(), ExportError> {
    let result = match value {
        SqlValue::Null => return Ok(()),
        SqlValue::Bool(b) => sheet.write_boolean(row, col, *b),
        SqlValue::Int(i) => match exact_number(*i) {
            Some(number) => sheet.write_number(row, col, number),
            None => sheet.write_string(row, col, i.to_string()),
        },
        SqlValue::Float(f) => sheet.write_number(row, col, *f),
        other => sheet.write_string(row, col, other.display_string()),
    };
    result.map_err(|err| ExportError::Spreadsheet(err.to_string()))?;
    Ok(())
}

/// Writes a workbook with one sheet per `(table, rows)` pair, a bold header
/// row of column names on each sheet.
pub(crate) fn write_workbook(
    path: &Path,
    sheets: &[(String, &ResultSet)],
) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for (table, set) in sheets {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(sheet_name(table))
            .map_err(|err| ExportError::Spreadsheet(err.to_string()))?;

        for (col, column) in set.columns.iter().enumerate() {
            sheet
                .write_string_with_format(0, col as u16, column, &header)
                .map_err(|err| ExportError::Spreadsheet(err.to_string()))?;
        }
        for (row, image) in set.rows.iter().enumerate() {
            for (col, value) in image.iter().enumerate() {
                write_cell(sheet, (row + 1) as u32, col as u16, value)?;
            }
        }
    }

    workbook
        .save(path)
        .map_err(|err| ExportError::Spreadsheet(err.to_string()))?;
    Ok(())
}

/// Writes one result set as a JSON array of row objects.
pub(crate) fn write_json_rows(path: &Path, set: &ResultSet) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, &set.to_json_rows())?;
    Ok(())
}

/// Writes several result sets as one JSON object keyed by table name, in
/// the given order.
pub(crate) fn write_json_tables(
    path: &Path,
    tables: &[(String, &ResultSet)],
) -> Result<(), ExportError> {
    let mut object = serde_json::Map::with_capacity(tables.len());
    for (table, set) in tables {
        object.insert(table.clone(), set.to_json_rows());
    }
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, &serde_json::Value::Object(object))?;
    Ok(())
}

#[cfg(test)]
mod tests {

    use super::*;

    fn sample() -> ResultSet {
        ResultSet {
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![
                vec![SqlValue::Int(1), SqlValue::Text("alpha".to_string())],
                vec![SqlValue::Int(2), SqlValue::Null],
            ],
        }
    }

    #[test]
    fn test_should_truncate_sheet_names_to_workbook_limit() {
        let long = "a_really_long_table_name_that_exceeds_the_limit";
        assert_eq!(sheet_name(long).len(), 31);
        assert_eq!(sheet_name("orders"), "orders");
    }

    #[test]
    fn test_should_keep_large_integers_out_of_number_cells() {
        assert_eq!(exact_number(42), Some(42.0));
        assert_eq!(exact_number(-MAX_EXACT_INT), Some(-(MAX_EXACT_INT as f64)));
        assert_eq!(exact_number(MAX_EXACT_INT), Some(MAX_EXACT_INT as f64));
        assert_eq!(exact_number(MAX_EXACT_INT + 1), None);
        assert_eq!(exact_number(i64::MAX), None);
    }

    #[test]
    fn test_should_write_workbook_with_out_of_range_integer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.xlsx");
        let set = ResultSet {
            columns: vec!["id".to_string()],
            rows: vec![vec![SqlValue::Int(i64::MAX)]],
        };

        write_workbook(&path, &[("ids".to_string(), &set)]).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_should_write_workbook_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.xlsx");
        let set = sample();

        write_workbook(&path, &[("orders".to_string(), &set)]).unwrap();
        assert!(path.is_file());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_should_write_json_rows_in_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.json");
        let set = sample();

        write_json_rows(&path, &set).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert!(text.find("\"id\"").unwrap() < text.find("\"name\"").unwrap());
    }

    #[test]
    fn test_should_write_table_keyed_json_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all.json");
        let set = sample();

        write_json_tables(
            &path,
            &[
                ("orders".to_string(), &set),
                ("customers".to_string(), &ResultSet::default()),
            ],
        )
        .unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["orders"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["customers"].as_array().unwrap().len(), 0);
    }
}
