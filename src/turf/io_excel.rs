// Reading Excel workbooks.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;
use turf_engine::{RespondentTable, TableBuilder, Value};

use crate::turf::io_common::parse_cell;
use crate::turf::*;

pub fn read_excel_table(path: &str, worksheet: Option<&str>) -> BTurfCliResult<RespondentTable> {
    let wrange = get_range(path, worksheet)?;
    read_range(&wrange, path)
}

fn get_range(path: &str, worksheet: Option<&str>) -> BTurfCliResult<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    select_worksheet(workbook.worksheets(), worksheet, path)
}

/// Picks the named worksheet, or the only one when no name is given.
fn select_worksheet(
    mut sheets: Vec<(String, Range<DataType>)>,
    worksheet: Option<&str>,
    path: &str,
) -> BTurfCliResult<Range<DataType>> {
    if let Some(name) = worksheet {
        let idx = sheets
            .iter()
            .position(|(n, _)| n == name)
            .context(MissingWorksheetSnafu { name, path })?;
        return Ok(sheets.swap_remove(idx).1);
    }
    match sheets.len() {
        0 => Err(Box::new(TurfCliError::EmptyFile {
            path: path.to_string(),
        })),
        1 => Ok(sheets.remove(0).1),
        _ => Err(Box::new(TurfCliError::AmbiguousWorksheet {
            path: path.to_string(),
            names: sheets.into_iter().map(|(name, _)| name).collect(),
        })),
    }
}

/// Reads a worksheet whose first row holds the column names.
/// Columns with an empty header are skipped.
fn read_range(wrange: &Range<DataType>, path: &str) -> BTurfCliResult<RespondentTable> {
    let mut rows = wrange.rows();
    let header_row = rows.next().context(EmptyFileSnafu { path })?;
    let header: Vec<(usize, String)> = header_row
        .iter()
        .enumerate()
        .filter_map(|(idx, cell)| {
            let name = cell.to_string().trim().to_string();
            if name.is_empty() {
                None
            } else {
                Some((idx, name))
            }
        })
        .collect();
    debug!("read_range: header: {:?}", header);
    let names: Vec<String> = header.iter().map(|(_, name)| name.clone()).collect();
    let mut builder = TableBuilder::from_header(&names).context(TableSnafu {})?;

    for (idx, row) in rows.enumerate() {
        let lineno = idx + 2;
        let mut values: Vec<Value> = Vec::with_capacity(header.len());
        for (col_idx, _) in header.iter() {
            let v = match row.get(*col_idx) {
                Some(cell) => read_cell(cell, lineno)?,
                None => Value::Missing,
            };
            values.push(v);
        }
        builder.add_row(values).context(TableSnafu {})?;
    }
    Ok(builder.build())
}

fn read_cell(cell: &DataType, lineno: usize) -> BTurfCliResult<Value> {
    match cell {
        DataType::Int(i) => Ok(Value::Number(*i as f64)),
        DataType::Float(x) => Ok(Value::Number(*x)),
        DataType::Bool(b) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
        DataType::String(s) => Ok(parse_cell(s)),
        DataType::Empty | DataType::Error(_) => Ok(Value::Missing),
        _ => Err(Box::new(TurfCliError::ExcelWrongCellType {
            lineno,
            content: format!("{:?}", cell),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    fn range(rows: Vec<Vec<DataType>>) -> Range<DataType> {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut r = Range::new((0, 0), (height - 1, width - 1));
        for (i, row) in rows.into_iter().enumerate() {
            for (j, cell) in row.into_iter().enumerate() {
                r.set_value((i as u32, j as u32), cell);
            }
        }
        r
    }

    fn s(x: &str) -> DataType {
        DataType::String(x.to_string())
    }

    #[test]
    fn read_worksheet() {
        let wrange = range(vec![
            vec![s("id"), s("A"), DataType::Empty, s("B")],
            vec![s("r1"), DataType::Int(1), s("ignored"), DataType::Bool(false)],
            vec![s("r2"), DataType::Float(0.0), DataType::Empty, DataType::Bool(true)],
            vec![s("r3"), DataType::Empty, DataType::Empty, s("1")],
            vec![
                s("r4"),
                DataType::Error(CellErrorType::NA),
                DataType::Empty,
                DataType::Error(CellErrorType::Div0),
            ],
        ]);
        let table = read_range(&wrange, "test.xlsx").unwrap();
        assert_eq!(table.column_names(), ["id", "A", "B"]);
        assert_eq!(table.num_rows(), 4);
        assert_eq!(
            table.column("A").unwrap(),
            [Value::Number(1.0), Value::Number(0.0), Value::Missing, Value::Missing]
        );
        assert_eq!(
            table.column("B").unwrap(),
            [
                Value::Number(0.0),
                Value::Number(1.0),
                Value::Number(1.0),
                Value::Missing
            ]
        );
    }

    #[test]
    fn wrong_cell_type() {
        let wrange = range(vec![vec![s("A")], vec![DataType::DateTime(44000.0)]]);
        let err = read_range(&wrange, "test.xlsx").unwrap_err();
        assert!(matches!(
            *err,
            TurfCliError::ExcelWrongCellType { lineno: 2, .. }
        ));
    }

    fn sheets(names: &[&str]) -> Vec<(String, Range<DataType>)> {
        names
            .iter()
            .map(|n| (n.to_string(), range(vec![vec![s(n)]])))
            .collect()
    }

    #[test]
    fn only_worksheet() {
        let wrange = select_worksheet(sheets(&["Q1"]), None, "test.xlsx").unwrap();
        assert_eq!(wrange.get_value((0, 0)), Some(&s("Q1")));
    }

    #[test]
    fn named_worksheet() {
        let wrange = select_worksheet(sheets(&["Q1", "Q2"]), Some("Q2"), "test.xlsx").unwrap();
        assert_eq!(wrange.get_value((0, 0)), Some(&s("Q2")));
    }

    #[test]
    fn several_worksheets_without_a_name() {
        let err = select_worksheet(sheets(&["Q1", "Q2"]), None, "test.xlsx").unwrap_err();
        match *err {
            TurfCliError::AmbiguousWorksheet { names, .. } => assert_eq!(names, ["Q1", "Q2"]),
            e => panic!("unexpected error {}", e),
        }
    }

    #[test]
    fn missing_worksheet() {
        let err = select_worksheet(sheets(&["Q1", "Q2"]), Some("Q3"), "test.xlsx").unwrap_err();
        assert!(matches!(*err, TurfCliError::MissingWorksheet { ref name, .. } if name == "Q3"));
    }

    #[test]
    fn workbook_without_worksheets() {
        let err = select_worksheet(Vec::new(), None, "test.xlsx").unwrap_err();
        assert!(matches!(*err, TurfCliError::EmptyFile { .. }));
    }

    #[test]
    fn missing_file() {
        let err = read_excel_table("/nonexistent/turfcalc/survey.xlsx", None).unwrap_err();
        assert!(matches!(*err, TurfCliError::OpeningExcel { .. }));
    }
}
