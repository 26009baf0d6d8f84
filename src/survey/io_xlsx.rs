use calamine::{DataType, Reader, Xlsx};
use std::io::Cursor;

use survey_pipeline::builder::Builder;

use crate::survey::*;

/// Reads a survey export from an Excel workbook. The first row of the
/// worksheet is the header.
pub fn read_xlsx_survey(
    path: &str,
    content: &[u8],
    worksheet_name: Option<&str>,
) -> SurveyResult<Table> {
    let wrange = get_range(path, content, worksheet_name)?;

    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyExcelSnafu {})?;
    debug!("read_xlsx_survey: header: {:?}", header);
    let labels: Vec<String> = header.iter().map(header_label).collect();
    let mut builder = Builder::new(labels.as_slice()).context(PipelineSnafu {})?;

    for (idx, row) in iter.enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        if row.iter().all(|c| matches!(c, DataType::Empty)) {
            debug!("read_xlsx_survey: lineno: {:?}: empty row, skipping", lineno);
            continue;
        }
        let values = row
            .iter()
            .map(|c| read_cell(c, lineno))
            .collect::<SurveyResult<Vec<Value>>>()?;
        debug!("read_xlsx_survey: lineno: {:?} row: {:?}", lineno, &values);
        builder.add_values(values).context(PipelineSnafu {})?;
    }
    let table = builder.build();
    info!(
        "read_xlsx_survey: {:?}: {} records, {} fields",
        path,
        table.len(),
        table.columns().len()
    );
    Ok(table)
}

fn header_label(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        // Blank labels get a name from the builder.
        DataType::Empty => "".to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) => f.to_string(),
        x => format!("{:?}", x),
    }
}

fn read_cell(cell: &DataType, lineno: usize) -> SurveyResult<Value> {
    match cell {
        DataType::String(s) => Ok(Value::Text(s.clone())),
        DataType::Float(f) => Ok(Value::Number(*f)),
        DataType::Int(i) => Ok(Value::Number(*i as f64)),
        DataType::DateTime(f) => Ok(Value::Number(*f)),
        DataType::Bool(b) => Ok(Value::Text(b.to_string())),
        DataType::Empty => Ok(Value::Missing),
        DataType::Error(_) => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
        #[allow(unreachable_patterns)]
        x => Ok(Value::Text(format!("{:?}", x))),
    }
}

fn get_range(
    path: &str,
    content: &[u8],
    worksheet_name_o: Option<&str>,
) -> SurveyResult<calamine::Range<DataType>> {
    debug!(
        "read_xlsx_survey: path: {:?} worksheet: {:?}",
        path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(content.to_vec())).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                path,
                name: worksheet_name,
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptyExcelSnafu {}.fail(),
            [(worksheet_name, wrange)] => {
                debug!(
                    "read_xlsx_survey: path: {:?} worksheet: {:?}",
                    path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            x => TooManyWorksheetsSnafu {
                path,
                count: x.len(),
            }
            .fail(),
        }
    }
}
