// Primitives for reading and writing CSV files.

use std::io::Write;

use survey_pipeline::builder::Builder;

use crate::survey::*;

/// Reads a survey export in CSV format: comma separated, double quotes, UTF-8,
/// with a header row.
pub fn read_csv_survey(path: &str, content: &[u8]) -> SurveyResult<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .quote(b'"')
        .from_reader(content);
    let header = rdr.headers().context(OpeningCsvSnafu { path })?.clone();
    if header.is_empty() {
        return MissingHeaderSnafu { path }.fail();
    }
    debug!("read_csv_survey: header: {:?}", header);

    let labels: Vec<&str> = header.iter().collect();
    let mut builder = Builder::new(labels.as_slice()).context(PipelineSnafu {})?;
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_csv_survey: lineno: {:?} row: {:?}", lineno, line);
        let cells: Vec<&str> = line.iter().collect();
        builder.add_row(&cells).context(PipelineSnafu {})?;
    }
    let table = builder.build();
    info!(
        "read_csv_survey: {:?}: {} records, {} fields",
        path,
        table.len(),
        table.columns().len()
    );
    Ok(table)
}

/// Writes a table in CSV format. Missing values are written as empty cells.
pub fn write_csv_table<W: Write>(table: &Table, out: W) -> SurveyResult<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(table.columns())
        .context(WritingCsvSnafu {})?;
    for row in table.rows() {
        let cells: Vec<String> = row.values().iter().map(|v| v.to_string()).collect();
        wtr.write_record(&cells).context(WritingCsvSnafu {})?;
    }
    wtr.flush().context(WritingOutputSnafu { path: "csv" })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_quoted_fields() {
        let content = "a, b ,c\n1,\"x, y\",\n\"2\",  ,z\n";
        let t = read_csv_survey("test.csv", content.as_bytes()).unwrap();
        assert_eq!(
            t.columns(),
            &["a".to_string(), " b ".to_string(), "c".to_string()]
        );
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(0, " b "), Some(&Value::text("x, y")));
        assert_eq!(t.get(0, "c"), Some(&Value::Missing));
        assert_eq!(t.get(1, "a"), Some(&Value::text("2")));
        assert_eq!(t.get(1, " b "), Some(&Value::text("  ")));
    }

    #[test]
    fn accented_labels() {
        let content = "Nome do Membro,Ministérios que participa\nJoão,Intercessão\n";
        let t = read_csv_survey("test.csv", content.as_bytes()).unwrap();
        assert_eq!(
            t.get(0, "Ministérios que participa"),
            Some(&Value::text("Intercessão"))
        );
    }

    #[test]
    fn empty_file_has_no_header() {
        let res = read_csv_survey("test.csv", b"");
        assert!(matches!(res, Err(SurveyError::MissingHeader { .. })));
    }

    #[test]
    fn ragged_line_is_an_error() {
        let res = read_csv_survey("test.csv", b"a,b\n1,2\n1,2,3\n");
        assert!(matches!(
            res,
            Err(SurveyError::CsvLineParse { lineno: 3, .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let res = read_csv_survey("test.csv", b"a,b\n\xff\xfe,2\n");
        assert!(res.is_err());
    }

    #[test]
    fn writes_values() {
        let t = Table::new(
            vec!["Nome".to_string(), "Nivel".to_string(), "Obs".to_string()],
            vec![vec![
                Value::text("Ana, B"),
                Value::Number(75.0),
                Value::Missing,
            ]],
        )
        .unwrap();
        let mut buf: Vec<u8> = Vec::new();
        write_csv_table(&t, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Nome,Nivel,Obs\n\"Ana, B\",75,\n"
        );
    }
}
