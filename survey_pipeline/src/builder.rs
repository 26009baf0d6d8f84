pub use crate::config::*;

/// A builder for assembling a raw table from the cells of a text export.
///
/// Empty cells are recorded as missing values, everything else as text.
/// Blank header labels are replaced by `Unnamed: <position>`.
///
/// ```
/// use survey_pipeline::builder::Builder;
/// use survey_pipeline::{PipelineError, Value};
///
/// let mut builder = Builder::new(&["Nome do Membro", "Ministérios que participa"])?;
/// builder.add_row(&["Ana", "Louvor, Dança"])?;
/// builder.add_row(&["Bia", ""])?;
///
/// let table = builder.build();
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.get(1, "Ministérios que participa"), Some(&Value::Missing));
/// # Ok::<(), PipelineError>(())
/// ```
pub struct Builder {
    pub(crate) _columns: Vec<String>,
    pub(crate) _rows: Vec<Vec<Value>>,
}

impl Builder {
    pub fn new<S: AsRef<str>>(header: &[S]) -> Result<Builder, PipelineError> {
        if header.is_empty() {
            return Err(PipelineError::EmptyHeader);
        }
        let columns = header
            .iter()
            .enumerate()
            .map(|(idx, h)| {
                let h = h.as_ref();
                if h.trim().is_empty() {
                    format!("Unnamed: {}", idx)
                } else {
                    h.to_string()
                }
            })
            .collect();
        Ok(Builder {
            _columns: columns,
            _rows: Vec::new(),
        })
    }

    pub fn num_columns(&self) -> usize {
        self._columns.len()
    }

    /// Adds a row of text cells.
    pub fn add_row<S: AsRef<str>>(&mut self, cells: &[S]) -> Result<(), PipelineError> {
        let values: Vec<Value> = cells
            .iter()
            .map(|c| match c.as_ref() {
                "" => Value::Missing,
                s => Value::text(s),
            })
            .collect();
        self.add_values(values)
    }

    /// Adds a row of already typed values.
    pub fn add_values(&mut self, values: Vec<Value>) -> Result<(), PipelineError> {
        if values.len() != self._columns.len() {
            return Err(PipelineError::RaggedRow {
                row: self._rows.len(),
                expected: self._columns.len(),
                found: values.len(),
            });
        }
        self._rows.push(values);
        Ok(())
    }

    pub fn build(self) -> Table {
        let rows = self
            ._rows
            .into_iter()
            .enumerate()
            .map(|(index, values)| Row { index, values })
            .collect();
        Table {
            columns: self._columns,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_labels_are_named() {
        let b = Builder::new(&["a", " ", ""]).unwrap();
        let t = b.build();
        assert_eq!(
            t.columns(),
            &["a".to_string(), "Unnamed: 1".to_string(), "Unnamed: 2".to_string()]
        );
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let mut b = Builder::new(&["a", "b"]).unwrap();
        b.add_row(&["1", "2"]).unwrap();
        let res = b.add_row(&["1"]);
        assert_eq!(
            res,
            Err(PipelineError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn empty_header_is_rejected() {
        let header: [&str; 0] = [];
        assert!(matches!(
            Builder::new(&header),
            Err(PipelineError::EmptyHeader)
        ));
    }

    #[test]
    fn whitespace_cells_are_text() {
        let mut b = Builder::new(&["a"]).unwrap();
        b.add_row(&["  "]).unwrap();
        assert_eq!(b.build().get(0, "a"), Some(&Value::text("  ")));
    }
}
