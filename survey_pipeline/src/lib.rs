mod config;
use log::{debug, info, warn};

pub mod builder;
pub mod cache;
pub mod manual;
mod query;

pub use crate::config::*;

// ********* Stages ***********

/// The stages of the pipeline.
///
/// The stages run strictly one after the other, each one consuming the full
/// table produced by the previous one.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Stage {
    /// Removes the administrative fields. Part of loading.
    DropColumns,
    /// Trims field names and text values.
    Clean,
    NormalizePercentages,
    RenameFields,
    /// Trims text values again, after the renaming.
    CleanValues,
    ExpandMultiValue,
    Finalize,
}

impl Stage {
    pub const PIPELINE: [Stage; 7] = [
        Stage::DropColumns,
        Stage::Clean,
        Stage::NormalizePercentages,
        Stage::RenameFields,
        Stage::CleanValues,
        Stage::ExpandMultiValue,
        Stage::Finalize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::DropColumns => "drop_columns",
            Stage::Clean => "clean",
            Stage::NormalizePercentages => "normalize_percentages",
            Stage::RenameFields => "rename_fields",
            Stage::CleanValues => "clean_values",
            Stage::ExpandMultiValue => "expand_multi_value",
            Stage::Finalize => "finalize",
        }
    }

    /// The representations a field may have when this stage is done with it.
    ///
    /// `None` means that the stage does not constrain this field: it passes
    /// through whatever it received.
    pub fn produces(&self, field: &str, rules: &PipelineRules) -> Option<&'static [Repr]> {
        match self {
            Stage::NormalizePercentages if rules.is_percentage_field(field) => Some(&[Repr::Number]),
            Stage::ExpandMultiValue if field == rules.multi_value_field => {
                Some(&[Repr::Text, Repr::Missing])
            }
            _ => None,
        }
    }

    pub fn apply(&self, table: Table, rules: &PipelineRules) -> Result<Table, PipelineError> {
        match self {
            Stage::DropColumns => Ok(drop_columns(table, rules.dropped_fields)),
            Stage::Clean => Ok(clean(table)),
            Stage::NormalizePercentages => normalize_percentages(table, rules.percentage_fields),
            Stage::RenameFields => Ok(rename_fields(table, rules.renames)),
            Stage::CleanValues => Ok(clean_values(table)),
            Stage::ExpandMultiValue => {
                expand_multi_value(table, rules.multi_value_field, rules.multi_value_delimiter)
            }
            Stage::Finalize => Ok(finalize(table, rules.identity_field)),
        }
    }

    fn check_output(&self, table: &Table, rules: &PipelineRules) -> Result<(), PipelineError> {
        for (col, field) in table.columns.iter().enumerate() {
            if let Some(allowed) = self.produces(field, rules) {
                let bad = table
                    .rows
                    .iter()
                    .any(|r| !allowed.contains(&r.values[col].repr()));
                if bad {
                    return Err(PipelineError::ContractViolation {
                        stage: self.name().to_string(),
                        field: field.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Runs all the stages on a raw table and returns the canonical table.
///
/// Any failing stage aborts the whole run: no partial table is returned.
pub fn run_pipeline(raw: Table, rules: &PipelineRules) -> Result<Table, PipelineError> {
    info!(
        "run_pipeline: processing {} records with {} fields",
        raw.len(),
        raw.columns.len()
    );
    let mut table = raw;
    for stage in Stage::PIPELINE.iter() {
        table = stage.apply(table, rules)?;
        stage.check_output(&table, rules)?;
        debug!(
            "run_pipeline: after {}: {} rows, fields: {:?}",
            stage.name(),
            table.len(),
            table.columns
        );
    }
    info!(
        "run_pipeline: canonical table has {} rows and {} fields",
        table.len(),
        table.columns.len()
    );
    Ok(table)
}

/// Removes the given fields. Absent fields are not an error.
pub fn drop_columns(table: Table, fields: &[&str]) -> Table {
    let keep: Vec<bool> = table
        .columns
        .iter()
        .map(|c| !fields.contains(&c.as_str()))
        .collect();
    for f in fields.iter() {
        if !table.has_column(f) {
            warn!("drop_columns: field {:?} not present, skipping", f);
        }
    }
    let columns: Vec<String> = table
        .columns
        .into_iter()
        .zip(keep.iter())
        .filter_map(|(c, k)| if *k { Some(c) } else { None })
        .collect();
    let rows: Vec<Row> = table
        .rows
        .into_iter()
        .map(|r| Row {
            index: r.index,
            values: r
                .values
                .into_iter()
                .zip(keep.iter())
                .filter_map(|(v, k)| if *k { Some(v) } else { None })
                .collect(),
        })
        .collect();
    Table { columns, rows }
}

/// Trims the field names and all the text values.
pub fn clean(table: Table) -> Table {
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    clean_values(Table {
        columns,
        rows: table.rows,
    })
}

/// Trims all the text values. Numbers and missing values are left as they are.
pub fn clean_values(table: Table) -> Table {
    let rows: Vec<Row> = table
        .rows
        .into_iter()
        .map(|r| Row {
            index: r.index,
            values: r.values.into_iter().map(clean_value).collect(),
        })
        .collect();
    Table {
        columns: table.columns,
        rows,
    }
}

fn clean_value(v: Value) -> Value {
    match v {
        Value::Text(s) => {
            let trimmed = s.trim();
            if trimmed.len() == s.len() {
                Value::Text(s)
            } else {
                Value::Text(trimmed.to_string())
            }
        }
        x => x,
    }
}

/// Reads a free-form percentage.
///
/// The value is read as text, a single trailing `%` is removed, and the rest
/// is parsed as a number. Anything that cannot be read counts as 0, including
/// values with a leading or doubled `%` such as `%50` or `50%%`.
pub fn parse_percentage(v: &Value) -> f64 {
    let s = match v {
        Value::Text(s) => s.clone(),
        Value::Number(x) => x.to_string(),
        Value::Missing => return 0.0,
    };
    let s = s.trim();
    let s = s.strip_suffix('%').unwrap_or(s).trim();
    match s.parse::<f64>() {
        Ok(x) if !x.is_nan() => x,
        _ => {
            if !s.is_empty() {
                warn!("parse_percentage: could not read {:?}, using 0", s);
            }
            0.0
        }
    }
}

/// Maps a percentage to the closest of the levels 0, 25, 50, 75, 100.
///
/// Each threshold belongs to the lower level: 12.5 is 0 and 12.6 is 25.
pub fn bucket_percentage(x: f64) -> u8 {
    if x <= 12.5 {
        0
    } else if x <= 37.5 {
        25
    } else if x <= 62.5 {
        50
    } else if x <= 87.5 {
        75
    } else {
        100
    }
}

/// Replaces the value of each percentage field by its level.
///
/// All the fields must be present.
pub fn normalize_percentages(table: Table, fields: &[&str]) -> Result<Table, PipelineError> {
    let mut cols: Vec<usize> = Vec::new();
    for f in fields.iter() {
        let col = table
            .column_index(f)
            .ok_or_else(|| PipelineError::MissingField(f.to_string()))?;
        cols.push(col);
    }
    let rows: Vec<Row> = table
        .rows
        .into_iter()
        .map(|r| {
            let mut values = r.values;
            for col in cols.iter() {
                let level = bucket_percentage(parse_percentage(&values[*col]));
                values[*col] = Value::Number(level as f64);
            }
            Row {
                index: r.index,
                values,
            }
        })
        .collect();
    Ok(Table {
        columns: table.columns,
        rows,
    })
}

/// Renames the fields found in the table. Other fields are left untouched.
pub fn rename_fields(table: Table, renames: &[(&str, &str)]) -> Table {
    let columns: Vec<String> = table
        .columns
        .into_iter()
        .map(|c| match renames.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => to.to_string(),
            None => c,
        })
        .collect();
    Table {
        columns,
        rows: table.rows,
    }
}

/// Produces the rows for each distinct value of a multi-valued field.
///
/// The values are split on the delimiter and trimmed; a value repeated in the
/// same field only produces one row. A missing field (or a field that is not
/// text) produces a single row with a missing value. There is always at least
/// one row.
pub fn fan_out(row: &Row, col: usize, delimiter: char) -> Vec<Row> {
    let parts: Vec<Value> = match &row.values[col] {
        Value::Text(s) => {
            let mut seen: Vec<&str> = Vec::new();
            for p in s.split(delimiter).map(|p| p.trim()) {
                if !seen.contains(&p) {
                    seen.push(p);
                }
            }
            seen.into_iter().map(Value::text).collect()
        }
        _ => vec![Value::Missing],
    };
    parts
        .into_iter()
        .map(|p| {
            let mut values = row.values.clone();
            values[col] = p;
            Row {
                index: row.index,
                values,
            }
        })
        .collect()
}

/// Expands the multi-valued field: one row per value, in order.
pub fn expand_multi_value(
    table: Table,
    field: &str,
    delimiter: char,
) -> Result<Table, PipelineError> {
    let col = table
        .column_index(field)
        .ok_or_else(|| PipelineError::MissingField(field.to_string()))?;
    let num_source = table.rows.len();
    let rows: Vec<Row> = table
        .rows
        .iter()
        .flat_map(|r| fan_out(r, col, delimiter))
        .collect();
    debug!(
        "expand_multi_value: {} source rows -> {} rows",
        num_source,
        rows.len()
    );
    Ok(Table {
        columns: table.columns,
        rows,
    })
}

/// Renumbers the rows from 0 and moves the identity field first.
///
/// The other fields keep their order. If the identity field is absent, only
/// the numbering changes.
pub fn finalize(table: Table, identity_field: &str) -> Table {
    let mut order: Vec<usize> = (0..table.columns.len()).collect();
    if let Some(col) = table.column_index(identity_field) {
        order.remove(col);
        order.insert(0, col);
    }
    let columns: Vec<String> = order.iter().map(|i| table.columns[*i].clone()).collect();
    let rows: Vec<Row> = table
        .rows
        .into_iter()
        .enumerate()
        .map(|(index, r)| Row {
            index,
            values: order.iter().map(|i| r.values[*i].clone()).collect(),
        })
        .collect();
    Table { columns, rows }
}
