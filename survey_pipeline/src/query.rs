// Read-only aggregations over a table.
//
// Missing values are never counted as a group.

use std::cmp::Ordering;

use crate::config::*;

/// Total order on values: numbers first, then text, then missing values.
pub(crate) fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Missing, Value::Missing) => Ordering::Equal,
        (Value::Number(_), _) => Ordering::Less,
        (_, Value::Number(_)) => Ordering::Greater,
        (Value::Text(_), _) => Ordering::Less,
        (_, Value::Text(_)) => Ordering::Greater,
    }
}

fn count_sorted(mut values: Vec<&Value>) -> Vec<(Value, u64)> {
    values.sort_by(|a, b| cmp_values(a, b));
    let mut res: Vec<(Value, u64)> = Vec::new();
    for v in values {
        if let Some((last, count)) = res.last_mut() {
            if cmp_values(last, v) == Ordering::Equal {
                *count += 1;
                continue;
            }
        }
        res.push((v.clone(), 1));
    }
    res
}

impl Table {
    /// Number of rows for each value of a field, in ascending value order.
    pub fn group_by_count(&self, field: &str) -> Result<Vec<(Value, u64)>, PipelineError> {
        let values: Vec<&Value> = self
            .column(field)?
            .into_iter()
            .filter(|v| !v.is_missing())
            .collect();
        Ok(count_sorted(values))
    }

    /// Number of rows for each value of a field, the most frequent first.
    ///
    /// Values with the same count are in ascending value order.
    pub fn value_counts(&self, field: &str) -> Result<Vec<(Value, u64)>, PipelineError> {
        let mut res = self.group_by_count(field)?;
        // The sort is stable: ties keep the ascending order.
        res.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(res)
    }

    /// The rows for which the field is equal to the value.
    ///
    /// The rows keep their index, like a selection over the original table.
    pub fn filter_eq(&self, field: &str, value: &Value) -> Result<Table, PipelineError> {
        let col = self
            .column_index(field)
            .ok_or_else(|| PipelineError::UnknownField(field.to_string()))?;
        let rows: Vec<Row> = self
            .rows
            .iter()
            .filter(|r| r.values[col] == *value)
            .cloned()
            .collect();
        Ok(Table {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Number of distinct non-missing values of a field.
    pub fn nunique(&self, field: &str) -> Result<usize, PipelineError> {
        Ok(self.group_by_count(field)?.len())
    }

    /// Counts of rows for each pair of values of two fields.
    ///
    /// Returns the values of the first field (ascending), the values of the
    /// second field (ascending) and the matrix of counts, one line per value of
    /// the first field. Rows with a missing value in either field are skipped.
    #[allow(clippy::type_complexity)]
    pub fn crosstab(
        &self,
        row_field: &str,
        col_field: &str,
    ) -> Result<(Vec<Value>, Vec<Value>, Vec<Vec<u64>>), PipelineError> {
        let left = self.column(row_field)?;
        let right = self.column(col_field)?;
        let pairs: Vec<(&Value, &Value)> = left
            .into_iter()
            .zip(right)
            .filter(|(a, b)| !a.is_missing() && !b.is_missing())
            .collect();
        let row_keys: Vec<Value> = count_sorted(pairs.iter().map(|p| p.0).collect())
            .into_iter()
            .map(|p| p.0)
            .collect();
        let col_keys: Vec<Value> = count_sorted(pairs.iter().map(|p| p.1).collect())
            .into_iter()
            .map(|p| p.0)
            .collect();
        let mut counts: Vec<Vec<u64>> = vec![vec![0; col_keys.len()]; row_keys.len()];
        for (a, b) in pairs {
            let i = row_keys.iter().position(|k| k == a);
            let j = col_keys.iter().position(|k| k == b);
            if let (Some(i), Some(j)) = (i, j) {
                counts[i][j] += 1;
            }
        }
        Ok((row_keys, col_keys, counts))
    }
}
