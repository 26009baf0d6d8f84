// ********* Input and output data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The content of a single cell.
///
/// The readers only produce `Text` and `Missing`. `Number` appears when the
/// source already carries numeric cells (spreadsheets) and after the
/// percentage normalization.
#[derive(PartialEq, Debug, Clone)]
pub enum Value {
    Text(String),
    Number(f64),
    /// An empty cell in the source.
    Missing,
}

/// The representation of a value, without its content.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Repr {
    Text,
    Number,
    Missing,
}

impl Value {
    pub fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    pub fn repr(&self) -> Repr {
        match self {
            Value::Text(_) => Repr::Text,
            Value::Number(_) => Repr::Number,
            Value::Missing => Repr::Missing,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(x) => Some(*x),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Number(x) => write!(f, "{}", x),
            Value::Missing => Ok(()),
        }
    }
}

/// One record of a table.
///
/// The index is the identity of the row. It is contiguous when the table is
/// built and after the final stage, but the expansion stage repeats the index
/// of the source record on every row it produces.
#[derive(PartialEq, Debug, Clone)]
pub struct Row {
    pub(crate) index: usize,
    pub(crate) values: Vec<Value>,
}

impl Row {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// A rectangular table: an ordered list of field names and the rows.
///
/// Invariant: every row has exactly one value per field.
/// Tables are not mutated once built: every stage and every query returns a
/// new table.
#[derive(PartialEq, Debug, Clone)]
pub struct Table {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<Row>,
}

impl Table {
    /// Builds a table, checking that all the rows have the width of the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Table, PipelineError> {
        let expected = columns.len();
        let mut res: Vec<Row> = Vec::with_capacity(rows.len());
        for (index, values) in rows.into_iter().enumerate() {
            if values.len() != expected {
                return Err(PipelineError::RaggedRow {
                    row: index,
                    expected,
                    found: values.len(),
                });
            }
            res.push(Row { index, values });
        }
        Ok(Table { columns, rows: res })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The position of the first field with this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// The value of a field for the row at the given position (not the row index).
    pub fn get(&self, row: usize, field: &str) -> Option<&Value> {
        let col = self.column_index(field)?;
        self.rows.get(row).and_then(|r| r.values.get(col))
    }

    /// All the values of a field, in row order.
    pub fn column(&self, field: &str) -> Result<Vec<&Value>, PipelineError> {
        let col = self
            .column_index(field)
            .ok_or_else(|| PipelineError::UnknownField(field.to_string()))?;
        Ok(self.rows.iter().map(|r| &r.values[col]).collect())
    }
}

/// Errors that prevent a table from being built or queried.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PipelineError {
    /// The source has no header row.
    EmptyHeader,
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// A field that the pipeline needs is absent from the source.
    MissingField(String),
    /// A query referenced a field that the table does not have.
    UnknownField(String),
    /// A stage produced a value with a representation it does not declare.
    ContractViolation { stage: String, field: String },
}

impl Error for PipelineError {}

impl Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::EmptyHeader => write!(f, "the source has no header row"),
            PipelineError::RaggedRow {
                row,
                expected,
                found,
            } => write!(
                f,
                "row {} has {} fields, the header declares {}",
                row, found, expected
            ),
            PipelineError::MissingField(name) => {
                write!(f, "required field {:?} is missing from the source", name)
            }
            PipelineError::UnknownField(name) => write!(f, "unknown field {:?}", name),
            PipelineError::ContractViolation { stage, field } => write!(
                f,
                "stage {} produced an unexpected value for field {:?}",
                stage, field
            ),
        }
    }
}

// ********* Configuration **********

// The labels are the questions of the 2024 ministry survey, verbatim.

pub const TIMESTAMP_FIELD: &str = "Carimbo de data/hora";
pub const TITHES_FIELD: &str = "Dízimos praticados em 2024:";
pub const OFFERINGS_FIELD: &str = "Ofertas praticadas em 2024:";
pub const MISSIONS_OFFERINGS_FIELD: &str = "Ofertas destinadas a Missões praticadas em 2024:";
pub const FINANCIAL_DIFFICULTY_FIELD: &str =
    "Dificuldades financeiras, onde “0” é estar sem dívidas e “100” é estar muito endividado:";
pub const FINANCIAL_SATISFACTION_FIELD: &str =
    "Está satisfeito financeiramente, onde “0” é estar insatisfeito e “100” é estar satisfeito:";
pub const CELEBRATION_ATTENDANCE_FIELD: &str =
    "Considera correta sua assiduidade nas Celebrações, onde “0” é estar incorreto e “100” é estar correto:";
pub const CELL_ATTENDANCE_FIELD: &str =
    "Considera correta sua assiduidade na sua Célula, onde “0” é estar incorreto e “100” é estar correto:";
pub const MINISTRY_ATTENDANCE_FIELD: &str =
    "Considera correta sua assiduidade em seu Ministério, onde “0” é estar incorreto e “100” é estar correto:";

pub const NAME_FIELD: &str = "Nome";
pub const MINISTRIES_FIELD: &str = "Ministérios";
pub const IN_RELATIONSHIP_FIELD: &str = "Em Relacionamento";

/// The rules that drive the pipeline: which fields are touched and how.
///
/// All the labels are matched exactly, after whitespace trimming.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PipelineRules {
    /// Administrative fields removed at load time, when present.
    pub dropped_fields: &'static [&'static str],
    /// Fields normalized to the 0/25/50/75/100 scale, by their source label.
    pub percentage_fields: &'static [&'static str],
    /// Source label -> internal name.
    pub renames: &'static [(&'static str, &'static str)],
    /// The field (internal name) expanded into one row per value.
    pub multi_value_field: &'static str,
    pub multi_value_delimiter: char,
    /// The field (internal name) placed first in the final table.
    pub identity_field: &'static str,
}

impl PipelineRules {
    pub const DEFAULT_RULES: PipelineRules = PipelineRules {
        dropped_fields: &[TIMESTAMP_FIELD, "id", "index"],
        percentage_fields: &[
            TITHES_FIELD,
            OFFERINGS_FIELD,
            MISSIONS_OFFERINGS_FIELD,
            FINANCIAL_DIFFICULTY_FIELD,
            FINANCIAL_SATISFACTION_FIELD,
            CELEBRATION_ATTENDANCE_FIELD,
            CELL_ATTENDANCE_FIELD,
            MINISTRY_ATTENDANCE_FIELD,
        ],
        renames: &[
            ("Nome de usuário", "Email"),
            ("Nome do Membro", NAME_FIELD),
            ("Ministérios que participa", MINISTRIES_FIELD),
            (FINANCIAL_DIFFICULTY_FIELD, "Dificuldades Financeiras"),
            (FINANCIAL_SATISFACTION_FIELD, "Satisfação Financeira"),
            ("Selecione seu Estado Civil", "Estado Civil"),
            ("Está em relacionamento romântico?", IN_RELATIONSHIP_FIELD),
            (
                "Como você considera seu engajamento e desempenho em seu Ministério?",
                "Engajamento",
            ),
            (
                "Escreva aqui o que deseja compartilhar como uma estratégia de melhoria em seu Ministério:",
                "Estratégia de Melhoria",
            ),
            (CELEBRATION_ATTENDANCE_FIELD, "Assiduidade Celebrações"),
            (CELL_ATTENDANCE_FIELD, "Assiduidade Célula"),
            (MINISTRY_ATTENDANCE_FIELD, "Assiduidade Ministério"),
        ],
        multi_value_field: MINISTRIES_FIELD,
        multi_value_delimiter: ',',
        identity_field: NAME_FIELD,
    };

    /// The name a field carries after the renaming stage.
    pub fn renamed<'a>(&self, label: &'a str) -> &'a str {
        for &(from, to) in self.renames {
            if from == label {
                return to;
            }
        }
        label
    }

    /// The percentage fields, under the names they have in the final table.
    pub fn final_percentage_fields(&self) -> Vec<&'static str> {
        self.percentage_fields
            .iter()
            .map(|label| self.renamed(*label))
            .collect()
    }

    pub fn is_percentage_field(&self, label: &str) -> bool {
        self.percentage_fields.contains(&label)
    }
}

impl Default for PipelineRules {
    fn default() -> PipelineRules {
        PipelineRules::DEFAULT_RULES
    }
}
