// The aggregates behind the reporting views, as JSON.

use serde_json::json;
use serde_json::Map as JSMap;

use crate::survey::io_common::simplify_file_name;
use crate::survey::*;

/// The questions answered with yes (`Sim`) or no (`Não`).
pub const YES_NO_FIELDS: [&str; 8] = [
    "Está realizando seu discipulado de forma periódica?",
    "Está movimentando sua Ficha de Oikós?",
    "Ganhou vidas em 2024?",
    "Ganhou vidas em 2023?",
    "Está discipulando novos convertidos/membros de sua célula?",
    "Tem participado das Reuniões de Liderança com o Pr Joel?",
    "Tem participado dos Treinamentos do Trilho do Crescimento?",
    "Tem servido nos Encontros, Eventos de outros Ministérios e cursos da UDF?",
];

pub const LIVES_WON_2023_FIELD: &str = "Ganhou vidas em 2023?";
pub const LIVES_WON_2024_FIELD: &str = "Ganhou vidas em 2024?";
pub const YES: &str = "Sim";

fn value_to_json(v: &Value) -> JSValue {
    match v {
        Value::Number(x) if x.fract() == 0.0 && x.abs() < 1e15 => json!(*x as i64),
        Value::Number(x) => json!(x),
        Value::Text(s) => json!(s),
        Value::Missing => JSValue::Null,
    }
}

fn counts_to_json(counts: &[(Value, u64)], key_name: &str) -> Vec<JSValue> {
    counts
        .iter()
        .map(|(v, c)| {
            let mut m: JSMap<String, JSValue> = JSMap::new();
            m.insert(key_name.to_string(), value_to_json(v));
            m.insert("count".to_string(), json!(c));
            JSValue::Object(m)
        })
        .collect()
}

/// Members at each level, for every percentage question.
fn percentage_distributions(table: &Table, rules: &PipelineRules) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for field in rules.final_percentage_fields() {
        match table.group_by_count(field) {
            Ok(counts) => l.push(json!({
                "field": field,
                "levels": counts_to_json(&counts, "level"),
            })),
            Err(e) => warn!("percentage_distributions: skipping {:?}: {}", field, e),
        }
    }
    l
}

/// Answers to the yes/no questions, the most frequent first.
fn yes_no_answers(table: &Table) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for field in YES_NO_FIELDS.iter() {
        if !table.has_column(field) {
            debug!("yes_no_answers: field {:?} not present", field);
            continue;
        }
        if let Ok(counts) = table.value_counts(field) {
            l.push(json!({
                "field": field,
                "answers": counts_to_json(&counts, "answer"),
            }));
        }
    }
    l
}

/// Answers in 2023 against answers in 2024.
fn lives_won_comparison(table: &Table) -> Option<JSValue> {
    match table.crosstab(LIVES_WON_2023_FIELD, LIVES_WON_2024_FIELD) {
        Ok((rows, cols, counts)) => Some(json!({
            "rows": rows.iter().map(value_to_json).collect::<Vec<JSValue>>(),
            "columns": cols.iter().map(value_to_json).collect::<Vec<JSValue>>(),
            "counts": counts,
        })),
        Err(e) => {
            debug!("lives_won_comparison: {}", e);
            None
        }
    }
}

/// Number of distinct members who answered yes to the relationship question.
fn in_relationship(table: &Table, rules: &PipelineRules) -> Option<usize> {
    let yes = table
        .filter_eq(IN_RELATIONSHIP_FIELD, &Value::text(YES))
        .ok()?;
    yes.nunique(rules.identity_field).ok()
}

pub fn build_summary_js(table: &Table, rules: &PipelineRules, input_path: &str) -> JSValue {
    let respondents = table.nunique(rules.identity_field).ok();
    json!({
        "config": {
            "input": simplify_file_name(input_path),
            "records": table.len(),
            "respondents": respondents,
        },
        "percentages": percentage_distributions(table, rules),
        "yesNo": yes_no_answers(table),
        "livesWonComparison": lives_won_comparison(table),
        "inRelationship": in_relationship(table, rules),
    })
}
