use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;
use std::io::Write;
use std::sync::Arc;

use serde_json::Value as JSValue;
use survey_pipeline::cache::{SourceKey, TableCache};
use survey_pipeline::*;
use text_diff::print_diff;

use crate::args::Args;
use crate::survey::config_reader::*;
use crate::survey::io_common::{InputSource, Provider};

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_xlsx;
pub mod report;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error reading file {path}"))]
    ReadingSource {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading the header of {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("The file {path} has no header row"))]
    MissingHeader { path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The worksheet {name} does not exist in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display(
        "The file {path} has {count} worksheets, the worksheet name must be provided"
    ))]
    TooManyWorksheets { path: String, count: usize },
    #[snafu(display("The worksheet is empty"))]
    EmptyExcel {},
    #[snafu(display("Cannot read the cell at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("Input type {provider} is not supported"))]
    UnknownProvider { provider: String },
    #[snafu(display("No input file: use --input or a configuration file"))]
    MissingInput {},
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing CSV"))]
    WritingCsv { source: csv::Error },
    #[snafu(display("Error while cleaning the survey"))]
    Pipeline { source: PipelineError },
    #[snafu(display("Difference detected between calculated summary and reference summary {path}"))]
    ReferenceMismatch { path: String },
}

pub type SurveyResult<T> = Result<T, SurveyError>;

/// Loads survey exports and keeps the canonical tables for reuse.
///
/// A file is only cleaned again when its content changes.
pub struct SurveySession {
    rules: PipelineRules,
    cache: TableCache,
}

impl SurveySession {
    pub fn new(rules: &PipelineRules) -> SurveySession {
        SurveySession {
            rules: rules.clone(),
            cache: TableCache::new(),
        }
    }

    pub fn load(&mut self, source: &InputSource) -> SurveyResult<Arc<Table>> {
        let (key, content) = read_source(source)?;
        let rules = &self.rules;
        self.cache
            .get_or_load(key, || clean_survey(source, &content, rules))
    }
}

fn read_source(source: &InputSource) -> SurveyResult<(SourceKey, Vec<u8>)> {
    info!("Attempting to read survey file {:?}", source.path);
    let content = fs::read(&source.path).context(ReadingSourceSnafu {
        path: source.path.clone(),
    })?;
    let key = SourceKey::new(&source.path, &content);
    debug!(
        "read_source: {:?}: {} bytes, digest {}",
        source.path,
        content.len(),
        key.digest
    );
    Ok((key, content))
}

fn clean_survey(
    source: &InputSource,
    content: &[u8],
    rules: &PipelineRules,
) -> SurveyResult<Table> {
    let raw = match source.provider {
        Provider::Csv => io_csv::read_csv_survey(&source.path, content)?,
        Provider::Xlsx => io_xlsx::read_xlsx_survey(
            &source.path,
            content,
            source.excel_worksheet_name.as_deref(),
        )?,
    };
    run_pipeline(raw, rules).context(PipelineSnafu {})
}

fn write_output(dest: &str, content: &[u8]) -> SurveyResult<()> {
    if dest == "stdout" {
        let mut out = std::io::stdout();
        out.write_all(content)
            .context(WritingOutputSnafu { path: dest })?;
        out.flush().context(WritingOutputSnafu { path: dest })
    } else {
        info!("write_output: writing {} bytes to {:?}", content.len(), dest);
        fs::write(dest, content).context(WritingOutputSnafu { path: dest })
    }
}

/// Compares the summary with a reference summary, printing the differences.
pub fn check_reference(summary: &JSValue, reference_path: &str) -> SurveyResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("check_reference: reference: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    let pretty_js_stats = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(
            pretty_js_summary_ref.as_str(),
            pretty_js_stats.as_ref(),
            "\n",
        );
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    info!("check_reference: summary matches {:?}", reference_path);
    Ok(())
}

pub fn run(args: &Args) -> SurveyResult<()> {
    let job = resolve_job(args)?;
    info!("run: job: {:?}", job);

    let rules = PipelineRules::DEFAULT_RULES;
    let mut session = SurveySession::new(&rules);
    let table = session.load(&job.input)?;

    if let Some(out) = &job.table_path {
        let mut buf: Vec<u8> = Vec::new();
        io_csv::write_csv_table(&table, &mut buf)?;
        write_output(out, &buf)?;
    }

    let summary = report::build_summary_js(&table, &rules, &job.input.path);
    let pretty_js_stats = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {})?;
    match &job.summary_path {
        Some(dest) => write_output(dest, format!("{}\n", pretty_js_stats).as_bytes())?,
        None if job.table_path.is_none() => {
            println!("{}", pretty_js_stats);
        }
        None => {}
    }

    // The reference summary, if provided for comparison
    if let Some(reference) = &job.reference_path {
        check_reference(&summary, reference)?;
    }
    Ok(())
}
