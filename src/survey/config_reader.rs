use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::args::Args;
use crate::survey::io_common::{InputSource, Provider};
use crate::survey::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct InputSettings {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "tablePath")]
    pub table_path: Option<String>,
    #[serde(rename = "summaryPath")]
    pub summary_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "inputSettings")]
    pub input_settings: InputSettings,
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
}

/// Everything needed for one run, after merging the configuration file and the
/// command line.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Job {
    pub input: InputSource,
    pub table_path: Option<String>,
    pub summary_path: Option<String>,
    pub reference_path: Option<String>,
}

pub fn read_config(path: &str) -> SurveyResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SurveyConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> SurveyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

// Paths in a configuration file are relative to the directory of that file.
fn resolve_path(root: &Path, p: &str) -> String {
    if p == "stdout" || Path::new(p).is_absolute() {
        p.to_string()
    } else {
        root.join(p).display().to_string()
    }
}

pub fn resolve_job(args: &Args) -> SurveyResult<Job> {
    let config = match &args.config {
        Some(p) => {
            let c = read_config(p)?;
            let root = Path::new(p).parent().unwrap_or_else(|| Path::new(""));
            Some((c, root.to_path_buf()))
        }
        None => None,
    };

    let input_path = match (&args.input, &config) {
        (Some(p), _) => p.clone(),
        (None, Some((c, root))) => resolve_path(root, &c.input_settings.file_path),
        (None, None) => return MissingInputSnafu {}.fail(),
    };

    let provider_name = args.input_type.clone().or_else(|| {
        config
            .as_ref()
            .and_then(|(c, _)| c.input_settings.provider.clone())
    });
    let provider = match provider_name {
        Some(name) => Provider::parse(&name)?,
        None => Provider::from_path(&input_path),
    };

    let excel_worksheet_name = args.excel_worksheet_name.clone().or_else(|| {
        config
            .as_ref()
            .and_then(|(c, _)| c.input_settings.excel_worksheet_name.clone())
    });

    let output_settings = config
        .as_ref()
        .map(|(c, root)| {
            let o = c.output_settings.clone().unwrap_or_default();
            OutputSettings {
                table_path: o.table_path.map(|p| resolve_path(root, &p)),
                summary_path: o.summary_path.map(|p| resolve_path(root, &p)),
            }
        })
        .unwrap_or_default();

    Ok(Job {
        input: InputSource {
            provider,
            path: input_path,
            excel_worksheet_name,
        },
        table_path: args.out.clone().or(output_settings.table_path),
        summary_path: args.summary.clone().or(output_settings.summary_path),
        reference_path: args.reference.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_only() {
        let args = Args {
            input: Some("dados.csv".to_string()),
            summary: Some("stdout".to_string()),
            ..Default::default()
        };
        let job = resolve_job(&args).unwrap();
        assert_eq!(job.input.provider, Provider::Csv);
        assert_eq!(job.input.path, "dados.csv");
        assert_eq!(job.summary_path, Some("stdout".to_string()));
        assert_eq!(job.table_path, None);
    }

    #[test]
    fn no_input() {
        let res = resolve_job(&Args::default());
        assert!(matches!(res, Err(SurveyError::MissingInput {})));
    }

    #[test]
    fn config_file_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("job.json");
        let mut f = fs::File::create(&config_path).unwrap();
        f.write_all(
            br#"{
                "inputSettings": {"provider": "xlsx", "filePath": "dados.xlsx", "excelWorksheetName": "Form1"},
                "outputSettings": {"tablePath": "out/tabela.csv", "summaryPath": "stdout"}
            }"#,
        )
        .unwrap();

        let args = Args {
            config: Some(config_path.display().to_string()),
            ..Default::default()
        };
        let job = resolve_job(&args).unwrap();
        assert_eq!(job.input.provider, Provider::Xlsx);
        assert_eq!(
            job.input.path,
            dir.path().join("dados.xlsx").display().to_string()
        );
        assert_eq!(job.input.excel_worksheet_name, Some("Form1".to_string()));
        assert_eq!(
            job.table_path,
            Some(dir.path().join("out/tabela.csv").display().to_string())
        );
        assert_eq!(job.summary_path, Some("stdout".to_string()));

        // The command line wins.
        let args = Args {
            config: Some(config_path.display().to_string()),
            input: Some("other.csv".to_string()),
            input_type: Some("csv".to_string()),
            ..Default::default()
        };
        let job = resolve_job(&args).unwrap();
        assert_eq!(job.input.provider, Provider::Csv);
        assert_eq!(job.input.path, "other.csv");
    }

    #[test]
    fn bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("job.json");
        fs::write(&config_path, "{\"outputSettings\": {}}").unwrap();
        let args = Args {
            config: Some(config_path.display().to_string()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_job(&args),
            Err(SurveyError::ParsingJson { .. })
        ));
    }
}
