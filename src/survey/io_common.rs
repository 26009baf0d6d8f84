use std::path::Path;

use crate::survey::*;

/// The formats a survey export can be read from.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Provider {
    Csv,
    Xlsx,
}

impl Provider {
    pub fn parse(name: &str) -> SurveyResult<Provider> {
        match name {
            "csv" => Ok(Provider::Csv),
            "xlsx" | "excel" => Ok(Provider::Xlsx),
            x => UnknownProviderSnafu { provider: x }.fail(),
        }
    }

    /// Guesses the format from the file extension, csv by default.
    pub fn from_path(path: &str) -> Provider {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => Provider::Xlsx,
            _ => Provider::Csv,
        }
    }
}

/// A fully resolved input: where to read the export from and how.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct InputSource {
    pub provider: Provider,
    pub path: String,
    pub excel_worksheet_name: Option<String>,
}

/// The name of the file, without the directories.
pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn providers() {
        assert_eq!(Provider::parse("csv").unwrap(), Provider::Csv);
        assert_eq!(Provider::parse("xlsx").unwrap(), Provider::Xlsx);
        assert!(matches!(
            Provider::parse("ess"),
            Err(SurveyError::UnknownProvider { .. })
        ));
        assert_eq!(Provider::from_path("a/dados.XLSX"), Provider::Xlsx);
        assert_eq!(Provider::from_path("dados.csv"), Provider::Csv);
        assert_eq!(Provider::from_path("dados"), Provider::Csv);
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/tmp/x/dados.csv"), "dados.csv");
        assert_eq!(simplify_file_name("dados.csv"), "dados.csv");
    }
}
