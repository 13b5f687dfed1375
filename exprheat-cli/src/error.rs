//! Error handling for the ExprHeat CLI

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ExprHeat CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("Parsing error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Nothing to render: {message}")]
    NoData { message: String },
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn invalid_format<S: Into<String>>(message: S) -> Self {
        Self::InvalidFormat { message: message.into() }
    }

    pub fn parse<F: Into<String>, M: Into<String>>(file: F, message: M) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn no_data<S: Into<String>>(message: S) -> Self {
        Self::NoData { message: message.into() }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("TOML parsing error: {}", err))
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Provide helpful error messages and suggestions
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();

    match error {
        CliError::FileNotFound { path } => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • Check that the file path is correct: {}\n\
                 • Ensure you have read permissions for the file",
                path.display()
            ));
        }

        CliError::Parse { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Data files need top-level \"samples\" and \"genes\" arrays\n\
                 • Setting keys are camelCase, e.g. \"highColor\" or \"additionalAnnotations\"\n\
                 • Colors are written as \"#rrggbb\" or \"#rgb\""
            );
        }

        CliError::InvalidFormat { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Use an output path ending in .svg or .png"
            );
        }

        CliError::Validation { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Visibility keys are written as <Annotation>:<value>, e.g. --hide Sex:Male\n\
                 • Increase --width or --height if the chart has no room to draw"
            );
        }

        CliError::Config { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your exprheat.toml configuration file\n\
                 • Use 'exprheat config --example' to generate a sample configuration"
            );
        }

        CliError::NoData { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check the genes and samples include/exclude lists in the setting\n\
                 • Remove --hide keys that hide every sample"
            );
        }
    }

    message
}

/// Print error with helpful suggestions and exit
pub fn print_error_and_exit(error: &CliError) -> ! {
    eprintln!("Error: {}", format_error_with_suggestions(error));
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CliError::config("test message");
        assert!(matches!(err, CliError::Config { .. }));
        assert_eq!(err.to_string(), "Configuration error: test message");
    }

    #[test]
    fn test_error_suggestions() {
        let err = CliError::file_not_found(PathBuf::from("data.json"));
        let formatted = format_error_with_suggestions(&err);
        assert!(formatted.contains("Suggestions:"));
        assert!(formatted.contains("Check that the file path is correct: data.json"));

        let err = CliError::validation("bad key");
        assert!(format_error_with_suggestions(&err).contains("--hide Sex:Male"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("a = ").unwrap_err();
        let cli_err: CliError = toml_err.into();
        assert!(matches!(cli_err, CliError::Config { .. }));
    }
}
