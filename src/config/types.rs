use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "structurePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// How a resource directory is mapped onto a package tree.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoaderSettings {
    /// Files parsed into layout-preserving structures.
    pub structure_patterns: Vec<String>,

    /// Files parsed into flat entity lists. Checked before `structure_patterns`.
    pub list_patterns: Vec<String>,

    /// Files and directories skipped entirely.
    pub exclude_patterns: Vec<String>,

    /// Whether files matching no pattern are kept as blobs.
    pub include_blobs: bool,

    /// Separator between object keys in entity ids.
    pub key_separator: String,

    /// Register stubs instead of reading everything up front.
    pub lazy: bool,

    /// Whether hidden files and directories are loaded.
    pub hidden: bool,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            structure_patterns: vec!["**/*.json".to_string()],
            list_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            include_blobs: true,
            key_separator: ".".to_string(),
            lazy: true,
            hidden: false,
        }
    }
}

impl LoaderSettings {
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Invalid separator
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.key_separator.is_empty() {
            errors.push(ValidationError::new(
                "keySeparator",
                "The separator cannot be empty. Please specify a separator, for example: \".\" (dot)",
            ));
        }

        if self.structure_patterns.is_empty() {
            errors.push(ValidationError::new(
                "structurePatterns",
                "At least one pattern is required. Example: [\"**/*.json\"]",
            ));
        }

        for (field, patterns) in [
            ("structurePatterns", &self.structure_patterns),
            ("listPatterns", &self.list_patterns),
            ("excludePatterns", &self.exclude_patterns),
        ] {
            for (index, pattern) in patterns.iter().enumerate() {
                if let Err(e) = globset::Glob::new(pattern) {
                    errors.push(ValidationError::new(
                        format!("{field}[{index}]"),
                        format!("Invalid glob pattern '{pattern}': {e}"),
                    ));
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
