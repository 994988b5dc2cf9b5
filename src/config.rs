//! `.silme.json` の読み込みとファイル分類
/// Configuration manager
mod manager;
/// Resource file pattern matcher
mod matcher;
/// Configuration types and settings
mod types;

pub use manager::{
    CONFIG_FILE_NAME,
    ConfigManager,
};
pub use matcher::{
    FileKind,
    FileMatcher,
    MatcherError,
};
pub use types::{
    ConfigError,
    LoaderSettings,
    ValidationError,
};
