//! 設定管理を行うモジュール

use std::io::ErrorKind;
use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    LoaderSettings,
};

/// Name of the settings file looked up in the loaded directory.
pub const CONFIG_FILE_NAME: &str = ".silme.json";

/// 設定管理を行う
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// 現在の設定
    current_settings: LoaderSettings,

    /// ワークスペースのルートパス
    workspace_root: Option<PathBuf>,

    /// Settings file the current settings came from, if any.
    config_file: Option<PathBuf>,
}

impl ConfigManager {
    /// 新しい設定マネージャーを作成
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: LoaderSettings::default(), workspace_root: None, config_file: None }
    }

    /// 設定を読み込む
    ///
    /// ルート直下の [`CONFIG_FILE_NAME`] を読む。なければデフォルト値を使う。
    /// 読んだファイルのパスは [`Self::config_file`] で取得できる。
    ///
    /// # Errors
    /// - ファイル読み込みエラー
    /// - JSON パースエラー
    /// - バリデーションエラー
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        tracing::debug!("Loading settings for workspace: {:?}", workspace_root);

        let found = match &workspace_root {
            Some(root) => read_config_file(root)?,
            None => None,
        };
        let (config_file, settings) = match found {
            Some((path, settings)) => (Some(path), settings),
            None => (None, LoaderSettings::default()),
        };

        settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = settings;
        self.workspace_root = workspace_root;
        self.config_file = config_file;
        tracing::debug!(config_file = ?self.config_file, "Settings loaded: {:?}", self.current_settings);

        Ok(())
    }

    /// 設定を差し替える
    ///
    /// # Errors
    /// バリデーションエラー
    pub fn update_settings(&mut self, new_settings: LoaderSettings) -> Result<(), ConfigError> {
        new_settings.validate().map_err(ConfigError::ValidationErrors)?;
        self.current_settings = new_settings;
        tracing::debug!("Settings updated");
        Ok(())
    }

    /// 現在の設定を取得
    #[must_use]
    pub const fn get_settings(&self) -> &LoaderSettings {
        &self.current_settings
    }

    /// ワークスペースルートを取得
    #[must_use]
    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    /// Path of the settings file read by the last successful load.
    #[must_use]
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }
}

/// Reads `root/.silme.json`; a missing file is `Ok(None)`.
fn read_config_file(root: &Path) -> Result<Option<(PathBuf, LoaderSettings)>, ConfigError> {
    let path = root.join(CONFIG_FILE_NAME);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let settings = serde_json::from_str(&content)?;
    Ok(Some((path, settings)))
}
