//! Prints every entity of a resource directory as `path:id=value`.

use std::io::{
    self,
    Write,
};
use std::path::PathBuf;
use std::process::ExitCode;

use silme::PackageLoader;
use silme::config::ConfigManager;
use silme::model::PathMode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let root = std::env::args_os().nth(1).map_or_else(|| PathBuf::from("."), PathBuf::from);

    match run(root) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// 設定を読み込み、ディレクトリ内の全エンティティを出力する
fn run(root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mut config_manager = ConfigManager::new();
    config_manager.load_settings(Some(root.clone()))?;

    let loader = PackageLoader::new(root, config_manager.get_settings())?;
    let package = loader.load()?;

    let mut out = io::stdout().lock();
    for (entity, path) in package.entities(true, PathMode::Relative) {
        writeln!(out, "{}:{}={}", path.unwrap_or_default(), entity.id(), entity.value())?;
    }
    out.flush()?;

    Ok(())
}
