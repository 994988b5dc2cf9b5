//! ディレクトリ読み込みから JSON 書き戻しまでのテスト

#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use std::fs;

use pretty_assertions::assert_eq;
use rstest::*;
use silme::config::{
    ConfigManager,
    LoaderSettings,
};
use silme::input::json::render_json;
use silme::{
    ElementSequence,
    PackageLoader,
    StructureKind,
};
use tempfile::TempDir;

const EN: &str = r#"{
  // greeting shown on the start page
  "hello": "Hello",
  "menu": {
    "open": "Open",
    "count": 3
  }
}
"#;

#[fixture]
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("en/app")).unwrap();
    fs::write(dir.path().join("en/app/main.json"), EN).unwrap();
    fs::write(dir.path().join("en/README.txt"), "not translatable").unwrap();
    dir
}

#[rstest]
#[case::eager(false)]
#[case::lazy(true)]
fn modify_and_render_keeps_layout(workspace: TempDir, #[case] lazy: bool) {
    let settings = LoaderSettings { lazy, ..LoaderSettings::default() };
    let mut package = PackageLoader::new(workspace.path(), &settings).unwrap().load().unwrap();

    let resource = package
        .package_mut("en")
        .and_then(|en| en.package_mut("app"))
        .and_then(|app| app.structure_mut("main.json"))
        .unwrap();
    let structure = resource.as_structure_mut().unwrap();
    structure.modify_entity("menu.open", "Open…").unwrap();

    assert_eq!(structure.ids(), vec!["hello", "menu.open"]);
    assert_eq!(render_json(&*structure), EN.replace("\"Open\"", "\"Open…\""));
}

#[rstest]
fn settings_file_drives_loading(workspace: TempDir) {
    fs::write(
        workspace.path().join(".silme.json"),
        r#"{"keySeparator": "/", "includeBlobs": false, "lazy": false}"#,
    )
    .unwrap();
    let mut config_manager = ConfigManager::new();
    config_manager.load_settings(Some(workspace.path().to_path_buf())).unwrap();

    let loader = PackageLoader::new(workspace.path(), config_manager.get_settings()).unwrap();
    let package = loader.load().unwrap();

    let en = package.package("en").unwrap();
    assert!(!en.is_lazy());
    assert_eq!(en.structure_ids(StructureKind::All), Vec::<&str>::new());
    assert_eq!(package.value("en/app/main.json", "menu/open").unwrap(), "Open");
}
