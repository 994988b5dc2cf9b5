//! ディレクトリを Package ツリーとして読み込む
use std::ffi::OsStr;
use std::fs;
use std::path::{
    Path,
    PathBuf,
};
use std::rc::Rc;

use ignore::{
    DirEntry,
    WalkBuilder,
};

use crate::config::{
    CONFIG_FILE_NAME,
    FileKind,
    FileMatcher,
    LoaderSettings,
};
use crate::input::json::{
    ParseError,
    parse_json_entity_list,
    parse_json_structure,
};
use crate::loader::types::LoaderError;
use crate::model::{
    Blob,
    Package,
    Resource,
};

/// リソースディレクトリのローダー
///
/// ディレクトリはサブパッケージ、ファイルは設定のパターンに従って
/// Structure / `EntityList` / Blob になる。`lazy` の場合は最初にアクセスされた時に読み込む。
#[derive(Clone, Debug)]
pub struct PackageLoader {
    /// ファイル分類
    matcher: Rc<FileMatcher>,
    /// 読み込み設定
    settings: Rc<LoaderSettings>,
}

impl PackageLoader {
    /// 新しいローダーを作成
    ///
    /// # Errors
    /// 無効な glob パターン
    pub fn new(root: impl Into<PathBuf>, settings: &LoaderSettings) -> Result<Self, LoaderError> {
        let root = root.into();
        let root = fs::canonicalize(&root).unwrap_or(root);
        let matcher = FileMatcher::new(root, settings)?;
        Ok(Self { matcher: Rc::new(matcher), settings: Rc::new(settings.clone()) })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.matcher.workspace_root()
    }

    /// ルートディレクトリを読み込む
    ///
    /// # Errors
    /// - ルートがディレクトリでない
    /// - 非 lazy なパッケージへのスタブ登録
    pub fn load(&self) -> Result<Package, LoaderError> {
        let root = self.root();
        if !root.is_dir() {
            return Err(LoaderError::NotADirectory(root.to_path_buf()));
        }
        tracing::debug!(root = %root.display(), lazy = self.settings.lazy, "Loading package");
        self.load_dir(root)
    }

    /// 1 階層分のエントリを読み込む
    fn load_dir(&self, dir: &Path) -> Result<Package, LoaderError> {
        let mut package = Package::with_lazy(file_id(dir), self.settings.lazy);
        package.uri = Some(dir.display().to_string());

        for entry in self.read_dir(dir) {
            let path = entry.path();
            let id = file_id(path);
            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                self.add_dir(&mut package, path, id)?;
            } else if entry.file_type().is_some_and(|ft| ft.is_file()) {
                self.add_file(&mut package, path, id)?;
            }
        }

        Ok(package)
    }

    /// スタブから呼ばれる。失敗時は空のパッケージ
    fn load_dir_or_empty(&self, dir: &Path, id: String) -> Package {
        self.load_dir(dir).unwrap_or_else(|e| {
            tracing::warn!(path = %dir.display(), "Failed to load package: {e}");
            Package::with_lazy(id, self.settings.lazy)
        })
    }

    /// 直下のエントリをファイル名順に列挙
    fn read_dir(&self, dir: &Path) -> Vec<DirEntry> {
        WalkBuilder::new(dir)
            .max_depth(Some(1))
            .hidden(!self.settings.hidden)
            .git_ignore(true)
            .require_git(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build()
            .filter_map(|result| match result {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    None
                }
            })
            .filter(|entry| entry.depth() > 0)
            .collect()
    }

    /// サブディレクトリをパッケージ (lazy ならスタブ) として追加
    fn add_dir(&self, package: &mut Package, path: &Path, id: String) -> Result<(), LoaderError> {
        if self.is_excluded(path) {
            tracing::trace!(path = %path.display(), "Skipping excluded directory");
            return Ok(());
        }

        if self.settings.lazy {
            let loader = self.clone();
            let path = path.to_path_buf();
            package.add_package_stub(id.clone(), move || loader.load_dir_or_empty(&path, id))?;
        } else {
            package.add_package(self.load_dir(path)?, None)?;
        }
        Ok(())
    }

    /// ファイルを Resource (lazy ならスタブ) として追加
    fn add_file(&self, package: &mut Package, path: &Path, id: String) -> Result<(), LoaderError> {
        if path.parent() == Some(self.root()) && path.file_name() == Some(OsStr::new(CONFIG_FILE_NAME))
        {
            return Ok(());
        }

        let kind = self.matcher.classify(path);
        if kind == FileKind::Skip {
            tracing::trace!(path = %path.display(), "Skipping file");
            return Ok(());
        }

        if self.settings.lazy {
            let loader = self.clone();
            let path = path.to_path_buf();
            package.add_structure_stub(id.clone(), move || loader.read_resource(&path, id, kind))?;
        } else {
            package.add_structure(self.read_resource(path, id, kind), None)?;
        }
        Ok(())
    }

    /// ファイルを読み込んで Resource にする
    ///
    /// 読み込み・パースに失敗したファイルは Blob として残す
    fn read_resource(&self, path: &Path, id: String, kind: FileKind) -> Resource {
        let uri = path.display().to_string();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %uri, "Failed to read file: {e}");
                return Blob { id, uri: Some(uri), source: None }.into();
            }
        };

        let parsed = match kind {
            FileKind::Structure | FileKind::List => self.parse(&id, &bytes, kind),
            FileKind::Blob | FileKind::Skip => Ok(None),
        };

        match parsed {
            Ok(Some(mut resource)) => {
                if let Resource::Structure(structure) = &mut resource {
                    structure.uri = Some(uri);
                    structure.source = Some(bytes);
                }
                resource
            }
            Ok(None) => Blob { id, uri: Some(uri), source: Some(bytes) }.into(),
            Err(e) => {
                tracing::warn!(path = %uri, "Failed to parse file, keeping it as a blob: {e}");
                Blob { id, uri: Some(uri), source: Some(bytes) }.into()
            }
        }
    }

    /// Blob 以外の種類をパースする
    fn parse(&self, id: &str, bytes: &[u8], kind: FileKind) -> Result<Option<Resource>, ParseError> {
        let text = std::str::from_utf8(bytes)?;
        let separator = &self.settings.key_separator;
        match kind {
            FileKind::Structure => Ok(Some(parse_json_structure(id, text, separator)?.into())),
            FileKind::List => Ok(Some(parse_json_entity_list(id, text, separator)?.into())),
            FileKind::Blob | FileKind::Skip => Ok(None),
        }
    }

    /// ルートからの相対パスが excludePatterns に一致するか
    fn is_excluded(&self, path: &Path) -> bool {
        path.strip_prefix(self.root())
            .is_ok_and(|relative_path| self.matcher.is_excluded_relative(relative_path))
    }
}

/// ファイル名 (拡張子込み) を id にする
fn file_id(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::TempDir;

    use super::*;
    use crate::model::{
        ElementSequence,
        PathMode,
        StructureKind,
    };

    /// en.json / de/menu.json / img/logo.png
    #[fixture]
    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("en.json"), r#"{"hello": "Hello", "nested": {"bye": "Bye"}}"#).unwrap();
        fs::create_dir_all(root.join("de")).unwrap();
        fs::write(root.join("de/menu.json"), r#"{"open": "Öffnen"}"#).unwrap();
        fs::create_dir_all(root.join("img")).unwrap();
        fs::write(root.join("img/logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        dir
    }

    fn settings(lazy: bool) -> LoaderSettings {
        LoaderSettings { lazy, ..LoaderSettings::default() }
    }

    #[rstest]
    #[case::eager(false)]
    #[case::lazy(true)]
    fn load_builds_package_tree(workspace: TempDir, #[case] lazy: bool) {
        let loader = PackageLoader::new(workspace.path(), &settings(lazy)).unwrap();

        let package = loader.load().unwrap();

        assert_eq!(package.is_lazy(), lazy);
        assert_eq!(package.package_ids(), vec!["de", "img"]);
        assert_eq!(package.structure_ids(StructureKind::All), vec!["en.json"]);
        assert_eq!(package.value("en.json", "nested.bye").unwrap(), "Bye");
        assert_eq!(package.value("de/menu.json", "open").unwrap(), "Öffnen");

        let logo = package.package("img").unwrap().structure("logo.png").unwrap();
        assert_eq!(logo.as_blob().and_then(|b| b.source.as_ref()).map(Vec::len), Some(4));
    }

    #[rstest]
    fn load_keeps_source_and_uri(workspace: TempDir) {
        let loader = PackageLoader::new(workspace.path(), &settings(false)).unwrap();

        let package = loader.load().unwrap();

        let structure = package.structure("en.json").unwrap().as_structure().unwrap();
        assert_that!(structure.uri.as_deref(), some(ends_with("en.json")));
        assert_eq!(
            structure.source.as_deref(),
            Some(br#"{"hello": "Hello", "nested": {"bye": "Bye"}}"#.as_slice())
        );
        assert_eq!(structure.ids(), vec!["hello", "nested.bye"]);
    }

    #[rstest]
    fn lazy_load_reads_files_on_first_access(workspace: TempDir) {
        let loader = PackageLoader::new(workspace.path(), &settings(true)).unwrap();
        let package = loader.load().unwrap();

        fs::write(workspace.path().join("en.json"), r#"{"hello": "Changed"}"#).unwrap();

        assert_eq!(package.value("en.json", "hello").unwrap(), "Changed");
    }

    #[rstest]
    fn eager_load_reads_files_up_front(workspace: TempDir) {
        let loader = PackageLoader::new(workspace.path(), &settings(false)).unwrap();
        let package = loader.load().unwrap();

        fs::write(workspace.path().join("en.json"), r#"{"hello": "Changed"}"#).unwrap();

        assert_eq!(package.value("en.json", "hello").unwrap(), "Hello");
    }

    #[rstest]
    fn lazy_load_keeps_missing_file_as_empty_blob(workspace: TempDir) {
        let loader = PackageLoader::new(workspace.path(), &settings(true)).unwrap();
        let package = loader.load().unwrap();

        fs::remove_file(workspace.path().join("en.json")).unwrap();

        let resource = package.structure("en.json").unwrap();
        assert_that!(resource.as_blob().map(|b| b.source.is_none()), some(eq(true)));
    }

    #[rstest]
    fn invalid_json_becomes_blob(workspace: TempDir) {
        fs::write(workspace.path().join("broken.json"), "{\"a\": ").unwrap();
        let loader = PackageLoader::new(workspace.path(), &settings(false)).unwrap();

        let package = loader.load().unwrap();

        assert_eq!(package.structure_ids(StructureKind::Blob), vec!["broken.json", "en.json"]);
        assert_that!(package.structure("broken.json").unwrap().as_blob(), some(anything()));
    }

    #[rstest]
    fn list_patterns_load_entity_lists(workspace: TempDir) {
        let settings = LoaderSettings {
            list_patterns: vec!["de/**".to_string()],
            lazy: false,
            ..LoaderSettings::default()
        };
        let loader = PackageLoader::new(workspace.path(), &settings).unwrap();

        let package = loader.load().unwrap();

        let menu = package.package("de").unwrap().structure("menu.json").unwrap();
        assert_that!(menu.as_list().map(|l| l.len()), some(eq(1)));
        assert_eq!(package.structure_ids(StructureKind::List), Vec::<&str>::new());
    }

    #[rstest]
    fn excludes_and_blob_setting_are_applied(workspace: TempDir) {
        fs::write(workspace.path().join("notes.txt"), "n").unwrap();
        let settings = LoaderSettings {
            exclude_patterns: vec!["img".to_string()],
            include_blobs: false,
            lazy: false,
            ..LoaderSettings::default()
        };
        let loader = PackageLoader::new(workspace.path(), &settings).unwrap();

        let package = loader.load().unwrap();

        assert_eq!(package.package_ids(), vec!["de"]);
        assert!(!package.has_structure("notes.txt"));
    }

    #[rstest]
    #[case::hidden_skipped(false, false)]
    #[case::hidden_loaded(true, true)]
    fn hidden_entries_follow_setting(workspace: TempDir, #[case] hidden: bool, #[case] expected: bool) {
        fs::write(workspace.path().join(".draft.json"), r#"{"a": "b"}"#).unwrap();
        fs::write(workspace.path().join(".silme.json"), r#"{"hidden": true}"#).unwrap();
        let settings = LoaderSettings { hidden, lazy: false, ..LoaderSettings::default() };
        let loader = PackageLoader::new(workspace.path(), &settings).unwrap();

        let package = loader.load().unwrap();

        assert_eq!(package.has_structure(".draft.json"), expected);
        assert!(!package.has_structure(".silme.json"));
    }

    #[rstest]
    fn gitignore_is_respected(workspace: TempDir) {
        fs::write(workspace.path().join(".gitignore"), "img/\n").unwrap();
        let loader = PackageLoader::new(workspace.path(), &settings(false)).unwrap();

        let package = loader.load().unwrap();

        assert_eq!(package.package_ids(), vec!["de"]);
    }

    #[rstest]
    fn entities_use_relative_paths(workspace: TempDir) {
        let loader = PackageLoader::new(workspace.path(), &settings(true)).unwrap();
        let package = loader.load().unwrap();

        let entities: Vec<(String, String)> = package
            .entities(true, PathMode::Relative)
            .into_iter()
            .map(|(entity, path)| (path.unwrap_or_default(), entity.id().to_string()))
            .collect();

        assert_eq!(
            entities,
            vec![
                ("de/menu.json".to_string(), "open".to_string()),
                ("en.json".to_string(), "hello".to_string()),
                ("en.json".to_string(), "nested.bye".to_string()),
            ]
        );
    }

    #[rstest]
    fn load_fails_for_missing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let loader = PackageLoader::new(&missing, &settings(true)).unwrap();

        let result = loader.load();

        assert!(matches!(result, Err(LoaderError::NotADirectory(path)) if path == missing));
    }

    #[rstest]
    fn new_rejects_invalid_patterns() {
        let settings = LoaderSettings {
            exclude_patterns: vec!["[x".to_string()],
            ..LoaderSettings::default()
        };

        let result = PackageLoader::new(".", &settings);

        assert!(matches!(result, Err(LoaderError::Matcher(_))));
    }
}
