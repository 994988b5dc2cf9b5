//! File pattern matcher for resource files.

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

use super::LoaderSettings;

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Invalid structure pattern '{pattern}': {source}")]
    InvalidStructurePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid list pattern '{pattern}': {source}")]
    InvalidListPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// How a file is turned into a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Parsed into a layout-preserving structure.
    Structure,
    /// Parsed into a flat entity list.
    List,
    /// Kept as raw bytes.
    Blob,
    /// Not loaded.
    Skip,
}

/// Classifies files against configured glob patterns.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    workspace_root: PathBuf,
    structure_set: GlobSet,
    list_set: GlobSet,
    exclude_set: GlobSet,
    include_blobs: bool,
}

impl FileMatcher {
    /// Creates a new matcher from settings.
    pub fn new(workspace_root: PathBuf, settings: &LoaderSettings) -> Result<Self, MatcherError> {
        let structure_set = Self::build_glob_set(&settings.structure_patterns, |pattern, source| {
            MatcherError::InvalidStructurePattern { pattern, source }
        })?;

        let list_set = Self::build_glob_set(&settings.list_patterns, |pattern, source| {
            MatcherError::InvalidListPattern { pattern, source }
        })?;

        let exclude_set = Self::build_glob_set(&settings.exclude_patterns, |pattern, source| {
            MatcherError::InvalidExcludePattern { pattern, source }
        })?;

        Ok(Self {
            workspace_root,
            structure_set,
            list_set,
            exclude_set,
            include_blobs: settings.include_blobs,
        })
    }

    fn build_glob_set<F>(patterns: &[String], make_error: F) -> Result<GlobSet, MatcherError>
    where
        F: Fn(String, globset::Error) -> MatcherError,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| make_error(pattern.clone(), e))?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }

    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Returns true if the path matches `excludePatterns`.
    ///
    /// The path must be relative to the workspace root.
    #[must_use]
    pub fn is_excluded_relative(&self, relative_path: &Path) -> bool {
        self.exclude_set.is_match(relative_path)
    }

    /// Classifies a file. `listPatterns` win over `structurePatterns`.
    ///
    /// The path must be absolute and under the workspace root.
    #[must_use]
    pub fn classify(&self, absolute_path: &Path) -> FileKind {
        let Some(relative_path) = absolute_path.strip_prefix(&self.workspace_root).ok() else {
            return FileKind::Skip;
        };

        self.classify_relative(relative_path)
    }

    /// Classifies a file.
    ///
    /// The path must be relative to the workspace root.
    #[must_use]
    pub fn classify_relative(&self, relative_path: &Path) -> FileKind {
        if self.is_excluded_relative(relative_path) {
            FileKind::Skip
        } else if self.list_set.is_match(relative_path) {
            FileKind::List
        } else if self.structure_set.is_match(relative_path) {
            FileKind::Structure
        } else if self.include_blobs {
            FileKind::Blob
        } else {
            FileKind::Skip
        }
    }
}
