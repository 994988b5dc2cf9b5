//! Directory loader building a [`Package`](crate::model::Package) tree from disk.
pub mod types;
pub mod workspace;

pub use types::LoaderError;
pub use workspace::PackageLoader;
