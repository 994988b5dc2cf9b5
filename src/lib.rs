//! silme
//!
//! ローカライズリソースのインメモリモデル。ディレクトリを [`Package`] のツリーとして読み込み、
//! ファイルのレイアウトを保ったまま [`Entity`] を参照・編集できる。

pub mod config;
pub mod error;
pub mod input;
pub mod loader;
pub mod model;
pub mod types;

pub use error::{
    ErrorKind,
    ModelError,
};
pub use loader::PackageLoader;
pub use model::{
    Blob,
    Comment,
    Element,
    ElementSequence,
    Entity,
    EntityList,
    Package,
    PathMode,
    Position,
    Resource,
    Structure,
    StructureKind,
};
