//! In-memory localization data model.
//!
//! A [`Package`] is a directory-like tree of sub-packages and resources. Resources
//! are opaque [`Blob`]s, ordered [`Structure`]s (text, [`Entity`]s and
//! [`Comment`]s in source order) or id-keyed [`EntityList`]s.

mod blob;
mod comment;
mod entity;
mod lazy;
mod package;
mod structure;

pub use blob::Blob;
pub use comment::Comment;
pub use entity::{
    Entity,
    EntityList,
};
pub use lazy::{
    LazyMap,
    Resolver,
};
pub use package::{
    Child,
    Package,
    PathMode,
    Resource,
    StructureKind,
};
pub use structure::{
    Element,
    ElementSequence,
    Position,
    ProcessCallback,
    Structure,
};
