//! Hierarchical containers of structures.

use super::blob::Blob;
use super::entity::{
    Entity,
    EntityList,
};
use super::lazy::LazyMap;
use super::structure::{
    ElementSequence,
    Structure,
};
use crate::error::ModelError;

/// A leaf stored in a package's structure map.
#[derive(Debug)]
pub enum Resource {
    Blob(Blob),
    Structure(Structure),
    List(EntityList),
}

impl Resource {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Blob(blob) => &blob.id,
            Self::Structure(structure) => &structure.id,
            Self::List(list) => list.id(),
        }
    }

    #[must_use]
    pub const fn as_structure(&self) -> Option<&Structure> {
        match self {
            Self::Structure(structure) => Some(structure),
            _ => None,
        }
    }

    pub fn as_structure_mut(&mut self) -> Option<&mut Structure> {
        match self {
            Self::Structure(structure) => Some(structure),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_list(&self) -> Option<&EntityList> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_blob(&self) -> Option<&Blob> {
        match self {
            Self::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    /// Entities held by a structure or list; `None` for blobs.
    #[must_use]
    pub fn entities(&self) -> Option<Vec<Entity>> {
        match self {
            Self::Blob(_) => None,
            Self::Structure(structure) => Some(structure.entities()),
            Self::List(list) => Some(list.entities()),
        }
    }

    /// Value of an entity held by a structure or list.
    ///
    /// # Errors
    /// - `NotAnEntityContainer` for blobs
    /// - `NoSuchEntity` if the entity is absent
    pub fn value(&self, entity: &str) -> Result<String, ModelError> {
        match self {
            Self::Blob(blob) => Err(ModelError::NotAnEntityContainer(blob.id.clone())),
            Self::Structure(structure) => structure.value(entity),
            Self::List(list) => list.value(entity),
        }
    }
}

impl From<Blob> for Resource {
    fn from(blob: Blob) -> Self {
        Self::Blob(blob)
    }
}

impl From<Structure> for Resource {
    fn from(structure: Structure) -> Self {
        Self::Structure(structure)
    }
}

impl From<EntityList> for Resource {
    fn from(list: EntityList) -> Self {
        Self::List(list)
    }
}

/// Filter for [`Package::structures`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StructureKind {
    #[default]
    All,
    /// Entity lists only.
    List,
    /// Structures only.
    Structure,
    /// Blobs, and structures too since every structure is also a blob.
    Blob,
}

impl StructureKind {
    #[must_use]
    pub const fn matches(self, resource: &Resource) -> bool {
        match self {
            Self::All => true,
            Self::List => matches!(resource, Resource::List(_)),
            Self::Structure => matches!(resource, Resource::Structure(_)),
            Self::Blob => matches!(resource, Resource::Blob(_) | Resource::Structure(_)),
        }
    }
}

/// How [`Package::entities`] reports entity paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathMode<'a> {
    /// No paths.
    #[default]
    Off,
    /// Paths relative to this package, which is not part of them.
    Relative,
    /// Paths starting with `prefix/{package id}`.
    From(&'a str),
}

/// A direct child of a package.
#[derive(Debug, Clone, Copy)]
pub enum Child<'a> {
    Package(&'a Package),
    Resource(&'a Resource),
}

impl<'a> Child<'a> {
    #[must_use]
    pub fn id(&self) -> &'a str {
        match *self {
            Self::Package(package) => package.id(),
            Self::Resource(resource) => resource.id(),
        }
    }

    #[must_use]
    pub const fn as_package(&self) -> Option<&'a Package> {
        match *self {
            Self::Package(package) => Some(package),
            Self::Resource(_) => None,
        }
    }

    #[must_use]
    pub const fn as_resource(&self) -> Option<&'a Resource> {
        match *self {
            Self::Resource(resource) => Some(resource),
            Self::Package(_) => None,
        }
    }
}

/// A directory-like namespace of sub-packages and structures.
///
/// Packages and structures live in separate maps, so the same id may name one of
/// each. Lookups that consider both check packages first.
///
/// A lazy package accepts stubs: resolvers that build an entry on first access.
#[derive(Debug)]
pub struct Package {
    /// Id of the package within its parent.
    id: String,
    /// Whether stubs may be registered.
    lazy: bool,
    /// Where the package was loaded from.
    pub uri: Option<String>,
    /// Sub-packages by id.
    packages: LazyMap<Package>,
    /// Blobs, structures and entity lists by id.
    structures: LazyMap<Resource>,
}

impl Package {
    /// Creates an empty lazy package.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_lazy(id, true)
    }

    #[must_use]
    pub fn with_lazy(id: impl Into<String>, lazy: bool) -> Self {
        Self {
            id: id.into(),
            lazy,
            uri: None,
            packages: LazyMap::new(),
            structures: LazyMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Number of direct sub-packages plus direct structures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len() + self.structures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All direct children: packages first, then structures, each in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Child<'_>)> {
        self.packages
            .iter()
            .map(|(id, p)| (id, Child::Package(p)))
            .chain(self.structures.iter().map(|(id, r)| (id, Child::Resource(r))))
    }

    /// Whether `id` names a package or a structure. Does not resolve stubs.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.packages.contains_key(id) || self.structures.contains_key(id)
    }

    /// The package named `id`, else the structure named `id`.
    pub fn get(&self, id: &str) -> Result<Child<'_>, ModelError> {
        if let Some(package) = self.packages.get(id) {
            return Ok(Child::Package(package));
        }
        self.structures
            .get(id)
            .map(Child::Resource)
            .ok_or_else(|| ModelError::NoSuchElement(id.to_owned()))
    }

    /// Registers a sub-package built by `resolver` on first access.
    ///
    /// # Errors
    /// `NotLazy` if this package was created with `lazy = false`.
    pub fn add_package_stub<F>(&mut self, id: impl Into<String>, resolver: F) -> Result<(), ModelError>
    where
        F: FnOnce() -> Package + 'static,
    {
        self.ensure_lazy()?;
        self.packages.set_stub(id, resolver);
        Ok(())
    }

    /// Registers a structure built by `resolver` on first access.
    ///
    /// # Errors
    /// `NotLazy` if this package was created with `lazy = false`.
    pub fn add_structure_stub<F>(
        &mut self,
        id: impl Into<String>,
        resolver: F,
    ) -> Result<(), ModelError>
    where
        F: FnOnce() -> Resource + 'static,
    {
        self.ensure_lazy()?;
        self.structures.set_stub(id, resolver);
        Ok(())
    }

    /// Fails unless stubs are allowed.
    fn ensure_lazy(&self) -> Result<(), ModelError> {
        if self.lazy { Ok(()) } else { Err(ModelError::NotLazy(self.id.clone())) }
    }

    /// Stores `resource` under its id, in the sub-package named by `path` if given.
    ///
    /// Missing packages along `path` are created with [`Package::new`].
    pub fn add_structure(
        &mut self,
        resource: impl Into<Resource>,
        path: Option<&str>,
    ) -> Result<(), ModelError> {
        let resource = resource.into();
        match path.filter(|p| !p.is_empty()) {
            None => {
                self.structures.insert(resource.id().to_owned(), resource);
                Ok(())
            }
            Some(path) => {
                let (head, rest) = split_path(path);
                self.descend_or_create(head)?.add_structure(resource, rest)
            }
        }
    }

    /// Stores `package` under its id, in the sub-package named by `path` if given.
    ///
    /// Missing packages along `path` are created with [`Package::new`].
    pub fn add_package(&mut self, package: Self, path: Option<&str>) -> Result<(), ModelError> {
        match path.filter(|p| !p.is_empty()) {
            None => {
                self.packages.insert(package.id.clone(), package);
                Ok(())
            }
            Some(path) => {
                let (head, rest) = split_path(path);
                self.descend_or_create(head)?.add_package(package, rest)
            }
        }
    }

    /// Returns the sub-package `id`, creating an empty one if needed.
    fn descend_or_create(&mut self, id: &str) -> Result<&mut Self, ModelError> {
        if !self.packages.contains_key(id) {
            tracing::trace!(package = %self.id, child = id, "Creating intermediate package");
            self.packages.insert(id, Self::new(id));
        }
        self.packages.get_mut(id).ok_or_else(|| ModelError::NoSuchPackage(id.to_owned()))
    }

    #[must_use]
    pub fn packages(&self) -> Vec<&Self> {
        self.packages.values().collect()
    }

    /// Ids of the direct sub-packages. Does not resolve stubs.
    #[must_use]
    pub fn package_ids(&self) -> Vec<&str> {
        self.packages.keys().collect()
    }

    /// Direct structures of the given kind.
    #[must_use]
    pub fn structures(&self, kind: StructureKind) -> Vec<&Resource> {
        self.structures.values().filter(|r| kind.matches(r)).collect()
    }

    /// Ids of the direct structures of the given kind.
    ///
    /// Stubs are only resolved when `kind` is not [`StructureKind::All`].
    #[must_use]
    pub fn structure_ids(&self, kind: StructureKind) -> Vec<&str> {
        if kind == StructureKind::All {
            return self.structures.keys().collect();
        }
        self.structures.iter().filter(|(_, r)| kind.matches(r)).map(|(id, _)| id).collect()
    }

    /// Collects `(entity, path)` pairs from structures and entity lists.
    ///
    /// With `recursive`, sub-packages are visited before this package's own
    /// structures. Paths join package ids and the structure id with `/`.
    #[must_use]
    pub fn entities(&self, recursive: bool, path: PathMode<'_>) -> Vec<(Entity, Option<String>)> {
        let prefix = match path {
            PathMode::Off => None,
            PathMode::Relative => Some(String::new()),
            PathMode::From(prefix) => Some(join_path(prefix, &self.id)),
        };
        let mut out = Vec::new();
        self.collect_entities(recursive, prefix.as_deref(), &mut out);
        out
    }

    /// Depth-first worker of [`Package::entities`].
    fn collect_entities(
        &self,
        recursive: bool,
        prefix: Option<&str>,
        out: &mut Vec<(Entity, Option<String>)>,
    ) {
        if recursive {
            for package in self.packages.values() {
                let child_prefix = prefix.map(|p| join_path(p, &package.id));
                package.collect_entities(recursive, child_prefix.as_deref(), out);
            }
        }
        for (id, resource) in self.structures.iter() {
            let Some(entities) = resource.entities() else {
                continue;
            };
            let path = prefix.map(|p| join_path(p, id));
            out.extend(entities.into_iter().map(|e| (e, path.clone())));
        }
    }

    #[must_use]
    pub fn has_structure(&self, id: &str) -> bool {
        self.structures.contains_key(id)
    }

    #[must_use]
    pub fn has_package(&self, id: &str) -> bool {
        self.packages.contains_key(id)
    }

    pub fn structure(&self, id: &str) -> Result<&Resource, ModelError> {
        self.structures.get(id).ok_or_else(|| ModelError::NoSuchStructure(id.to_owned()))
    }

    pub fn structure_mut(&mut self, id: &str) -> Result<&mut Resource, ModelError> {
        self.structures.get_mut(id).ok_or_else(|| ModelError::NoSuchStructure(id.to_owned()))
    }

    pub fn package(&self, id: &str) -> Result<&Self, ModelError> {
        self.packages.get(id).ok_or_else(|| ModelError::NoSuchPackage(id.to_owned()))
    }

    pub fn package_mut(&mut self, id: &str) -> Result<&mut Self, ModelError> {
        self.packages.get_mut(id).ok_or_else(|| ModelError::NoSuchPackage(id.to_owned()))
    }

    /// Resolves a `/`-separated path to a package or structure.
    ///
    /// Returns `Ok(None)` for an empty path or when the last segment matches
    /// nothing. A trailing `/` is ignored.
    ///
    /// # Errors
    /// `NoSuchPackage` when an intermediate segment is not a sub-package.
    pub fn element(&self, path: &str) -> Result<Option<Child<'_>>, ModelError> {
        if path.is_empty() {
            return Ok(None);
        }
        let path = path.strip_suffix('/').unwrap_or(path);
        match path.split_once('/') {
            None => Ok(self
                .packages
                .get(path)
                .map(Child::Package)
                .or_else(|| self.structures.get(path).map(Child::Resource))),
            Some((head, rest)) => self.package(head)?.element(rest),
        }
    }

    pub fn remove_structure(&mut self, id: &str) -> Result<(), ModelError> {
        if self.structures.remove(id) {
            Ok(())
        } else {
            Err(ModelError::NoSuchStructure(id.to_owned()))
        }
    }

    pub fn remove_package(&mut self, id: &str) -> Result<(), ModelError> {
        if self.packages.remove(id) { Ok(()) } else { Err(ModelError::NoSuchPackage(id.to_owned())) }
    }

    /// Value of `entity` in the structure at `path`.
    ///
    /// # Errors
    /// - `NoSuchElement` if `path` resolves to nothing
    /// - `NotAnEntityContainer` if it resolves to a package or a blob
    /// - `NoSuchEntity` if the entity is absent
    pub fn value(&self, path: &str, entity: &str) -> Result<String, ModelError> {
        match self.element(path)? {
            None => Err(ModelError::NoSuchElement(path.to_owned())),
            Some(Child::Package(_)) => Err(ModelError::NotAnEntityContainer(path.to_owned())),
            Some(Child::Resource(resource)) => resource.value(entity),
        }
    }
}

/// Splits off the first path segment; an empty remainder becomes `None`.
fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once('/') {
        Some((head, rest)) => (head, Some(rest).filter(|r| !r.is_empty())),
        None => (path, None),
    }
}

/// `"{prefix}/{id}"`, or `id` alone for an empty prefix.
fn join_path(prefix: &str, id: &str) -> String {
    if prefix.is_empty() { id.to_owned() } else { format!("{prefix}/{id}") }
}
