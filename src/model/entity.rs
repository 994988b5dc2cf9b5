//! Translatable entities and id-keyed entity lists.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::ModelError;

/// Shared state behind an [`Entity`] handle.
struct EntityData {
    /// Entity id, fixed at construction.
    id: String,
    /// Current value; mutable through any handle.
    value: RefCell<String>,
    /// Source spelling of `value`, dropped once the value changes.
    raw: RefCell<Option<String>>,
}

/// A single translatable id/value pair.
///
/// `Entity` is a cheap handle: cloning it shares the same underlying entity, so a
/// [`Structure`](super::Structure) and any [`EntityList`] derived from it see each
/// other's value changes.
#[derive(Clone)]
pub struct Entity(Rc<EntityData>);

impl Entity {
    /// Creates a new entity.
    #[must_use]
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self(Rc::new(EntityData {
            id: id.into(),
            value: RefCell::new(value.into()),
            raw: RefCell::new(None),
        }))
    }

    /// Creates an entity that remembers how its value was written in the source.
    #[must_use]
    pub fn with_raw(id: impl Into<String>, value: impl Into<String>, raw: impl Into<String>) -> Self {
        let entity = Self::new(id, value);
        *entity.0.raw.borrow_mut() = Some(raw.into());
        entity
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// Returns a copy of the current value.
    #[must_use]
    pub fn value(&self) -> String {
        self.0.value.borrow().clone()
    }

    /// Source spelling of the value, as long as the value is unchanged.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.0.raw.borrow().clone()
    }

    /// Replaces the value, visible through every handle of this entity.
    pub fn set_value(&self, value: impl Into<String>) {
        *self.0.value.borrow_mut() = value.into();
        self.0.raw.borrow_mut().take();
    }

    /// Returns true if both handles point at the same entity.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity").field("id", &self.0.id).field("value", &self.0.value.borrow()).finish()
    }
}

/// An id-keyed collection of entities.
///
/// Unlike a [`Structure`](super::Structure) it carries no layout; ids are unique and
/// inserting an entity with an existing id replaces the old one in place.
#[derive(Debug, Clone, Default)]
pub struct EntityList {
    /// Id of the resource this list represents.
    id: String,
    /// Entities in insertion order.
    entities: Vec<Entity>,
}

impl EntityList {
    /// Creates a list from `entities`; later duplicates replace earlier ones.
    #[must_use]
    pub fn new(id: impl Into<String>, entities: impl IntoIterator<Item = Entity>) -> Self {
        let mut list = Self { id: id.into(), entities: Vec::new() };
        for entity in entities {
            list.insert(entity);
        }
        list
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn has_entity(&self, id: &str) -> bool {
        self.entities.iter().any(|e| e.id() == id)
    }

    /// Looks up an entity by id.
    pub fn entity(&self, id: &str) -> Result<&Entity, ModelError> {
        self.entities
            .iter()
            .find(|e| e.id() == id)
            .ok_or_else(|| ModelError::no_such_entity(id))
    }

    /// Returns the value of the entity with the given id.
    pub fn value(&self, id: &str) -> Result<String, ModelError> {
        self.entity(id).map(Entity::value)
    }

    /// Inserts an entity, replacing any entity with the same id.
    pub fn insert(&mut self, entity: Entity) {
        if let Some(slot) = self.entities.iter_mut().find(|e| e.id() == entity.id()) {
            *slot = entity;
        } else {
            self.entities.push(entity);
        }
    }

    /// Removes and returns the entity with the given id.
    pub fn remove(&mut self, id: &str) -> Result<Entity, ModelError> {
        let pos = self.entities.iter().position(|e| e.id() == id).ok_or_else(|| {
            ModelError::NoSuchEntity { container: Some(self.id.clone()), id: id.to_owned() }
        })?;
        Ok(self.entities.remove(pos))
    }

    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.entities.iter().map(Entity::id).collect()
    }

    /// Returns handles to all entities.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.entities.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }
}
