//! Ordered, layout-preserving resource content.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::comment::Comment;
use super::entity::{
    Entity,
    EntityList,
};
use crate::error::ModelError;

/// One item of a [`Structure`] or [`Comment`].
#[derive(Debug, Clone)]
pub enum Element {
    /// Literal, non-translatable text (whitespace, punctuation, markup).
    Text(String),
    /// A translatable id/value pair, shared with every other handle to it.
    Entity(Entity),
    /// A source comment; may hold entities but no further comments.
    Comment(Comment),
}

impl Element {
    #[must_use]
    pub const fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_comment(&self) -> Option<&Comment> {
        match self {
            Self::Comment(comment) => Some(comment),
            _ => None,
        }
    }
}

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Entity> for Element {
    fn from(entity: Entity) -> Self {
        Self::Entity(entity)
    }
}

impl From<Comment> for Element {
    fn from(comment: Comment) -> Self {
        Self::Comment(comment)
    }
}

/// Where to insert a new element.
///
/// `None` in the `pos` arguments means append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// Absolute index; values past the end append.
    Index(usize),
    /// Directly before the first entity with this id.
    Before(String),
    /// Directly after the first entity with this id.
    After(String),
}

impl Position {
    #[must_use]
    pub fn before(id: impl Into<String>) -> Self {
        Self::Before(id.into())
    }

    #[must_use]
    pub fn after(id: impl Into<String>) -> Self {
        Self::After(id.into())
    }
}

/// Read access shared by [`Structure`] and [`Comment`].
///
/// Lookups by id resolve to the *first* matching entity in list order.
pub trait ElementSequence {
    /// The elements in source order.
    fn elements(&self) -> &[Element];

    fn len(&self) -> usize {
        self.elements().len()
    }

    fn is_empty(&self) -> bool {
        self.elements().is_empty()
    }

    /// Positional read.
    fn element(&self, index: usize) -> Result<&Element, ModelError> {
        self.elements()
            .get(index)
            .ok_or(ModelError::IndexOutOfRange { index, len: self.elements().len() })
    }

    /// Ids of all entities in list order; duplicates are kept.
    fn ids(&self) -> Vec<&str> {
        self.elements().iter().filter_map(Element::as_entity).map(Entity::id).collect()
    }

    /// Alias of [`ElementSequence::ids`].
    fn keys(&self) -> Vec<&str> {
        self.ids()
    }

    /// Handles to all entities in list order.
    fn entities(&self) -> Vec<Entity> {
        self.elements().iter().filter_map(Element::as_entity).cloned().collect()
    }

    fn has_entity(&self, id: &str) -> bool {
        self.elements().iter().filter_map(Element::as_entity).any(|e| e.id() == id)
    }

    /// Alias of [`ElementSequence::has_entity`].
    fn contains(&self, id: &str) -> bool {
        self.has_entity(id)
    }

    fn entity(&self, id: &str) -> Result<&Entity, ModelError> {
        self.elements()
            .iter()
            .filter_map(Element::as_entity)
            .find(|e| e.id() == id)
            .ok_or_else(|| ModelError::no_such_entity(id))
    }

    /// List index of the first entity with the given id.
    fn entity_pos(&self, id: &str) -> Result<usize, ModelError> {
        self.elements()
            .iter()
            .position(|el| el.as_entity().is_some_and(|e| e.id() == id))
            .ok_or_else(|| ModelError::no_such_entity(id))
    }

    fn value(&self, id: &str) -> Result<String, ModelError> {
        self.entity(id).map(Entity::value)
    }

    /// Sets the value of the first entity with the given id.
    fn modify_entity(&mut self, id: &str, value: &str) -> Result<bool, ModelError> {
        self.entity(id)?.set_value(value);
        Ok(true)
    }
}

/// Resolves a [`Position`] to a list index. `None` means append.
pub(crate) fn resolve_pos(
    seq: &impl ElementSequence,
    pos: Option<&Position>,
) -> Result<Option<usize>, ModelError> {
    Ok(match pos {
        None => None,
        Some(Position::Index(index)) => Some(*index),
        Some(Position::Before(anchor)) => Some(seq.entity_pos(anchor)?),
        Some(Position::After(anchor)) => Some(seq.entity_pos(anchor)? + 1),
    })
}

/// Inserts at `index`, clamping past-the-end indices to an append.
pub(crate) fn insert_at(elements: &mut Vec<Element>, element: Element, index: Option<usize>) {
    match index {
        Some(index) if index < elements.len() => elements.insert(index, element),
        _ => elements.push(element),
    }
}

/// Removes the first entity with the given id, reporting `label` on failure.
pub(crate) fn remove_entity_from(
    elements: &mut Vec<Element>,
    label: Option<&str>,
    id: &str,
) -> Result<Entity, ModelError> {
    let index = elements
        .iter()
        .position(|el| el.as_entity().is_some_and(|e| e.id() == id))
        .ok_or_else(|| ModelError::NoSuchEntity {
            container: label.map(ToOwned::to_owned),
            id: id.to_owned(),
        })?;
    match elements.remove(index) {
        Element::Entity(entity) => Ok(entity),
        _ => Err(ModelError::no_such_entity(id)),
    }
}

/// Positional delete.
pub(crate) fn remove_at(elements: &mut Vec<Element>, index: usize) -> Result<Element, ModelError> {
    if index < elements.len() {
        Ok(elements.remove(index))
    } else {
        Err(ModelError::IndexOutOfRange { index, len: elements.len() })
    }
}

/// Callback run by [`Structure::process`].
pub type ProcessCallback = Rc<dyn Fn(&mut Structure) -> Result<(), ModelError>>;

/// The parsed content of one localization file.
///
/// A structure keeps the file's literal text, entities and comments in their source
/// order so it can be written back with its original layout.
#[derive(Clone, Default)]
pub struct Structure {
    /// Id of the structure within its parent package.
    pub id: String,
    /// Where the structure was loaded from.
    pub uri: Option<String>,
    /// Raw content the structure was parsed from.
    pub source: Option<Vec<u8>>,
    /// Elements in source order.
    elements: Vec<Element>,
    /// Post-processing hook.
    process_cb: Option<ProcessCallback>,
}

impl fmt::Debug for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Structure")
            .field("id", &self.id)
            .field("uri", &self.uri)
            .field("elements", &self.elements)
            .field("process_cb", &self.process_cb.as_ref().map(|_| "<callback>"))
            .finish_non_exhaustive()
    }
}

impl ElementSequence for Structure {
    fn elements(&self) -> &[Element] {
        &self.elements
    }
}

impl Structure {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Appends without position resolution, for parsers filling a new structure.
    pub(crate) fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Builds a detached [`EntityList`] sharing this structure's entities.
    ///
    /// Changing the list's membership leaves the structure alone, but entity values
    /// are shared.
    #[must_use]
    pub fn entitylist(&self) -> EntityList {
        EntityList::new(self.id.clone(), self.entities())
    }

    /// Maps entity ids to `(entity, path)`, where path is `"{prefix}/{id}"`, or the
    /// structure id alone for an empty prefix.
    ///
    /// When ids repeat, the last entity wins.
    #[must_use]
    pub fn entities_with_path(&self, prefix: &str) -> HashMap<String, (Entity, String)> {
        let path =
            if prefix.is_empty() { self.id.clone() } else { format!("{prefix}/{}", self.id) };
        self.elements
            .iter()
            .filter_map(Element::as_entity)
            .map(|e| (e.id().to_owned(), (e.clone(), path.clone())))
            .collect()
    }

    /// Inserts `element` at `pos`, appending when `pos` is `None`.
    ///
    /// # Errors
    /// `NoSuchEntity` if `pos` is relative to an unknown entity.
    pub fn add_at_pos(
        &mut self,
        element: Element,
        pos: Option<&Position>,
    ) -> Result<usize, ModelError> {
        let index = resolve_pos(&*self, pos)?;
        insert_at(&mut self.elements, element, index);
        Ok(1)
    }

    pub fn add_entity(&mut self, entity: Entity, pos: Option<&Position>) -> Result<usize, ModelError> {
        self.add_at_pos(Element::Entity(entity), pos)
    }

    pub fn add_string(
        &mut self,
        text: impl Into<String>,
        pos: Option<&Position>,
    ) -> Result<usize, ModelError> {
        self.add_at_pos(Element::Text(text.into()), pos)
    }

    pub fn add_comment(&mut self, comment: Comment, pos: Option<&Position>) -> Result<usize, ModelError> {
        self.add_at_pos(Element::Comment(comment), pos)
    }

    /// Adds any element. Returns the number of elements added, `0` for `None`.
    pub fn add(&mut self, item: Option<Element>, pos: Option<&Position>) -> Result<usize, ModelError> {
        match item {
            None => Ok(0),
            Some(Element::Text(text)) => self.add_string(text, pos),
            Some(Element::Entity(entity)) => self.add_entity(entity, pos),
            Some(Element::Comment(comment)) => self.add_comment(comment, pos),
        }
    }

    /// Adds every item in order, starting at `pos`. Returns the total added.
    pub fn add_elements<I>(&mut self, items: I, pos: Option<&Position>) -> Result<usize, ModelError>
    where
        I: IntoIterator<Item = Element>,
    {
        let start = resolve_pos(&*self, pos)?;
        let mut added = 0;
        for item in items {
            let at = start.map(|index| Position::Index(index + added));
            added += self.add(Some(item), at.as_ref())?;
        }
        Ok(added)
    }

    /// Removes the first entity with the given id.
    pub fn remove_entity(&mut self, id: &str) -> Result<Entity, ModelError> {
        remove_entity_from(&mut self.elements, Some(&self.id), id)
    }

    pub fn remove_element(&mut self, index: usize) -> Result<Element, ModelError> {
        remove_at(&mut self.elements, index)
    }

    /// Stores the callback run by [`Structure::process`].
    pub fn set_process_cb<F>(&mut self, cb: F)
    where
        F: Fn(&mut Self) -> Result<(), ModelError> + 'static,
    {
        self.process_cb = Some(Rc::new(cb));
    }

    /// Runs the stored process callback on this structure.
    ///
    /// # Errors
    /// `MissingProcessCallback` when none was set, otherwise whatever the callback returns.
    pub fn process(&mut self) -> Result<(), ModelError> {
        let cb = self.process_cb.clone().ok_or(ModelError::MissingProcessCallback)?;
        (*cb)(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::{
        fixture,
        rstest,
    };

    use super::*;
    use crate::error::ErrorKind;

    #[fixture]
    fn abc() -> Structure {
        let mut s = Structure::new("menu.json");
        s.add_string("{\n", None).unwrap();
        for id in ["a", "b", "c"] {
            s.add_entity(Entity::new(id, id.to_uppercase()), None).unwrap();
        }
        s.add_string("}\n", None).unwrap();
        s
    }

    #[rstest]
    #[case::before(Position::before("b"), vec!["a", "x", "b", "c"])]
    #[case::after(Position::after("b"), vec!["a", "b", "x", "c"])]
    #[case::after_last(Position::after("c"), vec!["a", "b", "c", "x"])]
    #[case::index(Position::Index(1), vec!["x", "a", "b", "c"])]
    #[case::index_past_end(Position::Index(99), vec!["a", "b", "c", "x"])]
    fn add_entity_at_position(mut abc: Structure, #[case] pos: Position, #[case] expected: Vec<&str>) {
        let added = abc.add_entity(Entity::new("x", "X"), Some(&pos)).unwrap();

        assert_that!(added, eq(1));
        assert_eq!(abc.ids(), expected);
    }

    #[rstest]
    fn add_relative_to_unknown_anchor_fails(mut abc: Structure) {
        let result = abc.add_string("x", Some(&Position::before("nope")));

        assert_that!(result.unwrap_err().kind(), eq(ErrorKind::NotFound));
        assert_that!(abc.len(), eq(5));
    }

    #[rstest]
    fn add_none_is_a_no_op(mut abc: Structure) {
        assert_that!(abc.add(None, None).unwrap(), eq(0));
        assert_that!(abc.len(), eq(5));
    }

    #[rstest]
    fn add_dispatches_by_variant(mut abc: Structure) {
        abc.add(Some("tail".into()), None).unwrap();
        abc.add(Some(Entity::new("d", "D").into()), None).unwrap();
        abc.add(Some(Comment::new().into()), None).unwrap();

        assert_that!(abc.element(5).unwrap().as_text(), some(eq("tail")));
        assert_that!(abc.element(6).unwrap().as_entity().map(Entity::id), some(eq("d")));
        assert_that!(abc.element(7).unwrap().as_comment().is_some(), eq(true));
    }

    #[rstest]
    fn add_elements_keeps_relative_order(mut abc: Structure) {
        let added = abc
            .add_elements(
                [Element::from(Entity::new("x", "X")), Element::from(", "), Entity::new("y", "Y").into()],
                Some(&Position::after("a")),
            )
            .unwrap();

        assert_that!(added, eq(3));
        assert_eq!(abc.ids(), vec!["a", "x", "y", "b", "c"]);
        assert_that!(abc.element(3).unwrap().as_text(), some(eq(", ")));
    }

    #[rstest]
    fn lookups_resolve_first_match(mut abc: Structure) {
        abc.add_entity(Entity::new("a", "second"), None).unwrap();

        assert_that!(abc.entity_pos("a").unwrap(), eq(1));
        assert_that!(abc.value("a").unwrap(), eq("A"));
        assert_eq!(abc.keys(), vec!["a", "b", "c", "a"]);

        abc.modify_entity("a", "first").unwrap();
        assert_that!(abc.entity("a").unwrap().value(), eq("first"));
        assert_that!(abc.element(5).unwrap().as_entity().unwrap().value(), eq("second"));
    }

    #[rstest]
    fn entity_lookup_agrees_with_contains(abc: Structure) {
        for id in abc.ids() {
            assert_that!(abc.contains(id), eq(true));
            let pos = abc.entity_pos(id).unwrap();
            assert_that!(abc.elements()[pos].as_entity().unwrap().id(), eq(id));
        }
        assert_that!(abc.has_entity("zz"), eq(false));
        assert_that!(abc.entity("zz").unwrap_err().to_string(), eq("No such entity: zz"));
    }

    #[rstest]
    fn modify_unknown_entity_fails(mut abc: Structure) {
        assert_that!(abc.modify_entity("zz", "v").unwrap_err().kind(), eq(ErrorKind::NotFound));
    }

    #[rstest]
    fn remove_entity_then_second_remove_fails(mut abc: Structure) {
        let removed = abc.remove_entity("b").unwrap();

        assert_that!(removed.id(), eq("b"));
        assert_that!(abc.contains("b"), eq(false));
        assert_that!(
            abc.remove_entity("b").unwrap_err().to_string(),
            eq("[menu.json] No such entity: b")
        );
    }

    #[rstest]
    fn positional_access(mut abc: Structure) {
        assert_that!(abc.element(0).unwrap().as_text(), some(eq("{\n")));
        abc.remove_element(0).unwrap();
        assert_that!(abc.element(0).unwrap().as_entity().map(Entity::id), some(eq("a")));
        assert_that!(abc.element(10).unwrap_err().kind(), eq(ErrorKind::NotFound));
        assert_that!(abc.remove_element(10).unwrap_err().kind(), eq(ErrorKind::NotFound));
    }

    #[rstest]
    fn entitylist_shares_entities_but_not_membership(abc: Structure) {
        let mut list = abc.entitylist();
        list.remove("a").unwrap();
        list.entity("b").unwrap().set_value("changed");

        assert_that!(list.id(), eq("menu.json"));
        assert_that!(abc.has_entity("a"), eq(true));
        assert_that!(abc.value("b").unwrap(), eq("changed"));
    }

    #[rstest]
    #[case::with_prefix("app/locales", "app/locales/menu.json")]
    #[case::empty_prefix("", "menu.json")]
    fn entities_with_path_prefixes(abc: Structure, #[case] prefix: &str, #[case] expected: &str) {
        let map = abc.entities_with_path(prefix);

        assert_that!(map.len(), eq(3));
        let (entity, path) = &map["b"];
        assert_that!(entity.value(), eq("B"));
        assert_that!(path.as_str(), eq(expected));
    }

    #[rstest]
    fn entities_with_path_last_duplicate_wins(mut abc: Structure) {
        abc.add_entity(Entity::new("a", "again"), None).unwrap();

        assert_that!(abc.entities_with_path("")["a"].0.value(), eq("again"));
    }

    #[rstest]
    fn process_without_callback_fails(mut abc: Structure) {
        assert_eq!(abc.process().unwrap_err(), ModelError::MissingProcessCallback);
    }

    #[rstest]
    fn process_runs_callback_with_structure(mut abc: Structure) {
        abc.set_process_cb(|s| {
            for entity in s.entities() {
                entity.set_value(entity.value().to_lowercase());
            }
            s.add_string("// processed\n", None).map(|_| ())
        });

        abc.process().unwrap();

        assert_that!(abc.value("c").unwrap(), eq("c"));
        assert_that!(abc.len(), eq(6));
    }
}
