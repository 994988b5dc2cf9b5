//! Source comment blocks.

use super::entity::Entity;
use super::structure::{
    Element,
    ElementSequence,
    Position,
    insert_at,
    remove_at,
    remove_entity_from,
    resolve_pos,
};
use crate::error::ModelError;

/// A parsed comment block.
///
/// Behaves like a [`Structure`](super::Structure) without an id, except that it
/// never holds another comment.
#[derive(Debug, Clone, Default)]
pub struct Comment {
    /// Elements in source order.
    elements: Vec<Element>,
}

impl ElementSequence for Comment {
    fn elements(&self) -> &[Element] {
        &self.elements
    }
}

impl Comment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A comment holding a single text fragment.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { elements: vec![Element::Text(text.into())] }
    }

    /// Comments have no id.
    #[must_use]
    pub const fn id(&self) -> Option<&str> {
        None
    }

    /// Concatenated literal text of the comment.
    #[must_use]
    pub fn text(&self) -> String {
        self.elements.iter().filter_map(Element::as_text).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Inserts `element` at `pos`, appending when `pos` is `None`.
    ///
    /// # Errors
    /// - `NestedComment` if `element` is a comment
    /// - `NoSuchEntity` if `pos` is relative to an unknown entity
    pub fn add_at_pos(
        &mut self,
        element: Element,
        pos: Option<&Position>,
    ) -> Result<usize, ModelError> {
        if matches!(element, Element::Comment(_)) {
            return Err(ModelError::NestedComment);
        }
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

    /// Always fails: comments cannot be nested.
    #[allow(clippy::needless_pass_by_value, clippy::unused_self)]
    pub fn add_comment(
        &mut self,
        _comment: Comment,
        _pos: Option<&Position>,
    ) -> Result<usize, ModelError> {
        Err(ModelError::NestedComment)
    }

    /// Adds text or an entity. Returns the number of elements added, `0` for `None`.
    pub fn add(&mut self, item: Option<Element>, pos: Option<&Position>) -> Result<usize, ModelError> {
        match item {
            None => Ok(0),
            Some(element) => self.add_at_pos(element, pos),
        }
    }

    /// Adds every item in order, starting at `pos`. Returns the total added.
    ///
    /// Stops at the first failing item; items before it stay added.
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

    pub fn remove_entity(&mut self, id: &str) -> Result<Entity, ModelError> {
        remove_entity_from(&mut self.elements, None, id)
    }

    pub fn remove_element(&mut self, index: usize) -> Result<Element, ModelError> {
        remove_at(&mut self.elements, index)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn rejects_nested_comments() {
        let mut comment = Comment::new();

        assert_that!(comment.add(Some(Comment::new().into()), None), err(anything()));
        assert_that!(comment.add_comment(Comment::new(), None), err(anything()));
        assert_that!(comment.is_empty(), eq(true));
    }

    #[rstest]
    fn accepts_text_and_entities() {
        let mut comment = Comment::new();

        assert_that!(comment.add(Some("// LOCALIZATION NOTE: ".into()), None).unwrap(), eq(1));
        comment.add_entity(Entity::new("note", "keep short"), None).unwrap();

        assert_that!(comment.id(), none());
        assert_that!(comment.text(), eq("// LOCALIZATION NOTE: "));
        assert_that!(comment.value("note").unwrap(), eq("keep short"));
    }

    #[rstest]
    fn add_elements_stops_at_nested_comment() {
        let mut comment = Comment::new();

        let result =
            comment.add_elements([Element::from("a"), Comment::new().into(), "b".into()], None);

        assert_eq!(result.unwrap_err(), ModelError::NestedComment);
        assert_that!(comment.len(), eq(1));
    }

    #[rstest]
    fn remove_entity_without_container_label() {
        let mut comment = Comment::new();
        comment.add_entity(Entity::new("a", "1"), None).unwrap();

        comment.remove_entity("a").unwrap();

        assert_that!(comment.remove_entity("a").unwrap_err().to_string(), eq("No such entity: a"));
    }
}
