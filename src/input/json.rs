//! JSON translation files as structures.
//!
//! [`parse_json_structure`] keeps the full file layout: every string leaf becomes an
//! [`Entity`] keyed by its flattened key path (`common.hello`, `items[0]`), the
//! bytes in between stay as text and comments become [`Comment`]s. Rendering the
//! structure with [`render_json`] gives the file back, escapes spelled as written.
//! Non-string leaves (`3`, `true`, `null`) are not translatable: the structure keeps
//! them as text and [`parse_json_entity_list`] leaves them out.

use serde_json::Value;
use thiserror::Error;

use crate::model::{
    Comment,
    Element,
    ElementSequence,
    Entity,
    EntityList,
    Structure,
};
use crate::types::SourcePosition;

/// Errors from parsing JSON resources.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Error when failing to set the language for the parser
    #[error("Failed to set language for parser: {0}")]
    LanguageSetup(#[from] tree_sitter::LanguageError),
    /// Error when the parser produced no tree
    #[error("Failed to parse source")]
    ParseFailed,
    /// Error when the source is not valid JSON
    #[error("Syntax error at {0}")]
    Syntax(SourcePosition),
    /// Error from `serde_json`
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Error when the file is not UTF-8
    #[error("Invalid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

/// Flatten nested JSON into `(key, value)` pairs in document order.
///
/// Object members are joined with `separator`, array items use `[index]`.
/// Non-string leaves are kept as their JSON text.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use silme::input::json::flatten_json;
///
/// let json = json!({
///     "common": {
///         "hello": "Hello",
///         "goodbye": "Goodbye"
///     }
/// });
///
/// let flattened = flatten_json(&json, ".", None);
/// assert_eq!(flattened[0], ("common.hello".to_string(), "Hello".to_string()));
/// assert_eq!(flattened[1], ("common.goodbye".to_string(), "Goodbye".to_string()));
/// ```
#[must_use]
pub fn flatten_json(json: &Value, separator: &str, prefix: Option<&str>) -> Vec<(String, String)> {
    let mut result = Vec::new();
    flatten_json_value(json, separator, prefix, true, &mut result);
    result
}

/// Recursive worker of [`flatten_json`]; `scalars` keeps non-string leaves.
fn flatten_json_value(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
    scalars: bool,
    result: &mut Vec<(String, String)>,
) {
    match json {
        Value::Object(map) => {
            for (key, value) in map {
                let full_key = member_key(prefix, key, separator);
                flatten_json_value(value, separator, Some(&full_key), scalars, result);
            }
        }
        Value::Array(arr) => {
            for (index, value) in arr.iter().enumerate() {
                let full_key = item_key(prefix, index);
                flatten_json_value(value, separator, Some(&full_key), scalars, result);
            }
        }
        Value::String(s) => {
            if let Some(key) = prefix {
                result.push((key.to_string(), s.clone()));
            }
        }
        _ if scalars => {
            if let Some(key) = prefix {
                result.push((key.to_string(), json.to_string()));
            }
        }
        _ => {}
    }
}

/// Key of an object member below `prefix`.
fn member_key(prefix: Option<&str>, key: &str, separator: &str) -> String {
    prefix.map_or_else(|| key.to_string(), |p| format!("{p}{separator}{key}"))
}

/// Key of an array item below `prefix`.
fn item_key(prefix: Option<&str>, index: usize) -> String {
    prefix.map_or_else(|| format!("[{index}]"), |p| format!("{p}[{index}]"))
}

/// Parse JSON text into an [`EntityList`] of its flattened string leaves.
///
/// Numbers, booleans and `null` are skipped, matching [`parse_json_structure`].
///
/// # Errors
/// Returns error if `text` is not valid JSON.
pub fn parse_json_entity_list(id: &str, text: &str, separator: &str) -> Result<EntityList, ParseError> {
    let json: Value = serde_json::from_str(text)?;
    let mut leaves = Vec::new();
    flatten_json_value(&json, separator, None, false, &mut leaves);
    Ok(EntityList::new(id, leaves.into_iter().map(|(key, value)| Entity::new(key, value))))
}

/// Parse JSON (comments allowed) into a layout-preserving [`Structure`].
///
/// Only string leaves become entities; other values stay in the surrounding text.
///
/// # Errors
/// - Parser setup failure
/// - Syntax errors in `text`
pub fn parse_json_structure(id: &str, text: &str, separator: &str) -> Result<Structure, ParseError> {
    let mut parser = tree_sitter::Parser::new();
    parser.set_language(&tree_sitter_json::LANGUAGE.into())?;

    let tree = parser.parse(text, None).ok_or(ParseError::ParseFailed)?;
    let root = tree.root_node();
    if root.has_error() {
        let position = first_error(root).map_or_else(SourcePosition::default, |node| {
            SourcePosition::from(node.start_position())
        });
        return Err(ParseError::Syntax(position));
    }

    let mut builder = StructureBuilder {
        source: text,
        separator,
        cursor: 0,
        structure: Structure::new(id),
    };
    builder.visit(root, None);
    Ok(builder.finish())
}

/// Finds the first error or missing node, depth first.
fn first_error(node: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().filter(|c| c.has_error()).find_map(first_error)
}

/// Walks a JSON syntax tree, cutting the source into structure elements.
struct StructureBuilder<'s> {
    /// Full source text.
    source: &'s str,
    /// Separator between object keys in entity ids.
    separator: &'s str,
    /// Byte offset up to which the source has been emitted.
    cursor: usize,
    /// Structure under construction.
    structure: Structure,
}

impl StructureBuilder<'_> {
    /// Dispatches on the node kind; `key` is the entity id of a value node.
    fn visit(&mut self, node: tree_sitter::Node<'_>, key: Option<&str>) {
        match node.kind() {
            "comment" => self.push_comment(node),
            "string" => {
                if let Some(key) = key {
                    self.push_entity(node, key);
                }
            }
            "document" => {
                for child in children(node) {
                    self.visit(child, None);
                }
            }
            "object" => {
                for child in children(node) {
                    match child.kind() {
                        "pair" => self.visit_pair(child, key),
                        "comment" => self.push_comment(child),
                        _ => {}
                    }
                }
            }
            "array" => {
                let mut index = 0;
                for child in children(node) {
                    match child.kind() {
                        "[" | "]" | "," => {}
                        "comment" => self.push_comment(child),
                        _ => {
                            self.visit(child, Some(&item_key(key, index)));
                            index += 1;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Visits the value of an object member under `prefix`.
    fn visit_pair(&mut self, node: tree_sitter::Node<'_>, prefix: Option<&str>) {
        let Some(key_node) = node.child_by_field_name("key") else {
            return;
        };
        let Some(value_node) = node.child_by_field_name("value") else {
            return;
        };
        let Some(raw_key) = self.source.get(key_node.byte_range()) else {
            tracing::warn!("Failed to get key text from node");
            return;
        };
        let key = serde_json::from_str::<String>(raw_key)
            .unwrap_or_else(|_| raw_key.trim_matches('"').to_string());
        let full_key = member_key(prefix, &key, self.separator);

        for child in children(node) {
            if child.kind() == "comment" {
                self.push_comment(child);
            } else if child.id() == value_node.id() {
                self.visit(child, Some(&full_key));
            }
        }
    }

    /// Emits pending source text up to byte offset `end`.
    fn push_text_until(&mut self, end: usize) {
        if end <= self.cursor {
            return;
        }
        if let Some(text) = self.source.get(self.cursor..end) {
            self.structure.push(Element::Text(text.to_string()));
        }
        self.cursor = end;
    }

    /// Emits a string value as an entity that keeps its source spelling.
    fn push_entity(&mut self, node: tree_sitter::Node<'_>, key: &str) {
        let Some(raw) = self.source.get(node.byte_range()) else {
            return;
        };
        match serde_json::from_str::<String>(raw) {
            Ok(value) => {
                self.push_text_until(node.start_byte());
                self.structure.push(Element::Entity(Entity::with_raw(key, value, raw)));
                self.cursor = node.end_byte();
            }
            Err(e) => tracing::warn!(key, "Keeping undecodable string as text: {e}"),
        }
    }

    /// Emits a comment verbatim.
    fn push_comment(&mut self, node: tree_sitter::Node<'_>) {
        let Some(text) = self.source.get(node.byte_range()) else {
            return;
        };
        self.push_text_until(node.start_byte());
        self.structure.push(Element::Comment(Comment::from_text(text)));
        self.cursor = node.end_byte();
    }

    /// Emits trailing text and returns the structure.
    fn finish(mut self) -> Structure {
        self.push_text_until(self.source.len());
        self.structure
    }
}

/// Children of `node` in document order.
fn children(node: tree_sitter::Node<'_>) -> Vec<tree_sitter::Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Render a structure back into JSON text.
///
/// Text is written verbatim. An unchanged entity is written as it was spelled in the
/// source; a modified one is escaped as a fresh JSON string literal. Comments are
/// rendered element by element, so entities inside them are written too.
#[must_use]
pub fn render_json(structure: &impl ElementSequence) -> String {
    let mut out = String::new();
    render_elements(structure.elements(), &mut out);
    out
}

/// Appends `elements` to `out`, descending into comments.
fn render_elements(elements: &[Element], out: &mut String) {
    for element in elements {
        match element {
            Element::Text(text) => out.push_str(text),
            Element::Entity(entity) => match entity.raw() {
                Some(raw) => out.push_str(&raw),
                None => out.push_str(&Value::String(entity.value()).to_string()),
            },
            Element::Comment(comment) => render_elements(comment.elements(), out),
        }
    }
}
