//! User-declared document schemas.
//!
//! A schema is a nested tree declared as JSON: internal nodes are objects,
//! leaves are the strings `"text"`, `"number"` or `"boolean"`. Each leaf is
//! addressed by its *flat path*, the dotted concatenation of field names from
//! the root (`author.name`). The schema is fixed at engine construction and
//! drives both index layout and per-insert document validation.

use serde_json::Value;

use crate::error::{Result, SearchError};

/// Type of a schema leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LeafKind {
    Text,
    Number,
    Boolean,
}

impl LeafKind {
    fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// A typed leaf value extracted from a document.
#[derive(Debug, Clone, Copy)]
pub(crate) enum LeafValue<'a> {
    Text(&'a str),
    Number(f64),
    Boolean(bool),
}

/// A parsed schema tree.
#[derive(Debug, Clone)]
pub(crate) enum Schema {
    /// Internal node; fields in deterministic (key-sorted) order.
    Object(Vec<(String, Schema)>),
    Leaf(LeafKind),
}

impl Schema {
    /// Parse a schema declaration.
    ///
    /// The root must be an object; every value below it must be another
    /// object or one of the known leaf names.
    pub(crate) fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(fields) => {
                let mut children = Vec::with_capacity(fields.len());
                for (name, child) in fields {
                    children.push((name.clone(), Self::from_value(child)?));
                }
                Ok(Self::Object(children))
            }
            Value::String(leaf) => match leaf.as_str() {
                "text" => Ok(Self::Leaf(LeafKind::Text)),
                "number" => Ok(Self::Leaf(LeafKind::Number)),
                "boolean" => Ok(Self::Leaf(LeafKind::Boolean)),
                other => Err(SearchError::InvalidSchemaType {
                    found: format!("string '{other}'"),
                }),
            },
            other => Err(SearchError::InvalidSchemaType {
                found: json_type_name(other).to_string(),
            }),
        }
    }

    /// All leaves with their flat paths, in depth-first declaration order.
    pub(crate) fn leaves(&self) -> Vec<(String, LeafKind)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut String::new(), &mut out);
        out
    }

    fn collect_leaves(&self, prefix: &mut String, out: &mut Vec<(String, LeafKind)>) {
        match self {
            Self::Leaf(kind) => out.push((prefix.clone(), *kind)),
            Self::Object(children) => {
                for (name, child) in children {
                    let saved = prefix.len();
                    if !prefix.is_empty() {
                        prefix.push('.');
                    }
                    prefix.push_str(name);
                    child.collect_leaves(prefix, out);
                    prefix.truncate(saved);
                }
            }
        }
    }

    /// Flat paths of every text leaf.
    pub(crate) fn text_paths(&self) -> Vec<String> {
        self.leaves()
            .into_iter()
            .filter(|(_, kind)| *kind == LeafKind::Text)
            .map(|(path, _)| path)
            .collect()
    }

    /// Check a document against the schema.
    ///
    /// Every key present in the document must exist in the schema with a
    /// matching type; keys the document omits are fine. Validation errors
    /// from nested objects propagate.
    pub(crate) fn validate_document(&self, doc: &Value) -> Result<()> {
        self.validate_node(doc, &mut String::new())
    }

    fn validate_node(&self, value: &Value, path: &mut String) -> Result<()> {
        let describe = |path: &str| {
            if path.is_empty() {
                "document root".to_string()
            } else {
                format!("field '{path}'")
            }
        };
        match self {
            Self::Object(children) => {
                let Value::Object(fields) = value else {
                    return Err(SearchError::doc_schema(format!(
                        "{} must be an object, found {}",
                        describe(path),
                        json_type_name(value)
                    )));
                };
                for (name, field_value) in fields {
                    let saved = path.len();
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(name);
                    let child = children.iter().find(|(child_name, _)| child_name == name);
                    match child {
                        Some((_, child_schema)) => {
                            child_schema.validate_node(field_value, path)?;
                        }
                        None => {
                            return Err(SearchError::doc_schema(format!(
                                "unknown {}",
                                describe(path)
                            )));
                        }
                    }
                    path.truncate(saved);
                }
                Ok(())
            }
            Self::Leaf(kind) => {
                let matches = match kind {
                    LeafKind::Text => value.is_string(),
                    LeafKind::Number => value
                        .as_f64()
                        .is_some_and(f64::is_finite),
                    LeafKind::Boolean => value.is_boolean(),
                };
                if matches {
                    Ok(())
                } else {
                    Err(SearchError::doc_schema(format!(
                        "{} must be {}, found {}",
                        describe(path),
                        kind.name(),
                        json_type_name(value)
                    )))
                }
            }
        }
    }

    /// Visit every schema-declared leaf present in `doc` with its flat path.
    ///
    /// Assumes the document already passed [`Self::validate_document`].
    pub(crate) fn walk_document<'doc>(
        &self,
        doc: &'doc Value,
        f: &mut impl FnMut(&str, LeafValue<'doc>),
    ) {
        self.walk_node(doc, &mut String::new(), f);
    }

    fn walk_node<'doc>(
        &self,
        value: &'doc Value,
        path: &mut String,
        f: &mut impl FnMut(&str, LeafValue<'doc>),
    ) {
        match self {
            Self::Object(children) => {
                let Value::Object(fields) = value else {
                    return;
                };
                for (name, child) in children {
                    let Some(field_value) = fields.get(name) else {
                        continue;
                    };
                    let saved = path.len();
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(name);
                    child.walk_node(field_value, path, f);
                    path.truncate(saved);
                }
            }
            Self::Leaf(kind) => {
                let leaf = match kind {
                    LeafKind::Text => value.as_str().map(LeafValue::Text),
                    LeafKind::Number => value.as_f64().map(LeafValue::Number),
                    LeafKind::Boolean => value.as_bool().map(LeafValue::Boolean),
                };
                if let Some(leaf) = leaf {
                    f(path, leaf);
                }
            }
        }
    }
}

/// JSON type name for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use serde_json::json;

    fn book_schema() -> Schema {
        Schema::from_value(&json!({
            "title": "text",
            "year": "number",
            "inStock": "boolean",
            "author": { "name": "text" },
        }))
        .unwrap()
    }

    #[test]
    fn leaves_use_dotted_flat_paths() {
        let schema = book_schema();
        let leaves = schema.leaves();
        check!(leaves.contains(&("title".to_string(), LeafKind::Text)));
        check!(leaves.contains(&("year".to_string(), LeafKind::Number)));
        check!(leaves.contains(&("inStock".to_string(), LeafKind::Boolean)));
        check!(leaves.contains(&("author.name".to_string(), LeafKind::Text)));
    }

    #[test]
    fn text_paths_filters_by_kind() {
        let mut paths = book_schema().text_paths();
        paths.sort();
        check!(paths == vec!["author.name".to_string(), "title".to_string()]);
    }

    #[test]
    fn unknown_leaf_name_is_invalid_schema_type() {
        let err = Schema::from_value(&json!({ "title": "blob" })).unwrap_err();
        check!(matches!(err, SearchError::InvalidSchemaType { .. }));
    }

    #[test]
    fn non_object_non_string_is_invalid_schema_type() {
        let err = Schema::from_value(&json!({ "title": 42 })).unwrap_err();
        check!(err == SearchError::InvalidSchemaType { found: "number".to_string() });
    }

    #[test]
    fn valid_document_passes() {
        let schema = book_schema();
        let doc = json!({
            "title": "The Lyra Book",
            "year": 2022,
            "inStock": true,
            "author": { "name": "Daniele" },
        });
        check!(schema.validate_document(&doc) == Ok(()));
    }

    #[test]
    fn partial_document_passes() {
        let schema = book_schema();
        check!(schema.validate_document(&json!({ "title": "Sparse" })) == Ok(()));
    }

    #[test]
    fn wrong_leaf_type_is_rejected() {
        let schema = book_schema();
        let err = schema.validate_document(&json!({ "title": 42 })).unwrap_err();
        check!(matches!(err, SearchError::InvalidDocSchema { .. }));
        check!(err.to_string().contains("title"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let schema = book_schema();
        let err = schema
            .validate_document(&json!({ "publisher": "nobody" }))
            .unwrap_err();
        check!(err.to_string().contains("publisher"));
    }

    #[test]
    fn nested_validation_errors_propagate() {
        let schema = book_schema();
        let err = schema
            .validate_document(&json!({ "author": { "name": 7 } }))
            .unwrap_err();
        check!(matches!(err, SearchError::InvalidDocSchema { .. }));
        check!(err.to_string().contains("author.name"));
    }

    #[test]
    fn walk_visits_present_leaves_only() {
        let schema = book_schema();
        let doc = json!({ "title": "Short", "author": { "name": "D" } });
        let mut seen = Vec::new();
        schema.walk_document(&doc, &mut |path, _| seen.push(path.to_string()));
        seen.sort();
        check!(seen == vec!["author.name".to_string(), "title".to_string()]);
    }
}
