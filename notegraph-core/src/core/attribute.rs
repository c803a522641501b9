//! Labels, relations and the promoted-attribute definition mini-language.

use crate::{AttributeRow, NotegraphError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relation names created by the editor to track links inside note content.
const AUTO_LINK_NAMES: [&str; 4] = ["internalLink", "imageLink", "relationMapLink", "includeNoteLink"];

/// Whether an attribute is a plain label or a relation pointing at another note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    Label,
    Relation,
}

impl AttributeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Relation => "relation",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeType {
    type Err = NotegraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "label" => Ok(Self::Label),
            "relation" => Ok(Self::Relation),
            other => Err(NotegraphError::MalformedQuery(format!(
                "Unrecognized attribute type '{other}'. Only 'label' and 'relation' are possible values."
            ))),
        }
    }
}

/// Rejects attribute names written with their wire prefix (`#label`, `~relation`).
///
/// # Errors
///
/// Returns [`NotegraphError::MalformedQuery`] if `name` starts with `#` or `~`.
pub fn validate_attribute_name(name: &str) -> Result<()> {
    if name.starts_with('#') || name.starts_with('~') {
        return Err(NotegraphError::MalformedQuery(format!(
            "Attribute name '{name}' starts with '#' or '~'; pass the name without the prefix"
        )));
    }
    Ok(())
}

/// A label or relation owned by exactly one note.
///
/// Inherited attributes are not copies: the same `Attribute` is surfaced
/// through the effective attribute list of every note that inherits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub attribute_id: String,
    /// Owning note.
    pub note_id: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    pub name: String,
    pub value: String,
    pub position: i64,
    pub is_inheritable: bool,
}

impl Attribute {
    pub fn from_row(row: AttributeRow) -> Self {
        Self {
            attribute_id: row.attribute_id,
            note_id: row.note_id,
            attribute_type: row.attribute_type,
            name: row.name,
            value: row.value,
            position: row.position,
            is_inheritable: row.is_inheritable,
        }
    }

    pub fn is_label(&self) -> bool {
        self.attribute_type == AttributeType::Label
    }

    pub fn is_relation(&self) -> bool {
        self.attribute_type == AttributeType::Relation
    }

    /// The note a relation points at, or `None` for labels and empty relations.
    pub fn target_note_id(&self) -> Option<&str> {
        (self.is_relation() && !self.value.is_empty()).then_some(self.value.as_str())
    }

    /// True for relations maintained automatically from links in note content.
    pub fn is_auto_link(&self) -> bool {
        self.is_relation() && AUTO_LINK_NAMES.contains(&self.name.as_str())
    }

    /// True for `template`/`inherit` relations, which pull a target's attributes into the owner.
    pub fn is_inheritance_relation(&self) -> bool {
        self.is_relation() && (self.name == "template" || self.name == "inherit")
    }

    /// True for labels of the form `label:name` or `relation:name` carrying promoted metadata.
    pub fn is_definition(&self) -> bool {
        self.is_label() && (self.name.starts_with("label:") || self.name.starts_with("relation:"))
    }

    /// Parses the definition mini-language, or `None` when this is not a definition.
    pub fn definition(&self) -> Option<AttributeDefinition> {
        self.is_definition().then(|| AttributeDefinition::parse(&self.value))
    }

    /// The attribute in `#name=value` / `~name=value` notation.
    pub fn to_wire_string(&self) -> String {
        let marker = match self.attribute_type {
            AttributeType::Label => '#',
            AttributeType::Relation => '~',
        };
        if self.value.is_empty() {
            format!("{marker}{}", self.name)
        } else {
            format!("{marker}{}={}", self.name, self.value)
        }
    }
}

/// Value type of a promoted label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelType {
    Text,
    Number,
    Boolean,
    Date,
    DateTime,
    Time,
    Url,
    Color,
}

impl LabelType {
    fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "text" => Self::Text,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "time" => Self::Time,
            "url" => Self::Url,
            "color" => Self::Color,
            _ => return None,
        })
    }
}

/// Whether a promoted attribute accepts one value or many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    Single,
    Multi,
}

/// Promoted-attribute metadata parsed from a definition label's value,
/// e.g. `promoted,number,single,precision=2,alias=Price`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDefinition {
    pub is_promoted: bool,
    pub label_type: Option<LabelType>,
    pub multiplicity: Option<Multiplicity>,
    pub number_precision: Option<u32>,
    pub promoted_alias: Option<String>,
    pub inverse_relation: Option<String>,
}

impl AttributeDefinition {
    /// Parses the comma-separated token list. Unknown or malformed tokens are
    /// logged and skipped, so the result is always usable.
    pub fn parse(value: &str) -> Self {
        let mut def = Self::default();

        for token in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token == "promoted" {
                def.is_promoted = true;
            } else if let Some(label_type) = LabelType::from_token(token) {
                def.label_type = Some(label_type);
            } else if token == "single" {
                def.multiplicity = Some(Multiplicity::Single);
            } else if token == "multi" {
                def.multiplicity = Some(Multiplicity::Multi);
            } else if let Some(raw) = token_value(token, "precision") {
                match raw.parse::<u32>() {
                    Ok(precision) => def.number_precision = Some(precision),
                    Err(e) => log::warn!("Ignoring number precision '{raw}': {e}"),
                }
            } else if let Some(alias) = token_value(token, "alias") {
                def.promoted_alias = Some(alias.to_string());
            } else if let Some(inverse) = token_value(token, "inverse") {
                def.inverse_relation = Some(inverse.to_string());
            } else {
                log::warn!("Unrecognized attribute definition token: {token}");
            }
        }

        def
    }
}

fn token_value<'a>(token: &'a str, key: &str) -> Option<&'a str> {
    let (name, value) = token.split_once('=')?;
    (name.trim() == key).then(|| value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str, value: &str) -> Attribute {
        Attribute {
            attribute_id: "a1".to_string(),
            note_id: "n1".to_string(),
            attribute_type: AttributeType::Label,
            name: name.to_string(),
            value: value.to_string(),
            position: 10,
            is_inheritable: false,
        }
    }

    #[test]
    fn test_attribute_type_from_str() {
        assert_eq!("relation".parse::<AttributeType>().unwrap(), AttributeType::Relation);
        assert!(matches!(
            "tag".parse::<AttributeType>(),
            Err(NotegraphError::MalformedQuery(_))
        ));
    }

    #[test]
    fn test_validate_attribute_name() {
        assert!(validate_attribute_name("color").is_ok());
        assert!(validate_attribute_name("#color").is_err());
        assert!(validate_attribute_name("~template").is_err());
    }

    #[test]
    fn test_parse_full_definition() {
        let def = AttributeDefinition::parse("promoted, number ,single,precision=2,alias=Price");
        assert!(def.is_promoted);
        assert_eq!(def.label_type, Some(LabelType::Number));
        assert_eq!(def.multiplicity, Some(Multiplicity::Single));
        assert_eq!(def.number_precision, Some(2));
        assert_eq!(def.promoted_alias.as_deref(), Some("Price"));
        assert_eq!(def.inverse_relation, None);
    }

    #[test]
    fn test_parse_degrades_on_bad_tokens() {
        let def = AttributeDefinition::parse("promoted,precision=abc,sparkly,multi,inverse=parentOf");
        assert!(def.is_promoted);
        assert_eq!(def.number_precision, None);
        assert_eq!(def.multiplicity, Some(Multiplicity::Multi));
        assert_eq!(def.inverse_relation.as_deref(), Some("parentOf"));
    }

    #[test]
    fn test_definition_only_for_prefixed_labels() {
        assert!(label("label:price", "promoted").definition().is_some());
        assert!(label("relation:author", "promoted").is_definition());
        assert!(label("price", "promoted").definition().is_none());
    }

    #[test]
    fn test_relation_helpers() {
        let mut attr = label("template", "tpl");
        assert_eq!(attr.target_note_id(), None);
        assert!(!attr.is_inheritance_relation());

        attr.attribute_type = AttributeType::Relation;
        assert_eq!(attr.target_note_id(), Some("tpl"));
        assert!(attr.is_inheritance_relation());
        assert_eq!(attr.to_wire_string(), "~template=tpl");

        attr.name = "imageLink".to_string();
        assert!(attr.is_auto_link());
    }
}
