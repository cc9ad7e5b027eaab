//! Character model shared by every character set.
//!
//! Different sets use disjoint attribute vocabularies ("classic" talks
//! about hair colour and glasses, "fantasy" about race and class), so
//! attributes are a generic ordered map rather than a fixed struct.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single attribute value on a character.
///
/// `#[serde(untagged)]` makes serde try each variant in order, so the
/// JSON `true`, `180` and `"elf"` all land in the right variant without
/// any wrapper object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// `true` / `false`.
    Bool(bool),
    /// Any JSON number.
    Number(f64),
    /// Free text such as `"blonde"`.
    Text(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Attribute name → value. `BTreeMap` keeps the order stable, which
/// makes random attribute picks reproducible under a scripted RNG.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A full character, including its secret attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub image: String,
    pub attributes: Attributes,
}

impl Character {
    /// Returns the public face of this character (no attributes).
    pub fn card(&self) -> CharacterCard {
        CharacterCard {
            id: self.id.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
        }
    }
}

/// The public roster entry for a character: what every player may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterCard {
    pub id: String,
    pub name: String,
    pub image: String,
}

/// A named, validated collection of characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSet {
    /// File stem / lookup key, e.g. `"classic"`.
    pub id: String,
    /// Display name, e.g. `"Classic"`.
    pub set_name: String,
    pub description: String,
    pub characters: Vec<Character>,
}

impl CharacterSet {
    /// Looks up a character by its exact display name.
    pub fn find_by_name(&self, name: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_value_untagged_deserialize() {
        let attrs: Attributes = serde_json::from_str(
            r#"{"hasHat": true, "height": 180, "race": "elf"}"#,
        )
        .unwrap();
        assert_eq!(attrs["hasHat"], AttributeValue::Bool(true));
        assert_eq!(attrs["height"], AttributeValue::Number(180.0));
        assert_eq!(attrs["race"], AttributeValue::Text("elf".into()));
    }

    #[test]
    fn test_attribute_value_display() {
        assert_eq!(AttributeValue::from(true).to_string(), "true");
        assert_eq!(AttributeValue::from(180.0).to_string(), "180");
        assert_eq!(AttributeValue::from("red").to_string(), "red");
    }

    #[test]
    fn test_character_card_omits_attributes() {
        let character = Character {
            id: "alice".into(),
            name: "Alice".into(),
            image: "/images/characters/classic/alice.png".into(),
            attributes: [("hasGlasses".to_string(), true.into())]
                .into_iter()
                .collect(),
        };
        let json = serde_json::to_value(character.card()).unwrap();
        assert_eq!(json["name"], "Alice");
        assert!(json.get("attributes").is_none());
    }
}
