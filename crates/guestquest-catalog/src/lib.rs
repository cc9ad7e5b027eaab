//! Character sets for Guest Quest.
//!
//! A character set is a named list of characters, each with a display
//! name, an image path and a bag of attributes that players ask about.
//! The game core only reads from the catalog:
//!
//! - [`CharacterCatalog::list_set_ids`]
//! - [`CharacterCatalog::list_set_names`]
//! - [`CharacterCatalog::get_set`]
//!
//! Two sets (`classic` and `fantasy`) are compiled in. More can be loaded
//! from a directory of `<setId>.json` files with
//! [`CharacterCatalog::load_dir`].

mod catalog;
mod error;
mod model;

pub use catalog::CharacterCatalog;
pub use error::CatalogError;
pub use model::{
    AttributeValue, Attributes, Character, CharacterCard, CharacterSet,
};
