//! Cached character names used to label dialogue speakers

use std::collections::HashMap;

use crate::script::{Character, CharacterId};

/// Read-only lookup from character id to display name
#[derive(Debug, Clone, Default)]
pub struct CharacterCatalog {
    names: HashMap<CharacterId, String>,
}

impl CharacterCatalog {
    pub fn new(characters: Vec<Character>) -> Self {
        let mut catalog = Self::default();
        catalog.replace(characters);
        catalog
    }

    /// Swap in a freshly fetched catalog
    pub fn replace(&mut self, characters: Vec<Character>) {
        self.names = characters.into_iter().map(|c| (c.id, c.name)).collect();
    }

    /// Display name of a character, or its raw id when unknown
    pub fn display_name<'a>(&'a self, id: &'a CharacterId) -> &'a str {
        self.names
            .get(id)
            .map(String::as_str)
            .unwrap_or_else(|| id.as_str())
    }

    pub fn contains(&self, id: &CharacterId) -> bool {
        self.names.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
