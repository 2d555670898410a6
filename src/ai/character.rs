//! Personas the assistant can take on. Each session has its own
//! catalog so custom characters never leak between users.

use serde::Serialize;

use crate::ai::chat::error::{ChatError, Result};

const BUILTIN_CHARACTERS: &[(&str, &str)] = &[
    (
        "Professor AI",
        "You are an esteemed professor with deep knowledge across various disciplines. \
         You explain complex concepts in a clear, engaging way, using historical context, \
         examples, and structured reasoning to guide your students.",
    ),
    (
        "Comedian Bot",
        "You are a hilarious AI comedian who sees humor in everything. \
         You turn even the most serious conversations into lighthearted moments, using witty remarks, puns, and jokes.",
    ),
    (
        "Motivator AI",
        "You are a high-energy motivational speaker, always uplifting and encouraging. \
         You inspire people to chase their dreams, overcome adversity, and unlock their full potential \
         with powerful words and actionable advice.",
    ),
    (
        "Detective Noir",
        "You are a 1940s-style detective, full of grit and street smarts. \
         You speak in a noir film style, piecing together clues with dramatic flair, \
         always looking for the next big case in the shadows of the city.",
    ),
    (
        "Culinary Maestro",
        "You are a world-renowned chef with expertise in fine dining, exotic cuisines, and culinary science. \
         You give detailed cooking instructions, ingredient recommendations, and pro tips for gourmet meals.",
    ),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Character {
    pub name: String,
    #[serde(rename = "prompt")]
    pub system_prompt: String,
}

impl Character {
    pub fn new(name: &str, system_prompt: &str) -> Self {
        Self {
            name: name.to_string(),
            system_prompt: system_prompt.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CharacterCatalog {
    builtins: Vec<Character>,
    custom: Vec<Character>,
}

impl Default for CharacterCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CharacterCatalog {
    /// Catalog with only the built-in characters
    pub fn builtin() -> Self {
        let builtins = BUILTIN_CHARACTERS
            .iter()
            .map(|(name, prompt)| Character::new(name, prompt))
            .collect();
        Self {
            builtins,
            custom: Vec::new(),
        }
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.iter().any(|c| c.name == name)
    }

    pub fn resolve(&self, name: &str) -> Option<&Character> {
        self.builtins
            .iter()
            .chain(self.custom.iter())
            .find(|c| c.name == name)
    }

    /// Adds a custom character or replaces the prompt of an existing
    /// one. Built-in characters can't be overridden.
    pub fn register_custom(&mut self, name: &str, prompt: &str) -> Result<&Character> {
        let name = name.trim();
        let prompt = prompt.trim();
        if name.is_empty() {
            return Err(ChatError::InvalidInput(
                "Custom character name is required".to_string(),
            ));
        }
        if prompt.is_empty() {
            return Err(ChatError::InvalidInput(format!(
                "Custom character {} needs a description",
                name
            )));
        }
        if self.is_builtin(name) {
            return Err(ChatError::InvalidInput(format!(
                "{} is a built-in character and can't be redefined",
                name
            )));
        }

        let idx = match self.custom.iter().position(|c| c.name == name) {
            Some(idx) => {
                self.custom[idx].system_prompt = prompt.to_string();
                idx
            }
            None => {
                self.custom.push(Character::new(name, prompt));
                self.custom.len() - 1
            }
        };
        Ok(&self.custom[idx])
    }

    /// Built-ins first in their fixed order, then custom characters
    /// in the order they were registered.
    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.builtins.iter().chain(self.custom.iter())
    }

    pub fn builtins(&self) -> &[Character] {
        &self.builtins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order() {
        let catalog = CharacterCatalog::builtin();
        let names: Vec<&str> = catalog.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Professor AI",
                "Comedian Bot",
                "Motivator AI",
                "Detective Noir",
                "Culinary Maestro"
            ]
        );
    }

    #[test]
    fn test_resolve_builtin() {
        let catalog = CharacterCatalog::builtin();
        let detective = catalog.resolve("Detective Noir").unwrap();
        assert!(detective.system_prompt.starts_with("You are a 1940s-style detective"));
        assert!(catalog.resolve("Nobody").is_none());
    }

    #[test]
    fn test_register_custom() {
        let mut catalog = CharacterCatalog::builtin();
        catalog.register_custom("Pirate", "Arrr").unwrap();

        assert_eq!(catalog.resolve("Pirate").unwrap().system_prompt, "Arrr");
        assert!(!catalog.is_builtin("Pirate"));
        assert_eq!(catalog.iter().last().unwrap().name, "Pirate");
    }

    #[test]
    fn test_register_custom_replaces_prompt() {
        let mut catalog = CharacterCatalog::builtin();
        catalog.register_custom("Pirate", "Arrr").unwrap();
        catalog.register_custom("Pirate", "Yo ho ho").unwrap();

        assert_eq!(catalog.resolve("Pirate").unwrap().system_prompt, "Yo ho ho");
        assert_eq!(catalog.iter().filter(|c| c.name == "Pirate").count(), 1);
    }

    #[test]
    fn test_register_custom_rejects_builtin_and_blank() {
        let mut catalog = CharacterCatalog::builtin();
        assert!(matches!(
            catalog.register_custom("Comedian Bot", "Not funny"),
            Err(ChatError::InvalidInput(_))
        ));
        assert!(matches!(
            catalog.register_custom("  ", "Arrr"),
            Err(ChatError::InvalidInput(_))
        ));
        assert!(matches!(
            catalog.register_custom("Pirate", " "),
            Err(ChatError::InvalidInput(_))
        ));
    }
}
