use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::finale::{ClueSheet, FinalInstructions, MusicClip};
use crate::validator::is_valid;

/// A mini-game and the quote fragment it rewards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Canonical fragment text, recorded on completion.
    pub fragment: String,
    /// Other phrasings accepted for the fragment.
    #[serde(default)]
    pub alternates: Vec<String>,
}

impl Challenge {
    pub fn accepted_texts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.fragment.as_str()).chain(self.alternates.iter().map(String::as_str))
    }

    /// First word of the fragment, shown after a wrong answer.
    #[must_use]
    pub fn hint(&self) -> &str {
        self.fragment.split(' ').next().unwrap_or_default()
    }
}

/// A stop of the virtual tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

/// Everything the hunt needs to know about its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Challenges in quote order.
    pub challenges: Vec<Challenge>,
    pub complete_quote: String,
    #[serde(default)]
    pub visits: Vec<Visit>,
    #[serde(default)]
    pub clips: Vec<MusicClip>,
    #[serde(default)]
    pub clues: ClueSheet,
    #[serde(default)]
    pub instructions: FinalInstructions,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog has no challenges")]
    NoChallenges,
    #[error("challenge at position {0} has a blank id")]
    BlankId(usize),
    #[error("duplicate challenge id: {0}")]
    DuplicateId(String),
    #[error("challenge {0} has a blank fragment")]
    BlankFragment(String),
    #[error("duplicate visit id: {0}")]
    DuplicateVisit(String),
    #[error("clue slot {0} has no accepted answer")]
    EmptyClueSlot(usize),
    #[error("fragments do not reassemble into the complete quote")]
    QuoteMismatch,
}

const EMBEDDED_CATALOG: &str = include_str!("../data/catalog.json");

impl Catalog {
    /// Load a catalog from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Catalog bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled JSON is malformed.
    pub fn embedded() -> Result<Self, serde_json::Error> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    #[must_use]
    pub fn challenge(&self, id: &str) -> Option<&Challenge> {
        self.challenges.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn challenge_at(&self, index: usize) -> Option<&Challenge> {
        self.challenges.get(index)
    }

    #[must_use]
    pub fn visit(&self, id: &str) -> Option<&Visit> {
        self.visits.iter().find(|v| v.id == id)
    }

    #[must_use]
    pub fn total_challenges(&self) -> usize {
        self.challenges.len()
    }

    /// Fragments in quote order joined with single spaces.
    #[must_use]
    pub fn assembled_quote(&self) -> String {
        self.challenges
            .iter()
            .map(|c| c.fragment.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check the catalog is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.challenges.is_empty() {
            return Err(CatalogError::NoChallenges);
        }
        let mut ids = HashSet::new();
        for (index, challenge) in self.challenges.iter().enumerate() {
            if challenge.id.trim().is_empty() {
                return Err(CatalogError::BlankId(index));
            }
            if !ids.insert(challenge.id.as_str()) {
                return Err(CatalogError::DuplicateId(challenge.id.clone()));
            }
            if challenge.fragment.trim().is_empty() {
                return Err(CatalogError::BlankFragment(challenge.id.clone()));
            }
        }
        let mut visits = HashSet::new();
        for visit in &self.visits {
            if !visits.insert(visit.id.as_str()) {
                return Err(CatalogError::DuplicateVisit(visit.id.clone()));
            }
        }
        for (slot, accepted) in self.clues.valid_clues.iter().enumerate() {
            if accepted.iter().all(|answer| answer.trim().is_empty()) {
                return Err(CatalogError::EmptyClueSlot(slot));
            }
        }
        if !is_valid(&self.assembled_quote(), [&self.complete_quote]) {
            return Err(CatalogError::QuoteMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_is_consistent() {
        let catalog = Catalog::embedded().unwrap();
        assert_eq!(catalog.total_challenges(), 6);
        assert_eq!(catalog.validate(), Ok(()));
        assert_eq!(
            catalog.challenge("puzzle").map(|c| c.fragment.as_str()),
            Some("L'éducation est")
        );
        assert_eq!(catalog.challenge_at(5).unwrap().id, "riddle");
        assert!(catalog.visit("library").is_some());
        assert!(catalog.visit("attic").is_none());
    }

    #[test]
    fn hint_is_first_word() {
        let catalog = Catalog::embedded().unwrap();
        assert_eq!(catalog.challenge("quiz").unwrap().hint(), "l'arme");
        assert_eq!(catalog.challenge("riddle").unwrap().hint(), "-");
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let json = r#"{
            "challenges": [
                { "id": "solo", "name": "Solo", "fragment": "Bonjour", "alternates": ["Salut"] }
            ],
            "completeQuote": "Bonjour !",
            "clues": { "validClues": [["a"], ["b"], ["c"]] }
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert!(catalog.visits.is_empty());
        let accepted: Vec<&str> = catalog.challenges[0].accepted_texts().collect();
        assert_eq!(accepted, vec!["Bonjour", "Salut"]);
        assert_eq!(catalog.validate(), Ok(()));
    }

    #[test]
    fn validation_reports_problems() {
        let mut catalog = Catalog::embedded().unwrap();
        catalog.challenges[1].id = "puzzle".into();
        assert_eq!(
            catalog.validate(),
            Err(CatalogError::DuplicateId("puzzle".into()))
        );

        let mut catalog = Catalog::embedded().unwrap();
        catalog.complete_quote = "Autre chose".into();
        assert_eq!(catalog.validate(), Err(CatalogError::QuoteMismatch));

        let mut catalog = Catalog::embedded().unwrap();
        catalog.clues.valid_clues[2].clear();
        assert_eq!(catalog.validate(), Err(CatalogError::EmptyClueSlot(2)));

        let mut catalog = Catalog::embedded().unwrap();
        catalog.challenges[0].fragment = " ".into();
        assert_eq!(
            catalog.validate(),
            Err(CatalogError::BlankFragment("puzzle".into()))
        );

        assert_eq!(Catalog::default().validate(), Err(CatalogError::NoChallenges));
    }
}
