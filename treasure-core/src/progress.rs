//! Visitor progress: completed challenges and collected quote fragments.
//!
//! [`ProgressStore`] is the single owner of a visitor's [`ProgressRecord`].
//! Every mutation writes the whole record back to storage; storage failures
//! are logged and the session carries on in memory.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::finale::FinalSubmission;
use crate::storage::{KeyValueStorage, PROGRESS_KEY};

/// Persisted progress of one visitor.
///
/// Field names match the JSON the site has always written so existing
/// browsers keep their progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressRecord {
    pub completed_games: Vec<String>,
    pub quote_fragments: BTreeMap<String, String>,
    pub current_visit: Option<String>,
    #[serde(deserialize_with = "lenient_submission")]
    pub final_submission: Option<FinalSubmission>,
}

/// A submission in an unexpected shape is dropped on its own instead of
/// taking the rest of the record with it.
fn lenient_submission<'de, D>(deserializer: D) -> Result<Option<FinalSubmission>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| {
        serde_json::from_value(value)
            .map_err(|err| log::warn!("ignoring unreadable final submission: {err}"))
            .ok()
    }))
}

impl ProgressRecord {
    /// Parse a stored record. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON object of the right shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed_games.is_empty()
            && self.quote_fragments.is_empty()
            && self.current_visit.is_none()
            && self.final_submission.is_none()
    }

    /// Bring the completed list and the fragment map back in lockstep.
    ///
    /// Duplicate and blank ids are dropped, completions without a fragment
    /// are dropped, and fragments recorded without a completion are
    /// appended to the completed list in key order. Returns `true` if
    /// anything changed.
    pub fn reconcile(&mut self) -> bool {
        let before = self.clone();

        self.quote_fragments.retain(|id, _| !id.trim().is_empty());
        let mut seen = Vec::with_capacity(self.completed_games.len());
        for id in std::mem::take(&mut self.completed_games) {
            if self.quote_fragments.contains_key(&id) && !seen.contains(&id) {
                seen.push(id);
            }
        }
        for id in self.quote_fragments.keys() {
            if !seen.contains(id) {
                seen.push(id.clone());
            }
        }
        self.completed_games = seen;

        *self != before
    }
}

/// Whether mutations currently reach durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    Durable,
    /// A storage call failed earlier in this session; progress is kept in
    /// memory only until the next page load.
    MemoryOnly,
}

/// Single authoritative progress tracker for one visitor.
#[derive(Debug)]
pub struct ProgressStore<S: KeyValueStorage> {
    storage: S,
    record: ProgressRecord,
    persistence: Persistence,
}

impl<S: KeyValueStorage> ProgressStore<S> {
    /// Load the persisted record, or start empty.
    ///
    /// Missing, unreadable or malformed state is treated as "no state";
    /// the cause is logged and never surfaced.
    pub fn load(storage: S) -> Self {
        let mut persistence = Persistence::Durable;
        let record = match storage.get_item(PROGRESS_KEY) {
            Ok(Some(json)) => match ProgressRecord::from_json(&json) {
                Ok(mut record) => {
                    if record.reconcile() {
                        log::warn!("progress record was out of sync and has been repaired");
                    }
                    record
                }
                Err(err) => {
                    log::warn!("discarding malformed progress record: {err}");
                    ProgressRecord::default()
                }
            },
            Ok(None) => {
                log::debug!("no saved progress, starting fresh");
                ProgressRecord::default()
            }
            Err(err) => {
                log::warn!("progress storage unavailable, keeping progress in memory: {err}");
                persistence = Persistence::MemoryOnly;
                ProgressRecord::default()
            }
        };
        Self {
            storage,
            record,
            persistence,
        }
    }

    #[must_use]
    pub const fn record(&self) -> &ProgressRecord {
        &self.record
    }

    #[must_use]
    pub const fn persistence(&self) -> Persistence {
        self.persistence
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub fn is_completed(&self, challenge_id: &str) -> bool {
        self.record
            .completed_games
            .iter()
            .any(|id| id == challenge_id)
    }

    /// Mark a challenge complete and keep its reward fragment.
    ///
    /// The first completion wins: an already completed or blank id returns
    /// `false` and changes nothing.
    pub fn complete_challenge(&mut self, challenge_id: &str, fragment_text: &str) -> bool {
        if challenge_id.trim().is_empty() {
            log::debug!("ignoring completion with a blank challenge id");
            return false;
        }
        if self.is_completed(challenge_id) {
            return false;
        }
        self.record.completed_games.push(challenge_id.to_string());
        self.record
            .quote_fragments
            .insert(challenge_id.to_string(), fragment_text.to_string());
        log::debug!("challenge {challenge_id} completed");
        self.persist();
        true
    }

    /// Fragments of completed challenges, in completion order.
    #[must_use]
    pub fn collected_fragments(&self) -> Vec<&str> {
        self.record
            .completed_games
            .iter()
            .filter_map(|id| self.record.quote_fragments.get(id))
            .map(String::as_str)
            .collect()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.record.completed_games.len()
    }

    /// Collected fragments joined with single spaces.
    #[must_use]
    pub fn complete_quote(&self) -> String {
        self.collected_fragments().join(" ")
    }

    /// Forget everything. Callers confirm with the visitor first.
    pub fn reset(&mut self) {
        self.record = ProgressRecord::default();
        log::info!("progress reset");
        self.persist();
    }

    pub fn set_current_tour_selection(&mut self, visit_id: Option<&str>) {
        self.record.current_visit = visit_id.map(str::to_string);
        self.persist();
    }

    #[must_use]
    pub fn current_tour_selection(&self) -> Option<&str> {
        self.record.current_visit.as_deref()
    }

    pub fn record_final_submission(&mut self, submission: FinalSubmission) {
        self.record.final_submission = Some(submission);
        self.persist();
    }

    #[must_use]
    pub const fn final_submission(&self) -> Option<&FinalSubmission> {
        self.record.final_submission.as_ref()
    }

    fn persist(&mut self) {
        if self.persistence == Persistence::MemoryOnly {
            log::debug!("progress kept in memory only");
            return;
        }
        let json = match serde_json::to_string(&self.record) {
            Ok(json) => json,
            Err(err) => {
                log::error!("failed to serialize progress: {err}");
                return;
            }
        };
        if let Err(err) = self.storage.set_item(PROGRESS_KEY, &json) {
            log::warn!("failed to save progress, continuing in memory: {err}");
            self.persistence = Persistence::MemoryOnly;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, UnavailableStorage};

    fn fresh() -> (MemoryStorage, ProgressStore<MemoryStorage>) {
        let storage = MemoryStorage::new();
        let store = ProgressStore::load(storage.clone());
        (storage, store)
    }

    #[test]
    fn first_completion_wins() {
        let (_, mut store) = fresh();
        assert!(store.complete_challenge("quiz", "l'arme la plus puissante"));
        assert!(!store.complete_challenge("quiz", "something else"));
        assert!(store.is_completed("quiz"));
        assert_eq!(store.collected_fragments(), vec!["l'arme la plus puissante"]);
    }

    #[test]
    fn fragments_follow_completion_order() {
        let (_, mut store) = fresh();
        store.complete_challenge("riddle", "- Nelson Mandela");
        store.complete_challenge("puzzle", "L'éducation est");
        assert_eq!(
            store.collected_fragments(),
            vec!["- Nelson Mandela", "L'éducation est"]
        );
        assert_eq!(store.complete_quote(), "- Nelson Mandela L'éducation est");
    }

    #[test]
    fn blank_ids_are_ignored() {
        let (storage, mut store) = fresh();
        assert!(!store.complete_challenge("", "x"));
        assert!(!store.complete_challenge("   ", "x"));
        assert!(!store.is_completed(""));
        assert!(storage.raw(PROGRESS_KEY).is_none());
    }

    #[test]
    fn reset_clears_everything_and_persists() {
        let (storage, mut store) = fresh();
        store.complete_challenge("puzzle", "L'éducation est");
        store.set_current_tour_selection(Some("library"));
        store.reset();
        assert!(!store.is_completed("puzzle"));
        assert!(store.collected_fragments().is_empty());
        assert!(store.current_tour_selection().is_none());

        let reloaded = ProgressStore::load(storage);
        assert!(reloaded.record().is_empty());
    }

    #[test]
    fn reload_restores_progress() {
        let (storage, mut store) = fresh();
        store.complete_challenge("memory", "que vous puissiez utiliser");
        store.set_current_tour_selection(Some("science"));

        let reloaded = ProgressStore::load(storage);
        assert!(reloaded.is_completed("memory"));
        assert_eq!(
            reloaded.collected_fragments(),
            vec!["que vous puissiez utiliser"]
        );
        assert_eq!(reloaded.current_tour_selection(), Some("science"));
    }

    #[test]
    fn malformed_state_is_discarded() {
        let storage = MemoryStorage::new();
        storage.put_raw(PROGRESS_KEY, "{not json");
        let store = ProgressStore::load(storage);
        assert!(store.record().is_empty());
        assert_eq!(store.persistence(), Persistence::Durable);
    }

    #[test]
    fn legacy_record_without_optional_fields_loads() {
        let storage = MemoryStorage::new();
        storage.put_raw(
            PROGRESS_KEY,
            r#"{"completedGames":["puzzle"],"quoteFragments":{"puzzle":"L'éducation est"}}"#,
        );
        let store = ProgressStore::load(storage);
        assert!(store.is_completed("puzzle"));
        assert!(store.current_tour_selection().is_none());
        assert!(store.final_submission().is_none());
    }

    #[test]
    fn foreign_final_submission_keeps_progress() {
        let storage = MemoryStorage::new();
        storage.put_raw(
            PROGRESS_KEY,
            r#"{"completedGames":["puzzle"],"quoteFragments":{"puzzle":"L'éducation est"},"currentVisit":"arts","finalSubmission":{"clues":["a","b"]}}"#,
        );
        let store = ProgressStore::load(storage);
        assert!(store.is_completed("puzzle"));
        assert_eq!(store.collected_fragments(), vec!["L'éducation est"]);
        assert_eq!(store.current_tour_selection(), Some("arts"));
        assert!(store.final_submission().is_none());
    }

    #[test]
    fn final_submission_survives_reload() {
        let (storage, mut store) = fresh();
        store.record_final_submission(FinalSubmission {
            title: "Souvenirs".into(),
            author_name: "Sacha".into(),
            clues: ["a".into(), "b".into(), "c".into()],
            word_count: 210,
            submitted_at: None,
        });
        let reloaded = ProgressStore::load(storage);
        assert_eq!(reloaded.final_submission().map(|s| s.word_count), Some(210));
    }

    #[test]
    fn load_repairs_out_of_sync_records() {
        let storage = MemoryStorage::new();
        storage.put_raw(
            PROGRESS_KEY,
            r#"{"completedGames":["quiz","puzzle","quiz"],"quoteFragments":{"puzzle":"a","hangman":"b"},"currentVisit":null}"#,
        );
        let store = ProgressStore::load(storage);
        assert_eq!(store.record().completed_games, vec!["puzzle", "hangman"]);
        assert!(!store.is_completed("quiz"));
        assert_eq!(store.collected_fragments(), vec!["a", "b"]);
    }

    #[test]
    fn rejected_writes_degrade_to_memory() {
        let storage = MemoryStorage::new();
        let mut store = ProgressStore::load(storage.read_only());
        assert_eq!(store.persistence(), Persistence::Durable);
        assert!(store.complete_challenge("quiz", "l'arme la plus puissante"));
        assert_eq!(store.persistence(), Persistence::MemoryOnly);
        assert!(store.is_completed("quiz"));
        assert!(store.complete_challenge("memory", "que vous puissiez utiliser"));
        assert_eq!(store.completed_count(), 2);
        assert!(storage.raw(PROGRESS_KEY).is_none());
    }

    #[test]
    fn missing_backend_starts_in_memory() {
        let mut store = ProgressStore::load(UnavailableStorage);
        assert_eq!(store.persistence(), Persistence::MemoryOnly);
        assert!(store.complete_challenge("puzzle", "L'éducation est"));
        store.reset();
        assert!(!store.is_completed("puzzle"));
    }

    #[test]
    fn record_serializes_with_site_field_names() {
        let (storage, mut store) = fresh();
        store.complete_challenge("puzzle", "L'éducation est");
        let raw = storage.raw(PROGRESS_KEY).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["completedGames"][0], "puzzle");
        assert_eq!(value["quoteFragments"]["puzzle"], "L'éducation est");
        assert!(value["currentVisit"].is_null());
        assert!(value["finalSubmission"].is_null());
    }
}
