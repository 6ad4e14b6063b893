//! Quote reconstruction: validating fragments against the catalog, recording
//! them in the progress store, and checking the reassembled quote.
//!
//! Each challenge moves one way, `Locked -> Completed`; only
//! [`ProgressStore::reset`] sends every challenge back to `Locked`.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Visit};
use crate::progress::ProgressStore;
use crate::storage::KeyValueStorage;
use crate::validator::is_valid;

/// Outcome of claiming a challenge with a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FragmentOutcome {
    UnknownChallenge,
    Empty,
    AlreadyCompleted { fragment: String },
    Rejected { hint: String },
    Accepted { fragment: String },
}

impl FragmentOutcome {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Validate `user_text` against the challenge's accepted fragments and, on
/// success, complete the challenge with the canonical catalog text.
pub fn submit_fragment<S: KeyValueStorage>(
    store: &mut ProgressStore<S>,
    catalog: &Catalog,
    challenge_id: &str,
    user_text: &str,
) -> FragmentOutcome {
    let Some(challenge) = catalog.challenge(challenge_id) else {
        log::debug!("fragment submitted for unknown challenge {challenge_id}");
        return FragmentOutcome::UnknownChallenge;
    };
    if store.is_completed(&challenge.id) {
        let fragment = store
            .record()
            .quote_fragments
            .get(&challenge.id)
            .cloned()
            .unwrap_or_else(|| challenge.fragment.clone());
        return FragmentOutcome::AlreadyCompleted { fragment };
    }
    if user_text.trim().is_empty() {
        return FragmentOutcome::Empty;
    }
    if !is_valid(user_text, challenge.accepted_texts()) {
        return FragmentOutcome::Rejected {
            hint: challenge.hint().to_string(),
        };
    }
    store.complete_challenge(&challenge.id, &challenge.fragment);
    FragmentOutcome::Accepted {
        fragment: challenge.fragment.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhraseOutcome {
    Empty,
    Correct,
    Incorrect,
}

/// Check a fully reconstructed quote.
#[must_use]
pub fn verify_phrase(catalog: &Catalog, submitted: &str) -> PhraseOutcome {
    if submitted.trim().is_empty() {
        PhraseOutcome::Empty
    } else if is_valid(submitted, [&catalog.complete_quote]) {
        PhraseOutcome::Correct
    } else {
        PhraseOutcome::Incorrect
    }
}

/// One position of the quote on the solution page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentSlot {
    pub index: usize,
    pub challenge_id: String,
    /// Collected text, `None` while the challenge is locked.
    pub text: Option<String>,
}

#[must_use]
pub fn fragment_board<S: KeyValueStorage>(
    store: &ProgressStore<S>,
    catalog: &Catalog,
) -> Vec<FragmentSlot> {
    catalog
        .challenges
        .iter()
        .enumerate()
        .map(|(index, challenge)| FragmentSlot {
            index,
            challenge_id: challenge.id.clone(),
            text: store
                .record()
                .quote_fragments
                .get(&challenge.id)
                .cloned(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressTier {
    Starting,
    Halfway,
    Finishing,
}

impl ProgressTier {
    #[must_use]
    pub const fn for_percent(percent: u8) -> Self {
        if percent < 30 {
            Self::Starting
        } else if percent < 70 {
            Self::Halfway
        } else {
            Self::Finishing
        }
    }
}

/// Homepage progress tracker numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuntOverview {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
    pub tier: ProgressTier,
    pub all_complete: bool,
}

#[must_use]
pub fn overview<S: KeyValueStorage>(store: &ProgressStore<S>, catalog: &Catalog) -> HuntOverview {
    let total = catalog.total_challenges();
    let completed = catalog
        .challenges
        .iter()
        .filter(|challenge| store.is_completed(&challenge.id))
        .count();
    let percent = if total == 0 {
        0
    } else {
        u8::try_from((completed * 100 + total / 2) / total).unwrap_or(100)
    };
    HuntOverview {
        completed,
        total,
        percent,
        tier: ProgressTier::for_percent(percent),
        all_complete: total > 0 && completed == total,
    }
}

/// Remember the chosen tour stop. Ids outside the catalog are ignored.
pub fn select_visit<'c, S: KeyValueStorage>(
    store: &mut ProgressStore<S>,
    catalog: &'c Catalog,
    visit_id: &str,
) -> Option<&'c Visit> {
    let visit = catalog.visit(visit_id)?;
    store.set_current_tour_selection(Some(&visit.id));
    Some(visit)
}

/// The tour stop saved from a previous visit, if it still exists.
#[must_use]
pub fn saved_visit<'c, S: KeyValueStorage>(
    store: &ProgressStore<S>,
    catalog: &'c Catalog,
) -> Option<&'c Visit> {
    store
        .current_tour_selection()
        .and_then(|id| catalog.visit(id))
}
