//! Final challenge: identify three clues from a music clip, then write a
//! short story and send it in by email.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::storage::{DRAFT_KEY, KeyValueStorage};
use crate::validator::is_valid;

/// Minimum story length accepted for submission.
pub const MIN_STORY_WORDS: usize = 200;
/// Upper end of the recommended story length.
pub const MAX_STORY_WORDS: usize = 300;

/// The three clues hidden in a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClueSlot {
    Theme,
    Era,
    Emotion,
}

impl ClueSlot {
    pub const ALL: [Self; 3] = [Self::Theme, Self::Era, Self::Emotion];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Theme => 0,
            Self::Era => 1,
            Self::Emotion => 2,
        }
    }
}

/// Accepted answers for each clue slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClueSheet {
    pub valid_clues: [Vec<String>; 3],
}

impl ClueSheet {
    #[must_use]
    pub fn accepted(&self, slot: ClueSlot) -> &[String] {
        &self.valid_clues[slot.index()]
    }
}

/// Result of checking the clue triplet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClueReport {
    /// At least one field was left blank.
    Incomplete,
    Checked { valid: [bool; 3] },
}

impl ClueReport {
    #[must_use]
    pub fn all_valid(&self) -> bool {
        matches!(self, Self::Checked { valid } if valid.iter().all(|ok| *ok))
    }

    /// Slots whose answer was wrong. Empty for incomplete submissions.
    #[must_use]
    pub fn failed_slots(&self) -> Vec<ClueSlot> {
        match self {
            Self::Incomplete => Vec::new(),
            Self::Checked { valid } => ClueSlot::ALL
                .into_iter()
                .filter(|slot| !valid[slot.index()])
                .collect(),
        }
    }
}

#[must_use]
pub fn check_clues(sheet: &ClueSheet, answers: [&str; 3]) -> ClueReport {
    if answers.iter().any(|answer| answer.trim().is_empty()) {
        return ClueReport::Incomplete;
    }
    let valid = ClueSlot::ALL.map(|slot| is_valid(answers[slot.index()], sheet.accepted(slot)));
    ClueReport::Checked { valid }
}

#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordCountBand {
    TooShort,
    OnTarget,
    TooLong,
}

impl WordCountBand {
    #[must_use]
    pub const fn for_count(words: usize) -> Self {
        if words < MIN_STORY_WORDS {
            Self::TooShort
        } else if words <= MAX_STORY_WORDS {
            Self::OnTarget
        } else {
            Self::TooLong
        }
    }
}

/// Story being written for the final challenge.
///
/// Stored under [`DRAFT_KEY`] in the same shape the site always used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryDraft {
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub author_email: String,
    pub clue1: String,
    pub clue2: String,
    pub clue3: String,
    #[serde(rename = "timestamp")]
    pub saved_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoryError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("story is too short: {words} words, at least {MIN_STORY_WORDS} required")]
    TooShort { words: usize },
    #[error("the three clues have not been identified")]
    CluesNotValidated(ClueReport),
}

impl StoryDraft {
    #[must_use]
    pub fn clues(&self) -> [&str; 3] {
        [&self.clue1, &self.clue2, &self.clue3]
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        word_count(&self.content)
    }

    /// Check that the draft can be submitted.
    ///
    /// # Errors
    ///
    /// Returns the first missing required field, or [`StoryError::TooShort`]
    /// when the story has fewer than [`MIN_STORY_WORDS`] words.
    pub fn validate(&self) -> Result<(), StoryError> {
        for (name, value) in [
            ("title", &self.title),
            ("content", &self.content),
            ("author_name", &self.author_name),
        ] {
            if value.trim().is_empty() {
                return Err(StoryError::MissingField(name));
            }
        }
        let words = self.word_count();
        if words < MIN_STORY_WORDS {
            return Err(StoryError::TooShort { words });
        }
        Ok(())
    }
}

/// Where and how finished stories are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FinalInstructions {
    pub title: String,
    pub text: String,
    #[serde(alias = "email")]
    pub recipient: String,
    pub subject: String,
}

/// A ready-to-open email for the visitor's mail client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailDraft {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub href: String,
}

#[must_use]
pub fn compose_mail(instructions: &FinalInstructions, draft: &StoryDraft) -> MailDraft {
    let [clue1, clue2, clue3] = draft.clues();
    let body = format!(
        "Nom: {}\nTitre: {}\n\nIndices identifiés:\n1. {}\n2. {}\n3. {}\n\nNouvelle:\n{}\n",
        draft.author_name.trim(),
        draft.title.trim(),
        clue1.trim(),
        clue2.trim(),
        clue3.trim(),
        draft.content.trim(),
    );
    let href = format!(
        "mailto:{}?subject={}&body={}",
        instructions.recipient,
        urlencoding::encode(&instructions.subject),
        urlencoding::encode(&body),
    );
    MailDraft {
        recipient: instructions.recipient.clone(),
        subject: instructions.subject.clone(),
        body,
        href,
    }
}

/// Summary of a submitted story kept in the progress record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FinalSubmission {
    pub title: String,
    pub author_name: String,
    pub clues: [String; 3],
    pub word_count: usize,
    pub submitted_at: Option<String>,
}

/// Validate a draft and prepare both the email and the progress entry.
///
/// The writing step only opens once all three clues are right, so the
/// draft's clues are checked again against `sheet` before anything else.
///
/// # Errors
///
/// Returns [`StoryError::CluesNotValidated`] if a clue is blank or wrong,
/// otherwise a [`StoryError`] if the draft is incomplete or too short.
pub fn submit_story(
    instructions: &FinalInstructions,
    sheet: &ClueSheet,
    draft: &StoryDraft,
    submitted_at: Option<String>,
) -> Result<(FinalSubmission, MailDraft), StoryError> {
    let report = check_clues(sheet, draft.clues());
    if !report.all_valid() {
        return Err(StoryError::CluesNotValidated(report));
    }
    draft.validate()?;
    let submission = FinalSubmission {
        title: draft.title.trim().to_string(),
        author_name: draft.author_name.trim().to_string(),
        clues: draft.clues().map(|clue| clue.trim().to_string()),
        word_count: draft.word_count(),
        submitted_at,
    };
    Ok((submission, compose_mail(instructions, draft)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicClip {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub year: String,
    pub url: String,
}

/// Pick a random clip other than `current`.
///
/// Falls back to the full list when `current` is the only clip.
pub fn pick_clip<'a, R: Rng + ?Sized>(
    clips: &'a [MusicClip],
    current: Option<&str>,
    rng: &mut R,
) -> Option<&'a MusicClip> {
    let others: Vec<&MusicClip> = clips
        .iter()
        .filter(|clip| current != Some(clip.id.as_str()))
        .collect();
    if others.is_empty() {
        if clips.is_empty() {
            return None;
        }
        return clips.get(rng.gen_range(0..clips.len()));
    }
    others.get(rng.gen_range(0..others.len())).copied()
}

/// Story draft persistence, with the same never-fail policy as progress.
#[derive(Debug)]
pub struct DraftStore<S: KeyValueStorage> {
    storage: S,
}

impl<S: KeyValueStorage> DraftStore<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Save the draft. Returns `false` if storage refused it.
    pub fn save(&self, draft: &StoryDraft) -> bool {
        let json = match serde_json::to_string(draft) {
            Ok(json) => json,
            Err(err) => {
                log::error!("failed to serialize story draft: {err}");
                return false;
            }
        };
        match self.storage.set_item(DRAFT_KEY, &json) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("failed to save story draft: {err}");
                false
            }
        }
    }

    #[must_use]
    pub fn load(&self) -> Option<StoryDraft> {
        let json = match self.storage.get_item(DRAFT_KEY) {
            Ok(json) => json?,
            Err(err) => {
                log::warn!("story draft unavailable: {err}");
                return None;
            }
        };
        serde_json::from_str(&json)
            .map_err(|err| log::warn!("discarding malformed story draft: {err}"))
            .ok()
    }

    pub fn clear(&self) {
        if let Err(err) = self.storage.remove_item(DRAFT_KEY) {
            log::warn!("failed to clear story draft: {err}");
        }
    }
}
