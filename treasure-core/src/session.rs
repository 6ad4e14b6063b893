use crate::catalog::{Catalog, Visit};
use crate::finale::{self, ClueReport, MailDraft, StoryDraft, StoryError};
use crate::progress::ProgressStore;
use crate::quest::{self, FragmentOutcome, FragmentSlot, HuntOverview, PhraseOutcome};
use crate::storage::KeyValueStorage;
use crate::CatalogLoader;

/// Explicit context handed to every page: the read-only catalog and the
/// visitor's progress store.
#[derive(Debug)]
pub struct HuntSession<S: KeyValueStorage> {
    catalog: Catalog,
    progress: ProgressStore<S>,
}

impl<S: KeyValueStorage> HuntSession<S> {
    /// Build a session from an already loaded catalog.
    pub fn new(catalog: Catalog, storage: S) -> Self {
        Self {
            catalog,
            progress: ProgressStore::load(storage),
        }
    }

    /// Load the catalog through `loader`, then the visitor's progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn open<L: CatalogLoader>(loader: &L, storage: S) -> Result<Self, L::Error> {
        let catalog = loader.load_catalog()?;
        Ok(Self::new(catalog, storage))
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn progress(&self) -> &ProgressStore<S> {
        &self.progress
    }

    pub const fn progress_mut(&mut self) -> &mut ProgressStore<S> {
        &mut self.progress
    }

    pub fn submit_fragment(&mut self, challenge_id: &str, user_text: &str) -> FragmentOutcome {
        quest::submit_fragment(&mut self.progress, &self.catalog, challenge_id, user_text)
    }

    #[must_use]
    pub fn verify_phrase(&self, submitted: &str) -> PhraseOutcome {
        quest::verify_phrase(&self.catalog, submitted)
    }

    #[must_use]
    pub fn overview(&self) -> HuntOverview {
        quest::overview(&self.progress, &self.catalog)
    }

    #[must_use]
    pub fn fragment_board(&self) -> Vec<FragmentSlot> {
        quest::fragment_board(&self.progress, &self.catalog)
    }

    pub fn select_visit(&mut self, visit_id: &str) -> Option<&Visit> {
        quest::select_visit(&mut self.progress, &self.catalog, visit_id)
    }

    #[must_use]
    pub fn saved_visit(&self) -> Option<&Visit> {
        quest::saved_visit(&self.progress, &self.catalog)
    }

    #[must_use]
    pub fn check_clues(&self, answers: [&str; 3]) -> ClueReport {
        finale::check_clues(&self.catalog.clues, answers)
    }

    /// Validate the clues and the story, record the submission and build
    /// the email.
    ///
    /// # Errors
    ///
    /// Returns a [`StoryError`] when the draft cannot be submitted; progress
    /// is left untouched in that case.
    pub fn submit_story(
        &mut self,
        draft: &StoryDraft,
        submitted_at: Option<String>,
    ) -> Result<MailDraft, StoryError> {
        let (submission, mail) = finale::submit_story(
            &self.catalog.instructions,
            &self.catalog.clues,
            draft,
            submitted_at,
        )?;
        self.progress.record_final_submission(submission);
        Ok(mail)
    }

    pub fn reset(&mut self) {
        self.progress.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn session() -> (MemoryStorage, HuntSession<MemoryStorage>) {
        let storage = MemoryStorage::new();
        let session = HuntSession::new(Catalog::embedded().unwrap(), storage.clone());
        (storage, session)
    }

    #[test]
    fn story_submission_is_recorded_and_survives_reload() {
        let (storage, mut session) = session();
        let draft = StoryDraft {
            title: "Souvenirs".into(),
            content: vec!["nostalgie"; 220].join(" "),
            author_name: "Sacha".into(),
            clue1: "a".into(),
            clue2: "b".into(),
            clue3: "c".into(),
            ..StoryDraft::default()
        };
        assert!(session.check_clues(draft.clues()).all_valid());
        let mail = session.submit_story(&draft, None).unwrap();
        assert!(mail.href.starts_with("mailto:chasse-au-tresor@"));

        let reloaded = HuntSession::new(Catalog::embedded().unwrap(), storage);
        let submission = reloaded.progress().final_submission().unwrap();
        assert_eq!(submission.word_count, 220);
        assert_eq!(submission.author_name, "Sacha");
    }

    #[test]
    fn rejected_story_leaves_progress_alone() {
        let (_, mut session) = session();
        let draft = StoryDraft {
            title: "Court".into(),
            content: "trop court".into(),
            author_name: "Sacha".into(),
            clue1: "a".into(),
            clue2: "b".into(),
            clue3: "c".into(),
            ..StoryDraft::default()
        };
        assert_eq!(
            session.submit_story(&draft, None),
            Err(StoryError::TooShort { words: 2 })
        );
        assert!(session.progress().final_submission().is_none());
    }

    #[test]
    fn story_without_clues_is_not_recorded() {
        let (storage, mut session) = session();
        let draft = StoryDraft {
            title: "Souvenirs".into(),
            content: vec!["nostalgie"; 210].join(" "),
            author_name: "Sacha".into(),
            ..StoryDraft::default()
        };
        assert_eq!(
            session.submit_story(&draft, None),
            Err(StoryError::CluesNotValidated(ClueReport::Incomplete))
        );
        assert!(session.progress().final_submission().is_none());
        assert!(storage.raw(crate::storage::PROGRESS_KEY).is_none());
    }

    #[test]
    fn reset_locks_every_challenge() {
        let (_, mut session) = session();
        for challenge in session.catalog().challenges.clone() {
            assert!(session
                .submit_fragment(&challenge.id, &challenge.fragment)
                .is_accepted());
        }
        assert!(session.overview().all_complete);
        session.select_visit("arts");
        session.reset();
        assert_eq!(session.overview().completed, 0);
        assert!(session.saved_visit().is_none());
        assert!(session.fragment_board().iter().all(|slot| slot.text.is_none()));
    }
}
