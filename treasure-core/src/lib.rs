//! Treasure Hunt Engine
//!
//! Platform-agnostic logic for the Jean Prévost school treasure hunt.
//! Visitors clear six mini-games, each rewarding one fragment of a famous
//! quote, then tackle a final writing challenge. This crate owns answer
//! validation, progress persistence and the hunt rules without any browser
//! dependency.

pub mod catalog;
pub mod ciphers;
pub mod finale;
pub mod progress;
pub mod quest;
pub mod session;
pub mod storage;
pub mod validator;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogError, Challenge, Visit};
pub use ciphers::{CipherError, Direction, HashAlgorithm, caesar, digest_hex, vigenere};
pub use finale::{
    ClueReport, ClueSheet, ClueSlot, DraftStore, FinalInstructions, FinalSubmission, MailDraft,
    MusicClip, StoryDraft, StoryError, WordCountBand, check_clues, pick_clip, word_count,
};
pub use progress::{Persistence, ProgressRecord, ProgressStore};
pub use quest::{
    FragmentOutcome, FragmentSlot, HuntOverview, PhraseOutcome, ProgressTier, fragment_board,
    overview, submit_fragment, verify_phrase,
};
pub use session::HuntSession;
pub use storage::{
    DRAFT_KEY, KeyValueStorage, MemoryStorage, PROGRESS_KEY, StorageError, UnavailableStorage,
};
pub use validator::{is_valid, normalize_answer};

/// Trait for abstracting catalog loading
/// Platform-specific implementations should provide this
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the hunt catalog from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or parsed.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;
}

/// Loader for the catalog compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedCatalog;

impl CatalogLoader for EmbeddedCatalog {
    type Error = serde_json::Error;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Catalog::embedded()
    }
}
