//! JavaScript surface used by the hunt pages.
//!
//! Pages create one [`HuntHandle`] on load and call into it from their
//! event handlers. Structured results cross the boundary as plain JSON
//! objects.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use treasure_core::{
    Direction, DraftStore, HashAlgorithm, HuntSession, Persistence, StoryDraft, WordCountBand,
    ciphers, pick_clip,
};
use wasm_bindgen::prelude::*;

use crate::dom;
use crate::loader::{WebCatalogLoader, fetch_catalog_or_embedded};
use crate::storage::BrowserStorage;

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(Into::into)
}

fn error_value(err: &impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn entropy_seed() -> u64 {
    let high = (js_sys::Math::random() * f64::from(u32::MAX)) as u64;
    let low = js_sys::Date::now() as u64;
    (high << 32) ^ low
}

/// Handle owning the visitor's progress for the lifetime of a page.
#[wasm_bindgen]
pub struct HuntHandle {
    session: HuntSession<BrowserStorage>,
    drafts: DraftStore<BrowserStorage>,
    rng: ChaCha20Rng,
    current_clip: Option<String>,
}

impl HuntHandle {
    fn with_session(session: HuntSession<BrowserStorage>) -> Self {
        let drafts = DraftStore::new(session.progress().storage().clone());
        Self {
            session,
            drafts,
            rng: ChaCha20Rng::seed_from_u64(entropy_seed()),
            current_clip: None,
        }
    }
}

#[wasm_bindgen]
impl HuntHandle {
    /// Open the hunt with the embedded catalog and `localStorage`.
    ///
    /// # Errors
    /// Returns an error if the embedded catalog is unusable.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<HuntHandle, JsValue> {
        let session = HuntSession::open(&WebCatalogLoader, BrowserStorage::local())
            .map_err(|err| error_value(&err))?;
        Ok(Self::with_session(session))
    }

    /// Open the hunt with a catalog fetched from `catalog_url`, falling back
    /// to the embedded one.
    ///
    /// # Errors
    /// Returns an error if no usable catalog can be found.
    #[allow(clippy::future_not_send)]
    pub async fn load(catalog_url: Option<String>) -> Result<HuntHandle, JsValue> {
        let catalog = fetch_catalog_or_embedded(catalog_url.as_deref())
            .await
            .map_err(|err| error_value(&err))?;
        Ok(Self::with_session(HuntSession::new(
            catalog,
            BrowserStorage::local(),
        )))
    }

    /// Whether progress currently reaches `localStorage`.
    #[wasm_bindgen(js_name = isDurable)]
    #[must_use]
    pub fn is_durable(&self) -> bool {
        self.session.progress().persistence() == Persistence::Durable
    }

    /// # Errors
    /// Returns an error if the catalog cannot be converted.
    pub fn catalog(&self) -> Result<JsValue, JsValue> {
        to_js(self.session.catalog())
    }

    #[wasm_bindgen(js_name = isCompleted)]
    #[must_use]
    pub fn is_completed(&self, challenge_id: &str) -> bool {
        self.session.progress().is_completed(challenge_id)
    }

    #[wasm_bindgen(js_name = completeChallenge)]
    pub fn complete_challenge(&mut self, challenge_id: &str, fragment_text: &str) -> bool {
        self.session
            .progress_mut()
            .complete_challenge(challenge_id, fragment_text)
    }

    #[wasm_bindgen(js_name = collectedFragments)]
    #[must_use]
    pub fn collected_fragments(&self) -> Vec<String> {
        self.session
            .progress()
            .collected_fragments()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[wasm_bindgen(js_name = completeQuote)]
    #[must_use]
    pub fn complete_quote(&self) -> String {
        self.session.progress().complete_quote()
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    #[wasm_bindgen(js_name = currentVisit)]
    #[must_use]
    pub fn current_visit(&self) -> Option<String> {
        self.session.saved_visit().map(|visit| visit.id.clone())
    }

    /// Remember a tour stop; returns the stop, or `null` for unknown ids.
    ///
    /// # Errors
    /// Returns an error if the result cannot be converted.
    #[wasm_bindgen(js_name = selectVisit)]
    pub fn select_visit(&mut self, visit_id: &str) -> Result<JsValue, JsValue> {
        to_js(&self.session.select_visit(visit_id))
    }

    /// # Errors
    /// Returns an error if the outcome cannot be converted.
    #[wasm_bindgen(js_name = submitFragment)]
    pub fn submit_fragment(
        &mut self,
        challenge_id: &str,
        user_text: &str,
    ) -> Result<JsValue, JsValue> {
        to_js(&self.session.submit_fragment(challenge_id, user_text))
    }

    /// # Errors
    /// Returns an error if the outcome cannot be converted.
    #[wasm_bindgen(js_name = verifyPhrase)]
    pub fn verify_phrase(&self, submitted: &str) -> Result<JsValue, JsValue> {
        to_js(&self.session.verify_phrase(submitted))
    }

    /// # Errors
    /// Returns an error if the overview cannot be converted.
    pub fn overview(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.overview())
    }

    /// # Errors
    /// Returns an error if the board cannot be converted.
    #[wasm_bindgen(js_name = fragmentBoard)]
    pub fn fragment_board(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.fragment_board())
    }

    /// # Errors
    /// Returns an error if the report cannot be converted.
    #[wasm_bindgen(js_name = checkClues)]
    pub fn check_clues(&self, theme: &str, era: &str, emotion: &str) -> Result<JsValue, JsValue> {
        to_js(&self.session.check_clues([theme, era, emotion]))
    }

    /// Save a draft object, stamping it with the current time.
    ///
    /// # Errors
    /// Returns an error if `draft` does not have the shape of a story draft.
    #[wasm_bindgen(js_name = saveDraft)]
    pub fn save_draft(&self, draft: JsValue) -> Result<bool, JsValue> {
        let mut draft: StoryDraft = serde_wasm_bindgen::from_value(draft)?;
        draft.saved_at = Some(dom::now_iso());
        Ok(self.drafts.save(&draft))
    }

    /// The saved draft, or `null`.
    ///
    /// # Errors
    /// Returns an error if the draft cannot be converted.
    #[wasm_bindgen(js_name = loadDraft)]
    pub fn load_draft(&self) -> Result<JsValue, JsValue> {
        to_js(&self.drafts.load())
    }

    #[wasm_bindgen(js_name = clearDraft)]
    pub fn clear_draft(&self) {
        self.drafts.clear();
    }

    /// Submit the story; resolves to the email to open.
    ///
    /// # Errors
    /// Returns the validation message when the story cannot be submitted.
    #[wasm_bindgen(js_name = submitStory)]
    pub fn submit_story(&mut self, draft: JsValue) -> Result<JsValue, JsValue> {
        let draft: StoryDraft = serde_wasm_bindgen::from_value(draft)?;
        let mail = self
            .session
            .submit_story(&draft, Some(dom::now_iso()))
            .map_err(|err| error_value(&err))?;
        self.drafts.clear();
        to_js(&mail)
    }

    /// A clip different from the one currently shown, or `null`.
    ///
    /// # Errors
    /// Returns an error if the clip cannot be converted.
    #[wasm_bindgen(js_name = randomClip)]
    pub fn random_clip(&mut self) -> Result<JsValue, JsValue> {
        let clip = pick_clip(
            &self.session.catalog().clips,
            self.current_clip.as_deref(),
            &mut self.rng,
        )
        .cloned();
        self.current_clip = clip.as_ref().map(|clip| clip.id.clone());
        to_js(&clip)
    }
}

#[wasm_bindgen(js_name = isValid)]
#[must_use]
pub fn is_valid(user_text: &str, accepted_texts: Vec<String>) -> bool {
    treasure_core::is_valid(user_text, &accepted_texts)
}

#[wasm_bindgen(js_name = normalizeAnswer)]
#[must_use]
pub fn normalize_answer(text: &str) -> String {
    treasure_core::normalize_answer(text)
}

#[wasm_bindgen(js_name = wordCount)]
#[must_use]
pub fn word_count(text: &str) -> usize {
    treasure_core::word_count(text)
}

/// `"too_short"`, `"on_target"` or `"too_long"` for the story counter.
///
/// # Errors
/// Returns an error if the band cannot be converted.
#[wasm_bindgen(js_name = wordCountBand)]
pub fn word_count_band(text: &str) -> Result<JsValue, JsValue> {
    to_js(&WordCountBand::for_count(treasure_core::word_count(text)))
}

const fn direction(decrypt: bool) -> Direction {
    if decrypt {
        Direction::Decrypt
    } else {
        Direction::Encrypt
    }
}

#[wasm_bindgen]
#[must_use]
pub fn caesar(text: &str, shift: i32, decrypt: bool) -> String {
    ciphers::caesar(text, shift, direction(decrypt))
}

/// # Errors
/// Returns an error when the key is not made of letters.
#[wasm_bindgen]
pub fn vigenere(text: &str, key: &str, decrypt: bool) -> Result<String, JsValue> {
    ciphers::vigenere(text, key, direction(decrypt)).map_err(|err| error_value(&err))
}

#[wasm_bindgen(js_name = base64Encode)]
#[must_use]
pub fn base64_encode(text: &str) -> String {
    ciphers::base64_encode(text)
}

/// # Errors
/// Returns an error for malformed input.
#[wasm_bindgen(js_name = base64Decode)]
pub fn base64_decode(encoded: &str) -> Result<String, JsValue> {
    ciphers::base64_decode(encoded).map_err(|err| error_value(&err))
}

/// Hex digest; `algorithm` is `"md5"`, `"sha1"` or `"sha256"`.
///
/// # Errors
/// Returns an error for unsupported algorithms.
#[wasm_bindgen]
pub fn digest(text: &str, algorithm: &str) -> Result<String, JsValue> {
    let algorithm: HashAlgorithm = algorithm.parse().map_err(|err| error_value(&err))?;
    Ok(ciphers::digest_hex(text, algorithm))
}

/// Whether the page should warn that `algorithm` is no longer secure.
#[wasm_bindgen(js_name = isObsoleteDigest)]
#[must_use]
pub fn is_obsolete_digest(algorithm: &str) -> bool {
    algorithm
        .parse::<HashAlgorithm>()
        .is_ok_and(HashAlgorithm::is_obsolete)
}
