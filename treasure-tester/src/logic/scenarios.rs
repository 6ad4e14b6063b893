use anyhow::{Context, Result, bail, ensure};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use treasure_core::validator::STRIPPED_PUNCTUATION;
use treasure_core::{
    Catalog, FragmentOutcome, HuntSession, MemoryStorage, PROGRESS_KEY, Persistence,
    PhraseOutcome, ProgressStore, UnavailableStorage, is_valid,
};

pub type ScenarioCheck = fn(&Catalog, u64) -> Result<()>;

#[derive(Clone, Copy)]
pub struct Scenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub check: ScenarioCheck,
}

pub fn all_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            key: "smoke",
            name: "Smoke",
            description: "Open a session and claim the first fragment",
            check: smoke,
        },
        Scenario {
            key: "full-hunt",
            name: "Full Hunt",
            description: "Clear every challenge in a random order and verify the quote",
            check: full_hunt,
        },
        Scenario {
            key: "idempotent-completion",
            name: "Idempotent Completion",
            description: "Completing a challenge twice keeps the first fragment",
            check: idempotent_completion,
        },
        Scenario {
            key: "reset",
            name: "Reset",
            description: "Reset forgets all progress, durably",
            check: reset,
        },
        Scenario {
            key: "reload",
            name: "Reload",
            description: "Progress survives a fresh load from storage",
            check: reload,
        },
        Scenario {
            key: "answer-fuzz",
            name: "Answer Fuzz",
            description: "Case, accent, punctuation and spacing noise never changes a verdict",
            check: answer_fuzz,
        },
        Scenario {
            key: "storage-failure",
            name: "Storage Failure",
            description: "Broken or corrupted storage never blocks the hunt",
            check: storage_failure,
        },
        Scenario {
            key: "catalog-integrity",
            name: "Catalog Integrity",
            description: "Catalog fragments reassemble into the complete quote",
            check: catalog_integrity,
        },
    ]
}

pub fn find_scenario(key: &str) -> Option<Scenario> {
    all_scenarios()
        .into_iter()
        .find(|scenario| scenario.key == key)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    all_scenarios()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

fn new_session(catalog: &Catalog) -> (MemoryStorage, HuntSession<MemoryStorage>) {
    let storage = MemoryStorage::new();
    let session = HuntSession::new(catalog.clone(), storage.clone());
    (storage, session)
}

fn shuffled_ids(catalog: &Catalog, rng: &mut ChaCha20Rng) -> Vec<String> {
    let mut ids: Vec<String> = catalog.challenges.iter().map(|c| c.id.clone()).collect();
    ids.shuffle(rng);
    ids
}

fn claim(session: &mut HuntSession<MemoryStorage>, catalog: &Catalog, id: &str) -> Result<()> {
    let challenge = catalog
        .challenge(id)
        .with_context(|| format!("challenge {id} missing from catalog"))?;
    let outcome = session.submit_fragment(id, &challenge.fragment);
    ensure!(
        outcome.is_accepted(),
        "canonical fragment for {id} was not accepted: {outcome:?}"
    );
    Ok(())
}

fn smoke(catalog: &Catalog, _seed: u64) -> Result<()> {
    let (_, mut session) = new_session(catalog);
    let first = catalog
        .challenge_at(0)
        .context("catalog has no challenges")?;
    claim(&mut session, catalog, &first.id)?;
    let overview = session.overview();
    ensure!(overview.completed == 1, "expected one completion, got {}", overview.completed);
    ensure!(
        session.progress().collected_fragments() == vec![first.fragment.as_str()],
        "collected fragments do not match the claimed challenge"
    );
    Ok(())
}

fn full_hunt(catalog: &Catalog, seed: u64) -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let (_, mut session) = new_session(catalog);
    for id in shuffled_ids(catalog, &mut rng) {
        claim(&mut session, catalog, &id)?;
    }
    let overview = session.overview();
    ensure!(overview.all_complete, "hunt not complete: {overview:?}");
    ensure!(overview.percent == 100, "percent is {}", overview.percent);

    let board = session.fragment_board();
    let quote = board
        .iter()
        .map(|slot| slot.text.as_deref().unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ");
    ensure!(
        session.verify_phrase(&quote) == PhraseOutcome::Correct,
        "reassembled quote rejected: {quote}"
    );

    let words: Vec<&str> = quote.split_whitespace().collect();
    ensure!(!words.is_empty(), "reassembled quote is empty");
    let target = rng.gen_range(0..words.len());
    let tampered = words
        .iter()
        .enumerate()
        .map(|(index, word)| {
            if index == target {
                format!("{word}x")
            } else {
                (*word).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    ensure!(
        session.verify_phrase(&tampered) == PhraseOutcome::Incorrect,
        "quote with a wrong word accepted: {tampered}"
    );
    Ok(())
}

fn idempotent_completion(catalog: &Catalog, seed: u64) -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let (storage, mut session) = new_session(catalog);
    let ids = shuffled_ids(catalog, &mut rng);
    let id = ids.first().context("catalog has no challenges")?;
    claim(&mut session, catalog, id)?;
    let stored = storage.raw(PROGRESS_KEY);

    ensure!(
        !session.progress_mut().complete_challenge(id, "autre fragment"),
        "second completion of {id} reported a change"
    );
    match session.submit_fragment(id, "autre fragment") {
        FragmentOutcome::AlreadyCompleted { .. } => {}
        other => bail!("resubmission of {id} returned {other:?}"),
    }
    ensure!(storage.raw(PROGRESS_KEY) == stored, "stored record changed");
    ensure!(session.overview().completed == 1, "completion counted twice");
    Ok(())
}

fn reset(catalog: &Catalog, seed: u64) -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let (storage, mut session) = new_session(catalog);
    let ids = shuffled_ids(catalog, &mut rng);
    ensure!(!ids.is_empty(), "catalog has no challenges");
    let count = rng.gen_range(1..=ids.len());
    for id in &ids[..count] {
        claim(&mut session, catalog, id)?;
    }
    if let Some(visit) = catalog.visits.choose(&mut rng) {
        session.select_visit(&visit.id);
    }
    session.reset();

    let reloaded = HuntSession::new(catalog.clone(), storage);
    ensure!(
        reloaded.progress().record().is_empty(),
        "record not empty after reset: {:?}",
        reloaded.progress().record()
    );
    ensure!(
        catalog
            .challenges
            .iter()
            .all(|c| !reloaded.progress().is_completed(&c.id)),
        "a challenge is still completed after reset"
    );
    Ok(())
}

fn reload(catalog: &Catalog, seed: u64) -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let (storage, mut session) = new_session(catalog);
    let ids = shuffled_ids(catalog, &mut rng);
    let count = rng.gen_range(0..=ids.len());
    for id in &ids[..count] {
        claim(&mut session, catalog, id)?;
    }
    if let Some(visit) = catalog.visits.choose(&mut rng) {
        session.select_visit(&visit.id);
    }

    let reloaded = HuntSession::new(catalog.clone(), storage);
    ensure!(
        reloaded.progress().record() == session.progress().record(),
        "reloaded record differs"
    );
    ensure!(
        reloaded.progress().collected_fragments() == session.progress().collected_fragments(),
        "fragment order changed across reload"
    );
    Ok(())
}

/// Re-type `text` the way a hurried visitor might.
fn perturb(text: &str, rng: &mut ChaCha20Rng) -> String {
    let mut out = String::new();
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push_str(if rng.gen_bool(0.5) { "  " } else { " \t" });
        }
        for c in word.chars() {
            let upper: String = c.to_uppercase().collect();
            let base = strip_accent(c);
            if rng.gen_bool(0.3) && upper.to_lowercase() == c.to_lowercase().to_string() {
                out.push_str(&upper);
            } else if rng.gen_bool(0.3) {
                out.push(base);
            } else {
                out.push(c);
            }
        }
        if rng.gen_bool(0.3) {
            if let Some(mark) = STRIPPED_PUNCTUATION.choose(rng) {
                out.push(*mark);
            }
        }
    }
    if rng.gen_bool(0.5) {
        format!("  {out} ")
    } else {
        out
    }
}

fn strip_accent(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' => 'i',
        'ô' | 'ö' => 'o',
        'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'É' => 'E',
        other => other,
    }
}

fn answer_fuzz(catalog: &Catalog, seed: u64) -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    for challenge in &catalog.challenges {
        for accepted in challenge.accepted_texts() {
            let noisy = perturb(accepted, &mut rng);
            ensure!(
                is_valid(&noisy, challenge.accepted_texts()),
                "{}: {noisy:?} should match {accepted:?}",
                challenge.id
            );
        }
        let intruder = format!("{} intrus", challenge.fragment);
        ensure!(
            !is_valid(&intruder, challenge.accepted_texts()),
            "{}: extra word accepted",
            challenge.id
        );
    }
    let noisy_quote = perturb(&catalog.complete_quote, &mut rng);
    ensure!(
        is_valid(&noisy_quote, [&catalog.complete_quote]),
        "quote {noisy_quote:?} rejected"
    );
    Ok(())
}

fn storage_failure(catalog: &Catalog, seed: u64) -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let ids = shuffled_ids(catalog, &mut rng);
    let id = ids.first().context("catalog has no challenges")?;
    let fragment = &catalog
        .challenge(id)
        .context("challenge vanished")?
        .fragment;

    let backing = MemoryStorage::new();
    let mut frozen = ProgressStore::load(backing.read_only());
    ensure!(frozen.persistence() == Persistence::Durable, "read-only store starts degraded");
    ensure!(frozen.complete_challenge(id, fragment), "completion refused");
    ensure!(
        frozen.persistence() == Persistence::MemoryOnly,
        "rejected write did not switch to memory"
    );
    ensure!(frozen.is_completed(id), "in-session progress lost");
    ensure!(backing.raw(PROGRESS_KEY).is_none(), "read-only storage was written");

    let mut missing = ProgressStore::load(UnavailableStorage);
    ensure!(missing.persistence() == Persistence::MemoryOnly, "missing backend reported durable");
    ensure!(missing.complete_challenge(id, fragment), "completion refused without backend");

    let garbage: String = (0..rng.gen_range(1..40))
        .map(|_| char::from(rng.gen_range(b' '..=b'~')))
        .collect();
    backing.put_raw(PROGRESS_KEY, &format!("{{{garbage}"));
    let recovered = ProgressStore::load(backing.clone());
    ensure!(
        recovered.record().is_empty(),
        "corrupted record was not discarded"
    );
    Ok(())
}

fn catalog_integrity(catalog: &Catalog, _seed: u64) -> Result<()> {
    catalog.validate().context("catalog failed validation")?;
    for challenge in &catalog.challenges {
        ensure!(
            is_valid(&challenge.fragment, challenge.accepted_texts()),
            "{}: canonical fragment does not validate",
            challenge.id
        );
        ensure!(!challenge.hint().is_empty(), "{}: empty hint", challenge.id);
    }
    ensure!(
        is_valid(&catalog.assembled_quote(), [&catalog.complete_quote]),
        "fragments do not reassemble into the quote"
    );
    Ok(())
}
