//! Answer validation shared by every puzzle on the site.
//!
//! Free-text answers are compared after folding case, accents, a fixed
//! punctuation set and whitespace, so `"Le Thème!"` matches `"le theme"`.
//! Quote fragments, the whole-phrase check, the final clue triplet and the
//! catalog self-check all go through [`normalize_answer`].

use unicode_normalization::UnicodeNormalization;

/// Punctuation removed before answers are compared.
///
/// The apostrophe is kept: `"l'éducation"` stays one word.
pub const STRIPPED_PUNCTUATION: [char; 21] = [
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~',
    '(', ')',
];

const fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036f}')
}

/// Normalize a free-text answer for comparison.
///
/// Lower-cases, decomposes accented letters (NFD) and drops the combining
/// marks, removes [`STRIPPED_PUNCTUATION`], collapses whitespace runs to a
/// single space and trims both ends.
#[must_use]
pub fn normalize_answer(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c) && !STRIPPED_PUNCTUATION.contains(c))
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Check a user answer against a set of accepted phrasings.
///
/// Returns `true` iff the normalized input equals one of the normalized
/// accepted texts. Input that normalizes to nothing never matches.
#[must_use]
pub fn is_valid<I, S>(user_text: &str, accepted_texts: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let candidate = normalize_answer(user_text);
    if candidate.is_empty() {
        return false;
    }
    accepted_texts
        .into_iter()
        .any(|accepted| normalize_answer(accepted.as_ref()) == candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_accents_case_and_punctuation() {
        assert!(is_valid("Le Thème!", ["le theme"]));
        assert!(is_valid("  Thème  ", ["theme"]));
        assert_eq!(normalize_answer("L'Éducation   est."), "l'education est");
    }

    #[test]
    fn rejects_non_matches() {
        assert!(!is_valid("wrong", ["right"]));
        assert!(!is_valid("le theme", ["le thème principal"]));
    }

    #[test]
    fn accepts_any_listed_phrasing() {
        let accepted = vec!["la guerre".to_string(), "guerre".to_string()];
        assert!(is_valid("GUERRE", &accepted));
        assert!(is_valid("La  Guerre.", &accepted));
        assert!(!is_valid("la paix", &accepted));
    }

    #[test]
    fn blank_input_never_matches() {
        assert!(!is_valid("", ["anything"]));
        assert!(!is_valid(" .,;! ", [""]));
        assert!(!is_valid("answer", Vec::<String>::new()));
    }

    #[test]
    fn normalization_is_idempotent() {
        for sample in [
            "L'éducation est",
            "- Nelson Mandela",
            "  Ça   c'est   ÉNORME !!! ",
            "İstanbul (Türkiye)",
            "tab\tand\nnewline",
            "",
        ] {
            let once = normalize_answer(sample);
            assert_eq!(normalize_answer(&once), once, "sample {sample:?}");
        }
    }

    #[test]
    fn strips_every_listed_punctuation_mark() {
        let noisy: String = STRIPPED_PUNCTUATION.iter().collect();
        assert_eq!(normalize_answer(&format!("a{noisy}b")), "ab");
        assert_eq!(normalize_answer("pour-changer"), "pourchanger");
        assert_eq!(normalize_answer("(le monde)"), "le monde");
    }

    #[test]
    fn whole_quote_ignores_the_attribution_dash() {
        assert!(is_valid(
            "l'education est l'arme la plus puissante que vous puissiez utiliser pour changer le monde nelson mandela",
            ["L'éducation est l'arme la plus puissante que vous puissiez utiliser pour changer le monde. - Nelson Mandela"],
        ));
    }
}
