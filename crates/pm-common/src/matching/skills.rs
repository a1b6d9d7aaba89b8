use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;

/// Curated complementary-tool pairings, matched in either direction.
/// Kept as a fixed-order table so synergy hits (and the reason text built
/// from the first hit) are deterministic.
pub const SYNERGY_PAIRS: &[(&str, &str)] = &[
    ("react", "fastapi"),
    ("react", "apis"),
    ("python", "fastapi"),
    ("fastapi", "mongodb"),
    ("docker", "aws"),
    ("docker", "azure"),
    ("ml", "data"),
    ("python", "ml"),
    ("security", "apis"),
    ("testing", "apis"),
];

/// Canonical skill token: NFKC-fold, lowercase, then keep only ASCII
/// alphanumerics ("UI/UX" becomes "uiux").
pub fn normalize_skill_token(raw: &str) -> String {
    raw.nfkc()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Normalize a skill list into a canonical token set. Tokens that are
/// empty after normalization are dropped.
pub fn normalize_skills(skills: &[String]) -> BTreeSet<String> {
    skills
        .iter()
        .map(|raw| normalize_skill_token(raw))
        .filter(|token| !token.is_empty())
        .collect()
}

pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Explanation metadata for the skills signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillsSignal {
    /// Shared tokens, sorted, capped at 5.
    pub shared: Vec<String>,
    /// Synergy hits in table order, capped at 3.
    pub synergy: Vec<(&'static str, &'static str)>,
    pub jaccard: f64,
    pub synergy_count: usize,
}

/// Score skill compatibility between two canonical token sets.
///
/// Synergy dominates raw overlap: complementary tooling is worth more for
/// pod formation than both people knowing the same stack. Two hits from
/// the pairing table already max out the synergy component.
pub fn score_skills(
    mine: &BTreeSet<String>,
    theirs: &BTreeSet<String>,
    synergy_pairs: &'static [(&'static str, &'static str)],
) -> (f64, SkillsSignal) {
    if mine.is_empty() && theirs.is_empty() {
        return (0.0, SkillsSignal::default());
    }

    let jacc = jaccard(mine, theirs);
    let shared: Vec<String> = mine.intersection(theirs).take(5).cloned().collect();

    let hits: Vec<(&'static str, &'static str)> = synergy_pairs
        .iter()
        .filter(|(a, b)| {
            (mine.contains(*a) && theirs.contains(*b)) || (mine.contains(*b) && theirs.contains(*a))
        })
        .copied()
        .collect();

    let overlap_component = 0.25 * jacc;
    let complement_component = 0.65 * (hits.len() as f64 / 2.0).min(1.0);
    let score = (overlap_component + complement_component).min(1.0);

    let synergy_count = hits.len();
    let signal = SkillsSignal {
        shared,
        synergy: hits.into_iter().take(3).collect(),
        jaccard: jacc,
        synergy_count,
    };

    (score, signal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn raw(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn token_normalization_strips_punctuation_and_case() {
        assert_eq!(normalize_skill_token("UI/UX"), "uiux");
        assert_eq!(normalize_skill_token("  Node.js "), "nodejs");
        assert_eq!(normalize_skill_token("C++"), "c");
        assert_eq!(normalize_skill_token("ＦａｓｔＡＰＩ"), "fastapi");
    }

    #[test]
    fn normalize_skills_drops_tokens_that_vanish() {
        let set = normalize_skills(&raw(&["Python", "++", "", "REST APIs"]));
        assert_eq!(set, tokens(&["python", "restapis"]));
    }

    #[test]
    fn jaccard_is_symmetric() {
        let a = tokens(&["python", "fastapi", "docker"]);
        let b = tokens(&["python", "react"]);
        assert_eq!(jaccard(&a, &b), jaccard(&b, &a));
        assert!((jaccard(&a, &b) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn both_empty_scores_zero() {
        let (score, signal) = score_skills(&tokens(&[]), &tokens(&[]), SYNERGY_PAIRS);
        assert_eq!(score, 0.0);
        assert_eq!(signal, SkillsSignal::default());
    }

    #[test]
    fn single_synergy_pair_scores_without_overlap() {
        // react + fastapi is a declared pairing; there is no shared token.
        let mine = tokens(&["python", "fastapi"]);
        let theirs = tokens(&["react"]);
        let (score, signal) = score_skills(&mine, &theirs, SYNERGY_PAIRS);
        assert!((score - 0.325).abs() < 1e-9);
        assert_eq!(signal.synergy, vec![("react", "fastapi")]);
        assert_eq!(signal.synergy_count, 1);
        assert!(signal.shared.is_empty());
        assert_eq!(signal.jaccard, 0.0);
    }

    #[test]
    fn synergy_matches_either_direction_in_table_order() {
        let mine = tokens(&["aws", "data"]);
        let theirs = tokens(&["docker", "ml"]);
        let (_, signal) = score_skills(&mine, &theirs, SYNERGY_PAIRS);
        assert_eq!(signal.synergy, vec![("docker", "aws"), ("ml", "data")]);
    }

    #[test]
    fn two_hits_max_out_the_complement_component() {
        let mine = tokens(&["react", "docker"]);
        let theirs = tokens(&["fastapi", "aws"]);
        let (score, signal) = score_skills(&mine, &theirs, SYNERGY_PAIRS);
        assert_eq!(signal.synergy_count, 2);
        assert!((score - 0.65).abs() < 1e-9);
    }

    #[test]
    fn score_caps_at_one() {
        let shared: Vec<&str> = vec!["react", "fastapi", "python", "ml", "data", "docker", "aws"];
        let mine = tokens(&shared);
        let theirs = tokens(&shared);
        let (score, _) = score_skills(&mine, &theirs, SYNERGY_PAIRS);
        assert!(score <= 1.0);
    }

    #[test]
    fn shared_tokens_are_sorted_and_capped() {
        let mine = tokens(&["a", "b", "c", "d", "e", "f", "g"]);
        let theirs = mine.clone();
        let (_, signal) = score_skills(&mine, &theirs, SYNERGY_PAIRS);
        assert_eq!(signal.shared, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn alternate_tables_change_scoring_without_code_changes() {
        static QUIET_TABLE: &[(&str, &str)] = &[("haskell", "nix")];
        let mine = tokens(&["haskell"]);
        let theirs = tokens(&["nix"]);

        let (with_default, _) = score_skills(&mine, &theirs, SYNERGY_PAIRS);
        let (with_custom, signal) = score_skills(&mine, &theirs, QUIET_TABLE);

        assert_eq!(with_default, 0.0);
        assert!((with_custom - 0.325).abs() < 1e-9);
        assert_eq!(signal.synergy, vec![("haskell", "nix")]);
    }
}
