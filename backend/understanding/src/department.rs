//! Department inference for appointment requests.
//!
//! A keyword vocabulary is scanned first (substring match against the
//! lowercased text, insertion order, first hit wins). When nothing matches,
//! two learning rules try to mine a department name from the phrasing around
//! "appointment"/"appt"; a mined name is added to the vocabulary so later
//! requests hit it in the keyword scan.
//!
//! The vocabulary only grows. It is shared by every clone of a
//! [`Vocabulary`] handle and guarded by an async `RwLock`: scans share the
//! read lock, learning takes the write lock and re-scans before inserting.

use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Vocabulary every process starts with, in scan order.
pub const SEED_VOCABULARY: &[(&str, &str)] = &[
    ("dentist", "Dentistry"),
    ("cardiologist", "Cardiology"),
    ("doctor", "General Medicine"),
    ("heart", "Cardiology"),
    ("orthopaedics", "Orthopaedics"),
];

/// Words never learned as department names by the "<word> appointment" rule.
pub const STOP_WORDS: &[&str] = &["a", "an", "the", "my", "for", "at", "on", "in", "with"];

// "<word> appointment" / "<word> appt"
static WORD_BEFORE_APPOINTMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9_]+)\s+(?:appointment|appt)").unwrap());

// "appointment at|for|in|with <word>"
static WORD_AFTER_APPOINTMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:appointment|appt)\s+(?:at|for|in|with)\s+([a-z0-9_]+)").unwrap()
});

/// A pattern that can mine a new department keyword out of a sentence.
struct LearningRule {
    name: &'static str,
    pattern: &'static Lazy<Regex>,
    /// Reject captures found in [`STOP_WORDS`]. Only the first rule does this.
    rejects_stop_words: bool,
}

/// Evaluated in order; the first rule yielding a candidate wins.
static LEARNING_RULES: [LearningRule; 2] = [
    LearningRule {
        name: "word_before_appointment",
        pattern: &WORD_BEFORE_APPOINTMENT,
        rejects_stop_words: true,
    },
    LearningRule {
        name: "word_after_appointment",
        pattern: &WORD_AFTER_APPOINTMENT,
        rejects_stop_words: false,
    },
];

/// One keyword → canonical department mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub keyword: String,
    pub canonical_name: String,
}

impl VocabularyEntry {
    pub fn new(keyword: impl Into<String>, canonical_name: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into().to_lowercase(),
            canonical_name: canonical_name.into(),
        }
    }
}

/// Shared, append-only keyword table. Cloning yields another handle to the
/// same table.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    entries: Arc<RwLock<Vec<VocabularyEntry>>>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Vocabulary {
    /// A vocabulary holding [`SEED_VOCABULARY`].
    pub fn seeded() -> Self {
        Self::from_entries(
            SEED_VOCABULARY
                .iter()
                .map(|(keyword, name)| VocabularyEntry::new(*keyword, *name)),
        )
    }

    /// Build from arbitrary entries. Duplicate keywords keep the first mapping.
    pub fn from_entries(entries: impl IntoIterator<Item = VocabularyEntry>) -> Self {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|e| !e.keyword.is_empty() && seen.insert(e.keyword.clone()))
            .collect();
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Canonical name of the first entry whose keyword occurs in `lowercase_text`.
    pub async fn match_keyword(&self, lowercase_text: &str) -> Option<String> {
        let entries = self.entries.read().await;
        scan(&entries, lowercase_text).map(|e| e.canonical_name.clone())
    }

    /// Insert `keyword` unless the table already answers for `lowercase_text`.
    ///
    /// Runs under the write lock. A concurrent request may have taught the
    /// table something that now matches; in that case the existing mapping is
    /// returned and nothing is inserted.
    async fn learn(&self, lowercase_text: &str, keyword: &str) -> String {
        let mut entries = self.entries.write().await;
        if let Some(existing) = scan(&entries, lowercase_text) {
            debug!(keyword = %existing.keyword, "Keyword learned concurrently; reusing it");
            return existing.canonical_name.clone();
        }
        let canonical_name = capitalize(keyword);
        info!(
            keyword = %keyword,
            department = %canonical_name,
            "Learned new department"
        );
        entries.push(VocabularyEntry::new(keyword, canonical_name.clone()));
        canonical_name
    }

    /// Entries in scan order.
    pub async fn snapshot(&self) -> Vec<VocabularyEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn scan<'a>(entries: &'a [VocabularyEntry], lowercase_text: &str) -> Option<&'a VocabularyEntry> {
    entries.iter().find(|e| lowercase_text.contains(e.keyword.as_str()))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Maps appointment text to a canonical department, learning new departments
/// from phrasing when the vocabulary has no answer.
#[derive(Debug, Clone)]
pub struct DepartmentResolver {
    vocabulary: Vocabulary,
    stop_words: Arc<HashSet<&'static str>>,
}

impl Default for DepartmentResolver {
    fn default() -> Self {
        Self::new(Vocabulary::seeded())
    }
}

impl DepartmentResolver {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            stop_words: Arc::new(STOP_WORDS.iter().copied().collect()),
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Resolve `text` to a department, or `None` if neither the vocabulary nor
    /// a learning rule produces one. May add one entry to the vocabulary.
    pub async fn resolve(&self, text: &str) -> Option<String> {
        let lowercase = text.to_lowercase();

        if let Some(name) = self.vocabulary.match_keyword(&lowercase).await {
            debug!(department = %name, "Matched existing department keyword");
            return Some(name);
        }

        let keyword = self.mine_keyword(&lowercase)?;
        Some(self.vocabulary.learn(&lowercase, keyword).await)
    }

    /// Run the learning rules in order and return the first acceptable capture.
    fn mine_keyword<'t>(&self, lowercase: &'t str) -> Option<&'t str> {
        for rule in &LEARNING_RULES {
            let Some(word) = rule
                .pattern
                .captures(lowercase)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
            else {
                continue;
            };
            if rule.rejects_stop_words && self.stop_words.contains(word) {
                debug!(rule = rule.name, word, "Rejected stop word as department");
                continue;
            }
            debug!(rule = rule.name, word, "Mined department candidate");
            return Some(word);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(entries: &[VocabularyEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.keyword.as_str()).collect()
    }

    #[tokio::test]
    async fn seeded_keyword_matches_anywhere_in_text() {
        let resolver = DepartmentResolver::default();
        assert_eq!(
            resolver.resolve("Please book me with the DENTIST next week").await.as_deref(),
            Some("Dentistry")
        );
        assert_eq!(
            resolver.resolve("my heart has been racing").await.as_deref(),
            Some("Cardiology")
        );
        assert_eq!(resolver.vocabulary().len().await, SEED_VOCABULARY.len());
    }

    #[tokio::test]
    async fn keyword_match_is_substring_not_word() {
        let resolver = DepartmentResolver::default();
        // "heartburn" contains "heart".
        assert_eq!(
            resolver.resolve("heartburn again, need help").await.as_deref(),
            Some("Cardiology")
        );
    }

    #[tokio::test]
    async fn first_keyword_in_scan_order_wins() {
        let resolver = DepartmentResolver::default();
        // "doctor" appears first in the text, but "dentist" is earlier in the table.
        assert_eq!(
            resolver.resolve("doctor or dentist, whoever is free").await.as_deref(),
            Some("Dentistry")
        );
    }

    #[tokio::test]
    async fn learns_from_word_before_appointment() {
        let resolver = DepartmentResolver::default();
        assert_eq!(
            resolver.resolve("book a cardiology appointment").await.as_deref(),
            Some("Cardiology")
        );

        let entries = resolver.vocabulary().snapshot().await;
        assert_eq!(
            entries.last(),
            Some(&VocabularyEntry::new("cardiology", "Cardiology"))
        );

        // Now a plain keyword hit; nothing new is learned.
        assert_eq!(resolver.resolve("cardiology").await.as_deref(), Some("Cardiology"));
        assert_eq!(resolver.vocabulary().len().await, SEED_VOCABULARY.len() + 1);
    }

    #[tokio::test]
    async fn learns_from_word_after_appointment() {
        let resolver = DepartmentResolver::default();
        assert_eq!(
            resolver.resolve("Appointment with neurologist please").await.as_deref(),
            Some("Neurologist")
        );
        assert_eq!(
            resolver.resolve("any neurologist slots?").await.as_deref(),
            Some("Neurologist")
        );
    }

    #[tokio::test]
    async fn appt_abbreviation_is_recognized() {
        let resolver = DepartmentResolver::default();
        assert_eq!(resolver.resolve("derm appt friday").await.as_deref(), Some("Derm"));
    }

    #[tokio::test]
    async fn stop_word_falls_through_to_second_rule() {
        let resolver = DepartmentResolver::default();
        assert_eq!(
            resolver.resolve("my appointment for physiotherapy").await.as_deref(),
            Some("Physiotherapy")
        );
        let entries = resolver.vocabulary().snapshot().await;
        assert!(!keywords(&entries).contains(&"my"));
    }

    #[tokio::test]
    async fn stop_word_without_second_rule_is_not_found() {
        let resolver = DepartmentResolver::default();
        assert_eq!(resolver.resolve("cancel the appointment").await, None);
        assert_eq!(resolver.vocabulary().len().await, SEED_VOCABULARY.len());
    }

    #[tokio::test]
    async fn second_rule_does_not_filter_stop_words() {
        let resolver = DepartmentResolver::default();
        assert_eq!(
            resolver.resolve("appointment at the clinic").await.as_deref(),
            Some("The")
        );
    }

    #[tokio::test]
    async fn empty_text_is_not_found_and_does_not_learn() {
        let resolver = DepartmentResolver::default();
        assert_eq!(resolver.resolve("").await, None);
        assert_eq!(resolver.vocabulary().len().await, SEED_VOCABULARY.len());
    }

    #[tokio::test]
    async fn learned_entries_are_scanned_last() {
        let resolver = DepartmentResolver::default();
        resolver.resolve("an eye appointment").await;
        // "eye" is known now, but "doctor" sits earlier in the table.
        assert_eq!(
            resolver.resolve("eye doctor tomorrow").await.as_deref(),
            Some("General Medicine")
        );
    }

    #[tokio::test]
    async fn clones_share_the_vocabulary() {
        let resolver = DepartmentResolver::default();
        let other = resolver.clone();
        resolver.resolve("podiatry appointment").await;
        assert_eq!(other.resolve("podiatry").await.as_deref(), Some("Podiatry"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_learning_inserts_once() {
        let resolver = DepartmentResolver::default();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let resolver = resolver.clone();
                tokio::spawn(async move { resolver.resolve("book an oncology appointment").await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().as_deref(), Some("Oncology"));
        }
        let entries = resolver.vocabulary().snapshot().await;
        let count = entries.iter().filter(|e| e.keyword == "oncology").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn duplicate_seed_keywords_keep_first_mapping() {
        let vocabulary = Vocabulary::from_entries([
            VocabularyEntry::new("ENT", "Otolaryngology"),
            VocabularyEntry::new("ent", "Something Else"),
        ]);
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let entries = rt.block_on(vocabulary.snapshot());
        assert_eq!(entries, vec![VocabularyEntry::new("ent", "Otolaryngology")]);
    }

    #[test]
    fn capitalize_handles_empty_and_ascii() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("neurology"), "Neurology");
    }
}
