//! Text tokenization and stemming utilities for search indexing.

use ahash::AHashMap;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashMap;
use xxhash_rust::xxh3::xxh3_64;

use super::index::InvertedIndex;
use crate::index::SearchEntry;

/// Minimum token length for indexing. Set to 1 so short symbols like `P` or `E` survive.
const MIN_TOKEN_LENGTH: usize = 1;

/// Weight of terms found in an entry title.
const TITLE_WEIGHT: f32 = 2.0;
/// Weight of terms found in the entry body.
const TEXT_WEIGHT: f32 = 1.0;
/// Weight of terms found in the owning page title.
const PAGE_WEIGHT: f32 = 0.5;

/// Common English stop words to filter out from indexing.
/// These high-frequency words add little value to search relevance.
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "will", "with",
];

/// Document identifier: position of the entry in the payload.
type DocId = u32;

/// Term hash for fast lookup
type TermHash = u64;

/// Builder for accumulating term frequencies before TF-IDF finalization.
pub(crate) struct TermBuilder {
    /// Flat map from (term_hash, doc_id) → raw TF score
    term_docs: HashMap<(TermHash, DocId), f32>,
    /// Map from doc_id to document length (total term count for normalization)
    doc_lengths: HashMap<DocId, usize>,
    /// Number of entries added, including ones that produced no terms
    doc_count: usize,
    /// Reusable stemmer instance for English language stemming
    stemmer: Stemmer,
}

impl Default for TermBuilder {
    fn default() -> Self {
        Self {
            term_docs: HashMap::default(),
            doc_lengths: HashMap::default(),
            doc_count: 0,
            stemmer: Stemmer::create(Algorithm::English),
        }
    }
}

impl TermBuilder {
    /// Add a term with its TF score for a specific document.
    fn add(&mut self, term: &str, tf_score: f32, doc_id: DocId) {
        let term_hash = hash_term(term);
        *self.term_docs.entry((term_hash, doc_id)).or_insert(0.0) += tf_score;
    }

    /// Extracts and adds terms from text with frequency counting.
    /// TF score = term_count * base_score, where base_score weights importance.
    fn add_terms(&mut self, text: &str, doc_id: DocId, base_score: f32) {
        let words = tokenize_and_stem(text, &self.stemmer);

        let mut word_counts: AHashMap<String, usize> = AHashMap::with_capacity(words.len());
        for word in words {
            *word_counts.entry(word).or_insert(0) += 1;
        }

        let doc_len: usize = word_counts.values().sum();
        *self.doc_lengths.entry(doc_id).or_insert(0) += doc_len;

        for (word, count) in word_counts {
            let tf_score = (count as f32) * base_score;
            self.add(&word, tf_score, doc_id);
        }
    }

    /// Index one entry under its payload position.
    pub(crate) fn add_entry(&mut self, doc_id: DocId, entry: &SearchEntry) {
        self.doc_count += 1;
        self.add_terms(&entry.title, doc_id, TITLE_WEIGHT);
        self.add_terms(&entry.text, doc_id, TEXT_WEIGHT);
        self.add_terms(&entry.page, doc_id, PAGE_WEIGHT);
    }

    /// Calculates IDF scores and produces the final searchable index.
    /// Uses formula: TF-IDF = (1 + ln(tf_normalized)) * ln(total_docs / doc_freq),
    /// where tf_normalized = tf / doc_length for length normalization.
    pub(crate) fn finalize(self) -> InvertedIndex {
        let start = std::time::Instant::now();
        let total_docs = self.doc_count as f32;

        let total_length: usize = self.doc_lengths.values().sum();
        let avg_doc_length = if self.doc_lengths.is_empty() {
            1.0
        } else {
            total_length as f32 / self.doc_lengths.len() as f32
        };

        type GroupedDocs = HashMap<TermHash, Vec<(DocId, f32)>>;
        let mut grouped: GroupedDocs = HashMap::new();
        let total_term_doc_pairs = self.term_docs.len();
        for ((term_hash, doc_id), tf_score) in self.term_docs {
            grouped
                .entry(term_hash)
                .or_default()
                .push((doc_id, tf_score));
        }

        let mut terms: HashMap<TermHash, Vec<(DocId, f32)>> = HashMap::new();

        for (term_hash, doc_scores) in grouped {
            // IDF = ln(total_docs / doc_freq); a term present everywhere scores zero
            let doc_freq = doc_scores.len() as f32;
            let idf = (total_docs / doc_freq).ln();

            let mut tf_idf_scores: Vec<_> = doc_scores
                .into_iter()
                .map(|(doc_id, tf_score)| {
                    let doc_length = self.doc_lengths.get(&doc_id).copied().unwrap_or(1) as f32;
                    let length_norm = doc_length / avg_doc_length;
                    // Clamp to prevent over-penalization of short entries
                    let tf_normalized = tf_score / length_norm.max(0.5);
                    // Floor keeps long entries from scoring below entries without the term
                    (doc_id, (1.0 + tf_normalized.ln()).max(0.1) * idf)
                })
                .collect();

            // Descending by score, ties by position for deterministic output
            tf_idf_scores.sort_by(|(a_id, a), (b_id, b)| b.total_cmp(a).then(a_id.cmp(b_id)));

            terms.insert(term_hash, tf_idf_scores);
        }

        let index = InvertedIndex::new(terms, self.doc_count);

        tracing::info!(
            "Built search index: {} unique terms, {} documents, {} term-document pairs in {:?}",
            index.term_count(),
            index.document_count(),
            total_term_doc_pairs,
            start.elapsed()
        );

        index
    }
}

/// Tokenizes text into searchable terms with stemming and case-aware splitting.
///
/// A word runs until the next non-letter, and each word is also split into
/// components at CamelCase, `_` and `-` boundaries. Both the components and
/// the whole word are emitted:
/// - `HydroEnergyOutput` gives `hydro`, `energy`, `output`, `hydroenergyoutput`
/// - `construct_device!` gives `construct`, `devic`, `construct_devic`
/// - `HydroPowerSimulations.ReservoirLimitParameter` splits at the dot first
/// - `E^surplus` gives `e` and `surplus`
pub(crate) fn tokenize_and_stem(text: &str, stemmer: &Stemmer) -> Vec<String> {
    let mut tokens = vec![];
    let mut emit = |span: &str| {
        if span.len() >= MIN_TOKEN_LENGTH {
            index_token(span, &mut tokens, stemmer);
        }
    };

    // Byte offsets into `text`. `part` is None right after a `_` or `-`.
    let mut word: Option<usize> = None;
    let mut part: Option<usize> = None;
    let mut last_upper: Option<bool> = None;

    for (i, c) in text.char_indices() {
        let word_start = *word.get_or_insert(i);
        let part_start = *part.get_or_insert(i);

        let upper = c.is_alphabetic().then(|| c.is_uppercase());
        let hump = last_upper == Some(false) && upper == Some(true);
        last_upper = upper;

        if c == '-' || c == '_' {
            emit(&text[part_start..i]);
            part = None;
        } else if !c.is_alphabetic() {
            // A lone component is the word itself
            if part_start != word_start {
                emit(&text[part_start..i]);
            }
            emit(&text[word_start..i]);
            word = None;
            part = None;
        } else if hump {
            emit(&text[part_start..i]);
            part = Some(i);
        }
    }

    if let Some(word_start) = word {
        if let Some(part_start) = part.filter(|&p| p != word_start) {
            emit(&text[part_start..]);
        }
        emit(&text[word_start..]);
    }

    tokens
}

/// Add a token using proper stemming algorithm, filtering out stop words.
pub(crate) fn index_token(token: &str, tokens: &mut Vec<String>, stemmer: &Stemmer) {
    let lowercase = token.to_lowercase();

    if STOP_WORDS.contains(&lowercase.as_str()) {
        return;
    }

    let stemmed = stemmer.stem(&lowercase);
    tokens.push(stemmed.into_owned());
}

/// Hashes a term for fast lookup (case-insensitive).
///
/// Term tables are persisted to disk, so the hash must be stable across processes.
pub(crate) fn hash_term(term: &str) -> u64 {
    xxh3_64(term.to_lowercase().as_bytes())
}
