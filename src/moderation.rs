//! Sensitive-word masking, shared by the moderation check, the post
//! publish gate and the AI `safety` action.

use serde::Serialize;

use crate::store;

/// Outcome of masking a text against a word list.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MaskOutcome {
    pub allowed: bool,
    /// Words from the list found in the text, in list order.
    pub hits: Vec<String>,
    /// The text with every hit replaced by `*`, one per character.
    pub masked_text: String,
}

/// Mask every occurrence of the listed words.
///
/// Matching is case-sensitive substring containment, processed in list
/// order; empty words are skipped. A masked region consists of `*`
/// characters, so a later word that overlaps an earlier hit can no
/// longer match.
pub fn mask(text: &str, words: &[String]) -> MaskOutcome {
    let mut hits = Vec::new();
    let mut masked = text.to_string();
    for word in words {
        if word.is_empty() {
            continue;
        }
        if masked.contains(word.as_str()) {
            hits.push(word.clone());
            masked = masked.replace(word.as_str(), &"*".repeat(word.chars().count()));
        }
    }
    MaskOutcome {
        allowed: hits.is_empty(),
        hits,
        masked_text: masked,
    }
}

/// Check a text against the store's current word list.
pub async fn check_text(text: &str) -> MaskOutcome {
    let words = store::INSTANCE.read().await.sensitive_words.clone();
    mask(text, &words)
}

/// The current moderation word list.
pub async fn sensitive_words() -> Vec<String> {
    store::INSTANCE.read().await.sensitive_words.clone()
}
