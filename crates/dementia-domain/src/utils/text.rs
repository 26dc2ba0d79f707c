use std::collections::HashMap;

use unicode_segmentation::UnicodeSegmentation;

const PREVIEW_CHARS: usize = 500;

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "is", "are", "was", "were", "be", "been", "being",
    "to", "of", "in", "on", "at", "for", "with", "by", "from", "as", "this", "that", "these",
    "those", "it", "its", "we", "you", "i", "not", "no", "do", "does", "did", "will", "would",
    "can", "could", "should", "must", "have", "has", "had", "if", "then", "than", "so",
];

/// Word-boundary-safe truncation to ~500 characters, so multi-byte content
/// is never split mid-codepoint or mid-word.
pub fn truncate_preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        return content.to_string();
    }

    let mut preview = String::new();
    let mut char_count = 0;
    for word in content.split_word_bounds() {
        if char_count + word.chars().count() > PREVIEW_CHARS {
            break;
        }
        preview.push_str(word);
        char_count += word.chars().count();
    }
    preview.trim_end().to_string()
}

/// Keyword-search relevance score (spec's documented weights): exact
/// `label` match contributes 1.0, a `key_concepts` match 0.7, a `content`
/// substring match 0.5, a `preview` substring match 0.3. Contributions sum,
/// so a row can score up to 2.5. Callers filter out zero-score rows and
/// order by score, breaking ties by `last_accessed`.
pub fn keyword_relevance_score(label: &str, content: &str, preview: &str, key_concepts: &[String], query: &str) -> f32 {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return 0.0;
    }

    let mut score = 0.0;
    if label.to_lowercase() == query {
        score += 1.0;
    }
    if key_concepts.iter().any(|concept| concept.to_lowercase().contains(&query)) {
        score += 0.7;
    }
    if content.to_lowercase().contains(&query) {
        score += 0.5;
    }
    if preview.to_lowercase().contains(&query) {
        score += 0.3;
    }
    score
}

/// Top-N stopword-filtered term-frequency tokens from `content` plus any
/// supplied `tags`, used as a lightweight indexing aid. Intentionally
/// unsophisticated: no NLP dependency, just frequency counting.
pub fn extract_key_concepts(content: &str, tags: &[String]) -> Vec<String> {
    const TOP_N: usize = 10;
    const MIN_WORD_LEN: usize = 3;

    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in content.unicode_words() {
        let lower = word.to_lowercase();
        if lower.len() < MIN_WORD_LEN || STOPWORDS.contains(&lower.as_str()) {
            continue;
        }
        *counts.entry(lower).or_insert(0) += 1;
    }
    for tag in tags {
        *counts.entry(tag.to_lowercase()).or_insert(0) += TOP_N;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(TOP_N).map(|(word, _)| word).collect()
}
