use crate::core::comments::CommentRecord;
use std::collections::HashMap;

const STOP_WORDS: &[&str] = &[
    "a", "about", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "he",
    "her", "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "me", "more",
    "my", "no", "not", "of", "on", "one", "or", "our", "out", "she", "so", "some", "than",
    "that", "the", "their", "them", "then", "there", "these", "they", "this", "to", "too", "up",
    "us", "very", "was", "we", "were", "what", "when", "which", "who", "why", "will", "with",
    "would", "you", "your",
];

/// Comments whose text contains `keyword`, ignoring case.
pub fn filter_by_keyword(records: &[CommentRecord], keyword: &str) -> Vec<CommentRecord> {
    let needle = keyword.trim().to_lowercase();
    records
        .iter()
        .filter(|record| record.text.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Most liked first. Ties keep their upstream order.
pub fn sort_by_popularity(records: &mut [CommentRecord]) {
    records.sort_by(|a, b| b.popularity.cmp(&a.popularity));
}

pub fn top_by_popularity(mut records: Vec<CommentRecord>, n: usize) -> Vec<CommentRecord> {
    sort_by_popularity(&mut records);
    records.truncate(n);
    records
}

/// Word counts across all texts, most frequent first.
pub fn word_frequencies<'a>(
    texts: impl IntoIterator<Item = &'a str>,
    top: usize,
) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for text in texts {
        for word in tokenize(text) {
            *counts.entry(word).or_default() += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|(word_a, count_a), (word_b, count_b)| {
        count_b.cmp(count_a).then_with(|| word_a.cmp(word_b))
    });
    ranked.truncate(top);
    ranked
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|token| token.trim_matches('\'').to_lowercase())
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
        .filter(|token| !STOP_WORDS.contains(&token.as_str()))
}

/// Converts `textDisplay` HTML into terminal-friendly text.
pub fn to_plain_text(html: &str) -> String {
    let with_breaks = html
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n");

    let mut stripped = String::with_capacity(with_breaks.len());
    let mut in_tag = false;
    for c in with_breaks.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => stripped.push(c),
            _ => {}
        }
    }

    html_escape::decode_html_entities(&stripped).into_owned()
}
