// src/normalize.rs
//! Comment text normalization for export: lowercase, strip URLs/tags/punctuation,
//! drop stop-words, reduce tokens to a base form.
//!
//! Total and deterministic; applying it to its own output is a no-op.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static RE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("url regex"));
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

/// Closed English stop-word list (apostrophe-free forms, since punctuation
/// is stripped before filtering).
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "youre", "youve",
        "youll", "youd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
        "himself", "she", "shes", "her", "hers", "herself", "it", "its", "itself", "they",
        "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
        "that", "thatll", "these", "those", "am", "is", "are", "was", "were", "be", "been",
        "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
        "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
        "for", "with", "about", "against", "between", "into", "through", "during", "before",
        "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off",
        "over", "under", "again", "further", "then", "once", "here", "there", "when", "where",
        "why", "how", "all", "any", "both", "each", "few", "more", "most", "other", "some",
        "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s",
        "t", "can", "will", "just", "don", "dont", "should", "shouldve", "now", "d", "ll", "m",
        "o", "re", "ve", "y", "ain", "aren", "arent", "couldn", "couldnt", "didn", "didnt",
        "doesn", "doesnt", "hadn", "hadnt", "hasn", "hasnt", "haven", "havent", "isn", "isnt",
        "ma", "mightn", "mightnt", "mustn", "mustnt", "needn", "neednt", "shan", "shant",
        "shouldn", "shouldnt", "wasn", "wasnt", "weren", "werent", "won", "wont", "wouldn",
        "wouldnt",
    ]
    .into_iter()
    .collect()
});

/// Irregular plural → base form. Every value is a fixed point of [`lemmatize`].
static IRREGULAR: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("people", "person"),
        ("mice", "mouse"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("geese", "goose"),
        ("lives", "life"),
        ("wives", "wife"),
        ("knives", "knife"),
        ("leaves", "leaf"),
        ("wolves", "wolf"),
    ]
    .into_iter()
    .collect()
});

/// Normalize raw comment text. Never fails; unusable input yields "".
pub fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let no_urls = RE_URL.replace_all(&lowered, " ");
    let no_tags = RE_TAG.replace_all(&no_urls, " ");
    let no_punct: String = no_tags.chars().filter(|c| !c.is_ascii_punctuation()).collect();

    no_punct
        .split_whitespace()
        .filter(|t| is_content_token(t))
        .map(lemmatize)
        .filter(|t| is_content_token(t))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_content_token(t: &str) -> bool {
    !t.is_empty() && t.chars().all(char::is_alphanumeric) && !STOP_WORDS.contains(t)
}

/// Rule-based noun lemma. Results never end in a single plural `s` and are
/// never irregular plurals, so applying it twice changes nothing.
pub fn lemmatize(word: &str) -> String {
    let stem = strip_plural(word);
    match IRREGULAR.get(stem.as_str()) {
        Some(base) => (*base).to_string(),
        None => stem,
    }
}

fn strip_plural(word: &str) -> String {
    let n = word.chars().count();
    if n <= 3
        || !word.ends_with('s')
        || word.ends_with("ss")
        || word.ends_with("us")
        || word.ends_with("is")
        || IRREGULAR.contains_key(word)
    {
        return word.to_string();
    }
    if n > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    for suffix in ["sses", "ches", "shes", "xes", "zes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    word[..word.len() - 1].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_noise_and_stop_words() {
        let s = "Check THIS out: https://example.com/x <b>Great</b> videos, www.spam.io!!";
        assert_eq!(normalize(s), "check great video");
    }

    #[test]
    fn lemma_rules() {
        assert_eq!(lemmatize("cats"), "cat");
        assert_eq!(lemmatize("stories"), "story");
        assert_eq!(lemmatize("boxes"), "box");
        assert_eq!(lemmatize("watches"), "watch");
        assert_eq!(lemmatize("glass"), "glass");
        assert_eq!(lemmatize("glasses"), "glass");
        assert_eq!(lemmatize("childrens"), "child");
        assert_eq!(lemmatize("bus"), "bus");
        assert_eq!(lemmatize("analysis"), "analysis");
        assert_eq!(lemmatize("children"), "child");
        assert_eq!(lemmatize("gas"), "gas");
    }

    #[test]
    fn non_alphanumeric_tokens_are_dropped() {
        assert_eq!(normalize("love 😍 it"), "love");
        assert_eq!(normalize("..."), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn contractions_collapse_to_stop_words() {
        assert_eq!(normalize("I don't know, it isn't bad"), "know bad");
    }

    #[test]
    fn idempotent() {
        for s in [
            "The Cats were RUNNING across the boxes!!! <i>wow</i>",
            "Ünïcödé stories, glasses & buses; 1990s",
            "thes its hers",
            "<<<>>> www. http://",
        ] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input: {s}");
        }
    }
}
