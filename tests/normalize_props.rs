// tests/normalize_props.rs
use comment_sentiment_analyzer::normalize::{lemmatize, normalize};

const SAMPLES: &[&str] = &[
    "OMG!!! This is the BEST video I've ever watched 😂😂 https://t.co/xyz",
    "<a href=\"https://example.com\">link</a> subscribe to my channel",
    "Who's here in 2024?",
    "the the the",
    "Dogs, cats & foxes; the stories of the wolves",
    "   ",
    "Ça c'est très bien, les enfants!",
    "12345 abc123 a1b2",
];

#[test]
fn normalize_is_idempotent() {
    for s in SAMPLES {
        let once = normalize(s);
        assert_eq!(normalize(&once), once, "input: {s:?}");
    }
}

#[test]
fn output_is_lowercase_alphanumeric_tokens() {
    for s in SAMPLES {
        let out = normalize(s);
        for tok in out.split(' ').filter(|t| !t.is_empty()) {
            assert!(tok.chars().all(char::is_alphanumeric), "{tok:?} from {s:?}");
            assert_eq!(tok, tok.to_lowercase());
        }
        assert!(!out.contains("  "));
        assert_eq!(out.trim(), out);
    }
}

#[test]
fn urls_and_markup_are_removed() {
    let out = normalize("watch <b>this</b> https://youtu.be/abc and www.example.org now");
    assert_eq!(out, "watch");
}

#[test]
fn plurals_reduce_to_singular() {
    assert_eq!(normalize("Dogs, cats & foxes; the stories of the wolves"), "dog cat fox story wolf");
    assert_eq!(lemmatize(&lemmatize("berries")), lemmatize("berries"));
}

#[test]
fn stop_words_only_yield_empty() {
    assert_eq!(normalize("the the the"), "");
    assert_eq!(normalize("   "), "");
}
