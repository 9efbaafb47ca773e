use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::ingest::types::Sentiment;

static LEXICON: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, f64>>(raw).expect("valid sentiment lexicon")
});

/// Polarity above this is positive, below its negation negative.
/// Anything in between (inclusive) is neutral.
pub const NEUTRAL_BAND: f64 = 0.1;

impl Sentiment {
    /// Threshold a polarity score into a label.
    pub fn from_polarity(score: f64) -> Self {
        if score > NEUTRAL_BAND {
            Sentiment::Positive
        } else if score < -NEUTRAL_BAND {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

/// Stateless lexical polarity scorer. One value is shared by all jobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_polarity(&self, w: &str) -> Option<f64> {
        LEXICON.get(w).copied()
    }

    /// Mean polarity of the lexicon words in `text`, in [-1, 1]; 0 when none match.
    ///
    /// A preceding intensifier scales a word; a negator in the previous
    /// 1..=3 tokens flips and halves it.
    pub fn polarity(&self, text: &str) -> f64 {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut sum = 0.0;
        let mut hits = 0usize;

        for i in 0..tokens.len() {
            let Some(base) = self.word_polarity(&tokens[i]) else {
                continue;
            };

            let mut value = base;
            if i >= 1 {
                if let Some(factor) = intensity(&tokens[i - 1]) {
                    value *= factor;
                }
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            if negated {
                value *= -0.5;
            }

            sum += value.clamp(-1.0, 1.0);
            hits += 1;
        }

        if hits == 0 {
            return 0.0;
        }
        (sum / hits as f64).clamp(-1.0, 1.0)
    }

    /// Label computed over the raw comment text.
    pub fn classify(&self, text: &str) -> Sentiment {
        Sentiment::from_polarity(self.polarity(text))
    }
}

/// Lower-cased tokens of letters, digits and inner apostrophes.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|t| t.trim_matches(|c: char| c == '\'' || c == '\u{2019}'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase().replace('\u{2019}', "'"))
}

fn intensity(tok: &str) -> Option<f64> {
    match tok {
        "very" | "really" | "so" | "super" | "truly" => Some(1.3),
        "extremely" | "incredibly" | "absolutely" | "totally" => Some(1.5),
        "quite" | "pretty" => Some(1.1),
        "slightly" | "somewhat" | "kinda" => Some(0.5),
        _ => None,
    }
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "don't"
            | "doesn't"
            | "didn't"
            | "dont"
            | "doesnt"
            | "didnt"
            | "isnt"
            | "without"
    )
}
