//! Fuzzy location correction against a gazetteer of known destinations.
//!
//! The matching logic never owns its word list: a [`Gazetteer`] is injected
//! into the [`LocationNormalizer`], so the list can be extended or loaded
//! from elsewhere without touching the algorithm.

use serde::{Deserialize, Serialize};
use similar::TextDiff;

/// Similarity at or above which a correction is applied silently.
pub const DEFAULT_CORRECTION_THRESHOLD: f64 = 0.8;

/// Lowest similarity that still yields a (confirmation-required) suggestion.
pub const SUGGESTION_FLOOR: f64 = 0.6;

/// Destinations known to the assistant, in match-priority order.
const DEFAULT_DESTINATIONS: &[&str] = &[
    "mumbai", "delhi", "bangalore", "hyderabad", "chennai", "kolkata", "pune", "ahmedabad",
    "jaipur", "lucknow", "kanpur", "nagpur", "indore", "bhopal", "visakhapatnam", "patna",
    "goa", "kerala", "rajasthan", "himachal pradesh", "uttarakhand", "kashmir", "ladakh",
    "agra", "varanasi", "haridwar", "rishikesh", "dharamshala", "manali", "shimla",
    "udaipur", "jodhpur", "pushkar", "mount abu", "ranthambore", "jim corbett",
    "kochi", "thiruvananthapuram", "alleppey", "munnar", "thekkady",
    "mysore", "coorg", "ooty", "kodaikanal", "pondicherry", "hampi", "badami",
    "paris", "london", "dubai", "singapore", "thailand", "malaysia", "japan", "switzerland",
    "new york", "toronto", "sydney", "bali", "maldives", "nepal", "bhutan", "sri lanka",
];

/// Ordered list of known place names, stored case-folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gazetteer {
    entries: Vec<String>,
}

impl Gazetteer {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best-scoring entry for `query`; the earliest entry wins ties.
    pub fn best_match(&self, query: &str) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for entry in &self.entries {
            let score = similarity(query, entry);
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((entry.as_str(), score)),
            }
        }
        best
    }

    /// Find a known destination mentioned inside free text.
    ///
    /// Only whole-word containment counts; the longest entry wins, so
    /// "himachal pradesh" beats a shorter overlapping name.
    pub fn find_in_text(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let padded = format!(" {} ", words.join(" "));

        self.entries
            .iter()
            .filter(|e| padded.contains(&format!(" {} ", e)))
            .max_by_key(|e| e.len())
            .map(|e| title_case(e))
    }

    /// Entry closest to `name` when it scores at least `min_score`.
    pub fn closest(&self, name: &str, min_score: f64) -> Option<String> {
        let query = name.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }
        self.best_match(&query)
            .filter(|(_, score)| *score >= min_score)
            .map(|(entry, _)| title_case(entry))
    }
}

impl Default for Gazetteer {
    fn default() -> Self {
        Self::new(DEFAULT_DESTINATIONS.iter())
    }
}

/// Outcome of normalizing one free-text location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationResolution {
    pub resolved_name: String,
    pub was_corrected: bool,
    /// Implies `was_corrected`.
    pub needs_confirmation: bool,
}

impl LocationResolution {
    fn unchanged(name: &str) -> Self {
        Self {
            resolved_name: name.to_string(),
            was_corrected: false,
            needs_confirmation: false,
        }
    }
}

/// Applies fuzzy correction to user-supplied place names.
#[derive(Debug, Clone)]
pub struct LocationNormalizer {
    gazetteer: Gazetteer,
    threshold: f64,
}

impl LocationNormalizer {
    pub fn new(gazetteer: Gazetteer) -> Self {
        Self::with_threshold(gazetteer, DEFAULT_CORRECTION_THRESHOLD)
    }

    /// Threshold is clamped so it never drops below the suggestion floor.
    pub fn with_threshold(gazetteer: Gazetteer, threshold: f64) -> Self {
        Self {
            gazetteer,
            threshold: threshold.clamp(SUGGESTION_FLOOR, 1.0),
        }
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Resolve `raw` against the gazetteer. Never fails.
    ///
    /// An exact (case-insensitive) hit is returned title-cased and counts as
    /// canonical, not as a correction.
    pub fn normalize(&self, raw: &str) -> LocationResolution {
        let trimmed = raw.trim();
        let query = trimmed.to_lowercase();
        if query.is_empty() {
            return LocationResolution::unchanged(raw);
        }

        let Some((entry, score)) = self.gazetteer.best_match(&query) else {
            return LocationResolution::unchanged(trimmed);
        };

        if entry == query {
            return LocationResolution {
                resolved_name: title_case(entry),
                was_corrected: false,
                needs_confirmation: false,
            };
        }

        self.classify(trimmed, entry, score)
    }

    fn classify(&self, original: &str, entry: &str, score: f64) -> LocationResolution {
        if score >= self.threshold {
            LocationResolution {
                resolved_name: title_case(entry),
                was_corrected: true,
                needs_confirmation: false,
            }
        } else if score >= SUGGESTION_FLOOR {
            LocationResolution {
                resolved_name: title_case(entry),
                was_corrected: true,
                needs_confirmation: true,
            }
        } else {
            LocationResolution::unchanged(original)
        }
    }
}

impl Default for LocationNormalizer {
    fn default() -> Self {
        Self::new(Gazetteer::default())
    }
}

/// Character-level similarity ratio in `[0, 1]` (`2 * matches / total`).
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    f64::from(TextDiff::from_chars(a, b).ratio())
}

/// Capitalize the first letter of every whitespace-separated word.
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
