//! Rule-based natural-language understanding for Nova.
//!
//! `parse` is a pure, total function: any utterance yields a [`ParsedQuery`],
//! never an error. Classification is an ordered list of (predicate,
//! constructor) pairs evaluated top to bottom; the first match wins and there
//! is no backtracking.

use crate::models::{Gender, Intent, ParsedQuery, Season, StyleLevel};

// ── Vocabularies ─────────────────────────────────────────────────────────────

const CAPABILITY_CUES: &[&str] =
    &["wat kan", "wat kun", "mogelijkheden", "help", "hulp", "what can you do"];

const GREETINGS: &[&str] = &[
    "goedemorgen",
    "goedemiddag",
    "goedenavond",
    "hallo",
    "hoi",
    "hey",
    "hi",
    "yo",
];

/// Synonym table for the style level. First match in table order wins, so the
/// longer "smart casual" phrase is listed before plain "casual".
const STYLE_SYNONYMS: &[(&str, StyleLevel)] = &[
    ("smart casual", StyleLevel::SmartCasual),
    ("smart-casual", StyleLevel::SmartCasual),
    ("business", StyleLevel::SmartCasual),
    ("zakelijk", StyleLevel::SmartCasual),
    ("smart", StyleLevel::SmartCasual),
    ("netjes", StyleLevel::SmartCasual),
    ("formeel", StyleLevel::Formeel),
    ("chic", StyleLevel::Formeel),
    ("elegant", StyleLevel::Formeel),
    ("casual", StyleLevel::Casual),
    ("relaxed", StyleLevel::Casual),
];

const SEASONS: &[(&str, Season)] = &[
    ("lente", Season::Lente),
    ("zomer", Season::Zomer),
    ("herfst", Season::Herfst),
    ("winter", Season::Winter),
];

const OCCASIONS: &[&str] = &[
    "kantoor", "werk", "bruiloft", "gala", "feest", "date", "weekend", "vakantie",
    "festival", "uitgaan",
];

const COLORS: &[&str] = &[
    "zwart", "wit", "grijs", "beige", "navy", "blauw", "groen", "rood", "bordeaux",
    "roze", "paars", "geel", "oranje", "bruin", "camel",
];

const MALE_WORDS: &[&str] = &["heren", "man", "mannen"];
const FEMALE_WORDS: &[&str] = &["dames", "vrouw", "vrouwen"];

const REFINE_CUES: &[&str] = &["nog een", "ander", "meer", "opnieuw"];

// ── Matching helpers ─────────────────────────────────────────────────────────

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty())
}

/// True when a vocabulary term occurs in the text. Multi-word terms match as
/// a substring; single words match any token starting with the term, so
/// inflected forms ("zwarte", "zomerse") count as well.
fn has_term(text: &str, term: &str) -> bool {
    if term.contains(' ') {
        text.contains(term)
    } else {
        tokens(text).any(|w| w.starts_with(term))
    }
}

fn has_word(text: &str, words: &[&str]) -> bool {
    tokens(text).any(|w| words.contains(&w))
}

// ── Rules ────────────────────────────────────────────────────────────────────

type Rule = (fn(&str) -> bool, fn(&str) -> ParsedQuery);

/// Evaluated top to bottom; the first matching predicate builds the result.
const RULES: &[Rule] = &[
    (is_capability_question, capabilities),
    (is_short_greeting, smalltalk),
    (always, classify_outfit_query),
];

fn is_capability_question(text: &str) -> bool {
    CAPABILITY_CUES.iter().any(|cue| has_term(text, cue))
}

fn is_short_greeting(text: &str) -> bool {
    // A greeting only counts when the whole utterance is short; "hoi, outfit
    // voor kantoor" should fall through to slot extraction.
    if tokens(text).count() > 3 {
        return false;
    }
    GREETINGS.iter().any(|g| {
        text.starts_with(g)
            && text[g.len()..].chars().next().is_none_or(|c| !c.is_alphanumeric())
    })
}

fn always(_text: &str) -> bool {
    true
}

fn capabilities(_text: &str) -> ParsedQuery {
    ParsedQuery::bare(Intent::Capabilities)
}

fn smalltalk(_text: &str) -> ParsedQuery {
    ParsedQuery::bare(Intent::Smalltalk)
}

/// Slot extraction plus the outfit request/refine decision. Style, season and
/// occasion take the first vocabulary match; colors collect every match in
/// vocabulary order.
fn classify_outfit_query(text: &str) -> ParsedQuery {
    let style_level = STYLE_SYNONYMS
        .iter()
        .find(|(term, _)| has_term(text, term))
        .map(|(_, level)| *level);

    let season = SEASONS
        .iter()
        .find(|(term, _)| has_term(text, term))
        .map(|(_, season)| *season);

    let occasion = OCCASIONS
        .iter()
        .find(|term| has_term(text, term))
        .map(|term| term.to_string());

    let colors: Vec<String> = COLORS
        .iter()
        .filter(|term| has_term(text, term))
        .map(|term| term.to_string())
        .collect();

    let gender = if has_word(text, MALE_WORDS) {
        Some(Gender::Male)
    } else if has_word(text, FEMALE_WORDS) {
        Some(Gender::Female)
    } else {
        None
    };

    let mut query = ParsedQuery {
        intent: Intent::OutfitRequest,
        style_level,
        season,
        occasion,
        colors,
        gender,
    };

    if query.has_signal() && REFINE_CUES.iter().any(|cue| has_term(text, cue)) {
        query.intent = Intent::OutfitRefine;
    }
    // Anything else, with or without an explicit outfit keyword, stays
    // `outfit.request`; unclassified input is never an error.

    query
}

// ── Entry point ──────────────────────────────────────────────────────────────

/// Maps raw user text to an intent plus extracted slots. Pure and total.
pub fn parse(text: &str) -> ParsedQuery {
    let normalized = text.trim().to_lowercase();
    for (predicate, construct) in RULES {
        if predicate(&normalized) {
            return construct(&normalized);
        }
    }
    ParsedQuery::bare(Intent::OutfitRequest)
}
