//! Keyword classification of free-text chat messages.
//!
//! Messages are lower-cased and split into word tokens. Service keywords match
//! as token prefixes ("dented" counts as "dent"); FAQ and greeting words are
//! checked before any service keyword.

use once_cell::sync::Lazy;
use regex::Regex;

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z0-9]+").expect("word pattern is valid"));

/// Repair categories the assistant recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCategory {
    Collision,
    Headlight,
    Paint,
    Dent,
    General,
}

/// Questions answered without entering the booking flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Faq {
    Hours,
    Location,
    Price,
    Insurance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Faq(Faq),
    Problem(ServiceCategory),
}

// Checked in this order; the first category with a matching token wins.
const SERVICE_KEYWORDS: [(ServiceCategory, &[&str]); 4] = [
    (
        ServiceCategory::Collision,
        &["accident", "collision", "crash", "hit", "wreck", "frame"],
    ),
    (
        ServiceCategory::Headlight,
        &["headlight", "headlamp", "foggy", "yellow", "lens"],
    ),
    (ServiceCategory::Paint, &["paint", "scratch", "chip", "rust", "fade"]),
    (ServiceCategory::Dent, &["dent", "ding", "hail"]),
];

// Each entry is a run of consecutive words. Bare words like "open" or "much"
// also show up in damage reports, so those only count inside a question.
const FAQ_PHRASES: [(Faq, &[&[&str]]); 4] = [
    (
        Faq::Insurance,
        &[&["insurance"], &["insurer"], &["claim"], &["claims"], &["deductible"]],
    ),
    (
        Faq::Hours,
        &[
            &["hours"],
            &["are", "you", "open"],
            &["when", "do", "you", "open"],
            &["when", "do", "you", "close"],
            &["what", "time", "do", "you"],
        ],
    ),
    (
        Faq::Location,
        &[
            &["address"],
            &["directions"],
            &["located"],
            &["where", "are", "you"],
            &["where", "is", "the", "shop"],
        ],
    ),
    (
        Faq::Price,
        &[&["price"], &["pricing"], &["cost"], &["costs"], &["quote"], &["how", "much"]],
    ),
];

const GREETINGS: &[&str] = &[
    "hi", "hello", "hey", "howdy", "yo", "good", "morning", "afternoon", "evening", "there",
];

const AFFIRMATIVES: &[&str] = &[
    "yes", "yeah", "yep", "sure", "ok", "okay", "schedule", "book", "appointment",
];

// "don't" and "won't" tokenize to "don"/"won" plus "t".
const NEGATIONS: &[&str] = &[
    "no", "not", "nope", "nah", "never", "don", "dont", "won", "later",
];

impl ServiceCategory {
    /// Service type written into the booking request.
    pub fn service_type(self) -> &'static str {
        match self {
            ServiceCategory::Collision => "Collision Repair",
            ServiceCategory::Headlight => "Headlight Restoration",
            ServiceCategory::Paint => "Paint Repair",
            ServiceCategory::Dent => "Dent Repair",
            ServiceCategory::General => "General Repair",
        }
    }

    pub fn empathy_reply(self) -> &'static str {
        match self {
            ServiceCategory::Collision => {
                "I'm sorry to hear about the accident, I hope everyone is okay. Our collision \
                 team handles everything from fender benders to frame straightening, and we \
                 work directly with insurance companies. Would you like to schedule an \
                 appointment for an estimate?"
            }
            ServiceCategory::Headlight => {
                "Cloudy headlights make night driving a lot harder. Our headlight restoration \
                 brings back a clear lens in about an hour. Would you like to schedule an \
                 appointment?"
            }
            ServiceCategory::Paint => {
                "Paint damage is frustrating, especially when it spreads. We match your \
                 factory color so the repair blends in. Would you like to schedule an \
                 appointment for an estimate?"
            }
            ServiceCategory::Dent => {
                "Sorry to hear about the dent! Many dents can be pulled without repainting, \
                 which keeps the original finish. Would you like to schedule a time for us to \
                 take a look?"
            }
            ServiceCategory::General => {
                "Thanks for telling me about it. One of our technicians can take a look and \
                 tell you what it will take to fix. Would you like to schedule an appointment?"
            }
        }
    }

    /// Options offered after the problem is shared.
    pub fn follow_up_options(self) -> Vec<String> {
        let mut options = vec!["Yes, schedule an appointment".to_string()];
        if self == ServiceCategory::Collision {
            options.push("Tell me about insurance claims".to_string());
        }
        options
    }
}

fn tokens(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    WORD.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

fn any_prefix(tokens: &[String], keywords: &[&str]) -> bool {
    tokens
        .iter()
        .any(|token| keywords.iter().any(|keyword| token.starts_with(keyword)))
}

fn any_exact(tokens: &[String], keywords: &[&str]) -> bool {
    tokens.iter().any(|token| keywords.contains(&token.as_str()))
}

fn contains_phrase(tokens: &[String], phrase: &[&str]) -> bool {
    tokens
        .windows(phrase.len())
        .any(|window| window.iter().zip(phrase).all(|(token, word)| token.as_str() == *word))
}

/// Service category of a problem description, `General` when nothing matches.
pub fn detect_service(message: &str) -> ServiceCategory {
    let tokens = tokens(message);
    SERVICE_KEYWORDS
        .iter()
        .find(|(_, keywords)| any_prefix(&tokens, keywords))
        .map(|(category, _)| *category)
        .unwrap_or(ServiceCategory::General)
}

pub fn detect_faq(message: &str) -> Option<Faq> {
    let tokens = tokens(message);
    FAQ_PHRASES
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|phrase| contains_phrase(&tokens, phrase)))
        .map(|(faq, _)| *faq)
}

/// True when every word of the message is a greeting word.
pub fn is_greeting(message: &str) -> bool {
    let tokens = tokens(message);
    !tokens.is_empty() && tokens.iter().all(|token| GREETINGS.contains(&token.as_str()))
}

/// A yes to booking. Any negation word vetoes it, so "no, not an appointment" is not a yes.
pub fn is_affirmative(message: &str) -> bool {
    let tokens = tokens(message);
    !any_exact(&tokens, NEGATIONS) && any_exact(&tokens, AFFIRMATIVES)
}

/// Classifies a message received in the initial state. Anything that is not a
/// greeting or FAQ is a problem description.
pub fn classify(message: &str) -> Intent {
    if is_greeting(message) {
        return Intent::Greeting;
    }
    if let Some(faq) = detect_faq(message) {
        return Intent::Faq(faq);
    }
    Intent::Problem(detect_service(message))
}
