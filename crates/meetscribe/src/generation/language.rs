use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

/// Output language for generated documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
        }
    }

    /// English name of the language, used inside translation prompts.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Es => "Spanish",
            Language::En => "English",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "es" => Ok(Language::Es),
            "en" => Ok(Language::En),
            other => Err(OrchestratorError::InvalidRequest(format!(
                "invalid language '{}', expected 'es' or 'en'",
                other
            ))),
        }
    }
}

const SPANISH_WORDS: &[&str] = &[
    "el", "la", "de", "que", "y", "en", "un", "es", "se", "no", "te", "lo", "le", "da", "su",
    "por", "son", "con", "para", "al", "del", "los", "las", "una", "como", "más", "pero", "sus",
    "me", "hasta", "hay", "donde", "han", "quien", "están", "estado", "desde", "todo", "nos",
    "durante", "todos", "uno", "les", "ni", "contra", "otros", "ese", "eso", "ante", "ellos", "e",
    "esto", "mí", "antes", "algunos", "qué", "unos", "yo", "otro", "otras", "otra", "él", "tanto",
    "esa", "estos", "mucho", "quienes", "nada", "muchos", "cual", "poco", "ella", "estar",
    "estas", "algunas", "algo", "nosotros",
];

const ENGLISH_WORDS: &[&str] = &[
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on",
    "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we", "say",
    "her", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their", "what", "so",
    "up", "out", "if", "about", "who", "get", "which", "go", "me", "when", "make", "can", "like",
    "time", "no", "just", "him", "know", "take", "people", "into", "year", "your", "good", "some",
    "could", "them", "see", "other", "than", "then", "now", "look", "only", "come", "its", "over",
    "think", "also", "back", "after", "use", "two", "how", "our", "work", "first", "well", "way",
    "even", "new", "want", "because", "any", "these", "give", "day", "most", "us",
];

/// Lexical heuristic: counts tokens that belong to each closed list of common
/// function words. Spanish wins only with a strictly higher count, so ties and
/// empty input resolve to English.
pub fn detect_language(content: &str) -> Language {
    let mut es = 0usize;
    let mut en = 0usize;

    for token in content
        .split(|c: char| !c.is_alphabetic())
        .filter(|t| !t.is_empty())
    {
        let token = token.to_lowercase();
        if SPANISH_WORDS.contains(&token.as_str()) {
            es += 1;
        }
        if ENGLISH_WORDS.contains(&token.as_str()) {
            en += 1;
        }
    }

    log::debug!("Language detection: es={} en={}", es, en);

    if es > en {
        Language::Es
    } else {
        Language::En
    }
}
