//! Pre-flight checks that keep unproductive input away from the provider.

use crate::transcription::METADATA_MARKER;
use crate::worker::job::JobKind;

use super::language::Language;

/// Minimum number of words a transcript needs before it is worth generating from.
const MIN_TRANSCRIPT_WORDS: usize = 15;

/// Line count at which the short-line ratio check starts to apply.
const FRAGMENT_MIN_LINES: usize = 10;

/// Share of near-empty lines (at most two words) that marks a fragmentary transcript.
const FRAGMENT_LINE_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    TooShort,
    MetadataOnly,
    Fragmentary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub reason: ValidationFailure,
    pub guidance: String,
}

/// Validates content for a job kind. Trimmed length is counted in characters.
pub fn validate_content(
    content: &str,
    kind: JobKind,
    language: Language,
    min_chars: usize,
) -> Result<(), Rejection> {
    let trimmed = content.trim();

    if trimmed.chars().count() < min_chars {
        return Err(Rejection {
            reason: ValidationFailure::TooShort,
            guidance: short_content_guidance(kind, language, min_chars),
        });
    }

    if trimmed.starts_with(METADATA_MARKER) {
        return Err(Rejection {
            reason: ValidationFailure::MetadataOnly,
            guidance: metadata_only_guidance(language, trimmed),
        });
    }

    if looks_fragmentary(trimmed) {
        return Err(Rejection {
            reason: ValidationFailure::Fragmentary,
            guidance: fragmentary_guidance(language),
        });
    }

    Ok(())
}

/// True when the text reads like scattered transcription debris rather than a
/// conversation: very few words overall, or nearly every line holding one or two words.
pub fn looks_fragmentary(text: &str) -> bool {
    let words = text.split_whitespace().count();
    if words < MIN_TRANSCRIPT_WORDS {
        return true;
    }

    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < FRAGMENT_MIN_LINES {
        return false;
    }

    let short = lines
        .iter()
        .filter(|l| l.split_whitespace().count() <= 2)
        .count();
    short as f64 / lines.len() as f64 >= FRAGMENT_LINE_RATIO
}

pub fn short_content_guidance(kind: JobKind, language: Language, min_chars: usize) -> String {
    let document = match (kind, language) {
        (JobKind::ExecutiveSummary, Language::Es) => "un resumen ejecutivo",
        (JobKind::JiraTicket, Language::Es) => "tickets de Jira",
        (JobKind::Proposal, Language::Es) => "una propuesta técnica",
        (JobKind::ExecutiveSummary, Language::En) => "an executive summary",
        (JobKind::JiraTicket, Language::En) => "Jira tickets",
        (JobKind::Proposal, Language::En) => "a technical proposal",
    };

    match language {
        Language::Es => format!(
            "**CONTENIDO INSUFICIENTE**\n\n\
             El contenido proporcionado es demasiado corto para generar {} (mínimo {} caracteres).\n\n\
             **PRÓXIMO PASO:**\n\
             • Sube la transcripción completa de la reunión\n\
             • Incluye participantes, temas discutidos y decisiones tomadas",
            document, min_chars
        ),
        Language::En => format!(
            "**INSUFFICIENT CONTENT**\n\n\
             The provided content is too short to generate {} (minimum {} characters).\n\n\
             **NEXT STEP:**\n\
             • Upload the complete meeting transcription\n\
             • Include participants, discussed topics and decisions made",
            document, min_chars
        ),
    }
}

fn metadata_only_guidance(language: Language, analysis: &str) -> String {
    match language {
        Language::Es => format!(
            "**TRANSCRIPCIÓN NO DISPONIBLE**\n\n\
             Solo se pudo obtener información básica del archivo, no su contenido.\n\n\
             {}\n\n\
             **PRÓXIMO PASO:**\n\
             Sube un archivo de texto (.txt) con la transcripción de la reunión.",
            analysis
        ),
        Language::En => format!(
            "**TRANSCRIPTION NOT AVAILABLE**\n\n\
             Only basic file information could be obtained, not its content.\n\n\
             {}\n\n\
             **NEXT STEP:**\n\
             Upload a text file (.txt) with the meeting transcription.",
            analysis
        ),
    }
}

fn fragmentary_guidance(language: Language) -> String {
    match language {
        Language::Es => "**TRANSCRIPCIÓN INCOMPLETA**\n\n\
             La transcripción parece fragmentada y no contiene suficiente conversación para analizar.\n\n\
             **PRÓXIMO PASO:**\n\
             • Verifica que el audio sea claro\n\
             • Sube una transcripción completa en formato .txt"
            .to_string(),
        Language::En => "**INCOMPLETE TRANSCRIPTION**\n\n\
             The transcription looks fragmentary and does not contain enough conversation to analyze.\n\n\
             **NEXT STEP:**\n\
             • Check that the audio is clear\n\
             • Upload a complete transcription as a .txt file"
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEETING: &str = "Ana opened the planning meeting and reviewed the backlog. \
        The team agreed to ship the billing export next sprint and Luis will own the migration.";

    #[test]
    fn test_short_content_rejected() {
        let content = "a".repeat(30);
        let rejection =
            validate_content(&content, JobKind::ExecutiveSummary, Language::Es, 50).unwrap_err();
        assert_eq!(rejection.reason, ValidationFailure::TooShort);
        assert!(rejection.guidance.contains("resumen ejecutivo"));
    }

    #[test]
    fn test_short_content_guidance_differs_per_kind() {
        let summary = short_content_guidance(JobKind::ExecutiveSummary, Language::En, 50);
        let tickets = short_content_guidance(JobKind::JiraTicket, Language::En, 50);
        assert_ne!(summary, tickets);
        assert!(tickets.contains("Jira tickets"));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 25 two-byte characters: 50 bytes but only 25 chars.
        let content = "ñ".repeat(25);
        assert!(validate_content(&content, JobKind::Proposal, Language::Es, 30).is_err());
    }

    #[test]
    fn test_metadata_only_rejected() {
        let content = format!(
            "{}\nFile: standup.mp4\nSize: 12.40 MB\nType: video/mp4\nThis is padding to pass the length check.",
            METADATA_MARKER
        );
        let rejection =
            validate_content(&content, JobKind::Proposal, Language::En, 50).unwrap_err();
        assert_eq!(rejection.reason, ValidationFailure::MetadataOnly);
        assert!(rejection.guidance.contains("standup.mp4"));
    }

    #[test]
    fn test_fragmentary_transcript_rejected() {
        let content = "uh\nyes\nok so\nright\nhmm\nyeah\nno\nok\nsure\nbye now\nthanks all";
        let rejection =
            validate_content(content, JobKind::JiraTicket, Language::En, 10).unwrap_err();
        assert_eq!(rejection.reason, ValidationFailure::Fragmentary);
    }

    #[test]
    fn test_real_meeting_content_accepted() {
        assert!(validate_content(MEETING, JobKind::ExecutiveSummary, Language::En, 50).is_ok());
    }

    #[test]
    fn test_bullet_notes_are_not_fragmentary() {
        let notes = "Decisions:\n- Move launch to March because QA needs two more weeks\n\
            - Marta owns the vendor contract renewal\n- Budget approved for the new staging cluster";
        assert!(!looks_fragmentary(notes));
    }
}
