//! Deterministic "basic mode" output used when the provider cannot answer.

use std::collections::HashMap;

use crate::worker::job::JobKind;

use super::language::Language;

/// Sentinel present in every degraded response, in both languages.
pub const DEGRADED_MARKER: &str = "[BASIC MODE]";

const TOP_KEYWORDS: usize = 8;
const MIN_KEYWORD_LEN: usize = 5;

/// Returns true when `text` was produced by the local fallback.
pub fn is_degraded(text: &str) -> bool {
    text.contains(DEGRADED_MARKER)
}

pub fn degraded_notice(language: Language) -> String {
    match language {
        Language::Es => format!(
            "{} ⚠️ NOTA: Este resultado fue generado en modo básico debido a problemas con la API de IA.\n\
             Para obtener resultados más detallados, intenta nuevamente en unos minutos.",
            DEGRADED_MARKER
        ),
        Language::En => format!(
            "{} ⚠️ NOTE: This result was generated in basic mode due to problems with the AI API.\n\
             For more detailed results, try again in a few minutes.",
            DEGRADED_MARKER
        ),
    }
}

/// Most frequent longer words, most frequent first. Ties break alphabetically.
pub fn top_keywords(content: &str, limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for token in content
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_KEYWORD_LEN)
    {
        *counts.entry(token.to_lowercase()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

/// Builds the fallback document from locally computed statistics only,
/// followed by the degraded-mode notice.
pub fn fallback_response(content: &str, kind: JobKind, language: Language) -> String {
    let chars = content.chars().count();
    let words = content.split_whitespace().count();
    let lines = content.lines().filter(|l| !l.trim().is_empty()).count();
    let keywords = top_keywords(content, TOP_KEYWORDS)
        .into_iter()
        .map(|(word, n)| format!("- {} ({})", word, n))
        .collect::<Vec<_>>()
        .join("\n");

    let title = match (kind, language) {
        (JobKind::ExecutiveSummary, Language::Es) => "RESUMEN EJECUTIVO (MODO BÁSICO)",
        (JobKind::ExecutiveSummary, Language::En) => "EXECUTIVE SUMMARY (BASIC MODE)",
        (JobKind::JiraTicket, Language::Es) => "TICKETS DE JIRA (MODO BÁSICO)",
        (JobKind::JiraTicket, Language::En) => "JIRA TICKETS (BASIC MODE)",
        (JobKind::Proposal, Language::Es) => "PROPUESTA TÉCNICA (MODO BÁSICO)",
        (JobKind::Proposal, Language::En) => "TECHNICAL PROPOSAL (BASIC MODE)",
    };

    let body = match language {
        Language::Es => format!(
            "**Análisis del contenido:**\n\
             El contenido contiene: {} caracteres, {} palabras y {} líneas.\n\n\
             **Términos más frecuentes:**\n{}\n\n\
             **Próximos pasos:**\n\
             - Revisar el contenido original de la reunión\n\
             - Volver a solicitar el procesamiento cuando la API esté disponible",
            chars, words, lines, keywords
        ),
        Language::En => format!(
            "**Content analysis:**\n\
             The content contains: {} characters, {} words and {} lines.\n\n\
             **Most frequent terms:**\n{}\n\n\
             **Next steps:**\n\
             - Review the original meeting content\n\
             - Request processing again once the API is available",
            chars, words, lines, keywords
        ),
    };

    format!("**{}**\n\n{}\n\n{}", title, body, degraded_notice(language))
}
