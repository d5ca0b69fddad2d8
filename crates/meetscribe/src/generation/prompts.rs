//! Instruction documents sent to the text-generation provider.
//!
//! Template selection is a pure function of `(JobKind, Language)`. Every
//! template tells the model to use only information present in the input and
//! to flag missing sections instead of inventing them.

use crate::worker::job::JobKind;

use super::language::Language;

fn context_block(business_context: Option<&str>, language: Language) -> String {
    match (business_context.map(str::trim).filter(|c| !c.is_empty()), language) {
        (Some(ctx), Language::Es) => format!("CONTEXTO DEL NEGOCIO:\n{}", ctx),
        (Some(ctx), Language::En) => format!("BUSINESS CONTEXT:\n{}", ctx),
        (None, Language::Es) => "CONTEXTO DEL NEGOCIO: No se proporcionó contexto del negocio.".to_string(),
        (None, Language::En) => "BUSINESS CONTEXT: No business context provided.".to_string(),
    }
}

fn grounding_rules(language: Language) -> &'static str {
    match language {
        Language::Es => "REGLAS IMPORTANTES:\n\
            - Usa ÚNICAMENTE información que aparezca en el contenido de la reunión.\n\
            - NO inventes nombres, fechas, cifras ni compromisos.\n\
            - Si una sección no tiene información suficiente, escribe \"No se mencionó en la reunión\".",
        Language::En => "IMPORTANT RULES:\n\
            - Use ONLY information that appears in the meeting content.\n\
            - Do NOT invent names, dates, figures or commitments.\n\
            - If a section lacks enough information, write \"Not mentioned in the meeting\".",
    }
}

fn structure(kind: JobKind, language: Language) -> &'static str {
    match (kind, language) {
        (JobKind::ExecutiveSummary, Language::Es) => "Genera un RESUMEN EJECUTIVO con estas secciones:\n\
            **Objetivo de la reunión**\n\
            **Participantes**\n\
            **Puntos clave discutidos**\n\
            **Decisiones tomadas**\n\
            **Próximos pasos y responsables**\n\
            **Riesgos o bloqueos**",
        (JobKind::ExecutiveSummary, Language::En) => "Generate an EXECUTIVE SUMMARY with these sections:\n\
            **Meeting objective**\n\
            **Participants**\n\
            **Key points discussed**\n\
            **Decisions made**\n\
            **Next steps and owners**\n\
            **Risks or blockers**",
        (JobKind::JiraTicket, Language::Es) => "Genera TICKETS DE JIRA a partir de las tareas acordadas. Para cada ticket incluye:\n\
            - **Título**\n\
            - **Tipo** (Historia, Tarea o Bug)\n\
            - **Descripción**\n\
            - **Criterios de aceptación**\n\
            - **Prioridad**\n\
            - **Responsable** (solo si se mencionó)",
        (JobKind::JiraTicket, Language::En) => "Generate JIRA TICKETS from the agreed tasks. For each ticket include:\n\
            - **Title**\n\
            - **Type** (Story, Task or Bug)\n\
            - **Description**\n\
            - **Acceptance criteria**\n\
            - **Priority**\n\
            - **Assignee** (only if mentioned)",
        (JobKind::Proposal, Language::Es) => "Genera una PROPUESTA TÉCNICA con estas secciones:\n\
            **Contexto y problema**\n\
            **Solución propuesta**\n\
            **Alcance**\n\
            **Arquitectura y tecnologías**\n\
            **Plan de trabajo**\n\
            **Riesgos y supuestos**",
        (JobKind::Proposal, Language::En) => "Generate a TECHNICAL PROPOSAL with these sections:\n\
            **Context and problem**\n\
            **Proposed solution**\n\
            **Scope**\n\
            **Architecture and technologies**\n\
            **Work plan**\n\
            **Risks and assumptions**",
    }
}

/// Builds the instruction document for a generation request.
pub fn build_prompt(
    kind: JobKind,
    language: Language,
    content: &str,
    business_context: Option<&str>,
) -> String {
    let header = match language {
        Language::Es => "Eres un asistente que analiza reuniones de negocio. Responde en español.",
        Language::En => "You are an assistant that analyzes business meetings. Respond in English.",
    };
    let content_label = match language {
        Language::Es => "CONTENIDO DE LA REUNIÓN:",
        Language::En => "MEETING CONTENT:",
    };

    format!(
        "{}\n\n{}\n\n{}\n\n{}\n\n{}\n{}",
        header,
        context_block(business_context, language),
        structure(kind, language),
        grounding_rules(language),
        content_label,
        content
    )
}

pub fn translation_prompt(content: &str, source: Language, target: Language) -> String {
    format!(
        "Translate the following content from {} to {}.\n\n\
         INSTRUCTIONS:\n\
         1. Preserve the exact structure and formatting.\n\
         2. Keep technical terms that are commonly used untranslated.\n\
         3. Preserve the meaning and professional tone.\n\
         4. Do not add or remove sections.\n\
         5. Only translate the text, not formatting markers such as ** or -.\n\n\
         CONTENT TO TRANSLATE:\n{}\n\nTRANSLATION:",
        source.name(),
        target.name(),
        content
    )
}

pub fn chunk_summary_prompt(index: usize, total: usize, chunk: &str, language: Language) -> String {
    match language {
        Language::Es => format!(
            "Analiza este fragmento {} de {} de una reunión y genera un resumen ejecutivo conciso:\n\n{}",
            index + 1,
            total,
            chunk
        ),
        Language::En => format!(
            "Analyze this fragment {} of {} of a meeting and write a concise executive summary:\n\n{}",
            index + 1,
            total,
            chunk
        ),
    }
}

pub fn combine_prompt(joined: &str, language: Language) -> String {
    match language {
        Language::Es => format!(
            "Combina estos resúmenes de fragmentos de una reunión en un resumen ejecutivo coherente y completo:\n\n{}",
            joined
        ),
        Language::En => format!(
            "Combine these fragment summaries of a meeting into one coherent and complete executive summary:\n\n{}",
            joined
        ),
    }
}
