//! Last-resort descriptive placeholder built from artifact metadata.
//!
//! The text is never a transcription. It always starts with
//! [`METADATA_MARKER`] so downstream validation can recognise it.

use chrono::Local;

use crate::artifact::{Artifact, ArtifactKind};
use crate::generation::Language;

use super::METADATA_MARKER;

pub fn describe(artifact: &Artifact, language: Language) -> String {
    let mut lines = vec![METADATA_MARKER.to_string(), String::new()];
    let metadata = artifact.metadata();

    match language {
        Language::Es => {
            lines.push("ANÁLISIS DEL ARCHIVO (sin transcripción)".to_string());
            lines.push(format!("Nombre del archivo: {}", artifact.filename()));
            lines.push(format!("Tamaño: {:.2} MB", artifact.size_mb()));
            lines.push(format!("Tipo de contenido: {}", artifact.media_type()));
            if let Some(duration) = metadata.duration {
                lines.push(format!("Duración: {}", format_duration(duration.as_secs())));
            }
            if let (Some(w), Some(h)) = (metadata.width, metadata.height) {
                lines.push(format!("Resolución: {}x{}", w, h));
            }
            lines.push(format!("Analizado: {}", Local::now().format("%d/%m/%Y %H:%M:%S")));
            lines.push(String::new());
            lines.push(kind_hint_es(artifact.kind()).to_string());
        }
        Language::En => {
            lines.push("FILE ANALYSIS (no transcription)".to_string());
            lines.push(format!("File name: {}", artifact.filename()));
            lines.push(format!("Size: {:.2} MB", artifact.size_mb()));
            lines.push(format!("Content type: {}", artifact.media_type()));
            if let Some(duration) = metadata.duration {
                lines.push(format!("Duration: {}", format_duration(duration.as_secs())));
            }
            if let (Some(w), Some(h)) = (metadata.width, metadata.height) {
                lines.push(format!("Resolution: {}x{}", w, h));
            }
            lines.push(format!("Analyzed: {}", Local::now().format("%Y-%m-%d %H:%M:%S")));
            lines.push(String::new());
            lines.push(kind_hint_en(artifact.kind()).to_string());
        }
    }

    lines.join("\n")
}

fn kind_hint_es(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Video => {
            "Archivo de video detectado. Configure OPENAI_API_KEY o ASSEMBLY_AI_KEY para \
             transcripción automática, o suba una transcripción manual como archivo .txt."
        }
        ArtifactKind::Audio => {
            "Archivo de audio detectado. Configure una clave de API de transcripción para \
             procesarlo automáticamente."
        }
        _ => "Tipo de archivo no reconocido para transcripción.",
    }
}

fn kind_hint_en(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Video => {
            "Video file detected. Configure OPENAI_API_KEY or ASSEMBLY_AI_KEY for automatic \
             transcription, or upload a manual transcript as a .txt file."
        }
        ArtifactKind::Audio => {
            "Audio file detected. Configure a transcription API key to process it automatically."
        }
        _ => "File type not recognised for transcription.",
    }
}

fn format_duration(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
