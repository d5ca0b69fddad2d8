//! User-facing remediation messages returned in place of content.

use crate::generation::Language;

const SUPPORTED_FORMATS_ES: &str = "**FORMATOS SOPORTADOS:**\n\
    • Texto (.txt, .md)\n\
    • PDF (.pdf)\n\
    • Word (.docx, .doc)\n\
    • Video (.mp4, .mov, .avi)\n\
    • Audio (.mp3, .wav, .m4a)";

const SUPPORTED_FORMATS_EN: &str = "**SUPPORTED FORMATS:**\n\
    • Text (.txt, .md)\n\
    • PDF (.pdf)\n\
    • Word (.docx, .doc)\n\
    • Video (.mp4, .mov, .avi)\n\
    • Audio (.mp3, .wav, .m4a)";

pub fn no_file(language: Language) -> String {
    match language {
        Language::Es => "No se ha proporcionado ningún archivo para procesar.".to_string(),
        Language::En => "No file was provided for processing.".to_string(),
    }
}

pub fn no_content(media_type: &str, language: Language) -> String {
    match language {
        Language::Es => format!(
            "No se pudo extraer contenido del archivo de tipo: {}\n\n\
             **POSIBLES SOLUCIONES:**\n\
             • Verifica que el archivo no esté corrupto\n\
             • Asegúrate de que el formato sea compatible\n\
             • Intenta con un archivo diferente",
            media_type
        ),
        Language::En => format!(
            "Could not extract content from file of type: {}\n\n\
             **POSSIBLE SOLUTIONS:**\n\
             • Verify that the file is not corrupted\n\
             • Make sure the format is compatible\n\
             • Try with a different file",
            media_type
        ),
    }
}

pub fn unsupported_format(media_type: &str, language: Language) -> String {
    match language {
        Language::Es => format!(
            "Formato de archivo no soportado: {}\n\n{}",
            media_type, SUPPORTED_FORMATS_ES
        ),
        Language::En => format!(
            "Unsupported file format: {}\n\n{}",
            media_type, SUPPORTED_FORMATS_EN
        ),
    }
}

pub fn extraction_error(detail: &str, language: Language) -> String {
    match language {
        Language::Es => format!("Error al extraer el contenido del archivo: {}", detail),
        Language::En => format!("Error extracting the file content: {}", detail),
    }
}

pub fn pdf_without_text(language: Language) -> String {
    match language {
        Language::Es => "**PDF SIN TEXTO EXTRAÍBLE**\n\n\
             El PDF no contiene texto seleccionable. Probablemente es un documento escaneado.\n\n\
             **PRÓXIMO PASO:**\n\
             • Convierte el PDF a texto con una herramienta de OCR\n\
             • O sube una transcripción manual en formato .txt"
            .to_string(),
        Language::En => "**PDF WITHOUT EXTRACTABLE TEXT**\n\n\
             The PDF contains no selectable text. It is probably a scanned document.\n\n\
             **NEXT STEP:**\n\
             • Convert the PDF to text with an OCR tool\n\
             • Or upload a manual transcription as a .txt file"
            .to_string(),
    }
}

fn media_fallback(noun_es: &str, noun_en: &str, language: Language) -> String {
    match language {
        Language::Es => format!(
            "⚠️ CONTENIDO DE {} DETECTADO\n\n\
             El archivo es de {} pero no se pudo transcribir automáticamente.\n\n\
             **SOLUCIONES RECOMENDADAS:**\n\
             1. **Otter.ai** - Transcripción automática gratuita\n\
             2. **Google Docs** - Herramienta de transcripción\n\
             3. **Microsoft Word** - Transcripción de audio\n\n\
             **PRÓXIMO PASO:**\n\
             Sube un archivo de texto (.txt) con la transcripción del {}.",
            noun_es.to_uppercase(),
            noun_es,
            noun_es
        ),
        Language::En => format!(
            "⚠️ {} CONTENT DETECTED\n\n\
             The file is {} but could not be transcribed automatically.\n\n\
             **RECOMMENDED SOLUTIONS:**\n\
             1. **Otter.ai** - Free automatic transcription\n\
             2. **Google Docs** - Transcription tool\n\
             3. **Microsoft Word** - Audio transcription\n\n\
             **NEXT STEP:**\n\
             Upload a text file (.txt) with the {} transcription.",
            noun_en.to_uppercase(),
            noun_en,
            noun_en
        ),
    }
}

pub fn video_fallback(language: Language) -> String {
    media_fallback("video", "video", language)
}

pub fn audio_fallback(language: Language) -> String {
    media_fallback("audio", "audio", language)
}

/// Returned by the video pipeline when no usable transcript could be produced.
pub fn video_unavailable(
    filename: &str,
    byte_size: u64,
    media_type: &str,
    reason: &str,
    language: Language,
) -> String {
    match language {
        Language::Es => format!(
            "**PROCESAMIENTO DE VIDEO NO DISPONIBLE**\n\n\
             **Archivo:** {}\n**Tamaño:** {} bytes\n**Tipo:** {}\n\n\
             **Razón:** {}\n\n\
             **Soluciones:**\n\
             1. Asegúrate de que FFmpeg esté instalado en el sistema\n\
             2. Verifica que haya un proveedor de transcripción configurado\n\
             3. El video debe contener audio para poder procesarlo\n\
             4. Intenta con un archivo de audio o una transcripción en .txt",
            filename, byte_size, media_type, reason
        ),
        Language::En => format!(
            "**VIDEO PROCESSING NOT AVAILABLE**\n\n\
             **File:** {}\n**Size:** {} bytes\n**Type:** {}\n\n\
             **Reason:** {}\n\n\
             **Solutions:**\n\
             1. Make sure FFmpeg is installed on the system\n\
             2. Check that a transcription provider is configured\n\
             3. The video must contain audio to be processed\n\
             4. Try an audio file or a .txt transcription instead",
            filename, byte_size, media_type, reason
        ),
    }
}

pub fn oversized_file(max_mb: u64, language: Language) -> String {
    match language {
        Language::Es => format!(
            "El archivo excede el tamaño máximo permitido de {}MB. Por favor, divide el archivo en partes más pequeñas o comprime el video.",
            max_mb
        ),
        Language::En => format!(
            "The file exceeds the maximum allowed size of {}MB. Please split the file into smaller parts or compress the video.",
            max_mb
        ),
    }
}

pub fn video_processing_error(language: Language) -> String {
    match language {
        Language::Es => "No se pudo procesar el archivo de video. Verifica que el archivo tenga audio y esté en un formato soportado.".to_string(),
        Language::En => "The video file could not be processed. Check that the file has audio and is in a supported format.".to_string(),
    }
}

pub fn transcription_error(language: Language) -> String {
    match language {
        Language::Es => "No se pudo transcribir el contenido del archivo. Verifica que el archivo tenga audio claro y esté en un formato soportado.".to_string(),
        Language::En => "The file content could not be transcribed. Check that the file has clear audio and is in a supported format.".to_string(),
    }
}

pub fn unsupported_type(language: Language) -> String {
    match language {
        Language::Es => "El tipo de archivo no es compatible. Usa archivos de video, audio, texto o documentos (PDF, DOCX).".to_string(),
        Language::En => "The file type is not supported. Use video, audio, text or document files (PDF, DOCX).".to_string(),
    }
}

pub fn no_fragments_processed(language: Language) -> String {
    match language {
        Language::Es => "No se pudieron procesar los fragmentos del archivo.".to_string(),
        Language::En => "The file fragments could not be processed.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_lists_formats() {
        let msg = unsupported_format("application/zip", Language::Es);
        assert!(msg.contains("application/zip"));
        assert!(msg.contains("Word (.docx, .doc)"));
        assert!(msg.contains("Audio (.mp3, .wav, .m4a)"));
    }

    #[test]
    fn test_media_fallbacks_recommend_tools() {
        for msg in [
            video_fallback(Language::Es),
            audio_fallback(Language::En),
        ] {
            assert!(msg.contains("Otter.ai"));
            assert!(msg.contains("Google Docs"));
            assert!(msg.contains("Microsoft Word"));
            assert!(msg.contains(".txt"));
        }
        assert!(video_fallback(Language::Es).starts_with("⚠️ CONTENIDO DE VIDEO DETECTADO"));
        assert!(audio_fallback(Language::En).starts_with("⚠️ AUDIO CONTENT DETECTED"));
    }

    #[test]
    fn test_oversized_mentions_limit() {
        assert!(oversized_file(100, Language::Es).contains("100MB"));
    }
}
