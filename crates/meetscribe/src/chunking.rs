//! Splitting oversized text into bounded chunks and merging per-chunk results.
//!
//! Splitting is hierarchical: paragraphs are packed into chunks first, an
//! oversized paragraph is packed by sentences, an oversized sentence by words,
//! and only a single word longer than the limit is cut. Sizes are counted in
//! characters.

use std::sync::LazyLock;

use log::warn;
use regex::Regex;

static RE_PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Separator placed between partial results when they are joined.
pub const JOIN_SEPARATOR: &str = "\n\n---\n\n";

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const INLINE_SEPARATOR: &str = " ";

/// A bounded slice of a longer text. `index` is zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub total: usize,
    pub text: String,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Result of merging partials, before any re-summarisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Combined {
    Empty,
    Single(String),
    Joined(String),
}

/// Splits `text` into ordered chunks of at most `max_chars` characters.
pub fn split(text: &str, max_chars: usize) -> Vec<Chunk> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();

    let paragraphs = RE_PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty());
    pack(paragraphs, PARAGRAPH_SEPARATOR, max_chars, &mut pieces, |p, out| {
        split_paragraph(p, max_chars, out)
    });

    let total = pieces.len();
    pieces
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk { index, total, text })
        .collect()
}

fn split_paragraph(paragraph: &str, max_chars: usize, out: &mut Vec<String>) {
    pack(
        sentences(paragraph).into_iter(),
        INLINE_SEPARATOR,
        max_chars,
        out,
        |s, out| split_sentence(s, max_chars, out),
    );
}

fn split_sentence(sentence: &str, max_chars: usize, out: &mut Vec<String>) {
    pack(
        sentence.split_whitespace(),
        INLINE_SEPARATOR,
        max_chars,
        out,
        |word, out| {
            warn!(
                "Word of {} characters exceeds chunk limit {}, truncating",
                word.chars().count(),
                max_chars
            );
            out.push(word.chars().take(max_chars).collect());
        },
    );
}

/// Greedily packs `units` into buffers joined by `separator`, flushing a
/// buffer when the next unit would push it over `max_chars`. Units that are
/// too large on their own are handed to `oversize`.
fn pack<'a, I, F>(units: I, separator: &str, max_chars: usize, out: &mut Vec<String>, oversize: F)
where
    I: Iterator<Item = &'a str>,
    F: Fn(&str, &mut Vec<String>),
{
    let sep_len = separator.chars().count();
    let mut buffer = String::new();
    let mut buffer_len = 0usize;

    for unit in units {
        let unit_len = unit.chars().count();

        if unit_len > max_chars {
            if !buffer.is_empty() {
                out.push(std::mem::take(&mut buffer));
                buffer_len = 0;
            }
            oversize(unit, out);
            continue;
        }

        if buffer.is_empty() {
            buffer.push_str(unit);
            buffer_len = unit_len;
        } else if buffer_len + sep_len + unit_len > max_chars {
            out.push(std::mem::replace(&mut buffer, unit.to_string()));
            buffer_len = unit_len;
        } else {
            buffer.push_str(separator);
            buffer.push_str(unit);
            buffer_len += sep_len + unit_len;
        }
    }

    if !buffer.is_empty() {
        out.push(buffer);
    }
}

/// Splits a paragraph after each run of sentence terminators, keeping them.
fn sentences(paragraph: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut chars = paragraph.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_terminator(c) {
            continue;
        }
        let next_is_terminator = chars.peek().map(|&(_, n)| is_terminator(n)).unwrap_or(false);
        if !next_is_terminator {
            let end = i + c.len_utf8();
            result.push(&paragraph[start..end]);
            start = end;
        }
    }
    result.push(&paragraph[start..]);

    result
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Joins partials in order with [`JOIN_SEPARATOR`].
pub fn join_partials(partials: &[String]) -> String {
    partials.join(JOIN_SEPARATOR)
}

/// Classifies partial results: none, exactly one (returned unchanged), or
/// several joined in order.
pub fn combine(mut partials: Vec<String>) -> Combined {
    match partials.len() {
        0 => Combined::Empty,
        1 => Combined::Single(partials.remove(0)),
        _ => Combined::Joined(join_partials(&partials)),
    }
}
