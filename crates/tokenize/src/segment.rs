#![forbid(unsafe_code)]

/// A maximal run of word characters, or a single punctuation character,
/// borrowed from the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoarseUnit<'a> {
    /// literal source text of the unit
    pub text: &'a str,
    /// byte offset of the unit in the source
    pub start: usize,
}

impl CoarseUnit<'_> {
    /// Byte offset one past the end of the unit.
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

/// Split text on whitespace and punctuation.
///
/// Whitespace and control characters are boundaries and are discarded; each
/// punctuation character becomes its own unit; every other run of characters
/// is one unit. Empty input yields an empty vector.
pub fn segment(text: &str) -> Vec<CoarseUnit<'_>> {
    let mut units = Vec::new();
    let mut run_start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        let boundary = is_whitespace(ch) || is_dropped(ch);
        let punct = !boundary && is_punctuation(ch);
        if boundary || punct {
            if let Some(start) = run_start.take() {
                push_unit(&mut units, text, start, idx);
            }
            if punct {
                push_unit(&mut units, text, idx, idx + ch.len_utf8());
            }
        } else if run_start.is_none() {
            run_start = Some(idx);
        }
    }
    if let Some(start) = run_start {
        push_unit(&mut units, text, start, text.len());
    }
    units
}

fn push_unit<'a>(units: &mut Vec<CoarseUnit<'a>>, text: &'a str, start: usize, end: usize) {
    if let Some(slice) = text.get(start..end) {
        units.push(CoarseUnit { text: slice, start });
    }
}

/// Whitespace as seen by the segmenter.
pub fn is_whitespace(ch: char) -> bool {
    ch.is_whitespace()
}

// NUL, the replacement character and non-whitespace controls never carry text.
fn is_dropped(ch: char) -> bool {
    ch == '\u{0}' || ch == '\u{FFFD}' || ch.is_control()
}

/// Punctuation as seen by the segmenter: all ASCII non-alphanumeric symbols
/// plus the common Unicode punctuation blocks.
///
/// Latin-1 and CJK symbols that read as letters or numerals (`µ`, `²`, `º`,
/// `々`, `〇`) are not punctuation.
pub fn is_punctuation(ch: char) -> bool {
    if ch.is_ascii() {
        return ch.is_ascii_punctuation();
    }
    let cp = u32::from(ch);
    matches!(cp, 0x00A1 | 0x00A7 | 0x00AB | 0x00B6 | 0x00B7 | 0x00BB | 0x00BF)
        || matches!(cp, 0x3001..=0x3003 | 0x3008..=0x3011 | 0x3014..=0x301F | 0x3030 | 0x303D)
        || (0x2010..=0x2027).contains(&cp)
        || (0x2030..=0x205E).contains(&cp)
        || (0x2E00..=0x2E7F).contains(&cp)
        || (0xFE30..=0xFE4F).contains(&cp)
        || (0xFE50..=0xFE6F).contains(&cp)
        || (0xFF01..=0xFF0F).contains(&cp)
        || (0xFF1A..=0xFF20).contains(&cp)
        || (0xFF3B..=0xFF40).contains(&cp)
        || (0xFF5B..=0xFF65).contains(&cp)
}
