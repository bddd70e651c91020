/// Drop carriage returns and collapse runs of newlines into a single `\n`.
pub fn squish_newlines(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_nl = false;
    for c in s.chars() {
        match c {
            '\r' => continue,
            '\n' => {
                if !prev_nl {
                    out.push('\n');
                }
                prev_nl = true;
            }
            _ => {
                out.push(c);
                prev_nl = false;
            }
        }
    }
    out
}

/// Split `text` into overlapping windows of `chunk_size` bytes.
///
/// The text is normalised with [`squish_newlines`] first. Consecutive windows
/// start `chunk_size - overlap` bytes apart, or `chunk_size` apart when the
/// overlap is not smaller than the window. The last window may be short.
/// A zero `chunk_size` yields no chunks.
///
/// Windows are cut on byte offsets of the UTF-8 text, so a multi-byte
/// character straddling a boundary is decoded lossily on both sides. Offsets
/// count bytes of `text` as given: if the caller already replaced invalid
/// input bytes with U+FFFD, each replacement occupies three bytes here.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if chunk_size == 0 {
        return Vec::new();
    }
    let clean = squish_newlines(text);
    let bytes = clean.as_bytes();
    let step = if chunk_size > overlap { chunk_size - overlap } else { chunk_size };

    let mut out = Vec::new();
    let mut start = 0usize;
    while start < bytes.len() {
        let end = start.saturating_add(chunk_size).min(bytes.len());
        out.push(String::from_utf8_lossy(&bytes[start..end]).into_owned());
        if end == bytes.len() {
            break;
        }
        start += step;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn overlapping_windows_stop_at_end() {
        let chunks = chunk_text("abcdefghij", 4, 2);
        assert_eq!(chunks, vec!["abcd", "cdef", "efgh", "ghij"]);
    }

    #[test]
    fn overlap_not_smaller_than_size_falls_back_to_full_step() {
        assert_eq!(chunk_text("abcdefghij", 4, 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(chunk_text("abcdefghij", 4, 9), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn zero_chunk_size_is_empty_not_error() {
        assert!(chunk_text("abcdef", 0, 0).is_empty());
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("", 8, 2).is_empty());
        assert!(chunk_text("\r\r", 8, 2).is_empty());
    }

    #[test]
    fn newlines_are_normalised_before_splitting() {
        assert_eq!(squish_newlines("a\r\n\n\nb"), "a\nb");
        assert_eq!(chunk_text("a\r\n\n\nb", 10, 0), vec!["a\nb"]);
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(chunk_text("abc", 800, 200), vec!["abc"]);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let text = "The quick brown fox\r\n\r\njumps over the lazy dog.\n\n\nAgain and again.";
        let a = chunk_text(text, 7, 3);
        let b = chunk_text(text, 7, 3);
        assert_eq!(a, b);
        assert!(a.iter().all(|c| c.len() <= 7));
    }

    #[test]
    fn multibyte_boundaries_are_lossy() {
        // "é" is two bytes; a one-byte window splits it.
        let chunks = chunk_text("é", 1, 0);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.contains('\u{FFFD}')));
    }
}
