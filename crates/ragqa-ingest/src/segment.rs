//! Fixed-length character segmentation with overlap.
//!
//! Fragments start every `size - overlap` characters and hold up to `size`
//! characters. The last fragment may be shorter and, for short texts, may
//! lie entirely inside the previous one.

use ragqa_core::config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use ragqa_core::{Error, Result};

/// Validated segmentation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmenter {
    size: usize,
    overlap: usize,
}

impl Segmenter {
    /// Requires `size > 0` and `overlap < size`; anything else would never
    /// advance past the first fragment.
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::Configuration("segment size must be positive".into()));
        }
        if overlap >= size {
            return Err(Error::Configuration(format!(
                "segment overlap ({}) must be smaller than segment size ({})",
                overlap, size
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn segment(&self, text: &str) -> Vec<String> {
        // Byte offset of every char boundary, plus the end of the text.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_len = bounds.len() - 1;
        let step = self.size - self.overlap;

        let mut fragments = Vec::with_capacity(char_len / step + 1);
        let mut start = 0;
        while start < char_len {
            let end = (start + self.size).min(char_len);
            fragments.push(text[bounds[start]..bounds[end]].to_string());
            start += step;
        }
        fragments
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Split `text` into overlapping fragments of `size` characters.
pub fn segment(text: &str, size: usize, overlap: usize) -> Result<Vec<String>> {
    Ok(Segmenter::new(size, overlap)?.segment(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Undo segmentation by dropping each later fragment's leading overlap.
    fn reassemble(fragments: &[String], overlap: usize) -> String {
        let mut out = String::new();
        for (i, f) in fragments.iter().enumerate() {
            if i == 0 {
                out.push_str(f);
            } else {
                out.extend(f.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn test_document_of_1050_chars() {
        let text: String = (0..1050).map(|i| (b'a' + (i % 26) as u8) as char).collect();
        let fragments = segment(&text, 500, 100).unwrap();

        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0], text[0..500]);
        assert_eq!(fragments[1], text[400..900]);
        assert_eq!(fragments[2], text[800..1050]);
    }

    #[test]
    fn test_reassembles_for_many_parameters() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(7);
        for size in 1..40 {
            for overlap in 0..size {
                let fragments = segment(&text, size, overlap).unwrap();
                assert_eq!(reassemble(&fragments, overlap), text, "size={size} overlap={overlap}");
                assert!(fragments.iter().all(|f| f.chars().count() <= size));
            }
        }
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "héllo wörld ünïcode";
        let fragments = segment(text, 5, 2).unwrap();
        assert_eq!(fragments[0], "héllo");
        assert_eq!(fragments[1], "lo wö");
        assert_eq!(reassemble(&fragments, 2), text);
    }

    #[test]
    fn test_short_text_duplicates_tail() {
        let fragments = segment("abcdef", 5, 3).unwrap();
        assert_eq!(fragments, vec!["abcde", "cdef", "ef"]);
    }

    #[test]
    fn test_empty_text_has_no_fragments() {
        assert!(segment("", 500, 100).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(matches!(segment("abc", 0, 0), Err(Error::Configuration(_))));
        assert!(matches!(segment("abc", 10, 10), Err(Error::Configuration(_))));
        assert!(matches!(segment("abc", 10, 11), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_default_matches_reference_constants() {
        let s = Segmenter::default();
        assert_eq!((s.size(), s.overlap()), (500, 100));
    }
}
