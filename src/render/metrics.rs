//! Text measurement for the built-in PDF fonts
//!
//! Widths are the standard AFM advance widths (1/1000 em) for the printable
//! ASCII range; other characters are measured as an average glyph.

/// Millimetres per PostScript point
pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// The built-in faces used by the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    Helvetica,
    HelveticaBold,
    Courier,
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const COURIER_WIDTH: u16 = 600;
const FALLBACK_WIDTH: u16 = 556;

impl FontFace {
    /// Advance width of one character in 1/1000 em
    pub fn char_units(&self, c: char) -> u16 {
        if *self == FontFace::Courier {
            return COURIER_WIDTH;
        }

        let table = match self {
            FontFace::HelveticaBold => &HELVETICA_BOLD,
            _ => &HELVETICA,
        };

        match c as u32 {
            code @ 32..=126 => table[(code - 32) as usize],
            _ => FALLBACK_WIDTH,
        }
    }

    /// Width of `text` in millimetres at `font_size` points
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.char_units(c))).sum();
        units as f32 / 1000.0 * font_size * PT_TO_MM
    }
}

/// Word-wrap `text` to lines no wider than `max_width` millimetres.
///
/// Explicit newlines always break. Words are packed greedily, separated by
/// the spaces found in the source (so indentation survives on the first line
/// of a paragraph); a word wider than a whole line is broken by character.
/// Empty input yields a single empty line.
pub fn split_text_to_size(text: &str, face: FontFace, font_size: f32, max_width: f32) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let space = face.text_width(" ", font_size);

    let mut lines = Vec::new();
    for paragraph in normalized.split('\n') {
        let mut line = String::new();
        let mut line_width = 0.0_f32;
        let mut started = false;

        for word in paragraph.split(' ') {
            let word_width = face.text_width(word, font_size);
            let separator = if started { space } else { 0.0 };

            if started && line_width + separator + word_width > max_width && !line.trim().is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0.0;
                started = false;
            }

            if started {
                line.push(' ');
                line_width += space;
            }

            if word_width > max_width {
                // Break an oversized word across as many lines as it needs
                for c in word.chars() {
                    let char_width = face.text_width(c.encode_utf8(&mut [0; 4]), font_size);
                    if line_width + char_width > max_width && !line.is_empty() {
                        lines.push(std::mem::take(&mut line));
                        line_width = 0.0;
                    }
                    line.push(c);
                    line_width += char_width;
                }
            } else {
                line.push_str(word);
                line_width += word_width;
            }
            started = true;
        }

        lines.push(line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_courier_is_monospaced() {
        assert_eq!(FontFace::Courier.char_units('i'), 600);
        assert_eq!(FontFace::Courier.char_units('W'), 600);
        // 10 chars at 10pt: 10 * 0.6 * 10pt
        let width = FontFace::Courier.text_width("0123456789", 10.0);
        assert!((width - 60.0 * PT_TO_MM).abs() < 1e-4);
    }

    #[test]
    fn test_helvetica_widths() {
        assert_eq!(FontFace::Helvetica.char_units(' '), 278);
        assert_eq!(FontFace::Helvetica.char_units('A'), 667);
        assert_eq!(FontFace::Helvetica.char_units('i'), 222);
        assert_eq!(FontFace::Helvetica.char_units('~'), 584);
        assert_eq!(FontFace::HelveticaBold.char_units('i'), 278);
        assert_eq!(FontFace::Helvetica.char_units('é'), FALLBACK_WIDTH);
    }

    #[test]
    fn test_short_text_fits_one_line() {
        let lines = split_text_to_size("Hello world", FontFace::Helvetica, 11.0, 180.0);
        assert_eq!(lines, vec!["Hello world"]);
    }

    #[test]
    fn test_empty_text_is_one_line() {
        assert_eq!(split_text_to_size("", FontFace::Helvetica, 11.0, 180.0), vec![""]);
    }

    #[test]
    fn test_newlines_break() {
        let lines = split_text_to_size("a\n\nb\r\nc", FontFace::Helvetica, 11.0, 180.0);
        assert_eq!(lines, vec!["a", "", "b", "c"]);
    }

    #[test]
    fn test_greedy_wrap() {
        // Courier 10pt: each char is 6pt = 2.1167mm, so 10 chars fit in 22mm
        let lines = split_text_to_size("aaaa bbbb cccc", FontFace::Courier, 10.0, 22.0);
        assert_eq!(lines, vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn test_long_word_is_broken() {
        let lines = split_text_to_size("abcdefghijklmnopqrstuvwxy", FontFace::Courier, 10.0, 22.0);
        assert_eq!(lines, vec!["abcdefghij", "klmnopqrst", "uvwxy"]);
        for line in &lines {
            assert!(FontFace::Courier.text_width(line, 10.0) <= 22.0);
        }
    }

    #[test]
    fn test_indentation_preserved() {
        let lines = split_text_to_size("fn main() {\n    body();\n}", FontFace::Courier, 9.0, 170.0);
        assert_eq!(lines, vec!["fn main() {", "    body();", "}"]);
    }

    #[test]
    fn test_wrapped_lines_fit() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(20);
        let lines = split_text_to_size(&text, FontFace::Helvetica, 11.0, 180.0);

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(FontFace::Helvetica.text_width(line, 11.0) <= 180.0 + 1e-3);
        }
    }
}
