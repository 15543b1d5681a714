//! Text measurement for the paginated layout
//!
//! Wrap decisions need the width of a run of text at a given font size. The
//! PDF surface uses the standard Helvetica faces, so [`Helvetica`] carries
//! their AFM advance widths (units of 1/1000 em). [`FixedAdvance`] gives every
//! character the same width, which keeps layout tests predictable.

/// PostScript points per millimetre
pub const POINTS_PER_MM: f64 = 72.0 / 25.4;

/// Font face weight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

/// Measures rendered text width
pub trait TextMetrics: Send + Sync {
    /// Width of `text` in millimetres at `font_size` points
    fn text_width(&self, text: &str, font_size: f64, weight: FontWeight) -> f64;
}

/// Helvetica and Helvetica-Bold advance widths
#[derive(Debug, Clone, Copy, Default)]
pub struct Helvetica;

// Printable ASCII 0x20..=0x7E
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

/// Width used for characters outside printable ASCII
const FALLBACK_WIDTH: u16 = 556;

impl Helvetica {
    fn glyph_width(c: char, weight: FontWeight) -> u16 {
        let table = match weight {
            FontWeight::Normal => &HELVETICA,
            FontWeight::Bold => &HELVETICA_BOLD,
        };
        match c {
            '\t' => table[0],
            ' '..='~' => table[c as usize - 0x20],
            _ => FALLBACK_WIDTH,
        }
    }
}

impl TextMetrics for Helvetica {
    fn text_width(&self, text: &str, font_size: f64, weight: FontWeight) -> f64 {
        let units: u32 = text
            .chars()
            .map(|c| u32::from(Self::glyph_width(c, weight)))
            .sum();
        f64::from(units) / 1000.0 * font_size / POINTS_PER_MM
    }
}

/// Every character advances by the same width, regardless of font size
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance {
    /// Advance per character in millimetres
    pub advance: f64,
}

impl TextMetrics for FixedAdvance {
    fn text_width(&self, text: &str, _font_size: f64, _weight: FontWeight) -> f64 {
        text.chars().count() as f64 * self.advance
    }
}
