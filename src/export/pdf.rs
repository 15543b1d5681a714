//! PDF 1.4 serialization of a [`PagedDocument`]
//!
//! Writes an uncompressed document using the two standard Type1 faces, so
//! no font data is embedded. Text is encoded as WinAnsi; characters the
//! encoding cannot represent are replaced with `?`.

use std::io::Write;

use super::layout::{Element, PagedDocument, TextStyle, TITLE};
use super::metrics::{FontWeight, POINTS_PER_MM};
use crate::error::{Result, TutorError};

const CATALOG: usize = 1;
const PAGES: usize = 2;
const FONT_REGULAR: usize = 3;
const FONT_BOLD: usize = 4;
const INFO: usize = 5;
const FIRST_PAGE: usize = 6;

/// Serializes the document to PDF bytes
///
/// # Errors
///
/// Returns [`TutorError::Export`] for a document without pages or with
/// non-finite coordinates.
pub fn render(document: &PagedDocument) -> Result<Vec<u8>> {
    if document.pages.is_empty() {
        return Err(TutorError::Export("document has no pages".to_string()).into());
    }

    let mut writer = ObjectWriter::new();
    let geometry = document.geometry;
    let (width_pt, height_pt) = (
        geometry.width * POINTS_PER_MM,
        geometry.height * POINTS_PER_MM,
    );

    writer.object(CATALOG, &format!("<< /Type /Catalog /Pages {} 0 R >>", PAGES))?;

    let kids = (0..document.pages.len())
        .map(|i| format!("{} 0 R", page_object(i)))
        .collect::<Vec<_>>()
        .join(" ");
    writer.object(
        PAGES,
        &format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            document.pages.len()
        ),
    )?;

    writer.object(FONT_REGULAR, &font_dict("Helvetica"))?;
    writer.object(FONT_BOLD, &font_dict("Helvetica-Bold"))?;
    writer.object(
        INFO,
        &format!(
            "<< /Title {} /Producer {} >>",
            literal(TITLE),
            literal(concat!("study-tutor ", env!("CARGO_PKG_VERSION")))
        ),
    )?;

    for (i, page) in document.pages.iter().enumerate() {
        let mut content = String::new();
        for element in &page.elements {
            match element {
                Element::Text { x, y, text, style } => {
                    let (px, py) = (*x * POINTS_PER_MM, (geometry.height - y) * POINTS_PER_MM);
                    check_finite(&[px, py, style.size])?;
                    content.push_str(&text_op(px, py, text, style));
                }
                Element::Rule { x1, x2, y, gray } => {
                    let py = (geometry.height - y) * POINTS_PER_MM;
                    let (px1, px2) = (*x1 * POINTS_PER_MM, *x2 * POINTS_PER_MM);
                    check_finite(&[px1, px2, py])?;
                    content.push_str(&format!(
                        "{:.3} G 0.5 w {:.2} {:.2} m {:.2} {:.2} l S\n",
                        f64::from(*gray) / 255.0,
                        px1,
                        py,
                        px2,
                        py
                    ));
                }
            }
        }

        writer.object(
            page_object(i),
            &format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources << /Font << /F1 {} 0 R /F2 {} 0 R >> >> /Contents {} 0 R >>",
                PAGES,
                width_pt,
                height_pt,
                FONT_REGULAR,
                FONT_BOLD,
                page_object(i) + 1
            ),
        )?;
        writer.stream(page_object(i) + 1, content.as_bytes())?;
    }

    writer.finish()
}

fn page_object(index: usize) -> usize {
    FIRST_PAGE + index * 2
}

fn font_dict(base_font: &str) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        base_font
    )
}

fn check_finite(values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(TutorError::Export("element position is not a finite number".to_string()).into())
    }
}

fn text_op(x: f64, y: f64, text: &str, style: &TextStyle) -> String {
    let font = match style.weight {
        FontWeight::Normal => "F1",
        FontWeight::Bold => "F2",
    };
    let color = style.color;
    format!(
        "BT /{} {:.2} Tf {:.3} {:.3} {:.3} rg {:.2} {:.2} Td {} Tj ET\n",
        font,
        style.size,
        f64::from(color.0) / 255.0,
        f64::from(color.1) / 255.0,
        f64::from(color.2) / 255.0,
        x,
        y,
        literal(text)
    )
}

/// WinAnsi code for `c`, if the encoding has one
fn win_ansi(c: char) -> Option<u8> {
    match c {
        '\u{20AC}' => Some(0x80),
        '\u{2018}' => Some(0x91),
        '\u{2019}' => Some(0x92),
        '\u{201C}' => Some(0x93),
        '\u{201D}' => Some(0x94),
        '\u{2022}' => Some(0x95),
        '\u{2013}' => Some(0x96),
        '\u{2014}' => Some(0x97),
        '\u{2026}' => Some(0x85),
        '\t' => Some(b' '),
        ' '..='~' | '\u{A0}'..='\u{FF}' => u8::try_from(u32::from(c)).ok(),
        _ => None,
    }
}

/// PDF literal string with escaping; non-ASCII bytes are written as octal
fn literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('(');
    for c in text.chars() {
        match win_ansi(c).unwrap_or(b'?') {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            byte if byte.is_ascii() => out.push(char::from(byte)),
            byte => out.push_str(&format!("\\{:03o}", byte)),
        }
    }
    out.push(')');
    out
}

/// Accumulates numbered objects and records their byte offsets
struct ObjectWriter {
    buf: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl ObjectWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, number: usize, body: &str) -> Result<()> {
        self.offsets.push((number, self.buf.len()));
        write!(self.buf, "{} 0 obj\n{}\nendobj\n", number, body)?;
        Ok(())
    }

    fn stream(&mut self, number: usize, data: &[u8]) -> Result<()> {
        self.offsets.push((number, self.buf.len()));
        write!(
            self.buf,
            "{} 0 obj\n<< /Length {} >>\nstream\n",
            number,
            data.len()
        )?;
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        self.offsets.sort_unstable();
        let size = self.offsets.len() + 1;
        if self
            .offsets
            .iter()
            .enumerate()
            .any(|(i, (number, _))| *number != i + 1)
        {
            return Err(TutorError::Export("object numbers are not contiguous".to_string()).into());
        }

        let xref_at = self.buf.len();
        write!(self.buf, "xref\n0 {}\n0000000000 65535 f \n", size)?;
        for (_, offset) in &self.offsets {
            write!(self.buf, "{:010} 00000 n \n", offset)?;
        }
        write!(
            self.buf,
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, CATALOG, INFO, xref_at
        )?;
        Ok(self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::layout::{Page, PageGeometry, Rgb};

    fn document(pages: usize) -> PagedDocument {
        let style = TextStyle::new(9.0, FontWeight::Normal, Rgb::gray(40));
        PagedDocument {
            geometry: PageGeometry::A4,
            pages: (0..pages)
                .map(|i| Page {
                    elements: vec![
                        Element::Text {
                            x: 12.0,
                            y: 12.0,
                            text: format!("page {}", i + 1),
                            style,
                        },
                        Element::Rule {
                            x1: 12.0,
                            x2: 198.0,
                            y: 20.0,
                            gray: 220,
                        },
                    ],
                })
                .collect(),
        }
    }

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_header_and_trailer() {
        let bytes = render(&document(1)).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4\n"));
        assert!(bytes.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn test_one_page_object_per_page() {
        let text = as_text(&render(&document(3)).unwrap());
        assert_eq!(text.matches("/Type /Page ").count(), 3);
        assert!(text.contains("/Count 3"));
        assert!(text.contains("(page 3) Tj"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let bytes = render(&document(2)).unwrap();
        let text = as_text(&bytes);

        let startxref = text.rfind("startxref\n").unwrap() + "startxref\n".len();
        let xref_at: usize = text[startxref..].lines().next().unwrap().parse().unwrap();
        assert!(bytes[xref_at..].starts_with(b"xref\n0 10\n"));

        let xref = as_text(&bytes[xref_at..]);
        for (i, entry) in xref.lines().skip(3).take(9).enumerate() {
            assert_eq!(entry.len() + 1, 20);
            let offset: usize = entry[..10].parse().unwrap();
            assert!(bytes[offset..].starts_with(format!("{} 0 obj", i + 1).as_bytes()));
        }
    }

    #[test]
    fn test_literal_escapes_delimiters() {
        assert_eq!(literal(r"f(x) \ g"), r"(f\(x\) \\ g)");
    }

    #[test]
    fn test_literal_encodes_latin1_and_replaces_the_rest() {
        assert_eq!(literal("café"), "(caf\\351)");
        assert_eq!(literal("\u{201C}hi\u{201D}"), "(\\223hi\\224)");
        assert_eq!(literal("π ≈ 3.14"), "(? ? 3.14)");
    }

    #[test]
    fn test_rule_uses_stroke_gray() {
        let text = as_text(&render(&document(1)).unwrap());
        assert!(text.contains("0.863 G"));
    }

    #[test]
    fn test_empty_document_is_rejected() {
        let doc = PagedDocument {
            geometry: PageGeometry::A4,
            pages: Vec::new(),
        };
        let err = render(&doc).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TutorError>(),
            Some(TutorError::Export(_))
        ));
    }

    #[test]
    fn test_non_finite_position_is_rejected() {
        let mut doc = document(1);
        doc.pages[0].elements.push(Element::Rule {
            x1: f64::NAN,
            x2: 10.0,
            y: 10.0,
            gray: 200,
        });
        assert!(render(&doc).is_err());
    }
}
