//! Greedy vertical-flow pagination
//!
//! Lays a transcript out on fixed-size pages. A cursor walks down the page
//! from the top margin; before a block is placed the engine checks whether
//! it would cross the bottom margin and, if so, starts a new page first.
//!
//! Labels, timestamps, and rules are atomic. Question and answer bodies are
//! wrapped and placed line by line, so a long answer flows across pages
//! while its labels never split. A page that holds nothing yet accepts any
//! block, which keeps the flow moving even for oversized content.

use chrono::{DateTime, Utc};

use super::metrics::{FontWeight, TextMetrics};
use crate::error::{Result, TutorError};
use crate::transcript::Exchange;

/// Document title on the first page
pub const TITLE: &str = "Study Tutor Chat Export";

const TITLE_ADVANCE: f64 = 10.0;
const META_ADVANCE: f64 = 8.0;
const HEADER_RULE_ADVANCE: f64 = 10.0;
const LABEL_EXTENT: f64 = 8.0;
const LINE_HEIGHT: f64 = 4.0;
const BODY_GAP: f64 = 5.0;
const TIMESTAMP_EXTENT: f64 = 8.0;
const RULE_EXTENT: f64 = 3.0;
const RULE_ADVANCE: f64 = 8.0;
/// Horizontal indent of question and answer bodies
const BODY_INDENT: f64 = 2.0;
/// Bodies wrap this much narrower than the content width
const WRAP_INSET: f64 = 4.0;

const ACCENT: Rgb = Rgb(0, 102, 204);

const TITLE_STYLE: TextStyle = TextStyle::new(18.0, FontWeight::Bold, ACCENT);
const META_STYLE: TextStyle = TextStyle::new(9.0, FontWeight::Normal, Rgb::gray(100));
const LABEL_STYLE: TextStyle = TextStyle::new(10.0, FontWeight::Bold, ACCENT);
const QUESTION_STYLE: TextStyle = TextStyle::new(9.0, FontWeight::Normal, Rgb::gray(40));
const ANSWER_STYLE: TextStyle = TextStyle::new(8.5, FontWeight::Normal, Rgb::gray(50));
const TIMESTAMP_STYLE: TextStyle = TextStyle::new(7.0, FontWeight::Normal, Rgb::gray(150));

const HEADER_RULE_GRAY: u8 = 200;
const EXCHANGE_RULE_GRAY: u8 = 220;

/// Timestamp format used in exported documents
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Page size and margin in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl PageGeometry {
    /// A4 portrait with a 12mm margin
    pub const A4: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin: 12.0,
    };

    /// Width between the left and right margins
    pub fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    /// Cursor position no block may cross
    pub fn bottom(&self) -> f64 {
        self.height - self.margin
    }

    /// Wrap width for question and answer bodies
    pub fn wrap_width(&self) -> f64 {
        self.content_width() - WRAP_INSET
    }

    fn validate(&self) -> Result<()> {
        let tallest = [
            TITLE_ADVANCE,
            META_ADVANCE,
            LABEL_EXTENT,
            LINE_HEIGHT,
            TIMESTAMP_EXTENT,
            RULE_EXTENT,
        ]
        .into_iter()
        .fold(0.0, f64::max);

        if self.wrap_width() <= 0.0 {
            return Err(TutorError::Export(format!(
                "page width {}mm leaves no room for text",
                self.width
            ))
            .into());
        }
        if self.bottom() - self.margin < tallest {
            return Err(TutorError::Export(format!(
                "page height {}mm cannot fit a single block",
                self.height
            ))
            .into());
        }
        Ok(())
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn gray(level: u8) -> Self {
        Self(level, level, level)
    }
}

/// Font size (points), weight, and colour of a text run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub weight: FontWeight,
    pub color: Rgb,
}

impl TextStyle {
    pub const fn new(size: f64, weight: FontWeight, color: Rgb) -> Self {
        Self {
            size,
            weight,
            color,
        }
    }
}

/// Something drawn on a page, positioned in millimetres from the top left
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Single line of text with its baseline at `y`
    Text {
        x: f64,
        y: f64,
        text: String,
        style: TextStyle,
    },
    /// Horizontal rule
    Rule { x1: f64, x2: f64, y: f64, gray: u8 },
}

/// One page of positioned elements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

impl Page {
    /// Text runs on this page, in placement order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|element| match element {
            Element::Text { text, .. } => Some(text.as_str()),
            Element::Rule { .. } => None,
        })
    }
}

/// Laid-out multi-page document
#[derive(Debug, Clone, PartialEq)]
pub struct PagedDocument {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

impl PagedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Index of the first page containing `needle` as a whole text run
    pub fn page_of(&self, needle: &str) -> Option<usize> {
        self.pages
            .iter()
            .position(|page| page.texts().any(|text| text == needle))
    }
}

/// Wraps `text` into lines no wider than `max_width`
///
/// Explicit newlines start new lines (blank lines are kept), words break at
/// spaces, and a word wider than the line is split between characters.
/// Leading indentation stays attached to a paragraph's first word; tabs
/// count as four spaces.
/// Every returned line except a deliberate blank one is non-empty.
pub fn wrap_text(
    text: &str,
    max_width: f64,
    size: f64,
    weight: FontWeight,
    metrics: &dyn TextMetrics,
) -> Vec<String> {
    let fits = |candidate: &str| metrics.text_width(candidate, size, weight) <= max_width;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        let body = paragraph.trim_start_matches([' ', '\t']);
        let indent = paragraph[..paragraph.len() - body.len()].replace('\t', "    ");
        let mut line = String::new();

        for (idx, word) in body.split([' ', '\t']).filter(|w| !w.is_empty()).enumerate() {
            let word = if idx == 0 {
                format!("{}{}", indent, word)
            } else {
                word.to_string()
            };
            let word = word.as_str();
            if line.is_empty() {
                if fits(word) {
                    line.push_str(word);
                    continue;
                }
            } else {
                let candidate = format!("{} {}", line, word);
                if fits(&candidate) {
                    line = candidate;
                    continue;
                }
                lines.push(std::mem::take(&mut line));
                if fits(word) {
                    line.push_str(word);
                    continue;
                }
            }

            // Word is wider than a whole line
            for c in word.chars() {
                let mut candidate = line.clone();
                candidate.push(c);
                if !line.is_empty() && !fits(&candidate) {
                    lines.push(std::mem::take(&mut line));
                    line.push(c);
                } else {
                    line = candidate;
                }
            }
        }

        lines.push(line);
    }

    lines
}

/// Lays transcripts out on pages
pub struct Paginator<'a> {
    geometry: PageGeometry,
    metrics: &'a dyn TextMetrics,
    max_pages: usize,
}

impl<'a> Paginator<'a> {
    /// Creates a paginator
    ///
    /// # Errors
    ///
    /// Returns [`TutorError::Export`] if the geometry cannot hold the
    /// tallest block on an empty page, or `max_pages` is zero.
    pub fn new(
        geometry: PageGeometry,
        metrics: &'a dyn TextMetrics,
        max_pages: usize,
    ) -> Result<Self> {
        geometry.validate()?;
        if max_pages == 0 {
            return Err(TutorError::Export("page limit must be at least 1".to_string()).into());
        }
        Ok(Self {
            geometry,
            metrics,
            max_pages,
        })
    }

    /// Lays out the header and every exchange
    ///
    /// # Errors
    ///
    /// Returns [`TutorError::Export`] if the document needs more than the
    /// configured number of pages.
    pub fn paginate(
        &self,
        exchanges: &[Exchange],
        exported_at: DateTime<Utc>,
    ) -> Result<PagedDocument> {
        let mut flow = Flow::new(self.geometry, self.max_pages);
        let g = self.geometry;
        let body_x = g.margin + BODY_INDENT;

        flow.text(g.margin, TITLE, TITLE_STYLE);
        flow.advance(TITLE_ADVANCE);
        flow.text(
            g.margin,
            &format!("Exported on: {}", exported_at.format(TIMESTAMP_FORMAT)),
            META_STYLE,
        );
        flow.advance(META_ADVANCE);
        flow.rule(HEADER_RULE_GRAY);
        flow.advance(HEADER_RULE_ADVANCE);

        for (idx, exchange) in exchanges.iter().enumerate() {
            flow.reserve(LABEL_EXTENT)?;
            flow.text(
                g.margin,
                &format!("Q{}. {}", idx + 1, exchange.topic),
                LABEL_STYLE,
            );
            flow.advance(LABEL_EXTENT);

            for line in self.wrap(&exchange.question, QUESTION_STYLE) {
                flow.reserve(LINE_HEIGHT)?;
                flow.text(body_x, &line, QUESTION_STYLE);
                flow.advance(LINE_HEIGHT);
            }
            flow.advance(BODY_GAP);

            flow.reserve(LABEL_EXTENT)?;
            flow.text(g.margin, "Answer:", LABEL_STYLE);
            flow.advance(LABEL_EXTENT);

            for line in self.wrap(&exchange.answer, ANSWER_STYLE) {
                flow.reserve(LINE_HEIGHT)?;
                flow.text(body_x, &line, ANSWER_STYLE);
                flow.advance(LINE_HEIGHT);
            }
            flow.advance(BODY_GAP);

            flow.reserve(TIMESTAMP_EXTENT)?;
            flow.text(
                g.margin,
                &exchange.created_at.format(TIMESTAMP_FORMAT).to_string(),
                TIMESTAMP_STYLE,
            );
            flow.advance(TIMESTAMP_EXTENT);

            flow.reserve(RULE_EXTENT)?;
            flow.rule(EXCHANGE_RULE_GRAY);
            flow.advance(RULE_ADVANCE);
        }

        tracing::debug!(
            "Paginated {} exchanges onto {} pages",
            exchanges.len(),
            flow.pages.len()
        );

        Ok(PagedDocument {
            geometry: self.geometry,
            pages: flow.pages,
        })
    }

    fn wrap(&self, text: &str, style: TextStyle) -> Vec<String> {
        wrap_text(
            text,
            self.geometry.wrap_width(),
            style.size,
            style.weight,
            self.metrics,
        )
    }
}

/// Cursor over the pages being filled
struct Flow {
    geometry: PageGeometry,
    max_pages: usize,
    pages: Vec<Page>,
    y: f64,
}

impl Flow {
    fn new(geometry: PageGeometry, max_pages: usize) -> Self {
        Self {
            geometry,
            max_pages,
            pages: vec![Page::default()],
            y: geometry.margin,
        }
    }

    fn current(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Breaks the page if a block of `extent` would cross the bottom margin
    fn reserve(&mut self, extent: f64) -> Result<()> {
        let fresh = self.current().elements.is_empty();
        if self.y + extent > self.geometry.bottom() && !fresh {
            self.break_page()?;
        }
        Ok(())
    }

    fn break_page(&mut self) -> Result<()> {
        if self.pages.len() >= self.max_pages {
            return Err(TutorError::Export(format!(
                "document exceeds the page limit of {}",
                self.max_pages
            ))
            .into());
        }
        self.pages.push(Page::default());
        self.y = self.geometry.margin;
        Ok(())
    }

    fn advance(&mut self, dy: f64) {
        self.y += dy;
    }

    fn text(&mut self, x: f64, text: &str, style: TextStyle) {
        let y = self.y;
        self.current().elements.push(Element::Text {
            x,
            y,
            text: text.to_string(),
            style,
        });
    }

    fn rule(&mut self, gray: u8) {
        let (x1, x2, y) = (
            self.geometry.margin,
            self.geometry.width - self.geometry.margin,
            self.y,
        );
        self.current()
            .elements
            .push(Element::Rule { x1, x2, y, gray });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::metrics::{FixedAdvance, Helvetica};
    use crate::transcript::Origin;
    use chrono::TimeZone;

    fn exported_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn exchange(id: &str, question: &str, answer: &str) -> Exchange {
        Exchange::new(id, "Math", question, answer, exported_at(), Origin::Fresh).unwrap()
    }

    fn numbered_lines(count: usize) -> String {
        (1..=count)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn paginate(exchanges: &[Exchange]) -> PagedDocument {
        Paginator::new(PageGeometry::A4, &Helvetica, 500)
            .unwrap()
            .paginate(exchanges, exported_at())
            .unwrap()
    }

    #[test]
    fn test_wrap_breaks_at_spaces() {
        let metrics = FixedAdvance { advance: 1.0 };
        let lines = wrap_text("aaa bbb ccc", 7.0, 9.0, FontWeight::Normal, &metrics);
        assert_eq!(lines, vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let metrics = FixedAdvance { advance: 1.0 };
        let lines = wrap_text("ab abcdefghij", 4.0, 9.0, FontWeight::Normal, &metrics);
        assert_eq!(lines, vec!["ab", "abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_keeps_blank_lines_and_newlines() {
        let metrics = FixedAdvance { advance: 1.0 };
        let lines = wrap_text("one\r\n\ntwo", 40.0, 9.0, FontWeight::Normal, &metrics);
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn test_wrap_keeps_leading_indentation() {
        let metrics = FixedAdvance { advance: 1.0 };
        let text = "Example:\n    let x = 1;\n\t- nested item\n  ";
        let lines = wrap_text(text, 40.0, 9.0, FontWeight::Normal, &metrics);
        assert_eq!(
            lines,
            vec!["Example:", "    let x = 1;", "    - nested item", ""]
        );
    }

    #[test]
    fn test_wrap_makes_progress_when_narrower_than_a_char() {
        let metrics = FixedAdvance { advance: 5.0 };
        let lines = wrap_text("abc", 1.0, 9.0, FontWeight::Normal, &metrics);
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_lines_fit_the_wrap_width() {
        let answer = "The chain rule says the derivative of f(g(x)) is f'(g(x)) times g'(x). "
            .repeat(20);
        let width = PageGeometry::A4.wrap_width();
        for line in wrap_text(&answer, width, 8.5, FontWeight::Normal, &Helvetica) {
            assert!(Helvetica.text_width(&line, 8.5, FontWeight::Normal) <= width);
        }
    }

    #[test]
    fn test_header_only_on_first_page() {
        let doc = paginate(&[exchange("1", "Q", &numbered_lines(200))]);
        assert!(doc.page_count() > 1);
        assert_eq!(doc.page_of(TITLE), Some(0));
        let titles = doc
            .pages
            .iter()
            .flat_map(|page| page.texts())
            .filter(|text| *text == TITLE)
            .count();
        assert_eq!(titles, 1);
    }

    #[test]
    fn test_exchange_one_line_short_of_full_page_fits_one_page() {
        let doc = paginate(&[exchange("1", "Q", &numbered_lines(51))]);
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_one_more_line_spills_to_second_page() {
        let doc = paginate(&[exchange("1", "Q", &numbered_lines(52))]);
        assert_eq!(doc.page_count(), 2);
        // All answer lines fit on page one; only the timestamp moves
        assert_eq!(doc.page_of("line 52"), Some(0));
        assert_eq!(doc.page_of("2025-03-01 12:00:00 UTC"), Some(1));
    }

    #[test]
    fn test_long_answer_flows_line_by_line_and_terminates() {
        let doc = paginate(&[exchange("1", "Q", &numbered_lines(300))]);
        assert!(doc.page_count() >= 5);
        // Line 56 no longer fits under the first page's "Answer:" label
        assert_eq!(doc.page_of("line 55"), Some(0));
        assert_eq!(doc.page_of("line 56"), Some(1));
        for page in &doc.pages {
            for element in &page.elements {
                if let Element::Text { y, .. } = element {
                    assert!(*y <= PageGeometry::A4.bottom());
                }
            }
        }
    }

    #[test]
    fn test_labels_are_never_split_from_the_page_they_start() {
        // First exchange leaves room for less than a label at the bottom
        let first = exchange("1", "Q", &numbered_lines(50));
        let second = exchange("2", "Second question", "Short");
        let doc = paginate(&[first, second]);

        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page_of("Q2. Math"), Some(1));
        assert_eq!(doc.page_of("Second question"), Some(1));
        assert_eq!(doc.page_of("Answer:"), Some(0));
    }

    #[test]
    fn test_every_page_starts_at_the_top_margin() {
        let doc = paginate(&[exchange("1", "Q", &numbered_lines(120))]);
        for page in doc.pages.iter().skip(1) {
            match page.elements.first() {
                Some(Element::Text { y, .. }) | Some(Element::Rule { y, .. }) => {
                    assert_eq!(*y, PageGeometry::A4.margin)
                }
                None => panic!("empty page"),
            }
        }
    }

    #[test]
    fn test_page_limit_is_an_export_error() {
        let err = Paginator::new(PageGeometry::A4, &Helvetica, 2)
            .unwrap()
            .paginate(&[exchange("1", "Q", &numbered_lines(400))], exported_at())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TutorError>(),
            Some(TutorError::Export(msg)) if msg.contains("page limit of 2")
        ));
    }

    #[test]
    fn test_degenerate_geometry_is_rejected() {
        let tiny = PageGeometry {
            width: 210.0,
            height: 30.0,
            margin: 12.0,
        };
        assert!(Paginator::new(tiny, &Helvetica, 10).is_err());

        let narrow = PageGeometry {
            width: 25.0,
            height: 297.0,
            margin: 12.0,
        };
        assert!(Paginator::new(narrow, &Helvetica, 10).is_err());
    }

    #[test]
    fn test_same_input_same_layout() {
        let exchanges = vec![
            exchange("1", "What is 2+2?", "4"),
            exchange("2", "Explain limits", &"A limit describes behaviour. ".repeat(40)),
        ];
        assert_eq!(paginate(&exchanges), paginate(&exchanges));
    }
}
