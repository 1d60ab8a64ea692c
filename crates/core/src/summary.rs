//! Batch summaries over analyzed presentations.

use crate::types::{Element, PresentationAnalysis};
use std::fmt::Write;

/// Per-kind element counts for one presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementCounts {
    pub text: usize,
    pub tables: usize,
    pub charts: usize,
    pub images: usize,
}

impl ElementCounts {
    /// Count every element of an analysis, group children included.
    pub fn of(analysis: &PresentationAnalysis) -> Self {
        Self::count(analysis.elements())
    }

    /// Count only the elements placed directly on a slide. Groups and
    /// their children are not counted.
    pub fn top_level(analysis: &PresentationAnalysis) -> Self {
        Self::count(analysis.slides.iter().flat_map(|slide| slide.elements.iter()))
    }

    fn count<'a>(elements: impl Iterator<Item = &'a Element>) -> Self {
        let mut counts = Self::default();
        for element in elements {
            match element {
                Element::Text(_) => counts.text += 1,
                Element::Table(_) => counts.tables += 1,
                Element::Chart(_) => counts.charts += 1,
                Element::Image(_) => counts.images += 1,
                Element::Group(_) => {}
            }
        }
        counts
    }
}

/// Human-readable summary of a processed batch.
///
/// Produces `"Processed N files. "` followed by one sentence per file.
/// Counts cover top-level slide elements only.
pub fn batch_summary(results: &[(&str, &PresentationAnalysis)]) -> String {
    let mut summary = format!("Processed {} files. ", results.len());
    for (key, analysis) in results {
        let counts = ElementCounts::top_level(analysis);
        // Writing into a String cannot fail.
        let _ = write!(
            summary,
            "File '{}' ({} slides): {} text blocks, {} tables, {} charts. ",
            key, analysis.slide_count, counts.text, counts.tables, counts.charts
        );
    }
    summary
}

/// First `max_chars` characters of `text`, followed by `...`.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let end = text
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ChartElement, GroupElement, Paragraph, SlideAnalysis, TextElement, TextRole,
    };

    fn text(s: &str) -> Element {
        Element::Text(TextElement {
            role: TextRole::Body,
            paragraphs: vec![Paragraph::new(s)],
        })
    }

    fn sample() -> PresentationAnalysis {
        let mut analysis = PresentationAnalysis::new("q3.pptx");
        let mut first = SlideAnalysis::new(1);
        first.push(text("Agenda"));
        first.push(Element::Chart(ChartElement::default()));
        let mut second = SlideAnalysis::new(2);
        second.push(Element::Group(GroupElement {
            children: vec![text("Caption"), Element::Chart(ChartElement::default())],
        }));
        analysis.add_slide(first);
        analysis.add_slide(second);
        analysis
    }

    #[test]
    fn test_counts_include_group_children() {
        let counts = ElementCounts::of(&sample());
        assert_eq!(
            counts,
            ElementCounts {
                text: 2,
                tables: 0,
                charts: 2,
                images: 0
            }
        );
    }

    #[test]
    fn test_top_level_counts_skip_groups() {
        let counts = ElementCounts::top_level(&sample());
        assert_eq!(
            counts,
            ElementCounts {
                text: 1,
                tables: 0,
                charts: 1,
                images: 0
            }
        );
    }

    #[test]
    fn test_batch_summary() {
        let analysis = sample();
        let summary = batch_summary(&[("decks/q3.pptx", &analysis)]);
        assert_eq!(
            summary,
            "Processed 1 files. File 'decks/q3.pptx' (2 slides): 1 text blocks, 0 tables, 1 charts. "
        );
    }

    #[test]
    fn test_batch_summary_empty() {
        assert_eq!(batch_summary(&[]), "Processed 0 files. ");
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        assert_eq!(snippet("tiếng việt", 5), "tiếng...");
        assert_eq!(snippet("short", 100), "short...");
    }
}
