//! PPTX (Office Open XML) analyzer and generator.
//!
//! Opens .pptx files (ZIP archives of XML parts) and produces a
//! [`deck_core::PresentationAnalysis`]: per-slide text, tables, charts,
//! images and groups, with embedded chart workbooks read when present.
//!
//! [`generate`] goes the other way, rendering a [`deck_core::DeckDefinition`]
//! into a new presentation.

pub mod chart;
pub mod package;
pub mod parser;
pub mod shapes;
pub mod workbook;
pub mod writer;
pub mod xml;

#[cfg(test)]
mod test_support;

pub use parser::PptxAnalyzer;
pub use writer::{generate, generate_to_path};

/// Knobs for what the analyzer reads beyond the slide shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzeOptions {
    /// Read speaker notes into each slide.
    pub include_notes: bool,
    /// Read the embedded workbook behind each chart.
    pub include_workbooks: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            include_notes: true,
            include_workbooks: true,
        }
    }
}
