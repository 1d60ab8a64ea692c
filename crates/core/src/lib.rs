//! Core domain types, errors, and batch summaries for presentation analysis,
//! plus the deck definitions presentations are generated from.

pub mod deck;
pub mod error;
pub mod summary;
pub mod types;

pub use deck::DeckDefinition;
pub use error::{Error, Result};
pub use summary::{batch_summary, snippet, ElementCounts};
pub use types::{
    Alignment, CellValue, ChartElement, ChartPoint, ChartSeries, Element, GroupElement,
    ImageElement, Paragraph, PresentationAnalysis, PresentationFormat, SlideAnalysis,
    TableCell, TableElement, TableStructure, TextElement, TextRole,
};
