//! Domain types for representing analyzed presentation content.
//!
//! These types define the JSON shape of an analysis. Optional and empty
//! fields are left out of the serialized form to keep the output lean.

use serde::{Deserialize, Serialize};

/// Represents an entire presentation with its analyzed content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationAnalysis {
    /// Original filename or storage key.
    pub file_name: String,

    /// Number of slides, always equal to `slides.len()`.
    pub slide_count: usize,

    /// Slides in presentation order.
    pub slides: Vec<SlideAnalysis>,
}

impl PresentationAnalysis {
    /// Create an empty analysis for the given file name.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            slide_count: 0,
            slides: Vec::new(),
        }
    }

    /// Add a slide to the analysis.
    pub fn add_slide(&mut self, slide: SlideAnalysis) {
        self.slides.push(slide);
        self.slide_count = self.slides.len();
    }

    /// Iterate over every element of every slide, descending into groups.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.slides.iter().flat_map(|s| s.elements.iter()).flat_map(Element::walk)
    }
}

/// The format of the source presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
}

impl PresentationFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }
        None
    }
}

/// A single analyzed slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideAnalysis {
    /// 1-based slide number.
    pub slide_number: usize,

    /// Elements in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<Element>,

    /// Speaker notes, if requested and present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SlideAnalysis {
    /// Create a new slide with the given number.
    pub fn new(slide_number: usize) -> Self {
        Self {
            slide_number,
            elements: Vec::new(),
            notes: None,
        }
    }

    /// Add an element to this slide.
    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }
}

/// A content element found on a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Element {
    Text(TextElement),
    Table(TableElement),
    Chart(ChartElement),
    Image(ImageElement),
    Group(GroupElement),
}

impl Element {
    /// Short name of the element kind, as written in the `kind` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Text(_) => "text",
            Element::Table(_) => "table",
            Element::Chart(_) => "chart",
            Element::Image(_) => "image",
            Element::Group(_) => "group",
        }
    }

    /// This element followed by all of its descendants, depth first.
    pub fn walk(&self) -> Box<dyn Iterator<Item = &Element> + '_> {
        match self {
            Element::Group(g) => Box::new(
                std::iter::once(self).chain(g.children.iter().flat_map(Element::walk)),
            ),
            _ => Box::new(std::iter::once(self)),
        }
    }
}

/// Heuristic role of a text shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextRole {
    Title,
    Subtitle,
    Heading,
    Body,
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
    Distributed,
}

impl Alignment {
    /// Map a DrawingML `algn` attribute value.
    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "l" => Some(Self::Left),
            "ctr" => Some(Self::Center),
            "r" => Some(Self::Right),
            "just" | "justLow" => Some(Self::Justify),
            "dist" | "thaiDist" => Some(Self::Distributed),
            _ => None,
        }
    }
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A text shape: role plus paragraphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    pub role: TextRole,
    pub paragraphs: Vec<Paragraph>,
}

/// A paragraph within a text frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Indentation level, omitted when 0.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub level: u32,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            level: 0,
            text: text.into(),
            alignment: None,
        }
    }
}

/// A table shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableElement {
    pub structure: TableStructure,
}

/// Grid of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStructure {
    pub rows: usize,
    pub cols: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cells: Vec<Vec<TableCell>>,
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub r: usize,
    pub c: usize,
    pub text: String,

    /// Set when this cell starts a merged range.
    #[serde(default, skip_serializing_if = "is_false")]
    pub merge_origin: bool,

    /// Set when this cell is covered by another cell's merge.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_spanned: bool,
}

/// A chart, with whatever data could be recovered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub series: Vec<ChartSeries>,

    /// Cached cell values of the embedded workbook's active sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excel_data: Option<Vec<Vec<Option<CellValue>>>>,
}

/// A chart data series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<ChartPoint>,
}

/// One category/value pair of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// A workbook cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

/// A picture shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Package path of the image part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// A group shape and its extracted children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupElement {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}
