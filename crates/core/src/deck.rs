//! Deck definitions: the JSON description a presentation is generated from.
//!
//! A deck lists its slides either directly (`slides`) or as a flat
//! `elements` array where each element names its 1-based `slide`. Geometry
//! is in inches, colors are `#RRGGBB` (or `#RGB`) strings and font sizes are
//! points. Every field is optional unless noted; defaults mirror what the
//! generator draws when a value is absent.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Font used when a definition names none.
pub const DEFAULT_FONT_NAME: &str = "Calibri";

/// Text color used when a definition names none.
pub const DEFAULT_TEXT_COLOR: &str = "#1B1B1B";

/// A whole presentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckDefinition {
    #[serde(default)]
    pub slide: SlideSettings,

    #[serde(default)]
    pub metadata: DeckMetadata,

    #[serde(default)]
    pub slides: Vec<SlideDefinition>,

    /// Flat element list, used only when `slides` is empty.
    #[serde(default)]
    pub elements: Vec<PlacedElement>,
}

impl DeckDefinition {
    /// Parse a definition from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The slides to render, in order.
    ///
    /// With no `slides`, flat elements are grouped by their `slide` number
    /// (missing means 1) in ascending order, and `metadata.title` becomes
    /// the first slide's title.
    pub fn resolved_slides(&self) -> Vec<SlideDefinition> {
        if !self.slides.is_empty() {
            return self.slides.clone();
        }

        let mut grouped: BTreeMap<usize, Vec<ElementDefinition>> = BTreeMap::new();
        for placed in &self.elements {
            grouped
                .entry(placed.slide.unwrap_or(1))
                .or_default()
                .push(placed.element.clone());
        }

        let mut slides: Vec<SlideDefinition> = grouped
            .into_values()
            .map(|elements| SlideDefinition {
                elements,
                ..Default::default()
            })
            .collect();
        if let (Some(first), Some(title)) = (slides.first_mut(), &self.metadata.title) {
            first.title = Some(title.clone());
        }
        slides
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSettings {
    /// `"16:9"` (13.333 x 7.5 in) or `"4:3"` (10 x 7.5 in).
    #[serde(default = "default_slide_size")]
    pub size: String,
}

impl SlideSettings {
    /// Slide width and height in inches. Unknown sizes are widescreen.
    pub fn dimensions(&self) -> (f64, f64) {
        match self.size.as_str() {
            "4:3" => (10.0, 7.5),
            _ => (13.333, 7.5),
        }
    }
}

impl Default for SlideSettings {
    fn default() -> Self {
        Self {
            size: default_slide_size(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckMetadata {
    #[serde(default)]
    pub title: Option<String>,
}

/// One slide: a cover, or a titled slide of elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDefinition {
    /// `"cover"` for a cover slide; anything else is a regular slide.
    #[serde(default)]
    pub layout: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    /// Cover band color.
    #[serde(default)]
    pub accent_color: Option<String>,

    /// Cover footer.
    #[serde(default)]
    pub meta: Option<CoverMeta>,

    #[serde(default)]
    pub elements: Vec<ElementDefinition>,
}

impl SlideDefinition {
    pub fn is_cover(&self) -> bool {
        self.layout.as_deref() == Some("cover")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverMeta {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub date: String,
}

/// An element of the flat model, tagged with its slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedElement {
    #[serde(default)]
    pub slide: Option<usize>,

    #[serde(flatten)]
    pub element: ElementDefinition,
}

/// A slide element, tagged by `type`. Unknown types are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementDefinition {
    Text(TextDefinition),
    Table(TableDefinition),
    Chart(ChartDefinition),
    #[serde(other)]
    Unsupported,
}

/// A box on the slide, in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InchRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl InchRect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// Position as written in a definition; any key may be left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
}

impl Position {
    /// The element's box: `fallback` when no position was given, otherwise
    /// the given keys with 1, 1, 10, 1 for the missing ones.
    pub fn resolve(position: Option<&Position>, fallback: InchRect) -> InchRect {
        match position {
            None => fallback,
            Some(p) => InchRect {
                x: p.x.unwrap_or(1.0),
                y: p.y.unwrap_or(1.0),
                w: p.w.unwrap_or(10.0),
                h: p.h.unwrap_or(1.0),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontStyle {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub italic: Option<bool>,
    #[serde(default)]
    pub underline: Option<bool>,
}

/// Inner text margins in inches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    #[serde(default)]
    pub left: Option<f64>,
    #[serde(default)]
    pub right: Option<f64>,
    #[serde(default)]
    pub top: Option<f64>,
    #[serde(default)]
    pub bottom: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default)]
    pub font: FontStyle,

    /// Text color.
    #[serde(default)]
    pub text: Option<String>,

    /// `left`, `center` or `right`.
    #[serde(default)]
    pub align: Option<String>,

    #[serde(default)]
    pub margins: Margins,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextVariant {
    Heading,
    #[default]
    Paragraph,
    Bullets,
    Rich,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextDefinition {
    #[serde(default)]
    pub variant: TextVariant,

    /// Heading and paragraph text.
    #[serde(default)]
    pub text: String,

    /// Bullet lines.
    #[serde(default)]
    pub items: Vec<BulletItem>,

    /// Rich text runs, all in one paragraph.
    #[serde(default)]
    pub runs: Vec<RunDefinition>,

    #[serde(default)]
    pub position: Option<Position>,

    #[serde(default)]
    pub style: TextStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulletItem {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub level: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunDefinition {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub font: FontStyle,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub italic: Option<bool>,
    #[serde(default)]
    pub underline: Option<bool>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    #[serde(default)]
    pub headers: Vec<String>,

    #[serde(default)]
    pub rows: Vec<Vec<String>>,

    #[serde(default)]
    pub position: Option<Position>,

    /// Column widths in inches, applied left to right.
    #[serde(default)]
    pub column_widths: Option<Vec<f64>>,

    /// Only `align` is used.
    #[serde(default)]
    pub style: TextStyle,
}

/// A chart, tagged by `subtype`. Unknown subtypes are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "lowercase")]
pub enum ChartDefinition {
    Gantt(GanttDefinition),
    Pie(PieDefinition),
    Bar(BarDefinition),
    Line(LineDefinition),
    #[serde(other)]
    Unsupported,
}

/// Title, legend and placement shared by pie, bar and line charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartFrame {
    #[serde(default)]
    pub title: Option<String>,

    /// `right`, `left`, `top`, `bottom` or `corner`.
    #[serde(default = "default_legend")]
    pub legend: String,

    /// Space taken from the chart box on the legend's side.
    #[serde(default = "default_legend_pad")]
    pub legend_pad_inches: f64,

    #[serde(default)]
    pub position: Option<Position>,
}

impl Default for ChartFrame {
    fn default() -> Self {
        Self {
            title: None,
            legend: default_legend(),
            legend_pad_inches: default_legend_pad(),
            position: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieDefinition {
    #[serde(flatten)]
    pub frame: ChartFrame,

    #[serde(default)]
    pub data: Vec<PieSlice>,

    #[serde(default)]
    pub show_labels: bool,

    /// `"percent"` shows slice percentages when labels are on.
    #[serde(default)]
    pub labels: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryAxis {
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesDefinition {
    #[serde(default)]
    pub name: String,

    /// One value per category; `null` leaves a gap.
    #[serde(default)]
    pub data: Vec<Option<f64>>,

    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarDefinition {
    #[serde(flatten)]
    pub frame: ChartFrame,

    #[serde(default)]
    pub x: CategoryAxis,

    #[serde(default)]
    pub series: Vec<SeriesDefinition>,

    #[serde(default)]
    pub options: BarOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarOptions {
    #[serde(default)]
    pub stacked: bool,

    /// `vertical` (columns) or `horizontal` (bars).
    #[serde(default = "default_orientation")]
    pub orientation: String,
}

impl BarOptions {
    pub fn is_horizontal(&self) -> bool {
        self.orientation == "horizontal"
    }
}

impl Default for BarOptions {
    fn default() -> Self {
        Self {
            stacked: false,
            orientation: default_orientation(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineDefinition {
    #[serde(flatten)]
    pub frame: ChartFrame,

    #[serde(default)]
    pub x: CategoryAxis,

    #[serde(default)]
    pub series: Vec<SeriesDefinition>,

    #[serde(default)]
    pub options: LineOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineOptions {
    #[serde(default = "default_true")]
    pub markers: bool,
    #[serde(default)]
    pub smooth: bool,
}

impl Default for LineOptions {
    fn default() -> Self {
        Self {
            markers: true,
            smooth: false,
        }
    }
}

/// A roadmap of chevrons laid out on date-scaled lanes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GanttDefinition {
    #[serde(default)]
    pub position: Option<Position>,

    /// Width kept at the left of the box for lane labels.
    #[serde(default = "default_gutter")]
    pub gutter_inches: f64,

    /// Shorten `Phase N: tail` lane names to `PN – tail`.
    #[serde(default = "default_true")]
    pub shorten_lanes: bool,

    #[serde(default)]
    pub units: GanttUnits,

    #[serde(default)]
    pub grid: GanttGrid,

    /// Chevron point depth as a fraction of its height.
    #[serde(default = "default_chevron_head")]
    pub chevron_head: f64,

    #[serde(default)]
    pub items: Vec<GanttItem>,
}

impl Default for GanttDefinition {
    fn default() -> Self {
        Self {
            position: None,
            gutter_inches: default_gutter(),
            shorten_lanes: true,
            units: GanttUnits::default(),
            grid: GanttGrid::default(),
            chevron_head: default_chevron_head(),
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GanttUnits {
    /// Required to place anything on the time axis.
    #[serde(default)]
    pub x_range: Option<TimeRange>,

    #[serde(default)]
    pub y_range: LaneRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub t0: DateValue,
    pub t1: DateValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneRange {
    #[serde(default)]
    pub lanes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GanttGrid {
    /// Quarter boundaries; a guide line is drawn at each one.
    #[serde(default)]
    pub quarters: Vec<DateValue>,

    #[serde(default = "default_true")]
    pub show_labels: bool,

    /// How far above the lanes the quarter labels sit.
    #[serde(default = "default_label_offset")]
    pub label_offset_inches: f64,

    #[serde(default = "default_label_font_size")]
    pub label_font_size: f64,

    #[serde(default = "default_true")]
    pub top_axis_line: bool,
}

impl Default for GanttGrid {
    fn default() -> Self {
        Self {
            quarters: Vec::new(),
            show_labels: true,
            label_offset_inches: default_label_offset(),
            label_font_size: default_label_font_size(),
            top_axis_line: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttItem {
    #[serde(default)]
    pub id: String,

    /// Falls back to `id`.
    #[serde(default)]
    pub label: Option<String>,

    pub start: GanttStart,
    pub end: GanttEnd,

    #[serde(default)]
    pub size: ItemSize,

    #[serde(default)]
    pub style: ItemStyle,
}

impl GanttItem {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttStart {
    pub x: DateValue,

    /// Lane index, 0 at the top.
    #[serde(default)]
    pub y: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttEnd {
    pub x: DateValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemSize {
    /// Fraction of the lane height.
    #[serde(default = "default_item_height")]
    pub height: f64,
}

impl Default for ItemSize {
    fn default() -> Self {
        Self {
            height: default_item_height(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemStyle {
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A date given as text (`2025-01-31`, RFC 3339, `2025-01-31 08:00:00`)
/// or as Unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Timestamp(f64),
    Text(String),
}

impl DateValue {
    /// Resolve to a date-time. Timestamps are read as UTC.
    pub fn to_datetime(&self) -> Result<NaiveDateTime> {
        match self {
            DateValue::Timestamp(secs) => DateTime::from_timestamp(secs.floor() as i64, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| Error::InvalidDeck(format!("Timestamp {} is out of range", secs))),
            DateValue::Text(text) => parse_date_text(text.trim()),
        }
    }
}

fn parse_date_text(text: &str) -> Result<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }
    Err(Error::InvalidDeck(format!("Unrecognized date '{}'", text)))
}

fn default_slide_size() -> String {
    "16:9".to_string()
}

fn default_legend() -> String {
    "right".to_string()
}

fn default_legend_pad() -> f64 {
    0.7
}

fn default_orientation() -> String {
    "vertical".to_string()
}

fn default_true() -> bool {
    true
}

fn default_gutter() -> f64 {
    1.0
}

fn default_chevron_head() -> f64 {
    0.28
}

fn default_label_offset() -> f64 {
    0.30
}

fn default_label_font_size() -> f64 {
    12.0
}

fn default_item_height() -> f64 {
    0.6
}
