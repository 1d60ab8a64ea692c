//! DrawingML shapes for one slide: text boxes, filled rectangles, chevrons,
//! tables and chart frames.

use super::chart::ChartPart;
use super::emu;
use deck_core::deck::{InchRect, Margins};
use quick_xml::escape::escape;
use std::fmt::Write;

const GRAPHIC_TABLE_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/table";
const GRAPHIC_CHART_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";

/// A box in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rect {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl From<InchRect> for Rect {
    fn from(r: InchRect) -> Self {
        Self {
            x: emu(r.x),
            y: emu(r.y),
            w: emu(r.w.max(0.0)),
            h: emu(r.h.max(0.0)),
        }
    }
}

/// Character formatting of a run. `None` leaves the value to the theme.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RunFormat {
    pub font: Option<String>,
    /// Points.
    pub size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    /// `RRGGBB`.
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Run {
    pub text: String,
    pub format: RunFormat,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Para {
    pub runs: Vec<Run>,
    pub level: u32,
    /// OOXML alignment: `l`, `ctr` or `r`.
    pub align: Option<&'static str>,
}

impl Para {
    /// A paragraph of one run.
    pub fn single(text: &str, format: RunFormat, align: Option<&'static str>) -> Self {
        Self {
            runs: vec![Run {
                text: text.to_string(),
                format,
            }],
            level: 0,
            align,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TextFrame {
    pub paragraphs: Vec<Para>,
    pub wrap: bool,
    /// Shrink text on overflow.
    pub autofit: bool,
    /// Inches.
    pub margins: Margins,
}

impl TextFrame {
    pub fn wrapped(paragraphs: Vec<Para>) -> Self {
        Self {
            paragraphs,
            wrap: true,
            ..Default::default()
        }
    }
}

/// OOXML alignment code for `left`, `center` or `right`; anything else is left.
pub(crate) fn alignment(align: Option<&str>) -> &'static str {
    match align {
        Some("center") => "ctr",
        Some("right") => "r",
        _ => "l",
    }
}

/// Normalize `#RGB` / `#RRGGBB` to `RRGGBB`. Malformed colors become the
/// default text color.
pub(crate) fn hex_color(color: &str) -> String {
    let digits = color.trim().trim_start_matches('#');
    let expanded: String = if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    };
    if expanded.len() == 6 && expanded.chars().all(|c| c.is_ascii_hexdigit()) {
        expanded.to_ascii_uppercase()
    } else {
        "1B1B1B".to_string()
    }
}

/// Shapes of one slide, plus the charts they reference.
#[derive(Debug)]
pub(crate) struct SlideCanvas {
    shapes: String,
    next_id: u32,
    charts: Vec<ChartPart>,
}

impl SlideCanvas {
    pub fn new() -> Self {
        Self {
            shapes: String::with_capacity(4096),
            // Id 1 is the shape tree itself.
            next_id: 2,
            charts: Vec::new(),
        }
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn charts(&self) -> &[ChartPart] {
        &self.charts
    }

    pub fn add_text_box(&mut self, rect: impl Into<Rect>, frame: &TextFrame) {
        let id = self.take_id();
        let rect = rect.into();
        let mut xml = String::new();
        let _ = write!(
            xml,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>"#
        );
        write_xfrm(&mut xml, "a:xfrm", rect);
        xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#);
        write_text_body(&mut xml, "p:txBody", frame);
        xml.push_str("</p:sp>");
        self.shapes.push_str(&xml);
    }

    /// A borderless rectangle with a solid fill and no text.
    pub fn add_filled_rect(&mut self, rect: impl Into<Rect>, fill: &str) {
        let id = self.take_id();
        let mut xml = String::new();
        let _ = write!(
            xml,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Rectangle {id}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>"#
        );
        write_xfrm(&mut xml, "a:xfrm", rect.into());
        xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
        write_solid_fill(&mut xml, fill);
        xml.push_str("<a:ln><a:noFill/></a:ln></p:spPr></p:sp>");
        self.shapes.push_str(&xml);
    }

    /// A filled chevron whose point depth is `head` of its height.
    pub fn add_chevron(&mut self, rect: impl Into<Rect>, fill: &str, head: f64, frame: &TextFrame) {
        let id = self.take_id();
        let adj = (head * 100_000.0).round() as i64;
        let mut xml = String::new();
        let _ = write!(
            xml,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Chevron {id}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>"#
        );
        write_xfrm(&mut xml, "a:xfrm", rect.into());
        let _ = write!(
            xml,
            r#"<a:prstGeom prst="chevron"><a:avLst><a:gd name="adj" fmla="val {adj}"/></a:avLst></a:prstGeom>"#
        );
        write_solid_fill(&mut xml, fill);
        xml.push_str("<a:ln><a:noFill/></a:ln></p:spPr>");
        write_text_body(&mut xml, "p:txBody", frame);
        xml.push_str("</p:sp>");
        self.shapes.push_str(&xml);
    }

    /// A table whose rows are lists of cell paragraphs. Columns take
    /// `column_widths` (inches) and rows share the height evenly.
    pub fn add_table(&mut self, rect: InchRect, column_widths: &[f64], rows: &[Vec<Para>]) {
        let id = self.take_id();
        let row_height = emu(rect.h / rows.len().max(1) as f64);
        let mut xml = String::new();
        let _ = write!(
            xml,
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Table {id}"/><p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr><p:nvPr/></p:nvGraphicFramePr>"#
        );
        write_xfrm(&mut xml, "p:xfrm", rect.into());
        let _ = write!(
            xml,
            r#"<a:graphic><a:graphicData uri="{GRAPHIC_TABLE_URI}"><a:tbl><a:tblPr firstRow="1" bandRow="1"/><a:tblGrid>"#
        );
        for width in column_widths {
            let _ = write!(xml, r#"<a:gridCol w="{}"/>"#, emu(*width));
        }
        xml.push_str("</a:tblGrid>");
        for row in rows {
            let _ = write!(xml, r#"<a:tr h="{}">"#, row_height);
            for cell in row {
                xml.push_str("<a:tc>");
                write_text_body(&mut xml, "a:txBody", &TextFrame::wrapped(vec![cell.clone()]));
                xml.push_str("<a:tcPr/></a:tc>");
            }
            xml.push_str("</a:tr>");
        }
        xml.push_str("</a:tbl></a:graphicData></a:graphic></p:graphicFrame>");
        self.shapes.push_str(&xml);
    }

    /// A chart frame. The chart part is referenced as `rId{n + 2}` for the
    /// n-th chart of the slide; `rId1` is the slide layout.
    pub fn add_chart(&mut self, rect: InchRect, chart: ChartPart) {
        let id = self.take_id();
        let rel_id = format!("rId{}", self.charts.len() + 2);
        let mut xml = String::new();
        let _ = write!(
            xml,
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Chart {id}"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr>"#
        );
        write_xfrm(&mut xml, "p:xfrm", rect.into());
        let _ = write!(
            xml,
            r#"<a:graphic><a:graphicData uri="{GRAPHIC_CHART_URI}"><c:chart xmlns:c="{GRAPHIC_CHART_URI}" r:id="{rel_id}"/></a:graphicData></a:graphic></p:graphicFrame>"#
        );
        self.shapes.push_str(&xml);
        self.charts.push(chart);
    }

    /// The slide part.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(self.shapes.len() + 1024);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#);
        xml.push_str(r#"<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
        xml.push_str(r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#);
        xml.push_str(&self.shapes);
        xml.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
        xml
    }
}

fn write_xfrm(xml: &mut String, tag: &str, rect: Rect) {
    let _ = write!(
        xml,
        r#"<{tag}><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></{tag}>"#,
        rect.x, rect.y, rect.w, rect.h
    );
}

fn write_solid_fill(xml: &mut String, color: &str) {
    let _ = write!(
        xml,
        r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
        hex_color(color)
    );
}

fn write_text_body(xml: &mut String, tag: &str, frame: &TextFrame) {
    let _ = write!(
        xml,
        r#"<{tag}><a:bodyPr wrap="{}" rtlCol="0""#,
        if frame.wrap { "square" } else { "none" }
    );
    let insets = [
        ("lIns", frame.margins.left),
        ("tIns", frame.margins.top),
        ("rIns", frame.margins.right),
        ("bIns", frame.margins.bottom),
    ];
    for (name, inches) in insets {
        if let Some(inches) = inches {
            let _ = write!(xml, r#" {}="{}""#, name, emu(inches));
        }
    }
    if frame.autofit {
        xml.push_str("><a:normAutofit/></a:bodyPr>");
    } else {
        xml.push_str("/>");
    }
    xml.push_str("<a:lstStyle/>");
    for para in &frame.paragraphs {
        write_paragraph(xml, para);
    }
    if frame.paragraphs.is_empty() {
        xml.push_str("<a:p/>");
    }
    let _ = write!(xml, "</{tag}>");
}

fn write_paragraph(xml: &mut String, para: &Para) {
    xml.push_str("<a:p>");
    if para.level > 0 || para.align.is_some() {
        xml.push_str("<a:pPr");
        if para.level > 0 {
            let _ = write!(xml, r#" lvl="{}""#, para.level.min(8));
        }
        if let Some(align) = para.align {
            let _ = write!(xml, r#" algn="{}""#, align);
        }
        xml.push_str("/>");
    }
    for run in &para.runs {
        // Line feeds become soft breaks within the paragraph.
        for (i, line) in run.text.split('\n').enumerate() {
            if i > 0 {
                xml.push_str("<a:br>");
                write_run_properties(xml, &run.format);
                xml.push_str("</a:br>");
            }
            if line.is_empty() {
                continue;
            }
            xml.push_str("<a:r>");
            write_run_properties(xml, &run.format);
            let _ = write!(xml, "<a:t>{}</a:t></a:r>", escape(line));
        }
    }
    xml.push_str("</a:p>");
}

fn write_run_properties(xml: &mut String, format: &RunFormat) {
    xml.push_str(r#"<a:rPr lang="en-US""#);
    if let Some(size) = format.size {
        let _ = write!(xml, r#" sz="{}""#, (size * 100.0).round() as i64);
    }
    if let Some(bold) = format.bold {
        let _ = write!(xml, r#" b="{}""#, u8::from(bold));
    }
    if let Some(italic) = format.italic {
        let _ = write!(xml, r#" i="{}""#, u8::from(italic));
    }
    if let Some(underline) = format.underline {
        let _ = write!(xml, r#" u="{}""#, if underline { "sng" } else { "none" });
    }
    xml.push_str(r#" dirty="0">"#);
    if let Some(color) = &format.color {
        write_solid_fill(xml, color);
    }
    if let Some(font) = &format.font {
        let _ = write!(xml, r#"<a:latin typeface="{}"/>"#, escape(font.as_str()));
    }
    xml.push_str("</a:rPr>");
}
