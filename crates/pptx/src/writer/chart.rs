//! Chart parts (`c:chartSpace`) and the workbook embedded behind each chart.
//!
//! The workbook holds the chart data on `Sheet1`: series names across row 1
//! from column B, categories down column A from row 2, values below each
//! series name. Chart caches reference the same cells.

use super::drawing::hex_color;
use crate::package::PackageWriter;
use deck_core::deck::{BarDefinition, LineDefinition, PieDefinition, SeriesDefinition};
use deck_core::Result;
use quick_xml::escape::escape;
use std::fmt::Write;

const CHART_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
const DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CATEGORY_AXIS_ID: u32 = 50_010_001;
const VALUE_AXIS_ID: u32 = 50_010_002;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Plot {
    Pie { percent_labels: bool, show_labels: bool },
    Bar { horizontal: bool, stacked: bool },
    Line { markers: bool, smooth: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SeriesData {
    pub name: String,
    pub values: Vec<Option<f64>>,
    pub color: Option<String>,
    /// Per-point fills, pie slices only.
    pub point_colors: Vec<Option<String>>,
}

impl From<&SeriesDefinition> for SeriesData {
    fn from(series: &SeriesDefinition) -> Self {
        Self {
            name: series.name.clone(),
            values: series.data.clone(),
            color: series.color.clone(),
            point_colors: Vec::new(),
        }
    }
}

/// Everything needed to write one chart part and its workbook.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChartPart {
    pub plot: Plot,
    pub title: Option<String>,
    /// OOXML legend position code.
    pub legend: &'static str,
    pub categories: Vec<String>,
    pub series: Vec<SeriesData>,
}

/// OOXML legend position for `right`, `left`, `top`, `bottom` or `corner`.
fn legend_code(position: &str) -> &'static str {
    match position {
        "left" => "l",
        "top" => "t",
        "bottom" => "b",
        "corner" => "tr",
        _ => "r",
    }
}

impl ChartPart {
    pub fn pie(pie: &PieDefinition) -> Self {
        Self {
            plot: Plot::Pie {
                percent_labels: pie.labels.as_deref() == Some("percent"),
                show_labels: pie.show_labels,
            },
            title: pie.frame.title.clone().filter(|t| !t.is_empty()),
            legend: legend_code(&pie.frame.legend),
            categories: pie.data.iter().map(|slice| slice.label.clone()).collect(),
            series: vec![SeriesData {
                name: pie.frame.title.clone().unwrap_or_default(),
                values: pie.data.iter().map(|slice| Some(slice.value)).collect(),
                color: None,
                point_colors: pie.data.iter().map(|slice| slice.color.clone()).collect(),
            }],
        }
    }

    pub fn bar(bar: &BarDefinition) -> Self {
        Self {
            plot: Plot::Bar {
                horizontal: bar.options.is_horizontal(),
                stacked: bar.options.stacked,
            },
            title: bar.frame.title.clone().filter(|t| !t.is_empty()),
            legend: legend_code(&bar.frame.legend),
            categories: bar.x.categories.clone(),
            series: bar.series.iter().map(SeriesData::from).collect(),
        }
    }

    pub fn line(line: &LineDefinition) -> Self {
        Self {
            plot: Plot::Line {
                markers: line.options.markers,
                smooth: line.options.smooth,
            },
            title: line.frame.title.clone().filter(|t| !t.is_empty()),
            legend: legend_code(&line.frame.legend),
            categories: line.x.categories.clone(),
            series: line.series.iter().map(SeriesData::from).collect(),
        }
    }

    /// The chart part. Its workbook is relationship `rId1`.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(4096);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        let _ = write!(
            xml,
            r#"<c:chartSpace xmlns:c="{CHART_NS}" xmlns:a="{DRAWING_NS}" xmlns:r="{REL_NS}"><c:date1904 val="0"/><c:roundedCorners val="0"/><c:chart>"#
        );

        match &self.title {
            Some(title) => {
                let _ = write!(
                    xml,
                    r#"<c:title><c:tx><c:rich><a:bodyPr/><a:lstStyle/><a:p><a:r><a:t>{}</a:t></a:r></a:p></c:rich></c:tx><c:overlay val="0"/></c:title><c:autoTitleDeleted val="0"/>"#,
                    escape(title.as_str())
                );
            }
            None => xml.push_str(r#"<c:autoTitleDeleted val="1"/>"#),
        }

        xml.push_str("<c:plotArea><c:layout/>");
        match self.plot {
            Plot::Pie { .. } => {
                xml.push_str(r#"<c:pieChart><c:varyColors val="1"/>"#);
                self.write_series(&mut xml);
                xml.push_str(r#"<c:firstSliceAng val="0"/></c:pieChart>"#);
            }
            Plot::Bar {
                horizontal,
                stacked,
            } => {
                let _ = write!(
                    xml,
                    r#"<c:barChart><c:barDir val="{}"/><c:grouping val="{}"/><c:varyColors val="0"/>"#,
                    if horizontal { "bar" } else { "col" },
                    if stacked { "stacked" } else { "clustered" }
                );
                self.write_series(&mut xml);
                xml.push_str(r#"<c:gapWidth val="150"/>"#);
                if stacked {
                    xml.push_str(r#"<c:overlap val="100"/>"#);
                }
                write_axis_ids(&mut xml);
                xml.push_str("</c:barChart>");
                write_axes(&mut xml, horizontal);
            }
            Plot::Line { markers, .. } => {
                xml.push_str(r#"<c:lineChart><c:grouping val="standard"/><c:varyColors val="0"/>"#);
                self.write_series(&mut xml);
                let _ = write!(xml, r#"<c:marker val="{}"/>"#, u8::from(markers));
                write_axis_ids(&mut xml);
                xml.push_str("</c:lineChart>");
                write_axes(&mut xml, false);
            }
        }
        xml.push_str("</c:plotArea>");

        let _ = write!(
            xml,
            r#"<c:legend><c:legendPos val="{}"/><c:overlay val="0"/></c:legend><c:plotVisOnly val="1"/><c:dispBlanksAs val="gap"/></c:chart>"#,
            self.legend
        );
        xml.push_str(r#"<c:externalData r:id="rId1"><c:autoUpdate val="0"/></c:externalData></c:chartSpace>"#);
        xml
    }

    fn write_series(&self, xml: &mut String) {
        for (i, series) in self.series.iter().enumerate() {
            let column = column_letter(i + 1);
            let _ = write!(
                xml,
                r#"<c:ser><c:idx val="{i}"/><c:order val="{i}"/><c:tx><c:strRef><c:f>Sheet1!${column}$1</c:f><c:strCache><c:ptCount val="1"/><c:pt idx="0"><c:v>{}</c:v></c:pt></c:strCache></c:strRef></c:tx>"#,
                escape(series.name.as_str())
            );

            match self.plot {
                Plot::Pie {
                    percent_labels,
                    show_labels,
                } => {
                    for (idx, color) in series.point_colors.iter().enumerate() {
                        if let Some(color) = color {
                            let _ = write!(
                                xml,
                                r#"<c:dPt><c:idx val="{idx}"/><c:bubble3D val="0"/><c:spPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill></c:spPr></c:dPt>"#,
                                hex_color(color)
                            );
                        }
                    }
                    if show_labels {
                        let (format, percent, value) = if percent_labels {
                            (r#"<c:numFmt formatCode="0%" sourceLinked="0"/>"#, 1, 0)
                        } else {
                            ("", 0, 1)
                        };
                        let _ = write!(
                            xml,
                            r#"<c:dLbls>{format}<c:showLegendKey val="0"/><c:showVal val="{value}"/><c:showCatName val="0"/><c:showSerName val="0"/><c:showPercent val="{percent}"/><c:showBubbleSize val="0"/></c:dLbls>"#
                        );
                    }
                }
                Plot::Bar { .. } => {
                    if let Some(color) = &series.color {
                        let _ = write!(
                            xml,
                            r#"<c:spPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill></c:spPr>"#,
                            hex_color(color)
                        );
                    }
                    xml.push_str(r#"<c:invertIfNegative val="0"/>"#);
                }
                Plot::Line { markers, .. } => {
                    if let Some(color) = &series.color {
                        let _ = write!(
                            xml,
                            r#"<c:spPr><a:ln w="25400"><a:solidFill><a:srgbClr val="{}"/></a:solidFill></a:ln></c:spPr>"#,
                            hex_color(color)
                        );
                    }
                    match (&series.color, markers) {
                        (_, false) => xml.push_str(r#"<c:marker><c:symbol val="none"/></c:marker>"#),
                        (Some(color), true) => {
                            let rgb = hex_color(color);
                            let _ = write!(
                                xml,
                                r#"<c:marker><c:symbol val="circle"/><c:size val="5"/><c:spPr><a:solidFill><a:srgbClr val="{rgb}"/></a:solidFill><a:ln><a:solidFill><a:srgbClr val="{rgb}"/></a:solidFill></a:ln></c:spPr></c:marker>"#
                            );
                        }
                        (None, true) => {}
                    }
                }
            }

            self.write_categories(xml);
            write_values(xml, &column, &series.values);

            if let Plot::Line { smooth, .. } = self.plot {
                let _ = write!(xml, r#"<c:smooth val="{}"/>"#, u8::from(smooth));
            }
            xml.push_str("</c:ser>");
        }
    }

    fn write_categories(&self, xml: &mut String) {
        if self.categories.is_empty() {
            return;
        }
        let _ = write!(
            xml,
            r#"<c:cat><c:strRef><c:f>Sheet1!$A$2:$A${}</c:f><c:strCache><c:ptCount val="{}"/>"#,
            self.categories.len() + 1,
            self.categories.len()
        );
        for (idx, category) in self.categories.iter().enumerate() {
            let _ = write!(
                xml,
                r#"<c:pt idx="{idx}"><c:v>{}</c:v></c:pt>"#,
                escape(category.as_str())
            );
        }
        xml.push_str("</c:strCache></c:strRef></c:cat>");
    }

    /// The embedded workbook backing the chart.
    pub fn workbook_bytes(&self) -> Result<Vec<u8>> {
        let mut workbook = PackageWriter::new();
        workbook.add("[Content_Types].xml", WORKBOOK_CONTENT_TYPES.as_bytes())?;
        workbook.add("_rels/.rels", WORKBOOK_ROOT_RELS.as_bytes())?;
        workbook.add("xl/workbook.xml", WORKBOOK_XML.as_bytes())?;
        workbook.add("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes())?;
        workbook.add("xl/styles.xml", WORKBOOK_STYLES.as_bytes())?;
        workbook.add("xl/worksheets/sheet1.xml", self.worksheet_xml().as_bytes())?;
        workbook.finish()
    }

    fn worksheet_xml(&self) -> String {
        let mut xml = String::with_capacity(2048);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#);

        xml.push_str(r#"<row r="1">"#);
        for (i, series) in self.series.iter().enumerate() {
            write_text_cell(&mut xml, &format!("{}1", column_letter(i + 1)), &series.name);
        }
        xml.push_str("</row>");

        let rows = self
            .series
            .iter()
            .map(|s| s.values.len())
            .chain([self.categories.len()])
            .max()
            .unwrap_or(0);
        for r in 0..rows {
            let row_number = r + 2;
            let _ = write!(xml, r#"<row r="{row_number}">"#);
            if let Some(category) = self.categories.get(r) {
                write_text_cell(&mut xml, &format!("A{row_number}"), category);
            }
            for (i, series) in self.series.iter().enumerate() {
                if let Some(Some(value)) = series.values.get(r) {
                    let _ = write!(
                        xml,
                        r#"<c r="{}{row_number}"><v>{value}</v></c>"#,
                        column_letter(i + 1)
                    );
                }
            }
            xml.push_str("</row>");
        }

        xml.push_str("</sheetData></worksheet>");
        xml
    }
}

fn write_values(xml: &mut String, column: &str, values: &[Option<f64>]) {
    let _ = write!(
        xml,
        r#"<c:val><c:numRef><c:f>Sheet1!${column}$2:${column}${}</c:f><c:numCache><c:formatCode>General</c:formatCode><c:ptCount val="{}"/>"#,
        values.len() + 1,
        values.len()
    );
    for (idx, value) in values.iter().enumerate() {
        if let Some(value) = value {
            let _ = write!(xml, r#"<c:pt idx="{idx}"><c:v>{value}</c:v></c:pt>"#);
        }
    }
    xml.push_str("</c:numCache></c:numRef></c:val>");
}

fn write_axis_ids(xml: &mut String) {
    let _ = write!(
        xml,
        r#"<c:axId val="{CATEGORY_AXIS_ID}"/><c:axId val="{VALUE_AXIS_ID}"/>"#
    );
}

/// Category and value axes; horizontal bars put categories on the left.
fn write_axes(xml: &mut String, horizontal: bool) {
    let (category_pos, value_pos) = if horizontal { ("l", "b") } else { ("b", "l") };
    let _ = write!(
        xml,
        r#"<c:catAx><c:axId val="{CATEGORY_AXIS_ID}"/><c:scaling><c:orientation val="minMax"/></c:scaling><c:delete val="0"/><c:axPos val="{category_pos}"/><c:numFmt formatCode="General" sourceLinked="1"/><c:majorTickMark val="out"/><c:minorTickMark val="none"/><c:tickLblPos val="nextTo"/><c:crossAx val="{VALUE_AXIS_ID}"/><c:crosses val="autoZero"/><c:auto val="1"/><c:lblAlgn val="ctr"/><c:lblOffset val="100"/><c:noMultiLvlLbl val="0"/></c:catAx>"#
    );
    let _ = write!(
        xml,
        r#"<c:valAx><c:axId val="{VALUE_AXIS_ID}"/><c:scaling><c:orientation val="minMax"/></c:scaling><c:delete val="0"/><c:axPos val="{value_pos}"/><c:majorGridlines/><c:numFmt formatCode="General" sourceLinked="1"/><c:majorTickMark val="out"/><c:minorTickMark val="none"/><c:tickLblPos val="nextTo"/><c:crossAx val="{CATEGORY_AXIS_ID}"/><c:crosses val="autoZero"/><c:crossBetween val="between"/></c:valAx>"#
    );
}

fn write_text_cell(xml: &mut String, reference: &str, text: &str) {
    let _ = write!(
        xml,
        r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#,
        escape(text)
    );
}

/// Spreadsheet column name of a zero-based index: 0 is `A`, 26 is `AA`.
pub(crate) fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.iter().rev().map(|&b| b as char).collect()
}

const WORKBOOK_CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const WORKBOOK_ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><bookViews><workbookView activeTab="0"/></bookViews><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const WORKBOOK_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border/></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs></styleSheet>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::parse_chart;
    use crate::workbook::read_active_sheet;
    use crate::xml::XmlElement;
    use deck_core::CellValue;

    fn revenue_bars(stacked: bool, horizontal: bool) -> ChartPart {
        let bar: BarDefinition = serde_json::from_value(serde_json::json!({
            "title": "Revenue",
            "x": {"categories": ["Q1", "Q2", "Q3"]},
            "series": [
                {"name": "2024", "data": [10, 12.5, null], "color": "#4FC3F7"},
                {"name": "2025", "data": [11, 14, 16]}
            ],
            "options": {
                "stacked": stacked,
                "orientation": if horizontal { "horizontal" } else { "vertical" }
            }
        }))
        .unwrap();
        ChartPart::bar(&bar)
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(1), "B");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn test_bar_chart_reads_back() {
        let root = XmlElement::parse(&revenue_bars(false, false).to_xml()).unwrap();
        let chart = parse_chart(&root);

        assert_eq!(chart.title.as_deref(), Some("Revenue"));
        assert_eq!(chart.chart_type.as_deref(), Some("COLUMN_CLUSTERED"));
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].name.as_deref(), Some("2024"));
        assert_eq!(chart.series[0].points.len(), 3);
        assert_eq!(chart.series[0].points[1].value, Some(12.5));
        assert_eq!(chart.series[0].points[2].category.as_deref(), Some("Q3"));
        assert_eq!(chart.series[0].points[2].value, None);
        assert_eq!(root.find("externalData").and_then(|e| e.ns_attr("id")), Some("rId1"));
    }

    #[test]
    fn test_bar_orientation_and_stacking() {
        let stacked = XmlElement::parse(&revenue_bars(true, true).to_xml()).unwrap();
        assert_eq!(parse_chart(&stacked).chart_type.as_deref(), Some("BAR_STACKED"));
        assert!(stacked.find("overlap").is_some());

        let columns = XmlElement::parse(&revenue_bars(true, false).to_xml()).unwrap();
        assert_eq!(parse_chart(&columns).chart_type.as_deref(), Some("COLUMN_STACKED"));
    }

    #[test]
    fn test_line_markers() {
        let line = |markers: bool| {
            let definition: LineDefinition = serde_json::from_value(serde_json::json!({
                "x": {"categories": ["Jan", "Feb"]},
                "series": [{"name": "Visits", "data": [3, 4], "color": "#81C784"}],
                "options": {"markers": markers, "smooth": true}
            }))
            .unwrap();
            XmlElement::parse(&ChartPart::line(&definition).to_xml()).unwrap()
        };

        let with = line(true);
        assert_eq!(parse_chart(&with).chart_type.as_deref(), Some("LINE_MARKERS"));
        assert_eq!(with.find("smooth").and_then(|s| s.attr("val")), Some("1"));
        assert_eq!(parse_chart(&line(false)).chart_type.as_deref(), Some("LINE"));
    }

    #[test]
    fn test_pie_slices() {
        let pie: PieDefinition = serde_json::from_value(serde_json::json!({
            "title": "Channel mix",
            "data": [
                {"label": "Search", "value": 45, "color": "#0EA5E9"},
                {"label": "Social", "value": 30}
            ],
            "showLabels": true,
            "labels": "percent",
            "legend": "bottom"
        }))
        .unwrap();
        let root = XmlElement::parse(&ChartPart::pie(&pie).to_xml()).unwrap();
        let chart = parse_chart(&root);

        assert_eq!(chart.chart_type.as_deref(), Some("PIE"));
        assert_eq!(chart.series[0].name.as_deref(), Some("Channel mix"));
        assert_eq!(chart.series[0].points[0].category.as_deref(), Some("Search"));
        assert_eq!(chart.series[0].points[1].value, Some(30.0));
        assert_eq!(root.find_all("dPt").len(), 1);
        assert_eq!(root.find("showPercent").and_then(|s| s.attr("val")), Some("1"));
        assert_eq!(root.find("legendPos").and_then(|s| s.attr("val")), Some("b"));
    }

    #[test]
    fn test_untitled_chart() {
        let line: LineDefinition = serde_json::from_value(serde_json::json!({"title": ""})).unwrap();
        let root = XmlElement::parse(&ChartPart::line(&line).to_xml()).unwrap();
        assert_eq!(parse_chart(&root).title, None);
        assert_eq!(root.find("autoTitleDeleted").and_then(|a| a.attr("val")), Some("1"));
    }

    #[test]
    fn test_workbook_layout() {
        let bytes = revenue_bars(false, false).workbook_bytes().unwrap();
        let grid = read_active_sheet(&bytes).unwrap();
        let text = |s: &str| Some(CellValue::Text(s.to_string()));
        let number = |n: f64| Some(CellValue::Number(n));

        assert_eq!(
            grid,
            vec![
                vec![None, text("2024"), text("2025")],
                vec![text("Q1"), number(10.0), number(11.0)],
                vec![text("Q2"), number(12.5), number(14.0)],
                vec![text("Q3"), None, number(16.0)],
            ]
        );
    }
}
