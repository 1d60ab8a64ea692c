//! Chart part parsing.
//!
//! Chart data is best-effort: a chart always yields an element, carrying as
//! much of title, series and embedded workbook data as could be read.

use crate::package::Package;
use crate::workbook;
use crate::xml::{is_truthy, XmlElement};
use deck_core::{ChartElement, ChartPoint, ChartSeries};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Read, Seek};

/// Upper bound on points per series cache, the row limit of a worksheet.
pub const MAX_CACHE_POINTS: usize = 1 << 20;

/// Read a chart part and, optionally, its embedded workbook.
pub fn extract_chart<R: Read + Seek>(
    package: &mut Package<R>,
    chart_path: &str,
    include_workbook: bool,
) -> ChartElement {
    let xml = match package.read_string(chart_path) {
        Ok(xml) => xml,
        Err(e) => {
            log::warn!("Chart part unavailable, emitting empty chart: {}", e);
            return ChartElement::default();
        }
    };

    let (mut chart, root) = match XmlElement::parse(&xml) {
        Ok(root) => (parse_chart(&root), Some(root)),
        Err(e) => {
            log::warn!("Chart XML in '{}' is damaged, keeping partial data: {}", chart_path, e);
            (scan_partial(&xml), None)
        }
    };

    if include_workbook {
        match embedded_workbook(package, chart_path, root.as_ref()) {
            Ok(Some(grid)) if !grid.is_empty() => chart.excel_data = Some(grid),
            Ok(_) => {}
            Err(e) => log::debug!("No workbook data for '{}': {}", chart_path, e),
        }
    }

    chart
}

fn embedded_workbook<R: Read + Seek>(
    package: &mut Package<R>,
    chart_path: &str,
    root: Option<&XmlElement>,
) -> deck_core::Result<Option<workbook::Grid>> {
    let rels = package.relationships(chart_path)?;

    // Prefer the relationship named by externalData, else any embedded package.
    let target = root
        .and_then(|r| r.child("externalData"))
        .and_then(|ext| ext.ns_attr("id"))
        .and_then(|id| rels.get(id))
        .filter(|rel| !rel.external)
        .or_else(|| rels.of_type("package").next())
        .map(|rel| rel.target.clone());

    let Some(target) = target else {
        return Ok(None);
    };

    let bytes = package.read_bytes(&target)?;
    workbook::read_active_sheet(&bytes).map(Some)
}

/// Extract title, chart type and series from a parsed `c:chartSpace`.
pub fn parse_chart(root: &XmlElement) -> ChartElement {
    let Some(chart) = root.child("chart") else {
        return ChartElement::default();
    };

    let plot_area = chart.child("plotArea");
    let plots: Vec<&XmlElement> = plot_area
        .map(|pa| pa.elements().filter(|e| e.name.ends_with("Chart")).collect())
        .unwrap_or_default();

    let series = plots
        .iter()
        .flat_map(|plot| plot.children_named("ser"))
        .map(parse_series)
        .filter(|s| s.name.is_some() || !s.points.is_empty())
        .collect();

    ChartElement {
        title: chart.child("title").map(title_text),
        chart_type: plots.first().map(|plot| chart_type(plot)),
        series,
        excel_data: None,
    }
}

fn title_text(title: &XmlElement) -> String {
    if let Some(rich) = title.path(&["tx", "rich"]) {
        return rich
            .children_named("p")
            .map(XmlElement::text)
            .collect::<Vec<_>>()
            .join("\n");
    }
    title
        .path(&["tx", "strRef", "strCache"])
        .map(|cache| cache_strings(cache).into_iter().flatten().collect())
        .unwrap_or_default()
}

fn parse_series(ser: &XmlElement) -> ChartSeries {
    let name = ser.child("tx").and_then(|tx| match tx.child("v") {
        Some(v) => Some(v.text()),
        None => tx
            .find("strCache")
            .and_then(|cache| cache_strings(cache).into_iter().flatten().next()),
    });

    let categories = ser
        .child("cat")
        .or_else(|| ser.child("xVal"))
        .and_then(data_cache)
        .map(cache_strings)
        .unwrap_or_default();

    let values: Vec<Option<f64>> = ser
        .child("val")
        .or_else(|| ser.child("yVal"))
        .and_then(data_cache)
        .map(|cache| {
            cache_strings(cache)
                .into_iter()
                .map(|v| v.and_then(|s| s.trim().parse().ok()))
                .collect()
        })
        .unwrap_or_default();

    let points: Vec<ChartPoint> = if categories.is_empty() {
        values
            .into_iter()
            .map(|value| ChartPoint {
                category: None,
                value,
            })
            .collect()
    } else {
        categories
            .into_iter()
            .zip(values)
            .map(|(category, value)| ChartPoint { category, value })
            .collect()
    };

    ChartSeries {
        name,
        points: points
            .into_iter()
            .filter(|p| p.category.is_some() || p.value.is_some())
            .collect(),
    }
}

/// The cached data block of a `cat`/`val` reference or literal.
fn data_cache(data: &XmlElement) -> Option<&XmlElement> {
    for source in data.elements() {
        let cache = match source.name.as_str() {
            "strRef" => source.child("strCache"),
            "numRef" => source.child("numCache"),
            "multiLvlStrRef" => source
                .child("multiLvlStrCache")
                .and_then(|c| c.child("lvl")),
            "strLit" | "numLit" => Some(source),
            _ => None,
        };
        if cache.is_some() {
            return cache;
        }
    }
    None
}

/// Point values of a cache, placed by their `idx`.
///
/// Counts and indexes at or past [`MAX_CACHE_POINTS`] are ignored.
fn cache_strings(cache: &XmlElement) -> Vec<Option<String>> {
    let declared = cache
        .child("ptCount")
        .and_then(|c| c.attr("val"))
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0)
        .min(MAX_CACHE_POINTS);

    let mut values: Vec<Option<String>> = vec![None; declared];
    for (position, pt) in cache.children_named("pt").enumerate() {
        let idx = pt
            .attr("idx")
            .and_then(|i| i.parse::<usize>().ok())
            .unwrap_or(position);
        if idx >= MAX_CACHE_POINTS {
            log::debug!("Ignoring chart cache point with index {}", idx);
            continue;
        }
        if values.len() <= idx {
            values.resize(idx + 1, None);
        }
        values[idx] = pt.child("v").map(XmlElement::text);
    }
    values
}

/// Chart type name of a plot element, e.g. `COLUMN_CLUSTERED`.
fn chart_type(plot: &XmlElement) -> String {
    let grouping = plot.child("grouping").and_then(|g| g.attr("val"));
    let stacking = match grouping {
        Some("stacked") => "_STACKED",
        Some("percentStacked") => "_STACKED_100",
        _ => "",
    };

    match plot.name.as_str() {
        "barChart" | "bar3DChart" => {
            let base = match plot.child("barDir").and_then(|d| d.attr("val")) {
                Some("bar") => "BAR",
                _ => "COLUMN",
            };
            let prefix = if plot.name == "bar3DChart" { "THREE_D_" } else { "" };
            let suffix = if stacking.is_empty() { "_CLUSTERED" } else { stacking };
            format!("{}{}{}", prefix, base, suffix)
        }
        "lineChart" => {
            let markers = is_truthy(plot.child("marker").and_then(|m| m.attr("val")))
                && !plot.children_named("ser").any(|ser| {
                    ser.path(&["marker", "symbol"])
                        .and_then(|s| s.attr("val"))
                        == Some("none")
                });
            let base = if markers { "LINE_MARKERS" } else { "LINE" };
            format!("{}{}", base, stacking)
        }
        "line3DChart" => "THREE_D_LINE".to_string(),
        "pieChart" => "PIE".to_string(),
        "pie3DChart" => "THREE_D_PIE".to_string(),
        "ofPieChart" => "PIE_OF_PIE".to_string(),
        "doughnutChart" => "DOUGHNUT".to_string(),
        "areaChart" => format!("AREA{}", stacking),
        "area3DChart" => format!("THREE_D_AREA{}", stacking),
        "scatterChart" => "XY_SCATTER".to_string(),
        "radarChart" => "RADAR".to_string(),
        "bubbleChart" => "BUBBLE".to_string(),
        "stockChart" => "STOCK_HLC".to_string(),
        "surfaceChart" | "surface3DChart" => "SURFACE".to_string(),
        other => other.trim_end_matches("Chart").to_uppercase(),
    }
}

/// Recover what we can from chart XML that fails to parse.
///
/// Streams events until the first error, keeping the chart title and the
/// series names seen so far. Points are dropped since they may be cut short.
/// Only a `title` directly under `chart` counts; axis titles are ignored.
fn scan_partial(xml: &str) -> ChartElement {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut chart = ChartElement::default();
    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut in_title = false;
    let mut in_ser = false;
    let mut in_ser_tx = false;
    let mut in_text = false;
    let mut title = String::new();
    let mut name = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local = e.name().local_name().as_ref().to_vec();
                let parent = open.last().map(Vec::as_slice);
                match local.as_slice() {
                    b"title" if parent == Some(b"chart".as_slice()) && chart.title.is_none() => {
                        in_title = true;
                        title.clear();
                    }
                    b"ser" => {
                        in_ser = true;
                        name.clear();
                    }
                    b"tx" if parent == Some(b"ser".as_slice()) => in_ser_tx = true,
                    b"t" | b"v" => in_text = true,
                    _ => {}
                }
                open.push(local);
            }
            Ok(Event::Text(ref e)) if in_text => {
                let text = e.unescape().unwrap_or_default();
                if in_title {
                    title.push_str(&text);
                } else if in_ser_tx {
                    name.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                open.pop();
                let parent = open.last().map(Vec::as_slice);
                match e.name().local_name().as_ref() {
                    b"title" if in_title => {
                        in_title = false;
                        chart.title = Some(title.clone());
                    }
                    b"tx" if parent == Some(b"ser".as_slice()) => in_ser_tx = false,
                    b"ser" => {
                        in_ser = false;
                        chart.series.push(ChartSeries {
                            name: (!name.is_empty()).then(|| name.clone()),
                            points: Vec::new(),
                        });
                    }
                    b"t" | b"v" => in_text = false,
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::debug!("Partial chart scan stopped: {}", e);
                break;
            }
            _ => {}
        }
    }

    // A series cut off by the error still has a usable name.
    if in_ser && !name.is_empty() {
        chart.series.push(ChartSeries {
            name: Some(name),
            points: Vec::new(),
        });
    }
    if in_title && !title.is_empty() {
        chart.title = Some(title);
    }
    chart.series.retain(|s| s.name.is_some());
    chart
}

#[cfg(test)]
mod tests {
    use super::*;

    const BAR_CHART: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <c:chart>
    <c:title><c:tx><c:rich><a:bodyPr/><a:p><a:r><a:t>Quarterly </a:t></a:r><a:r><a:t>Revenue</a:t></a:r></a:p></c:rich></c:tx></c:title>
    <c:plotArea>
      <c:barChart>
        <c:barDir val="col"/>
        <c:grouping val="clustered"/>
        <c:ser>
          <c:idx val="0"/>
          <c:tx><c:strRef><c:f>Sheet1!$B$1</c:f><c:strCache><c:ptCount val="1"/><c:pt idx="0"><c:v>2024</c:v></c:pt></c:strCache></c:strRef></c:tx>
          <c:cat><c:strRef><c:f>Sheet1!$A$2:$A$3</c:f><c:strCache><c:ptCount val="2"/><c:pt idx="0"><c:v>Q1</c:v></c:pt><c:pt idx="1"><c:v>Q2</c:v></c:pt></c:strCache></c:strRef></c:cat>
          <c:val><c:numRef><c:f>Sheet1!$B$2:$B$3</c:f><c:numCache><c:formatCode>General</c:formatCode><c:ptCount val="2"/><c:pt idx="0"><c:v>100</c:v></c:pt><c:pt idx="1"><c:v>150.5</c:v></c:pt></c:numCache></c:numRef></c:val>
        </c:ser>
        <c:ser>
          <c:idx val="1"/>
          <c:tx><c:v>2025</c:v></c:tx>
          <c:cat><c:strRef><c:strCache><c:ptCount val="2"/><c:pt idx="0"><c:v>Q1</c:v></c:pt><c:pt idx="1"><c:v>Q2</c:v></c:pt></c:strCache></c:strRef></c:cat>
          <c:val><c:numRef><c:numCache><c:ptCount val="2"/><c:pt idx="1"><c:v>80</c:v></c:pt></c:numCache></c:numRef></c:val>
        </c:ser>
      </c:barChart>
    </c:plotArea>
  </c:chart>
  <c:externalData r:id="rId1"/>
</c:chartSpace>"#;

    fn point(category: &str, value: Option<f64>) -> ChartPoint {
        ChartPoint {
            category: Some(category.to_string()),
            value,
        }
    }

    #[test]
    fn test_parse_bar_chart() {
        let chart = parse_chart(&XmlElement::parse(BAR_CHART).unwrap());

        assert_eq!(chart.title.as_deref(), Some("Quarterly Revenue"));
        assert_eq!(chart.chart_type.as_deref(), Some("COLUMN_CLUSTERED"));
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].name.as_deref(), Some("2024"));
        assert_eq!(
            chart.series[0].points,
            vec![point("Q1", Some(100.0)), point("Q2", Some(150.5))]
        );
        // Missing point 0 keeps its category with no value.
        assert_eq!(chart.series[1].name.as_deref(), Some("2025"));
        assert_eq!(
            chart.series[1].points,
            vec![point("Q1", None), point("Q2", Some(80.0))]
        );
    }

    #[test]
    fn test_chart_types() {
        let cases = [
            (r#"<c:barChart xmlns:c="c"><c:barDir val="bar"/><c:grouping val="stacked"/></c:barChart>"#, "BAR_STACKED"),
            (r#"<c:barChart xmlns:c="c"><c:barDir val="col"/><c:grouping val="percentStacked"/></c:barChart>"#, "COLUMN_STACKED_100"),
            (r#"<c:lineChart xmlns:c="c"><c:grouping val="standard"/><c:marker val="1"/></c:lineChart>"#, "LINE_MARKERS"),
            (r#"<c:lineChart xmlns:c="c"><c:grouping val="standard"/></c:lineChart>"#, "LINE"),
            (r#"<c:pieChart xmlns:c="c"/>"#, "PIE"),
            (r#"<c:doughnutChart xmlns:c="c"/>"#, "DOUGHNUT"),
            (r#"<c:areaChart xmlns:c="c"><c:grouping val="stacked"/></c:areaChart>"#, "AREA_STACKED"),
            (r#"<c:scatterChart xmlns:c="c"/>"#, "XY_SCATTER"),
        ];
        for (xml, expected) in cases {
            let plot = XmlElement::parse(xml).unwrap();
            assert_eq!(chart_type(&plot), expected, "for {}", xml);
        }
    }

    #[test]
    fn test_scatter_uses_x_and_y_values() {
        let xml = r#"<c:chartSpace xmlns:c="c"><c:chart><c:plotArea><c:scatterChart>
  <c:ser>
    <c:xVal><c:numRef><c:numCache><c:pt idx="0"><c:v>1.5</c:v></c:pt></c:numCache></c:numRef></c:xVal>
    <c:yVal><c:numRef><c:numCache><c:pt idx="0"><c:v>3</c:v></c:pt></c:numCache></c:numRef></c:yVal>
  </c:ser>
</c:scatterChart></c:plotArea></c:chart></c:chartSpace>"#;
        let chart = parse_chart(&XmlElement::parse(xml).unwrap());
        assert_eq!(chart.series[0].name, None);
        assert_eq!(chart.series[0].points, vec![point("1.5", Some(3.0))]);
    }

    #[test]
    fn test_series_without_categories_keeps_values() {
        let xml = r#"<c:chartSpace xmlns:c="c"><c:chart><c:plotArea><c:pieChart>
  <c:ser><c:tx><c:v>Share</c:v></c:tx>
    <c:val><c:numLit><c:pt idx="0"><c:v>0.25</c:v></c:pt><c:pt idx="1"><c:v>0.75</c:v></c:pt></c:numLit></c:val>
  </c:ser>
</c:pieChart></c:plotArea></c:chart></c:chartSpace>"#;
        let chart = parse_chart(&XmlElement::parse(xml).unwrap());
        let values: Vec<_> = chart.series[0].points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![Some(0.25), Some(0.75)]);
        assert!(chart.series[0].points.iter().all(|p| p.category.is_none()));
    }

    #[test]
    fn test_chart_without_title() {
        let xml = r#"<c:chartSpace xmlns:c="c"><c:chart><c:plotArea><c:pieChart/></c:plotArea></c:chart></c:chartSpace>"#;
        let chart = parse_chart(&XmlElement::parse(xml).unwrap());
        assert_eq!(chart.title, None);
        assert_eq!(chart.chart_type.as_deref(), Some("PIE"));
        assert!(chart.series.is_empty());
    }

    #[test]
    fn test_damaged_chart_keeps_title_and_series_names() {
        let cut = &BAR_CHART[..BAR_CHART.find("<c:idx val=\"1\"/>").unwrap()];
        let damaged = format!("{}<c:tx><c:v>2025</c:v></c:tx></c:broken></c:ser>", cut);

        assert!(XmlElement::parse(&damaged).is_err());
        let chart = scan_partial(&damaged);

        assert_eq!(chart.title.as_deref(), Some("Quarterly Revenue"));
        let names: Vec<_> = chart.series.iter().map(|s| s.name.as_deref()).collect();
        assert_eq!(names, vec![Some("2024"), Some("2025")]);
        assert!(chart.series.iter().all(|s| s.points.is_empty()));
    }

    #[test]
    fn test_damaged_chart_ignores_axis_titles() {
        let damaged = r#"<c:chartSpace xmlns:c="c" xmlns:a="a"><c:chart>
<c:title><c:tx><c:rich><a:p><a:r><a:t>Revenue</a:t></a:r></a:p></c:rich></c:tx></c:title>
<c:plotArea><c:barChart><c:ser><c:idx val="0"/><c:tx><c:v>2024</c:v></c:tx></c:ser></c:barChart>
<c:valAx><c:title><c:tx><c:rich><a:p><a:r><a:t>USD</a:t></a:r></a:p></c:rich></c:tx></c:title></c:valAx>
<c:broken></c:plotArea>"#;

        assert!(XmlElement::parse(damaged).is_err());
        let chart = scan_partial(damaged);
        assert_eq!(chart.title.as_deref(), Some("Revenue"));
        assert_eq!(chart.series.len(), 1);

        let untitled = r#"<c:chartSpace xmlns:c="c" xmlns:a="a"><c:chart><c:plotArea>
<c:catAx><c:title><c:tx><c:rich><a:p><a:r><a:t>Quarter</a:t></a:r></a:p></c:rich></c:tx></c:title></c:catAx>
<c:broken></c:plotArea>"#;
        assert_eq!(scan_partial(untitled).title, None);
    }

    #[test]
    fn test_oversized_cache_index_is_ignored() {
        let xml = r#"<c:numCache xmlns:c="c"><c:ptCount val="2"/>
<c:pt idx="0"><c:v>1</c:v></c:pt>
<c:pt idx="18446744073709551615"><c:v>2</c:v></c:pt>
<c:pt idx="1"><c:v>3</c:v></c:pt></c:numCache>"#;
        let cache = XmlElement::parse(xml).unwrap();
        assert_eq!(
            cache_strings(&cache),
            vec![Some("1".to_string()), Some("3".to_string())]
        );
    }

    #[test]
    fn test_oversized_point_count_is_capped() {
        let xml = r#"<c:strCache xmlns:c="c"><c:ptCount val="4611686018427387904"/>
<c:pt idx="0"><c:v>Q1</c:v></c:pt></c:strCache>"#;
        let cache = XmlElement::parse(xml).unwrap();
        let values = cache_strings(&cache);
        assert_eq!(values.len(), MAX_CACHE_POINTS);
        assert_eq!(values[0].as_deref(), Some("Q1"));
        assert!(values[1..].iter().all(Option::is_none));
    }
}
