//! PPTX analyzer: walks slides in presentation order and collects elements.

use crate::package::{Package, Relationships};
use crate::shapes::{self, SlideContext};
use crate::xml::XmlElement;
use crate::AnalyzeOptions;
use deck_core::{Error, PresentationAnalysis, PresentationFormat, Result, SlideAnalysis};
use std::io::{Cursor, Read, Seek};
use std::path::Path;

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Analyzer for PPTX (Office Open XML) presentations.
#[derive(Debug, Clone, Default)]
pub struct PptxAnalyzer {
    options: AnalyzeOptions,
}

impl PptxAnalyzer {
    /// Create an analyzer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with the given options.
    pub fn with_options(options: AnalyzeOptions) -> Self {
        Self { options }
    }

    /// Analyze a file on disk.
    ///
    /// A missing path is reported as [`Error::FileNotFound`] before anything
    /// is opened.
    pub fn analyze_path(&self, path: &Path) -> Result<PresentationAnalysis> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path)?;
        let format = PresentationFormat::from_magic(&bytes).or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(PresentationFormat::from_extension)
        });
        if format.is_none() {
            return Err(Error::UnsupportedFormat(path.display().to_string()));
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");

        self.analyze_bytes(&bytes, filename)
    }

    /// Analyze an in-memory PPTX.
    pub fn analyze_bytes(&self, bytes: &[u8], file_name: &str) -> Result<PresentationAnalysis> {
        self.analyze(Cursor::new(bytes), file_name)
    }

    /// Analyze a PPTX from a reader.
    pub fn analyze<R: Read + Seek>(&self, reader: R, file_name: &str) -> Result<PresentationAnalysis> {
        let mut package = Package::open(reader)?;
        if !package.has_part(PRESENTATION_PART) {
            return Err(Error::MissingPart(PRESENTATION_PART.to_string()));
        }

        let mut analysis = PresentationAnalysis::new(file_name);

        let slide_order = self.get_slide_order(&mut package)?;
        log::debug!("{}: {} slides", file_name, slide_order.len());

        for (idx, slide_path) in slide_order.iter().enumerate() {
            let slide = self.analyze_slide(&mut package, slide_path, idx + 1);
            analysis.add_slide(slide);
        }

        Ok(analysis)
    }

    /// Get the ordered list of slide paths.
    ///
    /// The slide id list in presentation.xml is authoritative; when it is
    /// absent, slide relationships are ordered by their trailing number.
    fn get_slide_order<R: Read + Seek>(&self, package: &mut Package<R>) -> Result<Vec<String>> {
        let rels = package.relationships(PRESENTATION_PART)?;
        let presentation = package.read_xml(PRESENTATION_PART)?;

        if let Some(id_list) = presentation.child("sldIdLst") {
            let ordered: Vec<String> = id_list
                .children_named("sldId")
                .filter_map(|sld| sld.ns_attr("id"))
                .filter_map(|rid| match rels.get(rid) {
                    Some(rel) => Some(rel.target.clone()),
                    None => {
                        log::warn!("Slide id references unknown relationship {}", rid);
                        None
                    }
                })
                .collect();
            if !ordered.is_empty() {
                return Ok(ordered);
            }
        }

        Ok(slides_by_number(&rels))
    }

    /// Analyze a single slide. A slide that cannot be read yields an empty entry.
    fn analyze_slide<R: Read + Seek>(
        &self,
        package: &mut Package<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> SlideAnalysis {
        let mut slide = SlideAnalysis::new(slide_number);

        let content = match package.read_xml(slide_path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Slide {} unreadable, leaving it empty: {}", slide_number, e);
                return slide;
            }
        };
        let rels = match package.relationships(slide_path) {
            Ok(rels) => rels,
            Err(e) => {
                log::warn!("Slide {} relationships unreadable: {}", slide_number, e);
                Relationships::default()
            }
        };

        if let Some(tree) = content.path(&["cSld", "spTree"]) {
            let mut ctx = SlideContext {
                package: &mut *package,
                rels: &rels,
                options: &self.options,
            };
            slide.elements = shapes::extract_shapes(tree, &mut ctx);
        }

        if self.options.include_notes {
            slide.notes = self.read_notes(package, &rels);
        }

        slide
    }

    /// Speaker notes text from the slide's notes part.
    fn read_notes<R: Read + Seek>(
        &self,
        package: &mut Package<R>,
        rels: &Relationships,
    ) -> Option<String> {
        let notes_path = rels.of_type("notesSlide").next()?.target.clone();
        let notes = match package.read_xml(&notes_path) {
            Ok(notes) => notes,
            Err(e) => {
                log::warn!("Notes part unreadable: {}", e);
                return None;
            }
        };
        notes_text(&notes)
    }
}

/// Text of the body placeholder of a notes slide.
fn notes_text(notes: &XmlElement) -> Option<String> {
    let tree = notes.path(&["cSld", "spTree"])?;
    let body = tree.find_all("sp").into_iter().find(|sp| {
        sp.path(&["nvSpPr", "nvPr", "ph"])
            .and_then(|ph| ph.attr("type"))
            == Some("body")
    })?;

    let text = shapes::extract_text(body)?
        .paragraphs
        .into_iter()
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join("\n");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Slide relationship targets ordered by the number in their id or target.
fn slides_by_number(rels: &Relationships) -> Vec<String> {
    let mut slides: Vec<(String, Option<usize>)> = rels
        .of_type("slide")
        .map(|rel| {
            let order_num = extract_slide_number(&rel.target).or_else(|| extract_slide_number(&rel.id));
            (rel.target.clone(), order_num)
        })
        .collect();

    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    slides.into_iter().map(|(path, _)| path).collect()
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        chart_frame, picture, text_shape, xlsx_bytes, PptxBuilder, CHART_REL, IMAGE_REL,
        PACKAGE_REL,
    };
    use deck_core::{CellValue, Element, TextRole};

    const SIMPLE_CHART: &str = r#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <c:chart>
    <c:title><c:tx><c:rich><a:p><a:r><a:t>Budget</a:t></a:r></a:p></c:rich></c:tx></c:title>
    <c:plotArea><c:pieChart>
      <c:ser>
        <c:tx><c:v>Spend</c:v></c:tx>
        <c:cat><c:strRef><c:strCache><c:pt idx="0"><c:v>Ops</c:v></c:pt><c:pt idx="1"><c:v>R&amp;D</c:v></c:pt></c:strCache></c:strRef></c:cat>
        <c:val><c:numRef><c:numCache><c:pt idx="0"><c:v>40</c:v></c:pt><c:pt idx="1"><c:v>60</c:v></c:pt></c:numCache></c:numRef></c:val>
      </c:ser>
    </c:pieChart></c:plotArea>
  </c:chart>
  <c:externalData r:id="rId1"/>
</c:chartSpace>"#;

    const SHEET: &str = r#"<worksheet><sheetData>
  <row r="1"><c r="B1" t="s"><v>0</v></c></row>
  <row r="2"><c r="A2" t="s"><v>1</v></c><c r="B2"><v>40</v></c></row>
</sheetData></worksheet>"#;

    fn chart(element: &Element) -> &deck_core::ChartElement {
        match element {
            Element::Chart(c) => c,
            other => panic!("expected chart, got {}", other.kind()),
        }
    }

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_one_entry_per_slide() {
        let bytes = PptxBuilder::new()
            .slide(&text_shape(Some("title"), "Kickoff"))
            .slide("")
            .slide(&text_shape(None, "Next steps"))
            .build();

        let analysis = PptxAnalyzer::new().analyze_bytes(&bytes, "deck.pptx").unwrap();

        assert_eq!(analysis.file_name, "deck.pptx");
        assert_eq!(analysis.slide_count, 3);
        let numbers: Vec<_> = analysis.slides.iter().map(|s| s.slide_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(analysis.slides[1].elements.is_empty());

        match &analysis.slides[0].elements[0] {
            Element::Text(text) => {
                assert_eq!(text.role, TextRole::Title);
                assert_eq!(text.paragraphs[0].text, "Kickoff");
            }
            other => panic!("expected text, got {}", other.kind()),
        }
    }

    #[test]
    fn test_slide_order_follows_id_list() {
        let bytes = PptxBuilder::new()
            .slide(&text_shape(None, "first part"))
            .slide(&text_shape(None, "second part"))
            .order(&[2, 1])
            .build();

        let analysis = PptxAnalyzer::new().analyze_bytes(&bytes, "deck.pptx").unwrap();
        let first = match &analysis.slides[0].elements[0] {
            Element::Text(t) => t.paragraphs[0].text.clone(),
            other => panic!("expected text, got {}", other.kind()),
        };
        assert_eq!(first, "second part");
    }

    #[test]
    fn test_slide_order_fallback_without_id_list() {
        let bytes = PptxBuilder::new()
            .slide(&text_shape(None, "one"))
            .slide(&text_shape(None, "two"))
            .without_id_list()
            .build();

        let analysis = PptxAnalyzer::new().analyze_bytes(&bytes, "deck.pptx").unwrap();
        assert_eq!(analysis.slide_count, 2);
        let texts: Vec<_> = analysis
            .elements()
            .filter_map(|e| match e {
                Element::Text(t) => Some(t.paragraphs[0].text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn test_chart_without_workbook_keeps_title() {
        let bytes = PptxBuilder::new()
            .slide(&chart_frame("rId2"))
            .slide_rel(1, "rId2", CHART_REL, "../charts/chart1.xml")
            .part("ppt/charts/chart1.xml", SIMPLE_CHART.as_bytes())
            .build();

        let analysis = PptxAnalyzer::new().analyze_bytes(&bytes, "deck.pptx").unwrap();
        let chart = chart(&analysis.slides[0].elements[0]);

        assert_eq!(chart.title.as_deref(), Some("Budget"));
        assert_eq!(chart.chart_type.as_deref(), Some("PIE"));
        assert_eq!(chart.series[0].points.len(), 2);
        assert_eq!(chart.series[0].points[1].category.as_deref(), Some("R&D"));
        assert!(chart.excel_data.is_none());

        let json = serde_json::to_value(&analysis.slides[0].elements[0]).unwrap();
        assert_eq!(json["kind"], "chart");
        assert_eq!(json["title"], "Budget");
        assert!(json.get("excel_data").is_none());
    }

    #[test]
    fn test_chart_with_embedded_workbook() {
        let workbook = xlsx_bytes(&["Spend", "Ops"], SHEET);
        let bytes = PptxBuilder::new()
            .slide(&chart_frame("rId2"))
            .slide_rel(1, "rId2", CHART_REL, "../charts/chart1.xml")
            .part("ppt/charts/chart1.xml", SIMPLE_CHART.as_bytes())
            .rels(
                "ppt/charts/chart1.xml",
                &[("rId1", PACKAGE_REL, "../embeddings/Microsoft_Excel_Worksheet.xlsx")],
            )
            .part("ppt/embeddings/Microsoft_Excel_Worksheet.xlsx", &workbook)
            .build();

        let analysis = PptxAnalyzer::new().analyze_bytes(&bytes, "deck.pptx").unwrap();
        let chart = chart(&analysis.slides[0].elements[0]);

        assert_eq!(
            chart.excel_data,
            Some(vec![
                vec![None, Some(CellValue::Text("Spend".to_string()))],
                vec![
                    Some(CellValue::Text("Ops".to_string())),
                    Some(CellValue::Number(40.0)),
                ],
            ])
        );
    }

    #[test]
    fn test_workbooks_can_be_skipped() {
        let workbook = xlsx_bytes(&["Spend", "Ops"], SHEET);
        let bytes = PptxBuilder::new()
            .slide(&chart_frame("rId2"))
            .slide_rel(1, "rId2", CHART_REL, "../charts/chart1.xml")
            .part("ppt/charts/chart1.xml", SIMPLE_CHART.as_bytes())
            .rels(
                "ppt/charts/chart1.xml",
                &[("rId1", PACKAGE_REL, "../embeddings/book.xlsx")],
            )
            .part("ppt/embeddings/book.xlsx", &workbook)
            .build();

        let analyzer = PptxAnalyzer::with_options(AnalyzeOptions {
            include_workbooks: false,
            ..Default::default()
        });
        let analysis = analyzer.analyze_bytes(&bytes, "deck.pptx").unwrap();
        assert!(chart(&analysis.slides[0].elements[0]).excel_data.is_none());
    }

    #[test]
    fn test_corrupt_workbook_falls_back_to_chart_cache() {
        let bytes = PptxBuilder::new()
            .slide(&chart_frame("rId2"))
            .slide_rel(1, "rId2", CHART_REL, "../charts/chart1.xml")
            .part("ppt/charts/chart1.xml", SIMPLE_CHART.as_bytes())
            .rels(
                "ppt/charts/chart1.xml",
                &[("rId1", PACKAGE_REL, "../embeddings/book.xlsx")],
            )
            .part("ppt/embeddings/book.xlsx", b"not a zip at all")
            .build();

        let analysis = PptxAnalyzer::new().analyze_bytes(&bytes, "deck.pptx").unwrap();
        let chart = chart(&analysis.slides[0].elements[0]);
        assert_eq!(chart.title.as_deref(), Some("Budget"));
        assert_eq!(chart.series.len(), 1);
        assert!(chart.excel_data.is_none());
    }

    #[test]
    fn test_missing_chart_part_still_emits_chart() {
        let bytes = PptxBuilder::new()
            .slide(&chart_frame("rId2"))
            .slide_rel(1, "rId2", CHART_REL, "../charts/chart9.xml")
            .build();

        let analysis = PptxAnalyzer::new().analyze_bytes(&bytes, "deck.pptx").unwrap();
        assert_eq!(analysis.slides[0].elements.len(), 1);
        assert_eq!(analysis.slides[0].elements[0].kind(), "chart");
    }

    #[test]
    fn test_pictures_and_groups() {
        let group = format!(
            r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="10" name="Group"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}{}</p:grpSp>"#,
            picture("rId3"),
            text_shape(None, "Caption")
        );
        let bytes = PptxBuilder::new()
            .slide(&format!("{}{}", picture("rId3"), group))
            .slide_rel(1, "rId3", IMAGE_REL, "../media/image1.png")
            .part("ppt/media/image1.png", b"\x89PNG")
            .build();

        let analysis = PptxAnalyzer::new().analyze_bytes(&bytes, "deck.pptx").unwrap();
        let elements = &analysis.slides[0].elements;
        assert_eq!(elements.len(), 2);

        match &elements[0] {
            Element::Image(image) => {
                assert_eq!(image.content_type.as_deref(), Some("image/png"));
                assert_eq!(image.target.as_deref(), Some("ppt/media/image1.png"));
            }
            other => panic!("expected image, got {}", other.kind()),
        }
        match &elements[1] {
            Element::Group(group) => {
                let kinds: Vec<_> = group.children.iter().map(Element::kind).collect();
                assert_eq!(kinds, vec!["image", "text"]);
            }
            other => panic!("expected group, got {}", other.kind()),
        }
    }

    #[test]
    fn test_alternate_content_keeps_every_branch_shape() {
        let wrapped = format!(
            r#"<mc:AlternateContent><mc:Choice Requires="p14">{}{}</mc:Choice><mc:Fallback>{}</mc:Fallback></mc:AlternateContent>"#,
            text_shape(None, "First"),
            text_shape(None, "Second"),
            text_shape(None, "Fallback")
        );
        let bytes = PptxBuilder::new()
            .slide(&format!("{}{}", wrapped, text_shape(None, "After")))
            .build();

        let analysis = PptxAnalyzer::new().analyze_bytes(&bytes, "deck.pptx").unwrap();
        let texts: Vec<_> = analysis.slides[0]
            .elements
            .iter()
            .map(|element| match element {
                Element::Text(text) => text.paragraphs[0].text.as_str(),
                other => panic!("expected text, got {}", other.kind()),
            })
            .collect();
        assert_eq!(texts, vec!["First", "Second", "After"]);
    }

    #[test]
    fn test_speaker_notes() {
        let notes = r#"<p:notes xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><p:cSld><p:spTree>
  <p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr></p:sp>
  <p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr>
    <p:txBody><a:p><a:r><a:t>Mention the budget</a:t></a:r></a:p></p:txBody></p:sp>
</p:spTree></p:cSld></p:notes>"#;
        let builder = || {
            PptxBuilder::new()
                .slide(&text_shape(None, "Body"))
                .slide_rel(
                    1,
                    "rId9",
                    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide",
                    "../notesSlides/notesSlide1.xml",
                )
                .part("ppt/notesSlides/notesSlide1.xml", notes.as_bytes())
                .build()
        };

        let analysis = PptxAnalyzer::new().analyze_bytes(&builder(), "deck.pptx").unwrap();
        assert_eq!(analysis.slides[0].notes.as_deref(), Some("Mention the budget"));

        let without = PptxAnalyzer::with_options(AnalyzeOptions {
            include_notes: false,
            ..Default::default()
        })
        .analyze_bytes(&builder(), "deck.pptx")
        .unwrap();
        assert_eq!(without.slides[0].notes, None);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = PptxAnalyzer::new()
            .analyze_path(Path::new("/definitely/not/here/mock-proposal.pptx"))
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
        assert!(err.is_not_found());
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_analyze_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        std::fs::write(&path, PptxBuilder::new().slide("").build()).unwrap();

        let analysis = PptxAnalyzer::new().analyze_path(&path).unwrap();
        assert_eq!(analysis.file_name, "deck.pptx");
        assert_eq!(analysis.slide_count, 1);
    }

    #[test]
    fn test_unsupported_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "plain text").unwrap();

        let err = PptxAnalyzer::new().analyze_path(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_zip_without_presentation_part() {
        let bytes = crate::test_support::zip_bytes(&[("word/document.xml", &b"<w:document/>"[..])]);
        let err = PptxAnalyzer::new().analyze_bytes(&bytes, "doc.docx").unwrap_err();
        assert!(matches!(err, Error::MissingPart(_)));
    }
}
