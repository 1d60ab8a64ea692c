//! In-memory PPTX and XLSX fixtures for tests.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const SLIDE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const SHEET_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub const CHART_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
pub const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub const PACKAGE_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/package";

/// Write named entries into a ZIP archive.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        zip.start_file(*name, FileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn rels_xml(rels: &[(String, String, String)]) -> String {
    let body: String = rels
        .iter()
        .map(|(id, ty, target)| {
            format!(r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#, id, ty, target)
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        body
    )
}

/// A `p:sp` text shape with one run, optionally a placeholder.
pub fn text_shape(placeholder: Option<&str>, text: &str) -> String {
    let ph = placeholder
        .map(|ty| format!(r#"<p:ph type="{}"/>"#, ty))
        .unwrap_or_default();
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Text"/><p:cNvSpPr/><p:nvPr>{}</p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        ph, text
    )
}

/// A graphic frame referencing a chart part through `rid`.
pub fn chart_frame(rid: &str) -> String {
    format!(
        r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="4" name="Chart"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" r:id="{}"/></a:graphicData></a:graphic></p:graphicFrame>"#,
        rid
    )
}

/// A picture shape whose blip references `rid`.
pub fn picture(rid: &str) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="5" name="Picture"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/><a:stretch/></p:blipFill><p:spPr/></p:pic>"#,
        rid
    )
}

/// Builds a minimal PPTX: presentation part, slides, relationships and
/// any extra parts a test needs.
#[derive(Default)]
pub struct PptxBuilder {
    slides: Vec<String>,
    slide_rels: Vec<Vec<(String, String, String)>>,
    extra_rels: Vec<(String, Vec<(String, String, String)>)>,
    parts: Vec<(String, Vec<u8>)>,
    order: Option<Vec<usize>>,
    id_list: bool,
}

impl PptxBuilder {
    pub fn new() -> Self {
        Self {
            id_list: true,
            ..Default::default()
        }
    }

    /// Add a slide whose shape tree contains `shapes`.
    pub fn slide(mut self, shapes: &str) -> Self {
        self.slides.push(shapes.to_string());
        self.slide_rels.push(Vec::new());
        self
    }

    /// Add a relationship to slide `number` (1-based).
    pub fn slide_rel(mut self, number: usize, id: &str, ty: &str, target: &str) -> Self {
        self.slide_rels[number - 1].push((id.to_string(), ty.to_string(), target.to_string()));
        self
    }

    /// Relationships for an arbitrary part.
    pub fn rels(mut self, part: &str, rels: &[(&str, &str, &str)]) -> Self {
        let rels = rels
            .iter()
            .map(|(id, ty, target)| (id.to_string(), ty.to_string(), target.to_string()))
            .collect();
        self.extra_rels.push((part.to_string(), rels));
        self
    }

    /// Add a raw part.
    pub fn part(mut self, path: &str, data: &[u8]) -> Self {
        self.parts.push((path.to_string(), data.to_vec()));
        self
    }

    /// Presentation order as 1-based slide file numbers.
    pub fn order(mut self, order: &[usize]) -> Self {
        self.order = Some(order.to_vec());
        self
    }

    /// Leave `sldIdLst` out of presentation.xml.
    pub fn without_id_list(mut self) -> Self {
        self.id_list = false;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let order = self
            .order
            .clone()
            .unwrap_or_else(|| (1..=self.slides.len()).collect());

        let id_list = if self.id_list {
            let ids: String = order
                .iter()
                .enumerate()
                .map(|(i, n)| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, 100 + n))
                .collect();
            format!("<p:sldIdLst>{}</p:sldIdLst>", ids)
        } else {
            String::new()
        };

        let presentation = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="{}">{}<p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#,
            REL_NS, id_list
        );
        let presentation_rels: Vec<_> = (1..=self.slides.len())
            .map(|n| {
                (
                    format!("rId{}", 100 + n),
                    SLIDE_REL.to_string(),
                    format!("slides/slide{}.xml", n),
                )
            })
            .collect();

        let mut entries: Vec<(String, Vec<u8>)> = vec![
            ("ppt/presentation.xml".to_string(), presentation.into_bytes()),
            (
                "ppt/_rels/presentation.xml.rels".to_string(),
                rels_xml(&presentation_rels).into_bytes(),
            ),
        ];

        for (idx, (shapes, rels)) in self.slides.iter().zip(&self.slide_rels).enumerate() {
            let n = idx + 1;
            let slide = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="{}"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
                REL_NS, shapes
            );
            entries.push((format!("ppt/slides/slide{}.xml", n), slide.into_bytes()));
            if !rels.is_empty() {
                entries.push((
                    format!("ppt/slides/_rels/slide{}.xml.rels", n),
                    rels_xml(rels).into_bytes(),
                ));
            }
        }

        for (part, rels) in &self.extra_rels {
            entries.push((
                crate::package::rels_path_for(part),
                rels_xml(rels).into_bytes(),
            ));
        }
        entries.extend(self.parts);

        let borrowed: Vec<(&str, &[u8])> = entries
            .iter()
            .map(|(name, data)| (name.as_str(), data.as_slice()))
            .collect();
        zip_bytes(&borrowed)
    }
}

/// An XLSX with one sheet and the given shared strings.
pub fn xlsx_bytes(shared: &[&str], sheet_xml: &str) -> Vec<u8> {
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="{}"><bookViews><workbookView activeTab="0"/></bookViews><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        REL_NS
    );
    let workbook_rels = rels_xml(&[(
        "rId1".to_string(),
        SHEET_REL.to_string(),
        "worksheets/sheet1.xml".to_string(),
    )]);
    let strings: String = shared
        .iter()
        .map(|s| format!("<si><t>{}</t></si>", s))
        .collect();
    let sst = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">{}</sst>"#,
        strings
    );

    zip_bytes(&[
        ("xl/workbook.xml", workbook.as_bytes()),
        ("xl/_rels/workbook.xml.rels", workbook_rels.as_bytes()),
        ("xl/sharedStrings.xml", sst.as_bytes()),
        ("xl/worksheets/sheet1.xml", sheet_xml.as_bytes()),
    ])
}
