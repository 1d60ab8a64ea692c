//! Shape extraction from a slide's shape tree.

use crate::chart;
use crate::package::{Package, Relationships};
use crate::xml::{is_truthy, XmlElement};
use crate::AnalyzeOptions;
use deck_core::{
    Alignment, Element, GroupElement, ImageElement, Paragraph, TableCell, TableElement,
    TableStructure, TextElement, TextRole,
};
use std::io::{Read, Seek};

/// Everything shape extraction needs from the enclosing slide.
pub struct SlideContext<'a, R> {
    pub package: &'a mut Package<R>,
    pub rels: &'a Relationships,
    pub options: &'a AnalyzeOptions,
}

/// Extract every supported shape under `tree`, in document order.
///
/// Unsupported shapes (connectors, SmartArt, OLE frames) are skipped.
pub fn extract_shapes<R: Read + Seek>(
    tree: &XmlElement,
    ctx: &mut SlideContext<'_, R>,
) -> Vec<Element> {
    let mut elements = Vec::new();
    for shape in tree.elements() {
        // Newer shape kinds wrapped with a fallback rendition; every shape
        // of the chosen branch counts.
        if shape.name == "AlternateContent" {
            if let Some(branch) = shape.child("Choice").or_else(|| shape.child("Fallback")) {
                elements.extend(extract_shapes(branch, ctx));
            }
            continue;
        }
        match extract_shape(shape, ctx) {
            Some(element) => elements.push(element),
            None => log::trace!("Ignoring '{}' element", shape.name),
        }
    }
    elements
}

fn extract_shape<R: Read + Seek>(
    shape: &XmlElement,
    ctx: &mut SlideContext<'_, R>,
) -> Option<Element> {
    match shape.name.as_str() {
        "graphicFrame" => extract_graphic_frame(shape, ctx),
        "pic" => Some(Element::Image(extract_picture(shape, ctx.rels))),
        "sp" => extract_text(shape).map(Element::Text),
        "grpSp" => Some(Element::Group(GroupElement {
            children: extract_shapes(shape, ctx),
        })),
        _ => None,
    }
}

fn extract_graphic_frame<R: Read + Seek>(
    frame: &XmlElement,
    ctx: &mut SlideContext<'_, R>,
) -> Option<Element> {
    let data = frame.path(&["graphic", "graphicData"])?;

    if let Some(chart_ref) = data.child("chart") {
        let target = chart_ref
            .ns_attr("id")
            .and_then(|id| ctx.rels.get(id))
            .map(|rel| rel.target.clone());
        let chart = match target {
            Some(path) => {
                chart::extract_chart(ctx.package, &path, ctx.options.include_workbooks)
            }
            None => {
                log::warn!("Chart frame without a resolvable chart part");
                Default::default()
            }
        };
        return Some(Element::Chart(chart));
    }

    data.child("tbl")
        .map(|tbl| Element::Table(TableElement {
            structure: extract_table(tbl),
        }))
}

/// Text frame of a `p:sp`; shapes without one are not text shapes.
pub fn extract_text(sp: &XmlElement) -> Option<TextElement> {
    let body = sp.child("txBody")?;
    Some(TextElement {
        role: text_role(sp, body),
        paragraphs: body.children_named("p").map(paragraph).collect(),
    })
}

fn text_role(sp: &XmlElement, body: &XmlElement) -> TextRole {
    if let Some(ph) = sp.path(&["nvSpPr", "nvPr", "ph"]) {
        match ph.attr("type") {
            Some("title") | Some("ctrTitle") => return TextRole::Title,
            Some("subTitle") => return TextRole::Subtitle,
            _ => {}
        }
    }

    // Font size in hundredths of a point on the first paragraph's runs.
    if let Some(first) = body.child("p") {
        for run in first.children_named("r") {
            let size = run
                .child("rPr")
                .and_then(|rpr| rpr.attr("sz"))
                .and_then(|sz| sz.parse::<u32>().ok());
            match size {
                Some(sz) if sz >= 2800 => return TextRole::Title,
                Some(sz) if sz >= 2000 => return TextRole::Heading,
                _ => {}
            }
        }
    }

    TextRole::Body
}

fn paragraph(p: &XmlElement) -> Paragraph {
    let ppr = p.child("pPr");
    Paragraph {
        level: ppr
            .and_then(|ppr| ppr.attr("lvl"))
            .and_then(|lvl| lvl.parse().ok())
            .unwrap_or(0),
        text: paragraph_text(p),
        alignment: ppr
            .and_then(|ppr| ppr.attr("algn"))
            .and_then(Alignment::from_ooxml),
    }
}

/// Text of a paragraph, with soft line breaks as `\n`.
fn paragraph_text(p: &XmlElement) -> String {
    let mut text = String::new();
    for child in p.elements() {
        match child.name.as_str() {
            "r" | "fld" => {
                if let Some(t) = child.child("t") {
                    text.push_str(&t.text());
                }
            }
            "br" => text.push('\n'),
            _ => {}
        }
    }
    text
}

fn extract_table(tbl: &XmlElement) -> TableStructure {
    let rows: Vec<&XmlElement> = tbl.children_named("tr").collect();
    let grid_cols = tbl
        .child("tblGrid")
        .map(|grid| grid.children_named("gridCol").count())
        .unwrap_or(0);

    let cells: Vec<Vec<TableCell>> = rows
        .iter()
        .enumerate()
        .map(|(r, row)| {
            row.children_named("tc")
                .enumerate()
                .map(|(c, tc)| table_cell(r, c, tc))
                .collect()
        })
        .collect();

    let widest_row = cells.iter().map(Vec::len).max().unwrap_or(0);

    TableStructure {
        rows: rows.len(),
        cols: if grid_cols > 0 { grid_cols } else { widest_row },
        cells,
    }
}

fn table_cell(r: usize, c: usize, tc: &XmlElement) -> TableCell {
    let span = |name: &str| {
        tc.attr(name)
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1)
    };

    TableCell {
        r,
        c,
        text: tc
            .child("txBody")
            .map(|body| {
                body.children_named("p")
                    .map(paragraph_text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default(),
        merge_origin: span("gridSpan") > 1 || span("rowSpan") > 1,
        is_spanned: is_truthy(tc.attr("hMerge")) || is_truthy(tc.attr("vMerge")),
    }
}

fn extract_picture(pic: &XmlElement, rels: &Relationships) -> ImageElement {
    let target = pic
        .path(&["blipFill", "blip"])
        .and_then(|blip| blip.ns_attr("embed"))
        .and_then(|id| rels.get(id))
        .map(|rel| rel.target.clone());

    ImageElement {
        content_type: target.as_deref().and_then(guess_mime_type),
        target,
    }
}

/// Content type of a media part, from its extension.
fn guess_mime_type(path: &str) -> Option<String> {
    let ext = path.rsplit_once('.')?.1.to_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        "wdp" => "image/vnd.ms-photo",
        _ => return None,
    };
    Some(mime.to_string())
}
