//! PPTX generation from a [`DeckDefinition`].
//!
//! Every slide uses one blank layout and is drawn from absolute shapes.
//! Charts are native chart parts, each backed by an embedded workbook so
//! PowerPoint can edit the data.

mod chart;
mod drawing;
mod gantt;
mod slide;
mod template;

use crate::package::PackageWriter;
use deck_core::{DeckDefinition, Error, Result};
use std::path::Path;
use template::{REL_CHART, REL_PACKAGE, REL_SLIDE_LAYOUT};

const EMU_PER_INCH: f64 = 914_400.0;

/// Inches to EMUs.
pub(crate) fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

/// Render a deck definition to PPTX bytes.
///
/// An invalid Gantt chart fails the whole deck, naming its slide.
pub fn generate(deck: &DeckDefinition) -> Result<Vec<u8>> {
    let (width, height) = deck.slide.dimensions();
    let slides = deck.resolved_slides();

    let mut canvases = Vec::with_capacity(slides.len());
    for (i, definition) in slides.iter().enumerate() {
        let canvas = slide::render(definition, width, height).map_err(|e| match e {
            Error::InvalidDeck(message) => Error::InvalidDeck(format!("Slide {}: {}", i + 1, message)),
            other => other,
        })?;
        canvases.push(canvas);
    }
    let chart_total = canvases.iter().map(|c| c.charts().len()).sum();

    let mut package = PackageWriter::new();
    package.add(
        "[Content_Types].xml",
        template::content_types(canvases.len(), chart_total).as_bytes(),
    )?;
    package.add("_rels/.rels", template::root_rels().as_bytes())?;
    package.add(
        "ppt/presentation.xml",
        template::presentation_xml(canvases.len(), width, height).as_bytes(),
    )?;
    package.add(
        "ppt/_rels/presentation.xml.rels",
        template::presentation_rels(canvases.len()).as_bytes(),
    )?;
    package.add(
        "ppt/slideMasters/slideMaster1.xml",
        template::slide_master_xml().as_bytes(),
    )?;
    package.add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        template::slide_master_rels().as_bytes(),
    )?;
    package.add(
        "ppt/slideLayouts/slideLayout1.xml",
        template::slide_layout_xml().as_bytes(),
    )?;
    package.add(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        template::slide_layout_rels().as_bytes(),
    )?;
    package.add("ppt/theme/theme1.xml", template::THEME_XML.as_bytes())?;

    // Chart parts are numbered across the whole deck.
    let mut chart_number = 0;
    for (i, canvas) in canvases.iter().enumerate() {
        let slide_number = i + 1;
        let mut rels = vec![(
            "rId1".to_string(),
            REL_SLIDE_LAYOUT,
            "../slideLayouts/slideLayout1.xml".to_string(),
        )];

        for (k, chart) in canvas.charts().iter().enumerate() {
            chart_number += 1;
            let workbook = format!("Microsoft_Excel_Worksheet{chart_number}.xlsx");
            rels.push((
                format!("rId{}", k + 2),
                REL_CHART,
                format!("../charts/chart{chart_number}.xml"),
            ));
            package.add(
                &format!("ppt/charts/chart{chart_number}.xml"),
                chart.to_xml().as_bytes(),
            )?;
            package.add(
                &format!("ppt/charts/_rels/chart{chart_number}.xml.rels"),
                template::relationships(&[(
                    "rId1".to_string(),
                    REL_PACKAGE,
                    format!("../embeddings/{workbook}"),
                )])
                .as_bytes(),
            )?;
            package.add(&format!("ppt/embeddings/{workbook}"), &chart.workbook_bytes()?)?;
        }

        package.add(
            &format!("ppt/slides/slide{slide_number}.xml"),
            canvas.to_xml().as_bytes(),
        )?;
        package.add(
            &format!("ppt/slides/_rels/slide{slide_number}.xml.rels"),
            template::relationships(&rels).as_bytes(),
        )?;
    }

    log::debug!(
        "Generated {} slides with {} charts",
        canvases.len(),
        chart_total
    );
    package.finish()
}

/// Render a deck definition and write it to `path`.
pub fn generate_to_path(deck: &DeckDefinition, path: &Path) -> Result<()> {
    let bytes = generate(deck)?;
    std::fs::write(path, bytes)?;
    log::info!("Saved presentation to {}", path.display());
    Ok(())
}
