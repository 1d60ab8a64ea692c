//! Rendering one slide definition onto a canvas.

use super::chart::ChartPart;
use super::drawing::{alignment, Para, Run, RunFormat, SlideCanvas, TextFrame};
use super::gantt;
use deck_core::deck::{
    ChartDefinition, ChartFrame, ElementDefinition, InchRect, Position, SlideDefinition,
    TableDefinition, TextDefinition, TextStyle, TextVariant, DEFAULT_FONT_NAME, DEFAULT_TEXT_COLOR,
};
use deck_core::Result;

const TITLE_FRAME: InchRect = InchRect::new(1.0, 0.10, 11.3, 0.6);
const TEXT_FRAME: InchRect = InchRect::new(1.0, 1.0, 10.0, 1.0);
const TABLE_FRAME: InchRect = InchRect::new(1.0, 1.0, 10.0, 2.0);
const PIE_FRAME: InchRect = InchRect::new(6.0, 2.0, 5.0, 4.0);
const PLOT_FRAME: InchRect = InchRect::new(1.0, 2.0, 11.0, 4.0);

const COVER_BAND_FILL: &str = "#111827";
const COVER_TITLE_COLOR: &str = "#111827";
const COVER_SUBTITLE_COLOR: &str = "#374151";
const COVER_META_COLOR: &str = "#6B7280";

/// Draw a slide of `width` x `height` inches.
pub(crate) fn render(slide: &SlideDefinition, width: f64, height: f64) -> Result<SlideCanvas> {
    let mut canvas = SlideCanvas::new();

    if slide.is_cover() {
        render_cover(&mut canvas, slide, width, height);
        return Ok(canvas);
    }

    if let Some(title) = slide.title.as_deref().filter(|t| !t.is_empty()) {
        let format = RunFormat {
            size: Some(24.0),
            bold: Some(true),
            ..base_format(&TextStyle::default())
        };
        canvas.add_text_box(
            TITLE_FRAME,
            &TextFrame {
                paragraphs: vec![Para::single(title, format, Some("l"))],
                ..Default::default()
            },
        );
    }

    for element in &slide.elements {
        render_element(&mut canvas, element)?;
    }
    Ok(canvas)
}

fn render_element(canvas: &mut SlideCanvas, element: &ElementDefinition) -> Result<()> {
    match element {
        ElementDefinition::Text(text) => render_text(canvas, text),
        ElementDefinition::Table(table) => render_table(canvas, table),
        ElementDefinition::Chart(ChartDefinition::Gantt(chart)) => gantt::render(canvas, chart)?,
        ElementDefinition::Chart(ChartDefinition::Pie(pie)) => {
            canvas.add_chart(chart_frame(&pie.frame, PIE_FRAME), ChartPart::pie(pie));
        }
        ElementDefinition::Chart(ChartDefinition::Bar(bar)) => {
            canvas.add_chart(chart_frame(&bar.frame, PLOT_FRAME), ChartPart::bar(bar));
        }
        ElementDefinition::Chart(ChartDefinition::Line(line)) => {
            canvas.add_chart(chart_frame(&line.frame, PLOT_FRAME), ChartPart::line(line));
        }
        ElementDefinition::Chart(ChartDefinition::Unsupported) => {
            log::warn!("Skipping chart with unsupported subtype");
        }
        ElementDefinition::Unsupported => log::warn!("Skipping element with unsupported type"),
    }
    Ok(())
}

/// The cover layout: accent band, large title, subtitle and an owner/date footer.
///
/// The title is the first heading, falling back to the slide title; the
/// subtitle is the first paragraph or rich text.
fn render_cover(canvas: &mut SlideCanvas, slide: &SlideDefinition, width: f64, height: f64) {
    let accent = slide.accent_color.as_deref().unwrap_or(COVER_BAND_FILL);
    canvas.add_filled_rect(InchRect::new(0.0, 0.0, width, 1.2), accent);

    let texts = || {
        slide.elements.iter().filter_map(|element| match element {
            ElementDefinition::Text(text) => Some(text),
            _ => None,
        })
    };
    let title = texts()
        .find(|t| t.variant == TextVariant::Heading)
        .map(|t| t.text.as_str())
        .or(slide.title.as_deref())
        .unwrap_or_default();
    let subtitle = texts().find(|t| matches!(t.variant, TextVariant::Paragraph | TextVariant::Rich));

    let cover_text = |text: &str, size: f64, bold: Option<bool>, color: &str| {
        let format = RunFormat {
            font: Some(DEFAULT_FONT_NAME.to_string()),
            size: Some(size),
            bold,
            color: Some(color.to_string()),
            ..Default::default()
        };
        TextFrame::wrapped(vec![Para::single(text, format, Some("l"))])
    };

    canvas.add_text_box(
        InchRect::new(1.0, 1.6, width - 2.0, 1.6),
        &cover_text(title, 40.0, Some(true), COVER_TITLE_COLOR),
    );
    if let Some(subtitle) = subtitle {
        canvas.add_text_box(
            InchRect::new(1.0, 3.0, width - 2.0, 0.9),
            &cover_text(&subtitle.text, 18.0, None, COVER_SUBTITLE_COLOR),
        );
    }
    if let Some(meta) = &slide.meta {
        canvas.add_text_box(
            InchRect::new(1.0, height - 0.9, width - 2.0, 0.5),
            &cover_text(&format!("{}  •  {}", meta.owner, meta.date), 12.0, None, COVER_META_COLOR),
        );
    }
}

/// Run format a text style asks for, with the default font and color.
fn base_format(style: &TextStyle) -> RunFormat {
    RunFormat {
        font: Some(style.font.name.clone().unwrap_or_else(|| DEFAULT_FONT_NAME.to_string())),
        size: style.font.size,
        bold: style.font.bold,
        italic: style.font.italic,
        underline: style.font.underline,
        color: Some(style.text.clone().unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string())),
    }
}

fn render_text(canvas: &mut SlideCanvas, text: &TextDefinition) {
    let style = &text.style;
    let align = style.align.as_deref().map(|a| alignment(Some(a)));

    let paragraphs = match text.variant {
        TextVariant::Heading => {
            let format = RunFormat {
                size: Some(style.font.size.unwrap_or(28.0)),
                bold: Some(true),
                italic: None,
                underline: None,
                ..base_format(style)
            };
            vec![Para::single(&text.text, format, Some(align.unwrap_or("l")))]
        }
        TextVariant::Paragraph => vec![Para::single(&text.text, base_format(style), align)],
        TextVariant::Bullets => text
            .items
            .iter()
            .map(|item| Para {
                runs: vec![Run {
                    text: item.text.clone(),
                    format: RunFormat {
                        size: Some(style.font.size.unwrap_or(16.0)),
                        ..base_format(style)
                    },
                }],
                level: item.level,
                align,
            })
            .collect(),
        TextVariant::Rich => {
            let fallback = base_format(style);
            let runs = text
                .runs
                .iter()
                .map(|run| Run {
                    text: run.text.clone(),
                    format: RunFormat {
                        font: Some(
                            run.font
                                .name
                                .clone()
                                .unwrap_or_else(|| DEFAULT_FONT_NAME.to_string()),
                        ),
                        size: run.font.size.or(fallback.size),
                        bold: run.bold.or(fallback.bold),
                        italic: run.italic.or(fallback.italic),
                        underline: run.underline.or(fallback.underline),
                        color: run.color.clone().or_else(|| fallback.color.clone()),
                    },
                })
                .collect();
            vec![Para {
                runs,
                level: 0,
                align,
            }]
        }
    };

    let frame = TextFrame {
        paragraphs,
        wrap: true,
        autofit: true,
        margins: style.margins,
    };
    canvas.add_text_box(Position::resolve(text.position.as_ref(), TEXT_FRAME), &frame);
}

fn render_table(canvas: &mut SlideCanvas, table: &TableDefinition) {
    let columns = table
        .rows
        .iter()
        .map(Vec::len)
        .chain([table.headers.len()])
        .max()
        .unwrap_or(0);
    if columns == 0 {
        log::warn!("Skipping table without columns");
        return;
    }

    let frame = Position::resolve(table.position.as_ref(), TABLE_FRAME);
    let mut widths = vec![frame.w / columns as f64; columns];
    if let Some(custom) = &table.column_widths {
        for (width, value) in widths.iter_mut().zip(custom) {
            *width = *value;
        }
    }

    let align = Some(alignment(table.style.align.as_deref()));
    let cell = |text: &str, bold: Option<bool>| {
        let format = RunFormat {
            font: Some(DEFAULT_FONT_NAME.to_string()),
            size: Some(12.0),
            bold,
            color: Some(DEFAULT_TEXT_COLOR.to_string()),
            ..Default::default()
        };
        Para::single(text, format, align)
    };
    let row = |values: &[String], bold: Option<bool>| -> Vec<Para> {
        (0..columns)
            .map(|c| cell(values.get(c).map(String::as_str).unwrap_or_default(), bold))
            .collect()
    };

    let mut rows = Vec::with_capacity(table.rows.len() + 1);
    rows.push(row(&table.headers, Some(true)));
    rows.extend(table.rows.iter().map(|values| row(values, None)));
    canvas.add_table(frame, &widths, &rows);
}

/// Chart box with room kept for the legend on its side.
fn chart_frame(chart: &ChartFrame, fallback: InchRect) -> InchRect {
    let frame = Position::resolve(chart.position.as_ref(), fallback);
    padded_frame(frame, &chart.legend, chart.legend_pad_inches)
}

/// Shrink `frame` by `pad` inches on the legend's side, keeping at least an inch.
pub(crate) fn padded_frame(frame: InchRect, legend: &str, pad: f64) -> InchRect {
    let pad = pad.max(0.0);
    let InchRect { x, y, w, h } = frame;
    match legend {
        "right" => InchRect::new(x, y, (w - pad).max(1.0), h),
        "left" => InchRect::new(x + pad, y, (w - pad).max(1.0), h),
        "top" => InchRect::new(x, y + pad, w, (h - pad).max(1.0)),
        "bottom" => InchRect::new(x, y, w, (h - pad).max(1.0)),
        _ => frame,
    }
}
