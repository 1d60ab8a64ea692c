//! Gantt roadmaps drawn from plain shapes: lane bands, quarter guides and
//! one chevron per item.

use super::drawing::{Para, RunFormat, SlideCanvas, TextFrame};
use chrono::{Datelike, NaiveDateTime};
use deck_core::deck::{
    DateValue, GanttDefinition, InchRect, Margins, Position, DEFAULT_FONT_NAME, DEFAULT_TEXT_COLOR,
};
use deck_core::{Error, Result};

const DEFAULT_FRAME: InchRect = InchRect::new(1.0, 1.2, 11.3, 5.0);
const LANE_BAND_FILL: &str = "#F3F4F6";
const GUIDE_FILL: &str = "#E0E0E0";
const AXIS_LINE_FILL: &str = "#D1D5DB";
const ITEM_FILL: &str = "#90CAF9";
const SECONDS_PER_DAY: i64 = 86_400;

/// Maps dates onto the horizontal extent of the lanes, in whole days.
struct Timeline {
    t0: NaiveDateTime,
    total_days: i64,
    left: f64,
    width: f64,
}

impl Timeline {
    fn x_at(&self, date: &DateValue) -> Result<f64> {
        let days = days_between(self.t0, date.to_datetime()?);
        Ok(self.left + self.width * (days as f64 / self.total_days as f64))
    }
}

/// Whole days from `from` to `to`, rounded toward the past.
fn days_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// `Phase 3: Launch prep` becomes `P3 – Launch prep`; anything longer than
/// 32 characters is cut with an ellipsis.
pub(crate) fn shorten_lane(lane: &str) -> String {
    let lane = lane.trim();
    let short = match lane.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("phase ") => {
            let (head, tail) = match lane.split_once(':') {
                Some((head, tail)) => (head, tail.trim()),
                None => (lane, ""),
            };
            let number = head.split_whitespace().last().unwrap_or_default();
            if tail.is_empty() {
                format!("P{number}")
            } else {
                format!("P{number} – {tail}")
            }
        }
        _ => lane.to_string(),
    };

    if short.chars().count() > 32 {
        let mut cut: String = short.chars().take(32).collect();
        cut.push('…');
        cut
    } else {
        short
    }
}

fn quarter_label(date: NaiveDateTime) -> String {
    format!("Q{} {}", date.month0() / 3 + 1, date.year())
}

fn label_frame(text: &str, size: f64, bold: bool, align: &'static str) -> TextFrame {
    let format = RunFormat {
        font: Some(DEFAULT_FONT_NAME.to_string()),
        size: Some(size),
        bold: Some(bold),
        color: Some(DEFAULT_TEXT_COLOR.to_string()),
        ..Default::default()
    };
    TextFrame {
        paragraphs: vec![Para::single(text, format, Some(align))],
        ..Default::default()
    }
}

/// Draw a Gantt chart onto the slide.
///
/// Fails when the time range is missing or a date does not parse.
pub(crate) fn render(canvas: &mut SlideCanvas, gantt: &GanttDefinition) -> Result<()> {
    let frame = Position::resolve(gantt.position.as_ref(), DEFAULT_FRAME);
    let gutter = gantt.gutter_inches;
    let content_x = frame.x + gutter;
    let content_w = (frame.w - gutter).max(1.0);

    let lanes: Vec<String> = gantt
        .units
        .y_range
        .lanes
        .iter()
        .map(|lane| {
            if gantt.shorten_lanes {
                shorten_lane(lane)
            } else {
                lane.clone()
            }
        })
        .collect();
    let lane_count = lanes.len().max(1);
    let lane_h = frame.h / lane_count as f64;
    let lane_top = |index: usize| frame.y + lane_h * index as f64;

    let range = gantt
        .units
        .x_range
        .as_ref()
        .ok_or_else(|| Error::InvalidDeck("Gantt chart has no units.xRange".to_string()))?;
    let t0 = range.t0.to_datetime()?;
    let t1 = range.t1.to_datetime()?;
    let timeline = Timeline {
        t0,
        total_days: days_between(t0, t1).max(1),
        left: content_x,
        width: content_w,
    };

    for i in 0..lane_count {
        let top = lane_top(i);
        if i % 2 == 0 {
            canvas.add_filled_rect(InchRect::new(content_x, top, content_w, lane_h), LANE_BAND_FILL);
        }
        let label = lanes.get(i).cloned().unwrap_or_else(|| format!("Lane {}", i + 1));
        canvas.add_text_box(
            InchRect::new(frame.x, top, (gutter - 0.1).max(0.1), lane_h),
            &label_frame(&label, 12.0, true, "r"),
        );
    }

    let grid = &gantt.grid;
    let mut boundaries = Vec::with_capacity(grid.quarters.len());
    for quarter in &grid.quarters {
        let x = timeline.x_at(quarter)?;
        canvas.add_filled_rect(InchRect::new(x, frame.y, 0.018, frame.h), GUIDE_FILL);
        boundaries.push((x, quarter.to_datetime()?));
    }

    if grid.top_axis_line {
        canvas.add_filled_rect(
            InchRect::new(content_x, frame.y - 0.06, content_w, 0.012),
            AXIS_LINE_FILL,
        );
    }

    if grid.show_labels {
        for pair in boundaries.windows(2) {
            let (left, start) = pair[0];
            let (right, _) = pair[1];
            let center = (left + right) / 2.0;
            canvas.add_text_box(
                InchRect::new(center - 0.5, frame.y - grid.label_offset_inches, 1.0, 0.28),
                &label_frame(&quarter_label(start), grid.label_font_size, false, "ctr"),
            );
        }
    }

    for item in &gantt.items {
        let mut left = timeline.x_at(&item.start.x)?;
        let mut right = timeline.x_at(&item.end.x)?;
        if right < left {
            std::mem::swap(&mut left, &mut right);
        }

        let height = lane_h * item.size.height;
        let top = lane_top(item.start.y) + (lane_h - height) / 2.0;
        let format = RunFormat {
            font: Some(DEFAULT_FONT_NAME.to_string()),
            size: Some(11.0),
            bold: Some(true),
            color: Some(
                item.style
                    .text
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
            ),
            ..Default::default()
        };
        let text = TextFrame {
            paragraphs: vec![Para::single(item.display_label(), format, None)],
            wrap: true,
            autofit: false,
            margins: Margins {
                left: Some(0.08),
                top: Some(0.02),
                ..Default::default()
            },
        };
        canvas.add_chevron(
            InchRect::new(left, top, right - left, height),
            item.style.fill.as_deref().unwrap_or(ITEM_FILL),
            gantt.chevron_head,
            &text,
        );
    }

    Ok(())
}
