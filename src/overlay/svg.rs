//! SVG markup for dialogue and thought bubbles.

use std::fmt::Write as _;

use html_escape::encode_text;

use super::layout::BubbleMetrics;
use crate::model::Bubble;

const FONT_FAMILY: &str = "Comic Sans MS, cursive";
const FONT_SIZE: f32 = 12.0;
/// Radius and offset below the circle edge of each thought-trail dot.
const THOUGHT_TRAIL: [(f32, f32); 3] = [(5.0, 15.0), (3.0, 25.0), (2.0, 33.0)];

fn shadow_filter(out: &mut String, id: &str) {
    let _ = write!(
        out,
        r#"<filter id="{id}" x="-20%" y="-20%" width="140%" height="140%"><feDropShadow dx="0" dy="1" stdDeviation="2" flood-opacity="0.1"/></filter>"#
    );
}

fn text_lines(out: &mut String, metrics: &BubbleMetrics, lines: &[String], height: f32) {
    for (index, line) in lines.iter().enumerate() {
        let _ = write!(
            out,
            r#"<text x="0" y="{}" text-anchor="middle" font-family="{FONT_FAMILY}" font-size="{FONT_SIZE}" fill="black">{}</text>"#,
            metrics.baseline(height, index),
            encode_text(line)
        );
    }
}

/// Rounded box path: straight edges at `±w/2`, `±h/2`, corners bulging out by `r`.
fn rounded_box_path(w: f32, h: f32, r: f32) -> String {
    let (hw, hh) = (w / 2.0, h / 2.0);
    format!(
        "M {nx} {ny} H {hw} Q {ox} {ny} {ox} {iy} V {jy} Q {ox} {hh} {hw} {hh} H {nx} Q {onx} {hh} {onx} {jy} V {iy} Q {onx} {ny} {nx} {ny} Z",
        nx = -hw,
        ny = -hh,
        ox = hw + r,
        onx = -(hw + r),
        iy = -hh + r,
        jy = hh - r,
    )
}

fn dialogue_markup(
    out: &mut String,
    metrics: &BubbleMetrics,
    bubble: &Bubble,
    index: usize,
    canvas: f64,
) {
    let layout = metrics.layout_dialogue(&bubble.text);
    let (x, y) = bubble.position.to_pixels(canvas, canvas);
    let filter_id = format!("dialogue-shadow-{index}");
    let bottom = layout.height / 2.0;

    let _ = write!(out, r#"<g transform="translate({x}, {y})">"#);
    shadow_filter(out, &filter_id);
    let _ = write!(
        out,
        r#"<path d="{}" fill="white" filter="url(#{filter_id})"/>"#,
        rounded_box_path(layout.width, layout.height, metrics.corner_radius)
    );
    let _ = write!(
        out,
        r#"<path d="M -5 {bottom} L 0 {} L 5 {bottom}" fill="white"/>"#,
        bottom + metrics.tail_length
    );
    text_lines(out, metrics, &layout.lines, layout.height);
    out.push_str("</g>");
}

fn thought_markup(
    out: &mut String,
    metrics: &BubbleMetrics,
    bubble: &Bubble,
    index: usize,
    canvas: f64,
) {
    let layout = metrics.layout_thought(&bubble.text);
    let (x, y) = bubble.position.to_pixels(canvas, canvas);
    let filter_id = format!("thought-shadow-{index}");
    let radius = layout.size / 2.0;

    let _ = write!(out, r#"<g transform="translate({x}, {y})">"#);
    shadow_filter(out, &filter_id);
    let _ = write!(
        out,
        r#"<circle cx="0" cy="0" r="{radius}" fill="white" filter="url(#{filter_id})"/>"#
    );
    for (dot_radius, offset) in THOUGHT_TRAIL {
        let _ = write!(
            out,
            r#"<circle cx="0" cy="{}" r="{dot_radius}" fill="white"/>"#,
            radius + offset
        );
    }
    text_lines(out, metrics, &layout.lines, layout.size);
    out.push_str("</g>");
}

/// Builds a `canvas` x `canvas` SVG document with one group per bubble.
/// Positions are percentages scaled linearly onto the canvas.
pub fn overlay_svg(
    metrics: &BubbleMetrics,
    dialogues: &[Bubble],
    thoughts: &[Bubble],
    canvas: u32,
) -> String {
    let size = f64::from(canvas);
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<svg width="{canvas}" height="{canvas}" viewBox="0 0 {canvas} {canvas}" xmlns="http://www.w3.org/2000/svg">"#
    );
    for (index, bubble) in dialogues.iter().enumerate() {
        dialogue_markup(&mut out, metrics, bubble, index, size);
    }
    for (index, bubble) in thoughts.iter().enumerate() {
        thought_markup(&mut out, metrics, bubble, index, size);
    }
    out.push_str("</svg>");
    out
}
