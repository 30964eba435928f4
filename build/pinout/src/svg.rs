// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result};
use std::fmt::Write;

use crate::diagram::Diagram;
use crate::geometry::Rect;
use crate::layout::{
    PlacedAnnotation, PlacedGroup, LEGEND_PITCH, LEGEND_SWATCH,
};

/// Label corners are rounded by this much.
const LABEL_RADIUS: f64 = 3.0;

pub(crate) fn render(d: &Diagram) -> Result<String> {
    let image = d.image.load()?;
    let mut out = String::new();

    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    for sheet in d.stylesheets.iter().filter(|s| !s.embed) {
        writeln!(
            out,
            r#"<?xml-stylesheet type="text/css" href="{}"?>"#,
            escape(&sheet.path.display().to_string())
        )?;
    }
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" id="{id}" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        id = escape(&d.id),
        w = d.width,
        h = d.height,
    )?;

    for sheet in d.stylesheets.iter().filter(|s| s.embed) {
        let css = std::fs::read_to_string(&sheet.path).with_context(|| {
            format!("could not read stylesheet {}", sheet.path.display())
        })?;
        writeln!(out, "<style><![CDATA[\n{}]]></style>", css)?;
    }

    writeln!(
        out,
        r#"<g class="graphic" transform="translate({} {})">"#,
        d.offset.x, d.offset.y
    )?;
    writeln!(
        out,
        r#"<image x="{}" y="{}" width="{}" height="{}" href="{}" xlink:href="{}"/>"#,
        d.image.position.x,
        d.image.position.y,
        image.width,
        image.height,
        escape(&image.href),
        escape(&image.href),
    )?;

    for group in &d.groups {
        render_group(&mut out, group)?;
    }
    for annotation in &d.annotations {
        render_annotation(&mut out, annotation)?;
    }
    writeln!(out, "</g>")?;

    if let Some(legend) = &d.legend {
        writeln!(out, r#"<g class="legend">"#)?;
        for (i, entry) in legend.entries.iter().enumerate() {
            let y = legend.position.y + i as f64 * LEGEND_PITCH;
            writeln!(
                out,
                r#"<rect class="legend__swatch {}" x="{}" y="{}" width="{s}" height="{s}" rx="{}"/>"#,
                entry.category,
                legend.position.x,
                y,
                LABEL_RADIUS,
                s = LEGEND_SWATCH,
            )?;
            writeln!(
                out,
                r#"<text class="legend__text" x="{}" y="{}" dominant-baseline="central">{}</text>"#,
                legend.position.x + LEGEND_SWATCH + 10.0,
                y + LEGEND_SWATCH / 2.0,
                escape(&entry.name),
            )?;
        }
        writeln!(out, "</g>")?;
    }

    writeln!(out, "</svg>")?;
    Ok(out)
}

fn render_group(out: &mut String, group: &PlacedGroup) -> Result<()> {
    writeln!(out, r#"<g class="pinlabelgroup">"#)?;
    for pin in &group.pins {
        let from = group.pin_position(pin);
        let to = group.label_position(pin);
        writeln!(out, r#"<g class="pinlabel">"#)?;
        writeln!(
            out,
            r#"<path class="leaderline" d="{}"/>"#,
            group.leader.path(from, to)
        )?;
        for (rect, row) in group.row_rects(pin).iter().zip(&pin.rows) {
            label_box(out, rect, &row.name, row.category.css_class())?;
        }
        writeln!(out, "</g>")?;
    }
    writeln!(out, "</g>")?;
    Ok(())
}

fn render_annotation(out: &mut String, a: &PlacedAnnotation) -> Result<()> {
    let class = a.content.text.category.css_class();
    let target = a.target_rect();
    let body = a.body_rect();
    let [p0, p1, p2] = a.leader_points();
    let text = a.text_position();

    writeln!(out, r#"<g class="annotation {}">"#, class)?;
    writeln!(
        out,
        r#"<rect class="annotation__target" x="{}" y="{}" width="{}" height="{}" rx="{r}" ry="{r}"/>"#,
        target.x,
        target.y,
        target.width,
        target.height,
        r = a.target.corner_radius,
    )?;
    writeln!(
        out,
        r#"<path class="leaderline" d="M {} {} L {} {} L {} {}"/>"#,
        p0.x, p0.y, p1.x, p1.y, p2.x, p2.y
    )?;
    writeln!(
        out,
        r#"<rect class="annotation__body {}" x="{}" y="{}" width="{}" height="{}" rx="{r}" ry="{r}"/>"#,
        class,
        body.x,
        body.y,
        body.width,
        body.height,
        r = LABEL_RADIUS,
    )?;
    writeln!(
        out,
        r#"<text class="annotation__text {}" x="{}" y="{}" text-anchor="middle" dominant-baseline="central">{}</text>"#,
        class,
        text.x,
        text.y,
        escape(&a.content.text.name),
    )?;
    writeln!(out, "</g>")?;
    Ok(())
}

fn label_box(
    out: &mut String,
    rect: &Rect,
    text: &str,
    class: &str,
) -> Result<()> {
    let c = rect.center();
    writeln!(
        out,
        r#"<rect class="pinlabel__body {class}" x="{}" y="{}" width="{}" height="{}" rx="{r}" ry="{r}"/>"#,
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        r = LABEL_RADIUS,
    )?;
    writeln!(
        out,
        r#"<text class="pinlabel__text {class}" x="{}" y="{}" text-anchor="middle" dominant-baseline="central">{}</text>"#,
        c.x,
        c.y,
        escape(text),
    )?;
    Ok(())
}

/// Escapes text for use in XML character data and attribute values.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
