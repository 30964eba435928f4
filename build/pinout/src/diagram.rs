// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::geometry::Point;
use crate::image::BoardImage;
use crate::label::{HeaderGroup, PinLabelEntry};
use crate::layout::{
    AnnotationContent, BodyBox, LeaderStyle, Legend, PlacedAnnotation,
    PlacedGroup, TargetBox,
};

/// A stylesheet attached to the diagram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stylesheet {
    pub path: PathBuf,
    /// Copy the sheet into the SVG rather than linking to it.
    pub embed: bool,
}

/// A pinout diagram under construction.
///
/// Everything is drawn inside one graphic, offset from the document's
/// top-left corner by `offset`. The board image and all coordinates live in
/// that graphic's frame.
#[derive(Clone, Debug)]
pub struct Diagram {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub offset: Point,
    pub image: BoardImage,
    pub stylesheets: Vec<Stylesheet>,
    pub groups: Vec<PlacedGroup>,
    pub annotations: Vec<PlacedAnnotation>,
    pub legend: Option<Legend>,
}

impl Diagram {
    pub fn new(
        id: impl Into<String>,
        width: f64,
        height: f64,
        image: BoardImage,
    ) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            offset: Point::ZERO,
            image,
            stylesheets: vec![],
            groups: vec![],
            annotations: vec![],
            legend: None,
        }
    }

    pub fn add_stylesheet(&mut self, path: impl Into<PathBuf>, embed: bool) {
        self.stylesheets.push(Stylesheet {
            path: path.into(),
            embed,
        });
    }

    /// Labels a connector whose first pin is at the image coordinate
    /// `coordinate_name`. See [`PlacedGroup::new`] for the layout rules.
    pub fn place_group(
        &mut self,
        coordinate_name: &str,
        scale: Point,
        pin_pitch: Point,
        label_start: Point,
        label_pitch: Point,
        entries: &HeaderGroup,
        leader_style: LeaderStyle,
    ) -> Result<&PlacedGroup> {
        let origin = self.image.coord(coordinate_name)?;
        let group = PlacedGroup::new(
            origin,
            scale,
            pin_pitch,
            label_start,
            label_pitch,
            entries,
            leader_style,
        )
        .with_context(|| format!("could not label '{coordinate_name}'"))?;
        log::debug!(
            "placed {} pins at {coordinate_name} ({}, {})",
            group.pins.len(),
            origin.x,
            origin.y
        );
        self.groups.push(group);
        Ok(&self.groups[self.groups.len() - 1])
    }

    /// Adds a callout anchored at (`x`, `y`) in the graphic's frame.
    pub fn place_annotation(
        &mut self,
        x: f64,
        y: f64,
        scale: Point,
        content: AnnotationContent,
        body_box: BodyBox,
        target_box: TargetBox,
    ) -> Result<&PlacedAnnotation> {
        let name = content.text.name.clone();
        let annotation = PlacedAnnotation::new(
            Point::new(x, y),
            scale,
            content,
            body_box,
            target_box,
        )
        .with_context(|| format!("could not place annotation '{name}'"))?;
        self.annotations.push(annotation);
        Ok(&self.annotations[self.annotations.len() - 1])
    }

    pub fn set_legend(&mut self, x: f64, y: f64, entries: Vec<PinLabelEntry>) {
        self.legend = Some(Legend {
            position: Point::new(x, y),
            entries,
        });
    }

    /// Renders the finished diagram to an SVG document.
    pub fn render(&self) -> Result<String> {
        crate::svg::render(self)
    }

    /// Where [`write`](Self::write) puts the diagram by default: `<id>.svg`.
    pub fn default_output(&self) -> PathBuf {
        PathBuf::from(format!("{}.svg", self.id))
    }

    /// Renders the diagram and writes it to `out`, or to
    /// [`default_output`](Self::default_output). Returns the path written.
    pub fn write(&self, out: Option<&Path>) -> Result<PathBuf> {
        let out = out
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_output());
        let svg = self.render()?;
        std::fs::write(&out, svg)
            .with_context(|| format!("could not write {}", out.display()))?;
        log::info!(
            "wrote {} ({} groups, {} annotations)",
            out.display(),
            self.groups.len(),
            self.annotations.len()
        );
        Ok(out)
    }
}
