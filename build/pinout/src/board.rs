// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Board files: one TOML document per board revision, holding everything
//! needed to draw that revision's pinout.

use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::diagram::Diagram;
use crate::geometry::Point;
use crate::image::{suggest, BoardImage};
use crate::label::{HeaderGroup, PinLabelEntry};
use crate::layout::{AnnotationContent, BodyBox, LeaderStyle, TargetBox};

/// Board revisions that ship with this crate, by name.
const BUILTIN: &[(&str, &str)] = &[
    (
        "gm-standard-rev1",
        include_str!("../boards/gm-standard-rev1.toml"),
    ),
    (
        "gm-standard-rev2",
        include_str!("../boards/gm-standard-rev2.toml"),
    ),
];

/// Directory the built-in board files (and the files they name) live in.
const BUILTIN_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/boards");

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BoardConfig {
    pub name: String,
    #[serde(default = "default_id")]
    pub id: String,
    pub width: f64,
    pub height: f64,
    /// Offset of the graphic holding the image and labels.
    #[serde(default)]
    pub offset: Point,
    #[serde(default)]
    pub stylesheets: Vec<StylesheetConfig>,
    pub image: ImageConfig,
    /// Pin label tables, by name.
    #[serde(default)]
    pub headers: IndexMap<String, HeaderGroup>,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
    #[serde(default)]
    pub annotations: Vec<AnnotationConfig>,
    pub legend: Option<LegendConfig>,

    /// File this was read from; relative paths are resolved against it.
    #[serde(skip)]
    pub source: PathBuf,
}

fn default_id() -> String {
    "diagram".to_string()
}

fn unit_scale() -> Point {
    Point::ONE
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StylesheetConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub embed: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ImageConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub embed: bool,
    #[serde(default)]
    pub position: Point,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Named locations on the image, in pixels, in declaration order.
    #[serde(default)]
    pub coords: IndexMap<String, Point>,
}

/// A vector that is either spelled out or names one of the image's coords,
/// which is then used raw. Pitches are usually the latter, so that boards
/// with the same connector spacing share one measurement.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Vector {
    Named(String),
    Literal(Point),
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct GroupConfig {
    /// Image coordinate of the connector's first pin.
    pub coord: String,
    /// Name of the table in `headers` to label it with.
    pub labels: String,
    #[serde(default = "unit_scale")]
    pub scale: Point,
    pub pin_pitch: Vector,
    pub label_start: Point,
    pub label_pitch: Vector,
    #[serde(default)]
    pub leader: LeaderStyle,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AnnotationConfig {
    pub x: f64,
    pub y: f64,
    #[serde(default = "unit_scale")]
    pub scale: Point,
    pub content: AnnotationContent,
    #[serde(default)]
    pub body: BodyBox,
    #[serde(default)]
    pub target: TargetBox,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LegendConfig {
    pub x: f64,
    pub y: f64,
    pub entries: Vec<PinLabelEntry>,
}

impl BoardConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut cfg: Self = build_util::toml_from_file(path)?;
        cfg.source = path.to_owned();
        Ok(cfg)
    }

    /// Loads one of the board revisions that ship with this crate.
    pub fn builtin(name: &str) -> Result<Self> {
        let (_, text) = BUILTIN
            .iter()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| {
                let names: Vec<String> =
                    builtin_names().map(str::to_string).collect();
                anyhow!(suggest(name, names.iter(), "board revision"))
            })?;
        let mut cfg: Self = build_util::toml_from_str(text)
            .with_context(|| format!("built-in board {name} is malformed"))?;
        cfg.source = Path::new(BUILTIN_DIR).join(format!("{name}.toml"));
        Ok(cfg)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        build_util::relative_to(&self.source, path)
    }

    fn vector(&self, image: &BoardImage, v: &Vector) -> Result<Point> {
        match v {
            Vector::Named(name) => image.raw_coord(name),
            Vector::Literal(p) => Ok(*p),
        }
    }

    /// Builds the diagram this board file describes.
    pub fn diagram(&self) -> Result<Diagram> {
        let mut image =
            BoardImage::new(self.resolve(&self.image.path), self.image.embed);
        image.position = self.image.position;
        image.size = match (self.image.width, self.image.height) {
            (Some(w), Some(h)) => Some((w, h)),
            (None, None) => None,
            _ => bail!("image width and height must be given together"),
        };
        for (name, p) in &self.image.coords {
            image.register_coordinate(name, p.x, p.y);
        }

        let mut diagram =
            Diagram::new(&self.id, self.width, self.height, image);
        diagram.offset = self.offset;

        for sheet in &self.stylesheets {
            // Linked sheets are resolved by whoever views the SVG, so leave
            // them as written.
            let path = if sheet.embed {
                self.resolve(&sheet.path)
            } else {
                sheet.path.clone()
            };
            diagram.add_stylesheet(path, sheet.embed);
        }

        for g in &self.groups {
            let entries = self.headers.get(&g.labels).ok_or_else(|| {
                anyhow!(suggest(&g.labels, self.headers.keys(), "header table"))
            })?;
            let pin_pitch = self.vector(&diagram.image, &g.pin_pitch)?;
            let label_pitch = self.vector(&diagram.image, &g.label_pitch)?;
            diagram.place_group(
                &g.coord,
                g.scale,
                pin_pitch,
                g.label_start,
                label_pitch,
                entries,
                g.leader,
            )?;
        }

        for a in &self.annotations {
            diagram.place_annotation(
                a.x,
                a.y,
                a.scale,
                a.content.clone(),
                a.body,
                a.target,
            )?;
        }

        if let Some(legend) = &self.legend {
            diagram.set_legend(legend.x, legend.y, legend.entries.clone());
        }

        log::info!(
            "board {}: {} groups, {} annotations",
            self.name,
            diagram.groups.len(),
            diagram.annotations.len()
        );
        Ok(diagram)
    }
}

/// Names of the built-in board revisions.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTIN.iter().map(|(name, _)| *name)
}
