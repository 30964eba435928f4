// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Where labels, leader lines and callouts end up.
//!
//! Every placed item has an origin and a scale. Label and callout offsets
//! given by the author are in the item's local frame; a local point `p`
//! lands at `origin + scale * p` (component-wise) in the graphic. A scale of
//! `-1` on an axis mirrors the item across it, so the same offsets work for
//! a header on the left edge of the board as on the right.
//!
//! Pins are the exception: their pitch is measured on the board image, so
//! pin offsets are never mirrored.

use anyhow::{bail, Result};
use serde::Deserialize;
use std::str::FromStr;

use crate::geometry::{Point, Rect};
use crate::label::{HeaderGroup, PinLabelEntry};

/// Width of one label row.
pub const LABEL_WIDTH: f64 = 80.0;
/// Height of one label row.
pub const LABEL_HEIGHT: f64 = 26.0;
/// Space between the rows of a pin, which are laid out side by side.
pub const LABEL_GAP: f64 = 2.0;

/// Order in which a curved leader line turns. The first letter is the
/// direction it leaves the pin in, the second the direction it arrives at
/// the label in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Routing {
    #[default]
    Hh,
    Hv,
    Vh,
    Vv,
}

#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String")]
pub enum LeaderStyle {
    Straight,
    Curved(Routing),
}

impl Default for LeaderStyle {
    fn default() -> Self {
        LeaderStyle::Curved(Routing::Hh)
    }
}

impl FromStr for LeaderStyle {
    type Err = anyhow::Error;

    /// Parses `straight`, `curved`, or `curved-` followed by a routing
    /// (`hh`, `hv`, `vh`, `vv`).
    fn from_str(s: &str) -> Result<Self> {
        let routing = match s {
            "straight" => return Ok(LeaderStyle::Straight),
            "curved" | "curved-hh" => Routing::Hh,
            "curved-hv" => Routing::Hv,
            "curved-vh" => Routing::Vh,
            "curved-vv" => Routing::Vv,
            _ => bail!(
                "bad leader style '{s}': expected straight, curved, \
                 or curved-{{hh,hv,vh,vv}}"
            ),
        };
        Ok(LeaderStyle::Curved(routing))
    }
}

impl TryFrom<String> for LeaderStyle {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl LeaderStyle {
    /// SVG path data for a leader from `from` to `to`.
    pub fn path(self, from: Point, to: Point) -> String {
        let segment = match self {
            LeaderStyle::Straight => format!("L {} {}", to.x, to.y),
            LeaderStyle::Curved(Routing::Hh) => {
                let mid = (from.x + to.x) / 2.0;
                format!(
                    "C {} {} {} {} {} {}",
                    mid, from.y, mid, to.y, to.x, to.y
                )
            }
            LeaderStyle::Curved(Routing::Vv) => {
                let mid = (from.y + to.y) / 2.0;
                format!(
                    "C {} {} {} {} {} {}",
                    from.x, mid, to.x, mid, to.x, to.y
                )
            }
            LeaderStyle::Curved(Routing::Vh) => {
                format!("Q {} {} {} {}", from.x, to.y, to.x, to.y)
            }
            LeaderStyle::Curved(Routing::Hv) => {
                format!("Q {} {} {} {}", to.x, from.y, to.x, to.y)
            }
        };
        format!("M {} {} {}", from.x, from.y, segment)
    }
}

/// A pin whose label has been positioned. Both anchors are relative to the
/// group's origin.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedPin {
    /// Offset of the pin on the board image. Not mirrored.
    pub pin_anchor: Point,
    /// Offset of the label in the group's scaled frame.
    pub label_anchor: Point,
    pub rows: Vec<PinLabelEntry>,
}

/// A connector's worth of labels, ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedGroup {
    /// The connector's first pin, in the graphic's frame.
    pub origin: Point,
    pub scale: Point,
    pub leader: LeaderStyle,
    pub pins: Vec<PlacedPin>,
}

impl PlacedGroup {
    /// Lays out `entries` starting at `origin`: pin `i` sits at
    /// `origin + i * pin_pitch` on the image, and its label at
    /// `label_start + i * label_pitch` in the scaled frame.
    pub fn new(
        origin: Point,
        scale: Point,
        pin_pitch: Point,
        label_start: Point,
        label_pitch: Point,
        entries: &HeaderGroup,
        leader: LeaderStyle,
    ) -> Result<Self> {
        if !scale.is_mirror() {
            bail!(
                "scale ({}, {}) must be made of 1s and -1s",
                scale.x,
                scale.y
            );
        }
        if entries.is_empty() {
            bail!("no pins to label");
        }

        let pins = entries
            .pins
            .iter()
            .enumerate()
            .map(|(i, pin)| {
                let i = i as f64;
                PlacedPin {
                    pin_anchor: pin_pitch * i,
                    label_anchor: label_start + label_pitch * i,
                    rows: pin.rows.clone(),
                }
            })
            .collect();

        Ok(Self {
            origin,
            scale,
            leader,
            pins,
        })
    }

    /// Maps a point in the group's local frame into the graphic.
    pub fn to_graphic(&self, local: Point) -> Point {
        self.origin + local.scaled(self.scale)
    }

    /// Where `pin` is in the graphic.
    pub fn pin_position(&self, pin: &PlacedPin) -> Point {
        self.origin + pin.pin_anchor
    }

    /// Where the label of `pin` is anchored in the graphic.
    pub fn label_position(&self, pin: &PlacedPin) -> Point {
        self.to_graphic(pin.label_anchor)
    }

    /// Boxes for each row of a pin's label, in the graphic's frame. Rows
    /// run away from the pin along the group's x scale, and are centred
    /// vertically on the label anchor.
    pub fn row_rects(&self, pin: &PlacedPin) -> Vec<Rect> {
        let start = self.label_position(pin);
        let dir = self.scale.x;
        let step = LABEL_WIDTH + LABEL_GAP;
        (0..pin.rows.len())
            .map(|j| {
                let near = start.x + dir * j as f64 * step;
                let far = near + dir * LABEL_WIDTH;
                Rect::from_corners(
                    Point::new(near, start.y - LABEL_HEIGHT / 2.0),
                    Point::new(far, start.y + LABEL_HEIGHT / 2.0),
                )
            })
            .collect()
    }
}

/// The text of a callout and where it sits relative to the anchor.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AnnotationContent {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub text: PinLabelEntry,
}

/// The box that holds a callout's text, relative to the anchor. The text is
/// positioned separately, so it's up to the author to centre it.
#[derive(Copy, Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BodyBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for BodyBox {
    fn default() -> Self {
        Self {
            x: 40.0,
            y: 0.0,
            width: 120.0,
            height: 36.0,
        }
    }
}

/// The rounded highlight drawn over the thing being called out, relative
/// to the anchor.
#[derive(Copy, Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct TargetBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub corner_radius: f64,
}

impl Default for TargetBox {
    fn default() -> Self {
        Self {
            x: -20.0,
            y: -20.0,
            width: 40.0,
            height: 40.0,
            corner_radius: 20.0,
        }
    }
}

/// A free-standing callout, e.g. pointing out a connector or a button that
/// doesn't belong to a pin row.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedAnnotation {
    pub anchor: Point,
    pub scale: Point,
    pub content: AnnotationContent,
    pub body: BodyBox,
    pub target: TargetBox,
}

impl PlacedAnnotation {
    pub fn new(
        anchor: Point,
        scale: Point,
        content: AnnotationContent,
        body: BodyBox,
        target: TargetBox,
    ) -> Result<Self> {
        if !scale.is_mirror() {
            bail!(
                "scale ({}, {}) must be made of 1s and -1s",
                scale.x,
                scale.y
            );
        }
        Ok(Self {
            anchor,
            scale,
            content,
            body,
            target,
        })
    }

    fn to_graphic(&self, local: Point) -> Point {
        self.anchor + local.scaled(self.scale)
    }

    pub fn target_rect(&self) -> Rect {
        let t = &self.target;
        Rect::from_corners(
            self.to_graphic(Point::new(t.x, t.y)),
            self.to_graphic(Point::new(t.x + t.width, t.y + t.height)),
        )
    }

    pub fn body_rect(&self) -> Rect {
        let b = &self.body;
        Rect::from_corners(
            self.to_graphic(Point::new(b.x, b.y)),
            self.to_graphic(Point::new(b.x + b.width, b.y + b.height)),
        )
    }

    /// Where the text is centred.
    pub fn text_position(&self) -> Point {
        self.to_graphic(Point::new(self.content.x, self.content.y))
    }

    /// Leader from the anchor: straight along y to the middle of the body,
    /// then along x to the body's near edge.
    pub fn leader_points(&self) -> [Point; 3] {
        let mid = self.body.y + self.body.height / 2.0;
        [
            self.anchor,
            self.to_graphic(Point::new(0.0, mid)),
            self.to_graphic(Point::new(self.body.x, mid)),
        ]
    }
}

/// Key explaining what each label colour means.
#[derive(Clone, Debug, PartialEq)]
pub struct Legend {
    pub position: Point,
    pub entries: Vec<PinLabelEntry>,
}

/// Vertical distance between legend entries.
pub const LEGEND_PITCH: f64 = 30.0;
/// Side of a legend colour swatch.
pub const LEGEND_SWATCH: f64 = 20.0;
