// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Draws pinout diagrams of a board.
//!
//! A diagram is a photograph of the board with labels laid over it: one
//! label per pin of each connector, joined to the pin by a leader line, plus
//! free-standing callouts for things like ports and buttons, and a legend.
//! Locations are measured in pixels on the photograph and registered by
//! name on a [`BoardImage`]; connectors are then labelled relative to those
//! names with [`Diagram::place_group`].
//!
//! Each board revision is described by a TOML board file (see
//! [`BoardConfig`]). The revisions this crate knows about are available
//! through [`BoardConfig::builtin`].
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! let board = build_pinout::BoardConfig::builtin("gm-standard-rev2")?;
//! let path = board.diagram()?.write(None)?;
//! println!("wrote {}", path.display());
//! # Ok(())
//! # }
//! ```

mod board;
mod diagram;
mod geometry;
mod image;
mod label;
mod layout;
mod svg;

pub use board::{
    builtin_names, AnnotationConfig, BoardConfig, GroupConfig, ImageConfig,
    LegendConfig, StylesheetConfig, Vector,
};
pub use diagram::{Diagram, Stylesheet};
pub use geometry::{Point, Rect};
pub use image::BoardImage;
pub use label::{Category, HeaderGroup, Pin, PinLabelEntry};
pub use layout::{
    AnnotationContent, BodyBox, LeaderStyle, Legend, PlacedAnnotation,
    PlacedGroup, PlacedPin, Routing, TargetBox, LABEL_GAP, LABEL_HEIGHT,
    LABEL_WIDTH,
};
