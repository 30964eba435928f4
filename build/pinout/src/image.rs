// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{anyhow, bail, Context, Result};
use base64::Engine;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use crate::geometry::Point;

/// The photograph (or render) of the board that labels are drawn over, along
/// with named locations measured on it.
#[derive(Clone, Debug)]
pub struct BoardImage {
    pub path: PathBuf,

    /// Inline the image into the SVG instead of linking to it.
    pub embed: bool,

    /// Where the image's top-left corner sits within the diagram's graphic.
    pub position: Point,

    /// Width and height in pixels. Read from the PNG header when absent.
    pub size: Option<(f64, f64)>,

    coords: IndexMap<String, Point>,
}

impl BoardImage {
    pub fn new(path: impl Into<PathBuf>, embed: bool) -> Self {
        Self {
            path: path.into(),
            embed,
            position: Point::ZERO,
            size: None,
            coords: IndexMap::new(),
        }
    }

    /// Records a named location on the image. This may be an absolute pixel
    /// position, or a vector (e.g. a pin pitch) that is only ever looked up
    /// with [`raw_coord`](Self::raw_coord). Registering a name again
    /// replaces the earlier value.
    pub fn register_coordinate(&mut self, name: &str, x: f64, y: f64) {
        log::debug!("coord {name} = ({x}, {y})");
        self.coords.insert(name.to_string(), Point::new(x, y));
    }

    /// Looks up a named location, in the frame of the graphic that contains
    /// the image.
    pub fn coord(&self, name: &str) -> Result<Point> {
        Ok(self.position + self.raw_coord(name)?)
    }

    /// Looks up a named location exactly as it was registered, ignoring
    /// where the image is placed.
    pub fn raw_coord(&self, name: &str) -> Result<Point> {
        self.coords
            .get(name)
            .copied()
            .ok_or_else(|| {
                anyhow!(suggest(name, self.coords.keys(), "coordinate"))
            })
    }

    pub fn coords(&self) -> impl Iterator<Item = (&str, Point)> {
        self.coords.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Resolves what the SVG needs to show the image. The file is only read
    /// when it's being embedded or its size has to come from its header.
    pub(crate) fn load(&self) -> Result<LoadedImage> {
        if let (false, Some((width, height))) = (self.embed, self.size) {
            return Ok(LoadedImage {
                href: self.path.display().to_string(),
                width,
                height,
            });
        }

        let bytes = std::fs::read(&self.path).with_context(|| {
            format!("could not read board image {}", self.path.display())
        })?;
        let (width, height) = match self.size {
            Some(size) => size,
            None => png_size(&bytes).with_context(|| {
                format!("could not size {}", self.path.display())
            })?,
        };
        Ok(LoadedImage {
            href: if self.embed {
                data_uri(&self.path, &bytes)
            } else {
                self.path.display().to_string()
            },
            width,
            height,
        })
    }
}

pub(crate) struct LoadedImage {
    pub href: String,
    pub width: f64,
    pub height: f64,
}

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Pulls width and height out of a PNG's IHDR chunk, which the format
/// requires to come first.
fn png_size(bytes: &[u8]) -> Result<(f64, f64)> {
    if bytes.len() < 24 || !bytes.starts_with(PNG_SIGNATURE) {
        bail!("not a PNG file; give the image width and height explicitly");
    }
    if &bytes[12..16] != b"IHDR" {
        bail!("PNG does not start with an IHDR chunk");
    }
    let be = |b: &[u8]| u32::from_be_bytes([b[0], b[1], b[2], b[3]]);
    Ok((be(&bytes[16..20]) as f64, be(&bytes[20..24]) as f64))
}

fn data_uri(path: &Path, bytes: &[u8]) -> String {
    let mime = match path.extension().and_then(|e| e.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    };
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Builds an "unknown name" message, suggesting the closest known name when
/// there is one within a few edits.
pub(crate) fn suggest<'a>(
    name: &str,
    known: impl Iterator<Item = &'a String>,
    what: &str,
) -> String {
    // Suggest only for very small differences. A higher limit gives poor
    // suggestions for short names like `ac` or `ssr`.
    const MAX_DISTANCE: usize = 3;

    let mut scored: Vec<_> = known
        .filter_map(|s| {
            let distance = strsim::damerau_levenshtein(name, s);
            if distance <= MAX_DISTANCE {
                Some((distance, s))
            } else {
                None
            }
        })
        .collect();
    scored.sort();
    let mut out = format!("'{}' is not a known {}.", name, what);
    if let Some((_, s)) = scored.first() {
        out.push_str(&format!(" Did you mean '{}'?", s));
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A minimal PNG: signature plus an IHDR chunk, enough to be sized.
    pub(crate) fn tiny_png(width: u32, height: u32) -> Vec<u8> {
        let mut v = PNG_SIGNATURE.to_vec();
        v.extend_from_slice(&13u32.to_be_bytes());
        v.extend_from_slice(b"IHDR");
        v.extend_from_slice(&width.to_be_bytes());
        v.extend_from_slice(&height.to_be_bytes());
        v.extend_from_slice(&[8, 2, 0, 0, 0]);
        v
    }

    #[test]
    fn raw_ignores_position() {
        let mut img = BoardImage::new("pcb.png", true);
        img.position = Point::new(100.0, 50.0);
        img.register_coordinate("uart", 275.0, 403.0);
        img.register_coordinate("pin_pitch_v", 0.0, 30.0);

        assert_eq!(img.raw_coord("uart").unwrap(), Point::new(275.0, 403.0));
        assert_eq!(img.coord("uart").unwrap(), Point::new(375.0, 453.0));
        assert_eq!(
            img.raw_coord("pin_pitch_v").unwrap(),
            Point::new(0.0, 30.0)
        );
    }

    #[test]
    fn reregistering_replaces() {
        let mut img = BoardImage::new("pcb.png", true);
        img.register_coordinate("ssr", 1.0, 2.0);
        img.register_coordinate("ssr", 445.0, 403.0);
        assert_eq!(img.coord("ssr").unwrap(), Point::new(445.0, 403.0));
        assert_eq!(img.coords().count(), 1);
    }

    #[test]
    fn unknown_coord_suggests() {
        let mut img = BoardImage::new("pcb.png", true);
        img.register_coordinate("relais_out", 1015.0, 205.0);
        let err = img.coord("relay_out").unwrap_err().to_string();
        assert!(err.contains("'relay_out' is not a known coordinate"));
        assert!(err.contains("Did you mean 'relais_out'?"));

        let err = img.coord("screen").unwrap_err().to_string();
        assert!(!err.contains("Did you mean"));
    }

    #[test]
    fn suggests_closest_name() {
        let known = ["ac".to_string(), "ac_in".to_string(), "ssr".to_string()];
        let msg = suggest("ac_i", known.iter(), "header table");
        assert_eq!(
            msg,
            "'ac_i' is not a known header table. Did you mean 'ac_in'?"
        );
        let msg = suggest("temp_sensor", known.iter(), "header table");
        assert_eq!(msg, "'temp_sensor' is not a known header table.");
    }

    #[test]
    fn sizes_png() {
        assert_eq!(png_size(&tiny_png(1262, 820)).unwrap(), (1262.0, 820.0));
        assert!(png_size(b"GIF89a............................").is_err());
    }

    #[test]
    fn load_embeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pcb.png");
        std::fs::write(&path, tiny_png(4, 3)).unwrap();

        let img = BoardImage::new(&path, true).load().unwrap();
        assert!(img.href.starts_with("data:image/png;base64,iVBORw0KGgo"));
        assert_eq!((img.width, img.height), (4.0, 3.0));

        let img = BoardImage::new(&path, false).load().unwrap();
        assert_eq!(img.href, path.display().to_string());
        assert_eq!((img.width, img.height), (4.0, 3.0));

        // Linked and already sized: the file doesn't need to exist.
        let mut linked = BoardImage::new(dir.path().join("missing.png"), false);
        linked.size = Some((10.0, 20.0));
        let img = linked.load().unwrap();
        assert!(img.href.ends_with("missing.png"));
        assert_eq!((img.width, img.height), (10.0, 20.0));
    }
}
