// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::Deserialize;
use std::fmt;

/// Signal category of a label. Only affects styling: each category maps to
/// a CSS class in the diagram's stylesheet.
///
/// Board files may use either the long name (`"ground"`) or the CSS class
/// (`"gnd"`).
#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(alias = "gnd")]
    Ground,
    #[serde(alias = "pwr")]
    Power,
    Pwm,
    Ac,
    Doc,
    Temp,
    Comms,
    Gpio,
    Port,
    Button,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Ground,
        Category::Power,
        Category::Pwm,
        Category::Ac,
        Category::Doc,
        Category::Temp,
        Category::Comms,
        Category::Gpio,
        Category::Port,
        Category::Button,
    ];

    pub fn css_class(self) -> &'static str {
        match self {
            Category::Ground => "gnd",
            Category::Power => "pwr",
            Category::Pwm => "pwm",
            Category::Ac => "ac",
            Category::Doc => "doc",
            Category::Temp => "temp",
            Category::Comms => "comms",
            Category::Gpio => "gpio",
            Category::Port => "port",
            Category::Button => "button",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_class())
    }
}

/// One row of text on a pin label, written `["VCC", "pwr"]` in board files.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(from = "(String, Category)")]
pub struct PinLabelEntry {
    pub name: String,
    pub category: Category,
}

impl PinLabelEntry {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

impl From<(String, Category)> for PinLabelEntry {
    fn from((name, category): (String, Category)) -> Self {
        Self { name, category }
    }
}

/// The label rows of a single pin: usually a primary name, sometimes
/// followed by a documentation row such as a GPIO number.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Pin {
    pub rows: Vec<PinLabelEntry>,
}

impl Pin {
    pub fn new(rows: Vec<PinLabelEntry>) -> Self {
        Self { rows }
    }
}

/// The pins of one physical connector, in board order.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct HeaderGroup {
    pub pins: Vec<Pin>,
}

impl HeaderGroup {
    pub fn new(pins: Vec<Pin>) -> Self {
        Self { pins }
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

/// Shorthand for writing header tables in code.
///
/// ```
/// use build_pinout::{header, Category::*};
/// let fan = header![
///     [("GND", Ground), ("4010 FAN", Doc)],
///     [("VCC", Power), ("4010 FAN", Doc)],
/// ];
/// assert_eq!(fan.len(), 2);
/// ```
#[macro_export]
macro_rules! header {
    ($([$(($name:expr, $cat:expr)),* $(,)?]),* $(,)?) => {
        $crate::HeaderGroup::new(vec![
            $($crate::Pin::new(vec![
                $($crate::PinLabelEntry::new($name, $cat)),*
            ])),*
        ])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use indoc::indoc;

    #[derive(Deserialize)]
    struct Tables {
        headers: IndexMap<String, HeaderGroup>,
    }

    #[test]
    fn parse_tables() {
        let t: Tables = build_util::toml_from_str(indoc! {r#"
            [headers]
            lower = [
                [["GND", "gnd"], ["4010 FAN", "doc"]],
                [["VCC", "power"], ["4010 FAN", "doc"]],
            ]
            ac-in = [[["N", "ac"]], [["L", "ac"]]]
        "#})
        .unwrap();

        assert_eq!(
            t.headers["lower"],
            header![
                [("GND", Category::Ground), ("4010 FAN", Category::Doc)],
                [("VCC", Category::Power), ("4010 FAN", Category::Doc)],
            ]
        );
        assert_eq!(t.headers["ac-in"].len(), 2);
        assert_eq!(t.headers["ac-in"].pins[1].rows.len(), 1);
    }

    #[test]
    fn unknown_category_rejected() {
        let r: Result<Tables, _> = build_util::toml_from_str(indoc! {r#"
            [headers]
            bad = [[["X", "sparkle"]]]
        "#});
        assert!(r.is_err());
    }

    #[test]
    fn css_classes_are_distinct() {
        let mut classes: Vec<_> =
            Category::ALL.iter().map(|c| c.css_class()).collect();
        classes.sort();
        classes.dedup();
        assert_eq!(classes.len(), Category::ALL.len());
    }
}
