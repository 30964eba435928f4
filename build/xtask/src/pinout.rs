// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use anyhow::{bail, Context, Result};
use build_pinout::BoardConfig;

pub fn run(
    board: Option<&Path>,
    revision: Option<&str>,
    out: Option<&Path>,
) -> Result<()> {
    let board = load(board, revision)?;
    let diagram = board
        .diagram()
        .with_context(|| format!("could not lay out board {}", board.name))?;
    let path = diagram.write(out)?;
    println!("{}", path.display());
    Ok(())
}

pub fn list() {
    for name in build_pinout::builtin_names() {
        println!("{}", name);
    }
}

fn load(board: Option<&Path>, revision: Option<&str>) -> Result<BoardConfig> {
    match (board, revision) {
        (Some(path), None) => BoardConfig::from_file(path)
            .context("could not load board configuration"),
        (None, Some(name)) => BoardConfig::builtin(name),
        (Some(_), Some(_)) => {
            bail!("give either --board or --revision, not both")
        }
        (None, None) => bail!(
            "no board given; pass --board FILE or --revision NAME \
             (see --list-revisions)"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_exactly_one_board() {
        assert!(load(None, None).is_err());
        let board = Path::new("board.toml");
        assert!(load(Some(board), Some("gm-standard-rev1")).is_err());

        let builtin = load(None, Some("gm-standard-rev1")).unwrap();
        assert_eq!(builtin.name, "gm-standard-rev1");
    }

    #[test]
    fn renders_builtin_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("pinout.svg");
        run(None, Some("gm-standard-rev2"), Some(out.as_path())).unwrap();

        let svg = std::fs::read_to_string(&out).unwrap();
        assert!(svg.contains(r#"id="diagram""#));
        assert!(svg.contains(">gpio43</text>"));
        assert!(svg.contains(">BOOT</text>"));
    }
}
