// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use build_version::{parse_header, Output, VersionConfig, VersionRecord};

/// Command-line settings that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub header: Option<PathBuf>,
    pub flags: bool,
    pub cargo: bool,
    pub exclude: Vec<String>,
    pub require_tag: bool,
}

pub fn run(
    config: Option<&Path>,
    overrides: Overrides,
    check: bool,
) -> Result<()> {
    let cfg = configure(config, overrides)?;

    let record = VersionRecord::capture(&cfg)?;
    record.emit(&cfg)?;

    if check {
        check_header(&cfg, &record)?;
    }
    Ok(())
}

fn configure(
    config: Option<&Path>,
    overrides: Overrides,
) -> Result<VersionConfig> {
    let mut cfg = match config {
        Some(path) => VersionConfig::from_file(path)
            .context("could not load version configuration")?,
        None => VersionConfig::default(),
    };

    if let Some(path) = overrides.header {
        cfg.output = Output::Header;
        cfg.header_path = path;
    } else if overrides.flags {
        cfg.output = Output::Flags;
    } else if overrides.cargo {
        cfg.output = Output::Cargo;
    }
    if !overrides.exclude.is_empty() {
        cfg.exclude = overrides.exclude;
    }
    cfg.require_tag |= overrides.require_tag;

    Ok(cfg)
}

fn check_header(cfg: &VersionConfig, record: &VersionRecord) -> Result<()> {
    if cfg.output != Output::Header {
        bail!("--check only applies when writing a header");
    }
    let text = std::fs::read_to_string(&cfg.header_path).with_context(|| {
        format!("could not read back {}", cfg.header_path.display())
    })?;
    let written = parse_header(&text).with_context(|| {
        format!("could not parse {}", cfg.header_path.display())
    })?;
    if &written != record {
        bail!(
            "{} holds {:?}, expected {:?}",
            cfg.header_path.display(),
            written,
            record
        );
    }
    log::info!("{} checks out", cfg.header_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn defaults_without_config() {
        let cfg = configure(None, Overrides::default()).unwrap();
        assert_eq!(cfg, VersionConfig::default());
    }

    #[test]
    fn overrides_beat_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("version.toml");
        std::fs::write(
            &path,
            indoc! {r#"
                output = "cargo"
                exclude = ["nightly"]
            "#},
        )
        .unwrap();

        let cfg =
            configure(Some(path.as_path()), Overrides::default()).unwrap();
        assert_eq!(cfg.output, Output::Cargo);

        let cfg = configure(
            Some(path.as_path()),
            Overrides {
                flags: true,
                exclude: vec!["rc-*".to_string()],
                require_tag: true,
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(cfg.output, Output::Flags);
        assert_eq!(cfg.exclude, vec!["rc-*".to_string()]);
        assert!(cfg.require_tag);

        let cfg = configure(
            Some(path.as_path()),
            Overrides {
                header: Some(PathBuf::from("out/version.h")),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(cfg.output, Output::Header);
        assert_eq!(cfg.header_path, PathBuf::from("out/version.h"));
    }

    #[test]
    fn check_catches_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = VersionConfig {
            header_path: dir.path().join("version.h"),
            ..VersionConfig::default()
        };
        let record = VersionRecord::new("v1.2.3", "2024-01-01T00:00:00Z");
        record.write_header(&cfg.header_path).unwrap();
        check_header(&cfg, &record).unwrap();

        let other = VersionRecord::new("v1.2.4", "2024-01-01T00:00:00Z");
        assert!(check_header(&cfg, &other).is_err());

        let flags = VersionConfig {
            output: Output::Flags,
            ..cfg
        };
        assert!(check_header(&flags, &record).is_err());
    }
}
