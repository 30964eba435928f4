// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stamps firmware builds with a version and a build time.
//!
//! The version is whatever `git describe --tags --dirty` says about the
//! working tree, and the build time is the current UTC wall-clock time. The
//! pair is handed to the firmware build in one of three shapes:
//!
//! - a generated C header (`#define BUILD_GIT_VERSION "..."`),
//! - a pair of `-D` preprocessor flags,
//! - `cargo:rustc-env` directives, for use from a `build.rs`.
//!
//! Which shape is used is decided by a [`VersionConfig`], normally read from a
//! small TOML file.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Name of the define carrying the `git describe` output.
pub const VERSION_DEFINE: &str = "BUILD_GIT_VERSION";

/// Name of the define carrying the build timestamp.
pub const TIMESTAMP_DEFINE: &str = "BUILD_TIMESTAMP";

/// `strftime` format of the build timestamp: ISO-8601, UTC, whole seconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Environment variable a build script reads its [`VersionConfig`] from.
pub const CONFIG_VAR: &str = "VERSION_STAMP_CONFIG";

/// The shape in which a [`VersionRecord`] is handed to the build.
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Output {
    /// Overwrite a C header file.
    #[default]
    Header,
    /// Print `-D` build flags, one per line.
    Flags,
    /// Print `cargo:` directives.
    Cargo,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct VersionConfig {
    #[serde(default)]
    pub output: Output,

    /// Where the header goes when `output` is `header`. Relative paths are
    /// resolved against the config file.
    #[serde(default = "default_header_path")]
    pub header_path: PathBuf,

    /// Tag patterns that `git describe` should skip over, e.g. a rolling
    /// `nightly` tag that would otherwise always be the nearest one.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Refuse to stamp a build when `git describe` comes back empty.
    #[serde(default)]
    pub require_tag: bool,
}

fn default_header_path() -> PathBuf {
    PathBuf::from("src/version.h")
}

fn default_exclude() -> Vec<String> {
    vec!["nightly".to_string()]
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            output: Output::default(),
            header_path: default_header_path(),
            exclude: default_exclude(),
            require_tag: false,
        }
    }
}

impl VersionConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut cfg: Self = build_util::toml_from_file(path)?;
        cfg.header_path = build_util::relative_to(path, &cfg.header_path);
        Ok(cfg)
    }

    /// Reads the config from [`CONFIG_VAR`], falling back to defaults when
    /// it isn't set. Intended for build scripts; this prints a
    /// `cargo:rerun-if-env-changed` line.
    pub fn from_env() -> Result<Self> {
        build_util::config_or_default(CONFIG_VAR)
    }
}

/// Runs `git describe` in the current directory. See
/// [`describe_version_in`].
pub fn describe_version(exclude: &[String]) -> Result<String> {
    describe_version_in(Path::new("."), exclude)
}

/// Asks git for the nearest tag reachable from `HEAD` in `dir`, with a
/// `-dirty` suffix when tracked files have uncommitted changes.
///
/// If git runs but fails (no tags, no commits, not a repository), whatever it
/// printed on stdout is returned, which in practice is an empty string.
/// Failing to run git at all is an error.
pub fn describe_version_in(dir: &Path, exclude: &[String]) -> Result<String> {
    let mut cmd = Command::new("git");
    cmd.current_dir(dir).arg("describe").arg("--tags").arg("--dirty");
    for pattern in exclude {
        cmd.arg("--exclude").arg(pattern);
    }
    log::debug!("running {:?}", cmd);

    let out = cmd
        .output()
        .with_context(|| format!("failed to run {:?}", cmd))?;
    if !out.status.success() {
        log::warn!(
            "git describe returned {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

/// Returns the current UTC time, formatted with [`TIMESTAMP_FORMAT`].
pub fn current_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// What a single build gets stamped with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionRecord {
    /// Trimmed `git describe` output; may be empty.
    pub tag_description: String,
    pub timestamp: String,
}

impl VersionRecord {
    pub fn new(
        tag_description: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            tag_description: tag_description.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Captures the version of the repository containing the current
    /// directory.
    pub fn capture(config: &VersionConfig) -> Result<Self> {
        Self::capture_in(Path::new("."), config)
    }

    pub fn capture_in(dir: &Path, config: &VersionConfig) -> Result<Self> {
        let tag_description = describe_version_in(dir, &config.exclude)?;
        if tag_description.is_empty() {
            if config.require_tag {
                bail!(
                    "git describe found no tag in {}, and require-tag is set",
                    dir.display()
                );
            }
            log::warn!("no tag found; stamping an empty version");
        }
        let timestamp = current_timestamp();

        log::info!("Build version: {}", tag_description);
        log::info!("Build date: {}", timestamp);

        Ok(Self {
            tag_description,
            timestamp,
        })
    }

    /// Renders the generated header.
    pub fn header(&self) -> String {
        format!(
            "#pragma once\n\
             #ifndef GIT_VERSION_H\n\
             #define GIT_VERSION_H\n\
             #define {} \"{}\"\n\
             #define {} \"{}\"\n\
             #endif\n",
            VERSION_DEFINE,
            self.tag_description,
            TIMESTAMP_DEFINE,
            self.timestamp,
        )
    }

    /// Truncates and rewrites the header at `path`. There is no attempt to
    /// leave the old file in place if the write fails.
    pub fn write_header(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.header())
            .with_context(|| format!("could not write {}", path.display()))?;
        log::info!("wrote {}", path.display());
        Ok(())
    }

    /// Both values as `-D NAME=\"value\"` preprocessor flags.
    pub fn build_flags(&self) -> [String; 2] {
        [
            define_flag(VERSION_DEFINE, &self.tag_description),
            define_flag(TIMESTAMP_DEFINE, &self.timestamp),
        ]
    }

    /// Appends [`build_flags`](Self::build_flags) to a flag list owned by
    /// the surrounding build.
    pub fn append_build_flags(&self, flags: &mut Vec<String>) {
        flags.extend(self.build_flags());
    }

    /// Directives for a `build.rs`: both values as compile-time environment
    /// variables, and a request to re-run whenever `git_dir` moves.
    pub fn cargo_directives(&self, git_dir: &Path) -> Vec<String> {
        let env = |name: &str, value: &str| {
            format!("cargo:rustc-env={name}={value}")
        };
        let rerun = |path: PathBuf| {
            format!("cargo:rerun-if-changed={}", path.display())
        };
        vec![
            env(VERSION_DEFINE, &self.tag_description),
            env(TIMESTAMP_DEFINE, &self.timestamp),
            rerun(git_dir.join("HEAD")),
            rerun(git_dir.join("refs")),
        ]
    }

    /// Hands the record to the build in the shape `config` asks for.
    pub fn emit(&self, config: &VersionConfig) -> Result<()> {
        match config.output {
            Output::Header => self.write_header(&config.header_path)?,
            Output::Flags => {
                for flag in self.build_flags() {
                    println!("{}", flag);
                }
            }
            Output::Cargo => {
                for line in self.cargo_directives(Path::new(".git")) {
                    println!("{}", line);
                }
            }
        }
        Ok(())
    }
}

fn define_flag(name: &str, value: &str) -> String {
    format!("-D {}=\\\"{}\\\"", name, value)
}

/// Reads a generated header back into a [`VersionRecord`].
pub fn parse_header(text: &str) -> Result<VersionRecord> {
    let re = Regex::new(r#"(?m)^#define\s+(\w+)\s+"(.*)"\s*$"#)?;
    let defines: BTreeMap<&str, &str> = re
        .captures_iter(text)
        .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
        .collect();

    let get = |name: &str| -> Result<String> {
        match defines.get(name) {
            Some(v) => Ok(v.to_string()),
            None => bail!("header has no {} define", name),
        }
    };
    Ok(VersionRecord {
        tag_description: get(VERSION_DEFINE)?,
        timestamp: get(TIMESTAMP_DEFINE)?,
    })
}

/// Stamps the crate whose `build.rs` calls this, printing `cargo:` directives
/// so the values show up as `env!("BUILD_GIT_VERSION")` and
/// `env!("BUILD_TIMESTAMP")`. `git_dir` is the repository's `.git` directory
/// relative to the calling crate.
pub fn stamp_build_script(git_dir: &Path) -> Result<VersionRecord> {
    let config = VersionConfig::from_env()?;
    let record = VersionRecord::capture(&config)?;
    for line in record.cargo_directives(git_dir) {
        println!("{}", line);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use indoc::indoc;

    fn have_git() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .current_dir(dir)
            .args([
                "-c",
                "user.name=Test",
                "-c",
                "user.email=test@example.com",
                "-c",
                "commit.gpgsign=false",
                "-c",
                "tag.gpgsign=false",
            ])
            .args(args)
            .output()
            .unwrap()
            .status;
        assert!(status.success(), "git {:?} failed", args);
    }

    /// A repository with one commit tracking `file.txt`.
    fn repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init", "-q"]);
        std::fs::write(dir.path().join("file.txt"), "one\n").unwrap();
        git(dir.path(), &["add", "file.txt"]);
        git(dir.path(), &["commit", "-q", "-m", "first"]);
        dir
    }

    #[test]
    fn header_format() {
        let r = VersionRecord::new("v1.2.3", "2024-01-01T00:00:00Z");
        assert_eq!(
            r.header(),
            indoc! {r#"
                #pragma once
                #ifndef GIT_VERSION_H
                #define GIT_VERSION_H
                #define BUILD_GIT_VERSION "v1.2.3"
                #define BUILD_TIMESTAMP "2024-01-01T00:00:00Z"
                #endif
            "#}
        );
    }

    #[test]
    fn header_round_trip() {
        let r = VersionRecord::new(
            "v1.2.3-4-gdeadbee-dirty",
            "2024-01-01T00:00:00Z",
        );
        assert_eq!(parse_header(&r.header()).unwrap(), r);

        let empty = VersionRecord::new("", "2024-01-01T00:00:00Z");
        assert_eq!(parse_header(&empty.header()).unwrap(), empty);
    }

    #[test]
    fn header_missing_define() {
        let err = parse_header(indoc! {r#"
            #pragma once
            #define BUILD_GIT_VERSION "v1.0"
        "#})
        .unwrap_err();
        assert!(err.to_string().contains("BUILD_TIMESTAMP"));
    }

    #[test]
    fn write_header_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("version.h");
        std::fs::write(&path, "x".repeat(4096)).unwrap();

        let r = VersionRecord::new("v2.0", "2024-01-01T00:00:00Z");
        r.write_header(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r.header());
    }

    #[test]
    fn flags() {
        let r = VersionRecord::new("v1.2.3", "2024-01-01T00:00:00Z");
        let mut flags = vec!["-Os".to_string()];
        r.append_build_flags(&mut flags);
        assert_eq!(
            flags,
            vec![
                "-Os".to_string(),
                r#"-D BUILD_GIT_VERSION=\"v1.2.3\""#.to_string(),
                r#"-D BUILD_TIMESTAMP=\"2024-01-01T00:00:00Z\""#.to_string(),
            ]
        );
    }

    #[test]
    fn cargo_directives() {
        let r = VersionRecord::new("v1.2.3", "2024-01-01T00:00:00Z");
        let lines = r.cargo_directives(Path::new("../../.git"));
        assert_eq!(lines[0], "cargo:rustc-env=BUILD_GIT_VERSION=v1.2.3");
        assert_eq!(
            lines[1],
            "cargo:rustc-env=BUILD_TIMESTAMP=2024-01-01T00:00:00Z"
        );
        assert_eq!(lines[2], "cargo:rerun-if-changed=../../.git/HEAD");
        assert_eq!(lines[3], "cargo:rerun-if-changed=../../.git/refs");
    }

    #[test]
    fn timestamp_pattern() {
        let re = Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$").unwrap();
        assert!(re.is_match(&current_timestamp()));

        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(t), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn config_defaults() {
        let cfg: VersionConfig = build_util::toml_from_str("").unwrap();
        assert_eq!(cfg, VersionConfig::default());
        assert_eq!(cfg.exclude, vec!["nightly".to_string()]);
        assert_eq!(cfg.output, Output::Header);
    }

    #[test]
    fn config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("version.toml");
        std::fs::write(
            &path,
            indoc! {r#"
                output = "flags"
                header-path = "gen/version.h"
                exclude = ["nightly", "rc-*"]
                require-tag = true
            "#},
        )
        .unwrap();

        let cfg = VersionConfig::from_file(&path).unwrap();
        assert_eq!(cfg.output, Output::Flags);
        assert_eq!(cfg.header_path, dir.path().join("gen/version.h"));
        assert_eq!(cfg.exclude.len(), 2);
        assert!(cfg.require_tag);
    }

    #[test]
    fn config_rejects_unknown_keys() {
        assert!(build_util::toml_from_str::<VersionConfig>("ouptut = \"flags\"")
            .is_err());
    }

    #[test]
    fn describe_tagged() {
        if !have_git() {
            return;
        }
        let dir = repo();
        git(dir.path(), &["tag", "v1.2.3"]);
        assert_eq!(describe_version_in(dir.path(), &[]).unwrap(), "v1.2.3");

        std::fs::write(dir.path().join("file.txt"), "two\n").unwrap();
        assert_eq!(
            describe_version_in(dir.path(), &[]).unwrap(),
            "v1.2.3-dirty"
        );
    }

    #[test]
    fn describe_skips_excluded() {
        if !have_git() {
            return;
        }
        let dir = repo();
        git(dir.path(), &["tag", "v1.0.0"]);
        git(dir.path(), &["commit", "-q", "--allow-empty", "-m", "second"]);
        git(dir.path(), &["tag", "nightly"]);

        let all = describe_version_in(dir.path(), &[]).unwrap();
        assert_eq!(all, "nightly");

        let skipped =
            describe_version_in(dir.path(), &["nightly".to_string()]).unwrap();
        assert!(skipped.starts_with("v1.0.0-1-g"), "got {skipped}");
    }

    #[test]
    fn describe_without_tags_is_empty() {
        if !have_git() {
            return;
        }
        let dir = repo();
        assert_eq!(describe_version_in(dir.path(), &[]).unwrap(), "");

        let cfg = VersionConfig::default();
        let r = VersionRecord::capture_in(dir.path(), &cfg).unwrap();
        assert_eq!(r.tag_description, "");
    }

    #[test]
    fn require_tag_rejects_empty() {
        if !have_git() {
            return;
        }
        let dir = repo();
        let cfg = VersionConfig {
            require_tag: true,
            ..VersionConfig::default()
        };
        assert!(VersionRecord::capture_in(dir.path(), &cfg).is_err());
    }

    #[test]
    fn stamping_is_stable() {
        if !have_git() {
            return;
        }
        let dir = repo();
        git(dir.path(), &["tag", "v3.1.4"]);
        let cfg = VersionConfig::default();

        let a = VersionRecord::capture_in(dir.path(), &cfg).unwrap();
        let b = VersionRecord::capture_in(dir.path(), &cfg).unwrap();
        assert_eq!(a.tag_description, b.tag_description);

        // Only the timestamp line may differ.
        let a = VersionRecord::new(a.tag_description, "T");
        let b = VersionRecord::new(b.tag_description, "T");
        assert_eq!(a.header(), b.header());
    }
}
