// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

mod pinout;
mod version;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BUILD_GIT_VERSION"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Debug, Parser)]
#[clap(
    max_term_width = 80,
    version = VERSION,
    about = "build-time helpers for the board and its firmware"
)]
enum Xtask {
    /// Stamps the firmware build with the nearest git tag and the current
    /// time, as a C header, as `-D` flags, or as cargo directives.
    Version {
        /// Path to the version configuration file, in TOML.
        #[clap(long)]
        config: Option<PathBuf>,

        /// Write the header to this path, overriding the configuration.
        #[clap(long, conflicts_with_all = &["flags", "cargo"])]
        header: Option<PathBuf>,

        /// Print `-D` build flags, one per line, instead of writing a
        /// header.
        #[clap(long, conflicts_with = "cargo")]
        flags: bool,

        /// Print `cargo:rustc-env` directives instead of writing a header.
        #[clap(long)]
        cargo: bool,

        /// Skip tags matching this pattern. May be repeated; replaces the
        /// configured list.
        #[clap(long)]
        exclude: Vec<String>,

        /// Fail if git finds no tag, rather than stamping an empty version.
        #[clap(long)]
        require_tag: bool,

        /// Read the header back after writing it and make sure it matches.
        #[clap(long)]
        check: bool,
    },

    /// Renders a board's pinout diagram to SVG.
    Pinout {
        /// Path to a board file, in TOML.
        #[clap(long, conflicts_with = "revision")]
        board: Option<PathBuf>,

        /// Name of a built-in board revision.
        #[clap(long)]
        revision: Option<String>,

        /// Where to write the SVG; defaults to `<id>.svg`.
        #[clap(short, long)]
        out: Option<PathBuf>,

        /// List the built-in board revisions and exit.
        #[clap(long)]
        list_revisions: bool,
    },
}

fn main() -> Result<()> {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");

    env_logger::init_from_env(env);

    let xtask = Xtask::parse();

    match xtask {
        Xtask::Version {
            config,
            header,
            flags,
            cargo,
            exclude,
            require_tag,
            check,
        } => {
            let overrides = version::Overrides {
                header,
                flags,
                cargo,
                exclude,
                require_tag,
            };
            version::run(config.as_deref(), overrides, check)?;
        }
        Xtask::Pinout {
            board,
            revision,
            out,
            list_revisions,
        } => {
            if list_revisions {
                pinout::list();
            } else {
                pinout::run(
                    board.as_deref(),
                    revision.as_deref(),
                    out.as_deref(),
                )?;
            }
        }
    }

    Ok(())
}
