// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

fn main() {
    // `xtask --version` names the tree it was built from. Without git we
    // still build, with an empty version.
    if let Err(e) = build_version::stamp_build_script(Path::new("../../.git")) {
        println!("cargo:warning=could not stamp version: {e:#}");
        println!("cargo:rustc-env=BUILD_GIT_VERSION=");
        println!(
            "cargo:rustc-env=BUILD_TIMESTAMP={}",
            build_version::current_timestamp()
        );
    }
}
