//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
fn main() {
    // ua.rs is included by error.rs: USER_AGENT is sent on every Data API
    // request, SDK_VERSION is appended to FMError messages
    let out_dir = std::env::var_os("OUT_DIR").expect("cargo sets OUT_DIR");
    let version = env!("CARGO_PKG_VERSION");
    let ua = format!(
        "FileMaker-RustSDK/{} (rust{}; {}/{})",
        version,
        rustc_version::version().expect("rustc version"),
        std::env::consts::ARCH,
        std::env::consts::OS
    );
    let code = format!(
        "const USER_AGENT: &str = \"{}\";\nconst SDK_VERSION: &str = \"{}\";\n",
        ua, version
    );
    let dest_path = std::path::Path::new(&out_dir).join("ua.rs");
    std::fs::write(&dest_path, &code).expect("write ua.rs");
    println!("cargo::rerun-if-changed=build.rs");
}
