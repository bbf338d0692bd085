// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! edgepub - OPC UA publisher configuration engine
//!
//! Main binary entry point.

use edgepub_bin::{error::report_error_and_exit, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    if let Err(e) = edgepub_bin::run(cli).await {
        report_error_and_exit(e);
    }
}
