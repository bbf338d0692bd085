// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::error::BinResult;

/// Displays version information.
pub fn version() -> BinResult<()> {
    println!("edgepub - OPC UA publisher configuration engine");
    println!();
    println!("Version Information:");
    println!("  edgepub-bin:    {}", env!("CARGO_PKG_VERSION"));
    println!("  edgepub-core:   {}", edgepub_core::VERSION);
    println!("  edgepub-opcua:  {}", edgepub_opcua::VERSION);
    println!("  edgepub-config: {}", edgepub_config::VERSION);
    println!();
    println!("Build Information:");
    println!("  Target:         {}", std::env::consts::ARCH);
    println!("  OS:             {}", std::env::consts::OS);
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");
    println!("Copyright (c) 2025 Sylvex. All rights reserved.");

    Ok(())
}
