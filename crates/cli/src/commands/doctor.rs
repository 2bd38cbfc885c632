// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sf doctor` - health checks against the daemon and workspace layout.

use crate::client::DaemonClient;
use crate::exit_error::ExitError;

pub async fn run() -> Result<(), ExitError> {
    let mut healthy = true;

    print!("workspace layout (.stoneforge/): ");
    if std::path::Path::new(".stoneforge").is_dir() {
        println!("ok");
    } else {
        healthy = false;
        println!("missing (run `sf init`)");
    }

    print!("daemon reachable: ");
    match DaemonClient::connect().await {
        Ok(mut client) => match client.hello().await {
            Ok(version) => println!("ok (stoneforged {version})"),
            Err(error) => {
                healthy = false;
                println!("no ({error})");
            }
        },
        Err(error) => {
            healthy = false;
            println!("no ({error})");
        }
    }

    if healthy {
        Ok(())
    } else {
        Err(ExitError::new(1, "one or more checks failed"))
    }
}
