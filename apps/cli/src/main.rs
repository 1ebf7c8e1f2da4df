//! # weft
//!
//! Command line entry point. All logic lives in `weft_cli`.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    weft_cli::run().await
}
