//! Cardiovascular risk CLI
//!
//! # Usage
//!
//! ```bash
//! # Start the web form and JSON API
//! cardio-risk --config cardio.toml serve --port 8080
//!
//! # Assess one record
//! cardio-risk assess --gender 1 --age-years 58 --bmi 31.2 --pulse-pressure 55 \
//!     --mean-arterial-pressure 104 --systolic-diastolic-ratio 1.6 \
//!     --cholesterol 2 --glucose 1 --smoker 0 --alcohol 0 --physically-active 0
//!
//! # Contributing factors only, from a file
//! cardio-risk explain --input record.yaml --format json
//!
//! # Download and verify the model artifacts
//! cardio-risk fetch
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success; for `assess`, not at risk
//! - 1: `assess` only, at risk
//! - 3: Invalid input, arguments or configuration
//! - 4: File not found or inaccessible
//! - 5: Model artifacts missing, corrupt or incompatible
//! - 10: Internal error

use cardio_risk_api::{run_cli, RiskCli};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = RiskCli::parse();

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}
