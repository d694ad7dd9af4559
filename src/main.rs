//! Main binary for the unit test harness

use clap::Parser;
use std::process;

use runtests::{HarnessConfig, TestHarness};

#[tokio::main]
async fn main() {
    let config = match HarnessConfig::try_parse() {
        Ok(config) => config,
        // clap handles --help/--version through this path too
        Err(e) => e.exit(),
    };

    let harness = match TestHarness::new(config) {
        Ok(harness) => harness,
        Err(e) => {
            eprintln!("Failed to create test harness: {}", e);
            process::exit(1);
        }
    };

    match harness.run().await {
        Ok(report) => {
            report.print_summary();

            if harness.config().verbose {
                report.print_detailed();
            }

            if let Some(path) = &harness.config().report {
                if let Err(e) = report.save_to_file(path) {
                    eprintln!("Failed to write report: {}", e);
                    process::exit(1);
                }
            }

            // Exit non-zero if anything fell short of a full pass
            if !report.success() {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Test run failed: {}", e);
            process::exit(1);
        }
    }
}
