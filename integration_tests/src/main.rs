//! Integration tests for the LED Button Service firmware.
//!
//! Run after flashing the firmware. Connects over BLE from the host adapter.

mod ble_client;
mod tests;

use std::time::Duration;

use clap::Parser;
use colored::Colorize;

use ble_client::LbsClient;
use tests::{print_results, run_all_tests, TestOptions};

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Integration tests for the LED Button Service firmware")]
struct Args {
    /// Advertised device name
    #[arg(short, long, default_value = "MY_LBS1")]
    name: String,

    /// BLE scan timeout in seconds
    #[arg(long, default_value = "10")]
    scan_timeout: u64,

    /// Also run tests that need the button pressed by hand
    #[arg(short, long)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let scan_timeout = Duration::from_secs(args.scan_timeout);

    println!("{}", "LED Button Service Integration Tests".bold());
    println!("Device: \"{}\"", args.name);
    println!();

    println!("Scanning for BLE device \"{}\"...", args.name);
    let mut client = LbsClient::connect_by_name(&args.name, scan_timeout).await?;
    println!("{}", "Connected!".green());

    println!("\nRunning tests...\n");

    let options = TestOptions {
        scan_timeout,
        interactive: args.interactive,
    };
    let results = run_all_tests(&mut client, &options).await;
    print_results(&results);

    let _ = client.disconnect().await;

    // Exit with error code if any tests failed
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
