//! Integration test cases.

use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use btleplug::api::CharPropFlags;
use colored::Colorize;

use crate::ble_client::LbsClient;

/// How long to wait for a hand-pressed button
const BUTTON_PRESS_WAIT: Duration = Duration::from_secs(15);

/// Settle time after a disconnect before rescanning
const RECYCLE_WAIT: Duration = Duration::from_millis(500);

/// Test result.
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub message: Option<String>,
}

/// Options that change which tests run.
pub struct TestOptions {
    pub scan_timeout: Duration,
    pub interactive: bool,
}

fn begin(name: &str) {
    print!("  {} ... ", name);
    std::io::Write::flush(&mut std::io::stdout()).ok();
}

fn finish(name: &str, outcome: Result<()>) -> TestResult {
    let result = match outcome {
        Ok(()) => TestResult {
            name: name.to_string(),
            passed: true,
            message: None,
        },
        Err(e) => TestResult {
            name: name.to_string(),
            passed: false,
            message: Some(e.to_string()),
        },
    };

    if result.passed {
        println!("{}", "PASS".green().bold());
    } else {
        println!("{}", "FAIL".red().bold());
        if let Some(msg) = &result.message {
            println!("    {}", msg.red());
        }
    }

    result
}

/// Run all tests and return results.
pub async fn run_all_tests(client: &mut LbsClient, options: &TestOptions) -> Vec<TestResult> {
    let mut results = Vec::new();

    macro_rules! run_test {
        ($name:expr, $test:expr) => {{
            begin($name);
            let outcome = $test.await;
            results.push(finish($name, outcome));
        }};
    }

    run_test!("Characteristic properties match the service", test_properties(client));
    run_test!("LED accepts 0x01 and 0x00", test_led_write_valid(client));
    run_test!("LED rejects values other than 0/1", test_led_write_bad_value(client));
    run_test!("LED rejects wrong lengths", test_led_write_bad_length(client));
    run_test!("Button read returns one boolean byte", test_button_read(client));
    run_test!("Button notifications can be toggled", test_button_subscribe(client));
    if options.interactive {
        run_test!("Button press is notified", test_button_press_notified(client));
    }
    run_test!(
        "Device advertises again after disconnect",
        test_reconnect(client, options.scan_timeout)
    );
    run_test!("LED works after reconnect", test_led_write_valid(client));

    results
}

/// Print test results summary.
pub fn print_results(results: &[TestResult]) {
    println!("\n{}", "=".repeat(60));
    println!("{}", "Test Results".bold());
    println!("{}", "=".repeat(60));

    let mut passed = 0;
    let mut failed = 0;

    for result in results {
        if result.passed {
            println!("  {} {}", "[PASS]".green().bold(), result.name);
            passed += 1;
        } else {
            println!("  {} {}", "[FAIL]".red().bold(), result.name);
            if let Some(msg) = &result.message {
                println!("         {}", msg.red());
            }
            failed += 1;
        }
    }

    println!("{}", "-".repeat(60));
    println!(
        "  Total: {} passed, {} failed",
        passed.to_string().green(),
        if failed > 0 {
            failed.to_string().red()
        } else {
            failed.to_string().normal()
        }
    );
    println!("{}", "=".repeat(60));
}

// --- Individual Tests ---

async fn test_properties(client: &mut LbsClient) -> Result<()> {
    let button = client.button_properties();
    if !button.contains(CharPropFlags::READ | CharPropFlags::NOTIFY) {
        bail!("Button properties {:?}, expected READ | NOTIFY", button);
    }
    if button.contains(CharPropFlags::WRITE) {
        bail!("Button must not be writable");
    }

    let led = client.led_properties();
    if !led.contains(CharPropFlags::WRITE) {
        bail!("LED properties {:?}, expected WRITE", led);
    }
    if led.contains(CharPropFlags::READ) {
        bail!("LED must not be readable");
    }
    Ok(())
}

async fn test_led_write_valid(client: &mut LbsClient) -> Result<()> {
    client.set_led(true).await?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    client.set_led(false).await?;
    Ok(())
}

async fn test_led_write_bad_value(client: &mut LbsClient) -> Result<()> {
    for value in [0x02u8, 0x7F, 0xFF] {
        if client.write_led_raw(&[value]).await.is_ok() {
            bail!("Write of 0x{:02x} was accepted", value);
        }
    }
    Ok(())
}

async fn test_led_write_bad_length(client: &mut LbsClient) -> Result<()> {
    if client.write_led_raw(&[0x01, 0x00]).await.is_ok() {
        bail!("Two-byte write was accepted");
    }
    if client.write_led_raw(&[]).await.is_ok() {
        bail!("Empty write was accepted");
    }
    Ok(())
}

async fn test_button_read(client: &mut LbsClient) -> Result<()> {
    let value = client.read_button_raw().await?;
    match value.as_slice() {
        [0x00] | [0x01] => {
            print!("({}) ", if value[0] == 1 { "pressed" } else { "released" });
            Ok(())
        }
        other => Err(anyhow!("Expected one byte 0x00/0x01, got {:02x?}", other)),
    }
}

async fn test_button_subscribe(client: &mut LbsClient) -> Result<()> {
    client.subscribe_button().await?;
    client.unsubscribe_button().await?;
    if !client.is_connected().await? {
        bail!("Connection dropped while toggling notifications");
    }
    Ok(())
}

async fn test_button_press_notified(client: &mut LbsClient) -> Result<()> {
    client.subscribe_button().await?;
    println!();
    println!("    {}", "Press the button on the device...".yellow());

    let value = client.wait_for_button(BUTTON_PRESS_WAIT).await?;
    client.unsubscribe_button().await?;

    match value.as_deref() {
        Some([0x01]) | Some([0x00]) => Ok(()),
        Some(other) => Err(anyhow!("Unexpected notification payload {:02x?}", other)),
        None => Err(anyhow!("No notification within {:?}", BUTTON_PRESS_WAIT)),
    }
}

async fn test_reconnect(client: &mut LbsClient, scan_timeout: Duration) -> Result<()> {
    tokio::time::sleep(RECYCLE_WAIT).await;
    client.reconnect(scan_timeout).await?;
    if !client.is_connected().await? {
        bail!("Not connected after reconnect");
    }
    Ok(())
}
