//! Real-time temperature monitoring example
//!
//! Run with: cargo run --example temperature_monitor

use std::time::Duration;
use tp25_ble::{Tp25Client, Tp25Scanner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (minimal)
    tracing_subscriber::fmt().with_env_filter("warn").init();

    println!("TP25 Temperature Monitor");
    println!("========================\n");
    println!("Looking for a thermometer...\n");

    let scanner = Tp25Scanner::new().await?;
    let peripheral = scanner.find_first(Duration::from_secs(15)).await?;

    let client = Tp25Client::new(peripheral);

    client.set_callback(|readings| {
        // Clear screen and move cursor to top
        print!("\x1B[2J\x1B[1;1H");

        println!("=== TP25 Temperature Monitor ===\n");

        for probe in 0..tp25_ble::NUM_PROBES {
            match (readings.celsius(probe), readings.fahrenheit(probe)) {
                (Some(c), Some(f)) => {
                    println!("  Probe {}: {:4}°C ({:6.1}°F)", probe + 1, c, f)
                }
                _ => println!("  Probe {}: not connected", probe + 1),
            }
        }

        if let Some(battery) = readings.battery {
            println!("\nBattery: {}", battery);
        }

        println!("\nPress Ctrl+C to exit");
    });

    println!("Connecting...");
    client.connect().await?;
    println!("Connected! Waiting for readings...");

    tokio::signal::ctrl_c().await?;

    println!("\nExiting...");
    client.disconnect().await?;

    Ok(())
}
