//! Thermometer discovery example
//!
//! Run with: cargo run --example find_thermometer

use btleplug::api::Peripheral as _;
use std::time::Duration;
use tp25_ble::Tp25Scanner;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("Scanning for TP25 thermometers (15s)...\n");

    let scanner = Tp25Scanner::new().await?;
    let peripheral = scanner.find_first(Duration::from_secs(15)).await?;

    let properties = peripheral.properties().await?;

    println!("Found a thermometer:");
    println!("  Address: {}", peripheral.address());
    if let Some(props) = properties {
        if let Some(name) = props.local_name {
            println!("  Name:    {}", name);
        }
        if let Some(rssi) = props.rssi {
            println!("  RSSI:    {} dBm", rssi);
        }
    }

    println!("\nUse this address with Tp25Scanner::find_by_address to connect directly.");

    Ok(())
}
