// SPDX-License-Identifier: MPL-2.0

//! Test program: Watch a pergola roof's live state.
//!
//! Connects to the device, prints the initial snapshot, then streams every
//! state merge (push events and 30-second polls alike) to stdout for five
//! minutes.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example roof_monitor -- <host> <password> [port]
//! ```
//!
//! # Example
//!
//! ```bash
//! cargo run --example roof_monitor -- 192.168.1.100 mypassword
//! ```

use std::env;
use std::time::Duration;

use pergor_lib::PergolaDevice;
use pergor_lib::state::{RoofState, UpdateSource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <host> <password> [port]", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --example roof_monitor -- 192.168.1.100 mypassword");
        std::process::exit(1);
    }

    let host = &args[1];
    let password = &args[2];

    let mut builder = PergolaDevice::builder(host).with_password(password);
    if let Some(port) = args.get(3) {
        builder = builder.with_port(port.parse()?);
    }

    println!("Connecting to {host}...");

    let (device, initial_state) = builder.connect().await?;

    println!("Connected!");
    print_state(&initial_state, "initial");
    println!();
    println!("Watching state changes for 5 minutes (Ctrl+C to exit)...");
    println!();

    device.on_state_changed(|state| {
        let source = match state.source() {
            Some(UpdateSource::Push) => "push",
            Some(UpdateSource::Rest) => "poll",
            None => "?",
        };
        print_state(state, source);
    });

    device.on_refresh_failed(|error| {
        println!("[poll] refresh failed, keeping last known state: {error}");
    });

    tokio::time::sleep(Duration::from_secs(300)).await;

    println!();
    println!("Shutting down...");
    device.shutdown().await;

    Ok(())
}

fn print_state(state: &RoofState, source: &str) {
    let stack = state
        .stack()
        .map_or_else(|| "?".to_owned(), |value| format!("{value:.0}%"));
    let tilt = state
        .tilt()
        .map_or_else(|| "?".to_owned(), |value| format!("{value:.1}°"));

    print!(
        "[{source}] state={} stack={stack} tilt={tilt}",
        state.state().unwrap_or("?")
    );

    if let Some(locked) = state.locked() {
        print!(" locked={locked}");
    }
    if let Some(device) = state.roof_device() {
        print!(" drive={}/{}", device.state, device.direction);
    }
    if let Some(weather) = state.weather_state() {
        print!(" weather={weather}");
    }
    println!();
}
