//! Interactive key/value echo demo.
//!
//! Opens a serial port (or the built-in dummy channel), waits for the
//! device's boot banner to settle, then sends each line typed on stdin as
//! a NUM field and prints whatever the device answers.
//!
//! Usage:
//!   cargo run --example echo_number -- [OPTIONS] [PORT]
//!
//! Options:
//!   --header FILE     Read protocol parameters from a shared C header
//!   --dummy           Talk to an in-process dummy channel instead of a port
//!   --help, -h        Show this help
//!
//! Set RUST_LOG=kvlink_core=trace to watch the wire traffic.

use std::io;
use std::sync::Arc;

use kvlink_core::protocol::{list_ports, DummyChannel, ProtocolParams, Sender, SenderConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut port_name: Option<String> = None;
    let mut header: Option<String> = None;
    let mut use_dummy = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--header" => {
                i += 1;
                if i < args.len() {
                    header = Some(args[i].clone());
                }
            }
            "--dummy" => {
                use_dummy = true;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            arg if !arg.starts_with('-') => {
                port_name = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
            }
        }
        i += 1;
    }

    let params = match &header {
        Some(path) => ProtocolParams::from_header(path)?,
        None => ProtocolParams::default(),
    };
    let params = Arc::new(params);
    let config = SenderConfig::default();

    let sender = if use_dummy {
        println!("Using the in-process dummy channel");
        Sender::new(
            Box::new(DummyChannel::new(&params)),
            Arc::clone(&params),
            config,
        )?
    } else {
        let name = match port_name {
            Some(name) => name,
            None => {
                let ports = list_ports();
                if ports.is_empty() {
                    anyhow::bail!("no serial ports found; name one or pass --dummy");
                }
                println!("No port given, using {}", ports[0].name);
                ports[0].name.clone()
            }
        };
        Sender::open(&name, Arc::clone(&params), config)?
    };

    println!("Waiting for the device to finish booting...");
    sender.wait_for_ready()?;
    println!("✓ Device ready (baud {})", sender.params().baud_rate);
    println!("Type a number and press enter; ctrl-d quits.");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let value = line.trim();
        if value.is_empty() {
            continue;
        }
        sender.send(&[("NUM", value.as_bytes())])?;
        sender.read_and_print()?;
    }

    println!("Done.");
    Ok(())
}

fn print_help() {
    println!("Interactive key/value echo demo");
    println!();
    println!("Usage: echo_number [OPTIONS] [PORT]");
    println!();
    println!("Options:");
    println!("  --header FILE     Read protocol parameters from a shared C header");
    println!("  --dummy           Use an in-process dummy channel instead of a port");
    println!("  --help, -h        Show this help");
}
