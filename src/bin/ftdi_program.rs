//! EEPROM identity programmer.
//!
//! Writes a new vendor/product ID to a device's EEPROM, prints the before
//! and after values, and exits non-zero when the read-back does not match.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ftdi_serial::identity::{self, DeviceIdentity, ReprogramReport, UsbEeprom};
use ftdi_serial::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "ftdi-program",
    version,
    about = "Reprogram the EEPROM vendor/product ID of an FTDI USB device."
)]
struct Args {
    /// New vendor ID (hex accepted, e.g. 0x0403).
    #[arg(long, value_parser = parse_id)]
    vid: u16,

    /// New product ID (hex accepted, e.g. 0x6010).
    #[arg(long, value_parser = parse_id)]
    pid: u16,

    /// Open the device currently carrying this vendor ID instead of the
    /// first device with the FTDI default.
    #[arg(long, value_parser = parse_id, requires = "match_pid")]
    match_vid: Option<u16>,

    /// Product ID to match together with --match-vid.
    #[arg(long, value_parser = parse_id, requires = "match_vid")]
    match_pid: Option<u16>,
}

fn parse_id(arg: &str) -> Result<u16, String> {
    let (digits, radix) = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (arg, 10),
    };
    u16::from_str_radix(digits, radix).map_err(|e| format!("not a valid ID {arg:?}: {e}"))
}

fn run(args: &Args) -> Result<ReprogramReport, AppError> {
    let mut device = match (args.match_vid, args.match_pid) {
        (Some(vid), Some(pid)) => UsbEeprom::open_matching(vid, pid)?,
        _ => UsbEeprom::open_first()?,
    };
    let target = DeviceIdentity {
        vendor_id: args.vid,
        product_id: args.pid,
    };
    Ok(identity::reprogram(&mut device, target)?)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let report = match run(&args) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "vid: {:#06x} -> {:#06x}",
        report.old.vendor_id, report.new.vendor_id
    );
    println!(
        "pid: {:#06x} -> {:#06x}",
        report.old.product_id, report.new.product_id
    );

    let target = DeviceIdentity {
        vendor_id: args.vid,
        product_id: args.pid,
    };
    if report.verified(target) {
        println!("done");
        ExitCode::SUCCESS
    } else {
        eprintln!("could not verify new values!");
        ExitCode::FAILURE
    }
}
