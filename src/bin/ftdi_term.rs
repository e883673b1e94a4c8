//! Terminal readback test.
//!
//! Opens the adapter on a device and echoes every non-empty line it
//! receives. Useful for checking that a board's TX path is alive.

use std::io::{BufRead, BufReader, ErrorKind};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ftdi_serial::{AppError, FtdiSerial, SerialConfig};

#[derive(Parser, Debug)]
#[command(
    name = "ftdi-term",
    version,
    about = "Terminal readback test for FTDI USB-serial devices."
)]
struct Args {
    /// Serial device to open (first available device when omitted).
    port: Option<String>,

    /// Line speed in baud.
    #[arg(short, long, default_value_t = 115_200)]
    baud: u32,
}

fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let config = SerialConfig {
        baud_rate: args.baud,
        ..Default::default()
    };
    let serial = FtdiSerial::open(args.port.as_deref(), config)?;
    eprintln!("opened {} at {} baud", serial.name(), args.baud);

    let mut reader = BufReader::new(serial);
    loop {
        let mut line = Vec::new();
        // Raw bytes, rendered lossily: a line with a garbage byte still
        // prints instead of being dropped.
        match reader.read_until(b'\n', &mut line) {
            Ok(_) => {
                if let Some(text) = render_line(&line) {
                    println!("{text}");
                }
            }
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                // Nothing received yet; keep listening.
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Trimmed, lossily decoded text of a received line, or `None` when
/// nothing printable remains.
fn render_line(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}
