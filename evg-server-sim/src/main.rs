//! # Soft EVG Server
//!
//! Serves a software VME-EVG-230/RF register bank over UDP, for driving the
//! client library without hardware on the network.
use std::error::Error;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use env_logger::Env;
use evg_server::server::Builder;
use evg_server_sim::SoftEvg;

#[derive(Parser)]
#[command(about = "Software VME-EVG-230/RF register bank served over UDP", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "2000")]
    port: u16,

    #[arg(short, long, default_value = "127.0.0.1")]
    ip: IpAddr,

    #[arg(long, help = "The firmware word reported by the bank", value_parser = parse_firmware)]
    firmware: Option<u16>,

    #[arg(long, default_value = "0", help = "Swallow the first n replies")]
    drop_first: u32,

    #[arg(long, help = "Delay every reply by this many milliseconds")]
    reply_delay_ms: Option<u64>,
}

fn parse_firmware(value: &str) -> Result<u16, String> {
    let digits = value.trim_start_matches("0x");
    u16::from_str_radix(digits, 16).map_err(|error| error.to_string())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    log::info!("Starting soft EVG server");

    let args = Args::parse();
    log::debug!("Parsed arguments: ip={}, port={}", args.ip, args.port);

    let bank = match args.firmware {
        Some(firmware) => SoftEvg::with_firmware(firmware),
        None => SoftEvg::new(),
    };

    let mut builder = Builder::new().drop_first(args.drop_first);
    if let Some(delay) = args.reply_delay_ms {
        builder = builder.reply_delay(Duration::from_millis(delay));
    }
    let mut server = builder.build(bank);

    let addr = SocketAddr::new(args.ip, args.port);
    log::info!("Binding to address: {}", addr);
    server.listen(addr)?;
    Ok(())
}
