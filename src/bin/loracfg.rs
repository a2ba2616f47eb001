//! Command-line front end for module register configuration.
//!
//! ```bash
//! loracfg --port /dev/ttyS0 get
//! loracfg --port /dev/ttyS0 set channel 65
//! loracfg --port /dev/ttyS0 set speed --baud 9600 --air-rate 2.4k
//! ```

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use loracfg::{
    AirDataRate, Channel, Error, OptionConfig, PacketSize, Parity, RadioConfigurator, Register,
    RegisterValue, Result, SerialTransport, SpeedConfig, TxPower, UartBaud, WriteOutcome,
    list_ports,
};
use tracing_subscriber::EnvFilter;

const CONFIG_MODE_NOTICE: &str = "note: the module only answers in configuration mode; \
set the M0/M1 jumpers accordingly and power-cycle it before running this command";

#[derive(Parser)]
#[command(name = "loracfg")]
#[command(about = "Read and write LoRa module configuration registers", long_about = None)]
struct Cli {
    /// Serial port the module is attached to
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// Reply timeout in milliseconds
    #[arg(long, default_value_t = 2000, global = true)]
    timeout_ms: u64,

    /// Fail when the module confirms a different value than requested
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List serial ports
    Ports,

    /// Read one register, or all of them
    Get {
        /// channel, speed or option
        register: Option<Register>,
    },

    /// Write a register and print the value before and after
    Set {
        #[command(subcommand)]
        target: SetTarget,
    },
}

#[derive(Subcommand)]
enum SetTarget {
    /// Operating channel
    Channel { channel: Channel },

    /// Speed register; omitted fields keep their current value
    Speed {
        /// UART baud rate (1200..115200)
        #[arg(long)]
        baud: Option<UartBaud>,
        /// UART parity (8N1, 8O1, 8E1)
        #[arg(long)]
        parity: Option<Parity>,
        /// Air data rate (0.3k..62.5k)
        #[arg(long)]
        air_rate: Option<AirDataRate>,
    },

    /// Option register; omitted fields keep their current value
    #[command(name = "option")]
    Options {
        /// Sub-packet size in bytes (240, 128, 64, 32)
        #[arg(long)]
        packet_size: Option<PacketSize>,
        /// Transmit power in dBm (22, 17, 13, 10)
        #[arg(long)]
        tx_power: Option<TxPower>,
        /// Ambient noise RSSI reporting
        #[arg(long)]
        ambient_noise: Option<bool>,
    },

    /// Any register address with a raw byte (decimal or 0x-prefixed hex)
    Raw {
        #[arg(value_parser = parse_byte)]
        register: u8,
        #[arg(value_parser = parse_byte)]
        value: u8,
    },
}

fn parse_byte(s: &str) -> std::result::Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("'{s}' is not a byte: {e}"))
}

fn describe(register: u8, byte: u8) -> String {
    Register::from_byte(register).map_or_else(
        || format!("0x{byte:02x}"),
        |register| RegisterValue::from_raw(register, byte).to_string(),
    )
}

fn report(outcome: &WriteOutcome, strict: bool) -> Result<()> {
    println!("before: {}", describe(outcome.register, outcome.previous));
    println!("after:  {}", describe(outcome.register, outcome.confirmed));

    if strict {
        outcome.verify()?;
    } else if !outcome.is_confirmed() {
        eprintln!(
            "warning: requested 0x{:02x} but the module confirmed 0x{:02x}",
            outcome.requested, outcome.confirmed
        );
    }
    Ok(())
}

async fn set(
    client: &mut RadioConfigurator<SerialTransport>,
    target: SetTarget,
) -> Result<WriteOutcome> {
    match target {
        SetTarget::Channel { channel } => client.set_channel(channel).await,
        SetTarget::Speed {
            baud,
            parity,
            air_rate,
        } => {
            let current = client.speed().await?;
            let speed = SpeedConfig {
                uart_baud: baud.unwrap_or(current.uart_baud),
                parity: parity.unwrap_or(current.parity),
                air_data_rate: air_rate.unwrap_or(current.air_data_rate),
            };
            client.set_speed(speed).await
        }
        SetTarget::Options {
            packet_size,
            tx_power,
            ambient_noise,
        } => {
            let current = client.options().await?;
            let options = OptionConfig {
                packet_size: packet_size.unwrap_or(current.packet_size),
                tx_power: tx_power.unwrap_or(current.tx_power),
                ambient_noise: ambient_noise.unwrap_or(current.ambient_noise),
                ..current
            };
            client.set_options(options).await
        }
        SetTarget::Raw { register, value } => client.write_raw(register, value).await,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let port = match cli.command {
        Command::Ports => {
            for port in list_ports()? {
                println!("{port}");
            }
            return Ok(());
        }
        _ => cli.port.ok_or_else(|| Error::InvalidValue {
            reason: "--port is required".into(),
        })?,
    };

    eprintln!("{CONFIG_MODE_NOTICE}");

    let mut client = RadioConfigurator::serial(port);
    client.set_timeout(Duration::from_millis(cli.timeout_ms));
    client.connect().await?;

    match cli.command {
        Command::Ports => {}
        Command::Get { register } => {
            let registers = register.map_or_else(|| Register::ALL.to_vec(), |r| vec![r]);
            for register in registers {
                let value = client.read(register).await?;
                println!("{}: {value}", register.name());
            }
        }
        Command::Set { target } => {
            let outcome = set(&mut client, target).await?;
            report(&outcome, cli.strict)?;
        }
    }

    client.disconnect().await
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            if e.is_retryable() {
                eprintln!("the exchange can be retried from scratch");
            }
            ExitCode::FAILURE
        }
    }
}
