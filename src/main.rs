//! `psserver`: the publish/subscribe broker.
//!
//! Usage: `psserver connections [portnum]`
//!
//! `connections` bounds the number of simultaneously connected clients (`0`
//! for no limit). `portnum` is `0` for an ephemeral port, or a port in
//! `1024..=65535`. The bound port is printed to stderr once listening;
//! sending SIGHUP prints the broker statistics to stderr.

use std::process::ExitCode;

use clap::Parser;
use psbroker::config::{is_valid_port, load_config};
#[cfg(unix)]
use psbroker::stats::Reporter;
use psbroker::transport::Server;
use psbroker::utils::{BrokerError, logging};
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "psserver", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Maximum number of concurrent connections; 0 for unlimited
    connections: usize,

    /// Port to listen on; 0 or omitted for an ephemeral port
    #[arg(value_parser = parse_port)]
    portnum: Option<u16>,
}

fn parse_port(s: &str) -> Result<u16, String> {
    let port: u16 = s.parse().map_err(|_| format!("invalid port `{s}`"))?;
    if is_valid_port(port) {
        Ok(port)
    } else {
        Err(format!("port {port} out of range"))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run() -> Result<(), BrokerError> {
    let cli = Cli::try_parse().map_err(|_| BrokerError::Usage)?;

    dotenvy::dotenv().ok();
    let settings = load_config()?.with_cli(cli.connections, cli.portnum);
    settings.validate()?;
    logging::init(&settings.log.level);

    // Install the SIGHUP handler before the port is announced so a signal
    // sent right after startup is never fatal.
    #[cfg(unix)]
    let hangup = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())?;

    let server = Server::bind(&settings).await?;
    eprintln!("{}", server.local_port()?);

    #[cfg(unix)]
    {
        let ctx = server.context();
        tokio::spawn(Reporter::new(ctx.stats().clone(), std::io::stderr()).run(hangup));
    }
    #[cfg(not(unix))]
    tracing::warn!("statistics reporting on signal is only available on unix");

    if let Err(e) = server.run().await {
        error!("Server failed: {}", e);
        return Err(e);
    }
    Ok(())
}
