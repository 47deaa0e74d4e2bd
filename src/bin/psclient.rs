//! `psclient`: an interactive client for `psserver`.
//!
//! Usage: `psclient portnum name [topic] ...`
//!
//! Connects to the broker on localhost, sends `name <name>` and a `sub` for
//! each topic given on the command line, then relays lines typed on stdin to
//! the server and prints every line the server sends back.

use clap::Parser;
use psbroker::transport::command::is_valid_token;
use psbroker::utils::logging;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

const HOST: &str = "localhost";

#[derive(Parser, Debug)]
#[command(name = "psclient", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Port (or service name) the server listens on
    portnum: String,

    /// Name to identify as
    name: String,

    /// Topics to subscribe to on startup
    topics: Vec<String>,
}

#[derive(Debug, Error)]
enum ClientError {
    #[error("Usage: psclient portnum name [topic] ...")]
    Usage,

    #[error("psclient: invalid name")]
    InvalidName,

    #[error("psclient: invalid topic")]
    InvalidTopic,

    #[error("psclient: unable to connect to port {0}")]
    Connect(String),

    #[error("psclient: server connection terminated")]
    ConnectionClosed,
}

impl ClientError {
    fn exit_code(&self) -> i32 {
        match self {
            ClientError::Usage => 1,
            ClientError::InvalidName | ClientError::InvalidTopic => 2,
            ClientError::Connect(_) => 3,
            ClientError::ConnectionClosed => 4,
        }
    }
}

#[tokio::main]
async fn main() {
    logging::init("warn");

    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    };
    // Exit directly: a pending blocking read on stdin would otherwise keep
    // the runtime from shutting down.
    std::process::exit(code);
}

async fn run() -> Result<(), ClientError> {
    let cli = Cli::try_parse().map_err(|_| ClientError::Usage)?;

    if !cli.topics.iter().all(|t| is_valid_token(t)) {
        return Err(ClientError::InvalidTopic);
    }
    if !is_valid_token(&cli.name) {
        return Err(ClientError::InvalidName);
    }

    let stream = TcpStream::connect(format!("{HOST}:{}", cli.portnum))
        .await
        .map_err(|_| ClientError::Connect(cli.portnum.clone()))?;
    let (server_in, mut server_out) = stream.into_split();

    let mut greeting = format!("name {}\n", cli.name);
    for topic in &cli.topics {
        greeting.push_str(&format!("sub {topic}\n"));
    }
    server_out
        .write_all(greeting.as_bytes())
        .await
        .map_err(|_| ClientError::ConnectionClosed)?;

    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut server_in = BufReader::new(server_in);
    let mut stdout = tokio::io::stdout();

    tokio::select! {
        // End of stdin ends the session normally.
        result = relay_lines(&mut stdin, &mut server_out) => match result {
            Ok(()) => Ok(()),
            Err(Relay::Read(e)) => {
                debug!(error = %e, "failed to read stdin");
                Ok(())
            }
            Err(Relay::Write(e)) => {
                debug!(error = %e, "failed to send to server");
                Err(ClientError::ConnectionClosed)
            }
        },
        result = relay_lines(&mut server_in, &mut stdout) => {
            if let Err(Relay::Read(e)) = result {
                debug!(error = %e, "failed to read from server");
            }
            Err(ClientError::ConnectionClosed)
        }
    }
}

/// Which side of a relay failed.
enum Relay {
    Read(std::io::Error),
    Write(std::io::Error),
}

/// Copies newline-terminated lines from `input` to `output` until `input` is
/// exhausted.
///
/// Lines are copied as raw bytes, so input that is not valid UTF-8 passes
/// through unchanged. A final line without a newline gets one appended.
async fn relay_lines<R, W>(input: &mut R, output: &mut W) -> Result<(), Relay>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).await.map_err(Relay::Read)? == 0 {
            return Ok(());
        }
        if buf.last() != Some(&b'\n') {
            buf.push(b'\n');
        }
        output.write_all(&buf).await.map_err(Relay::Write)?;
        output.flush().await.map_err(Relay::Write)?;
    }
}
