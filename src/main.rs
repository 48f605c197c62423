use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use memoria::client::{self, Command};
use memoria::config::{Config, Overrides};
use memoria::session::{Session, SessionError};
use memoria::{telemetry, view, SessionEnd};

#[derive(Parser, Debug)]
#[command(name = "memoria", about = "Terminal client for the shared memory board")]
struct Opts {
    /// Game server base URL
    #[arg(long)]
    server_url: Option<String>,
    /// Transports to try, in order (websocket,polling)
    #[arg(long)]
    transports: Option<String>,
    /// Delay between reconnection attempts
    #[arg(long)]
    reconnect_delay_ms: Option<u64>,
    /// Session document written by the account front-end
    #[arg(long)]
    session_file: Option<PathBuf>,
    /// Log connection activity to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    telemetry::init(opts.verbose);

    let config = Config::load(Overrides {
        server_url: opts.server_url,
        transports: opts.transports,
        reconnect_delay_ms: opts.reconnect_delay_ms,
        session_file: opts.session_file,
    })?;

    let session = match Session::load(&config.session_file) {
        Ok(session) => session,
        Err(SessionError::Blocked(username)) => {
            tracing::warn!(%username, "account is blocked");
            println!("Your account is blocked. Contact the administrator.");
            return Ok(());
        }
        Err(err) => {
            return Err(err).with_context(|| {
                format!("no usable session at {}, log in first", config.session_file.display())
            });
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(read_commands(tx));

    let username = session.username.clone();
    let end = client::play(config.connection, &session, &mut rx, |game| {
        println!("{}", view::render(game, &username));
    })
    .await;

    if end == SessionEnd::Blocked {
        println!("Your session has ended. Returning to login.");
    }
    Ok(())
}

/// Feeds stdin lines to the game loop. EOF counts as leaving.
async fn read_commands(tx: mpsc::UnboundedSender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match Command::parse(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        return;
                    }
                }
                None if line.trim().is_empty() => {}
                None => eprintln!("unknown command {line:?}: type a tile number, `retry` or `quit`"),
            },
            Ok(None) | Err(_) => {
                let _ = tx.send(Command::Quit);
                return;
            }
        }
    }
}
