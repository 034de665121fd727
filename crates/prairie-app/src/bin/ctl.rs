use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

/// Talk to a running prairie simulation over its TCP line protocol.
#[derive(Parser, Debug)]
#[command(name = "prairie-ctl", version, about)]
struct Cli {
    /// Address of the running simulation's viewer server.
    #[arg(long, env = "PRAIRIE_ADDR", default_value = "127.0.0.1:5005")]
    addr: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one control command (PAUSE, START, QUIT, GROWTH <coef>,
    /// GRASS <target>).
    Send {
        /// Command words, joined with spaces before sending.
        words: Vec<String>,
    },
    /// Stream status lines until the simulation goes away.
    Watch,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let stream = TcpStream::connect(&cli.addr)
        .with_context(|| format!("failed to connect to {}", cli.addr))?;

    match cli.command {
        Command::Send { words } => {
            let line = words.join(" ");
            if line.trim().is_empty() {
                bail!("nothing to send; provide a command, e.g. `send pause`");
            }
            let mut stream = stream;
            stream
                .write_all(format!("{line}\n").as_bytes())
                .context("failed to send command")?;
            println!("sent: {line}");
        }
        Command::Watch => {
            let reader = BufReader::new(stream);
            for line in reader.lines() {
                let line = line.context("status stream ended unexpectedly")?;
                println!("{line}");
            }
        }
    }

    Ok(())
}
