//! sealpost-cli: build, inspect and verify sealpost envelopes from a shell.

pub mod commands;
pub mod config;
pub mod error;

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::CliConfig;
use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "sealpost")]
#[command(about = "Build, inspect and verify signed message envelopes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an encryption and an identity keypair
    Keygen {
        /// Derive reproducible test keys from this counter
        #[arg(long)]
        seed: Option<u32>,
    },
    /// Print the canonical inbox name for two identities
    Inbox {
        a: String,
        b: String,
        /// Mark the inbox end-to-end encrypted
        #[arg(long)]
        e2e: bool,
    },
    /// Build a signed ping addressed to another identity
    Ping {
        /// Receiver identity, e.g. @@bob.sealpost/main
        receiver: String,
        /// Receiver's base64 encryption public key
        #[arg(long)]
        receiver_pk: String,
        /// Send a pong instead
        #[arg(long)]
        pong: bool,
    },
    /// Show the visible fields of an envelope
    Inspect {
        /// File holding the wire envelope, or - for stdin
        #[arg(default_value = "-")]
        input: PathBuf,
    },
    /// Check an envelope's signature
    Verify {
        /// Sender's base64 identity public key
        #[arg(long)]
        sender_pk: String,
        /// File holding the wire envelope, or - for stdin
        #[arg(default_value = "-")]
        input: PathBuf,
    },
}

fn read_input(input: &Path) -> Result<String, CliError> {
    if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(input)?)
    }
}

/// Run one command and return its output.
pub fn run(cli: Cli, config: &CliConfig) -> Result<String, CliError> {
    match cli.command {
        Command::Keygen { seed } => commands::keygen(seed),
        Command::Inbox { a, b, e2e } => commands::inbox(&a, &b, e2e),
        Command::Ping {
            receiver,
            receiver_pk,
            pong,
        } => commands::ping(config, &receiver, &receiver_pk, pong),
        Command::Inspect { input } => commands::inspect(&read_input(&input)?),
        Command::Verify { sender_pk, input } => commands::verify(&read_input(&input)?, &sender_pk),
    }
}
