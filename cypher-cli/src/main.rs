#![deny(missing_docs)]
//! A command-line interface for hybrid one-time pad messaging.

use clap::{Parser, Subcommand};
use cypher_core::key_wrap::{DEFAULT_KEY_BITS, RecipientPublicKey};
use cypher_core::{CypherError, Payload, Received, Result, keystore, session};
use log::{error, info};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Exit status for a payload whose integrity tag did not verify.
const EXIT_REJECTED: i32 = 2;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(
    after_help = "EXAMPLES:\n  \n# Create a key pair\ncypher-cli --keys ./my_keys keys init\n\n# Hand out the public key\ncypher-cli --keys ./my_keys keys export > alice.pem\n\n# Encrypt a message for someone\ncypher-cli send --to ./alice.pem --message \"Meet at noon.\" --output msg.json\n\n# Decrypt a message sent to you\ncypher-cli --keys ./my_keys receive --input msg.json"
)]
struct Cli {
    /// The path to the key store.
    #[arg(long, global = true, env = "CYPHER_KEYS")]
    keys: Option<PathBuf>,

    /// Passphrase protecting the private key.
    #[arg(long, global = true, env = "CYPHER_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the local key pair
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },
    /// Encrypt a message for a recipient
    Send {
        /// Recipient public key (PEM). If omitted, the key store's own public key is used.
        #[arg(long, value_name = "PUBLIC_KEY")]
        to: Option<PathBuf>,

        /// The message text. If neither --message nor --input is given, stdin is read.
        #[arg(short, long, conflicts_with = "input")]
        message: Option<String>,

        /// Read the message from a file.
        #[arg(short, long, value_name = "INPUT_FILE")]
        input: Option<PathBuf>,

        /// Write the payload to a file instead of stdout.
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        output: Option<PathBuf>,
    },
    /// Verify and decrypt a payload addressed to the key store
    Receive {
        /// Payload file. If omitted, stdin is read.
        #[arg(short, long, value_name = "PAYLOAD_FILE")]
        input: Option<PathBuf>,

        /// Write the plaintext to a file instead of stdout.
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
#[command(
    after_help = "EXAMPLES:\n  \n# Create a passphrase-protected 3072-bit key pair\ncypher-cli --keys ./my_keys --passphrase hunter2 keys init --bits 3072\n\n# Show key details\ncypher-cli --keys ./my_keys keys show"
)]
enum KeyCommands {
    /// Generate a new key pair in the key store
    Init {
        /// RSA modulus size in bits
        #[arg(short, long, default_value_t = DEFAULT_KEY_BITS)]
        bits: usize,
        /// Replace an existing key pair
        #[arg(long)]
        force: bool,
    },
    /// Show the status of the key store
    Show,
    /// Print the public key as PEM
    Export,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let passphrase = cli.passphrase.as_deref();
    match cli.command {
        Commands::Keys { command } => {
            let key_dir = require_key_dir(cli.keys)?;
            run_keys(&command, &key_dir, passphrase)?;
            Ok(0)
        }
        Commands::Send {
            to,
            message,
            input,
            output,
        } => {
            let recipient = match to {
                Some(path) => keystore::load_public_key_file(&path)?,
                None => keystore::load_public_key(&require_key_dir(cli.keys)?)?,
            };
            let plaintext = match message {
                Some(message) => message,
                None => read_input(input.as_deref())?,
            };

            let payload = session::send(&plaintext, &recipient)?;
            write_output(output.as_deref(), payload.as_str())?;
            if let Some(output) = output {
                println!("Encrypted message written to '{}'", output.display());
            }
            Ok(0)
        }
        Commands::Receive { input, output } => {
            let key_dir = require_key_dir(cli.keys)?;
            let private = keystore::load_private_key(&key_dir, passphrase)?;
            let payload = Payload::from(read_input(input.as_deref())?);

            match session::receive(&payload, &private)? {
                Received::Verified(plaintext) => {
                    write_output(output.as_deref(), &plaintext)?;
                    if let Some(output) = output {
                        info!("Decrypted message written to '{}'", output.display());
                    }
                    Ok(0)
                }
                Received::Rejected => {
                    error!("{}. Nothing was decrypted.", CypherError::IntegrityCheckFailed);
                    Ok(EXIT_REJECTED)
                }
            }
        }
    }
}

fn run_keys(command: &KeyCommands, key_dir: &Path, passphrase: Option<&str>) -> Result<()> {
    match command {
        KeyCommands::Init { bits, force } => {
            info!("Initializing key store at '{}'", key_dir.display());
            let pair = keystore::init(key_dir, passphrase, *bits, *force)?;
            println!("{}", pair.state.key_id);
        }
        KeyCommands::Show => {
            let state = keystore::load_state(key_dir)?;
            let public = keystore::load_public_key(key_dir)?;
            print_status(key_dir, &state, &public);
        }
        KeyCommands::Export => {
            let public = keystore::load_public_key(key_dir)?;
            print!("{}", public.to_pem()?);
        }
    }
    Ok(())
}

fn print_status(key_dir: &Path, state: &keystore::KeyStoreState, public: &RecipientPublicKey) {
    println!("Key Store: {}", key_dir.display());
    println!("{:-<40}", "");
    println!("Key ID: {}", state.key_id);
    println!("Bits: {}", state.bits);
    println!("Fingerprint: {}", state.fingerprint);
    println!(
        "Passphrase Protected: {}",
        if state.encrypted { "yes" } else { "no" }
    );
    println!("Max Message Length: {} symbols", public.max_message_len());
}

fn require_key_dir(keys: Option<PathBuf>) -> Result<PathBuf> {
    keys.ok_or_else(|| {
        CypherError::KeyStore("a --keys path is required for this command".to_string())
    })
}

fn read_input(path: Option<&Path>) -> Result<String> {
    let text = match path {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Ok(text)
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, contents)?,
        None => writeln!(io::stdout().lock(), "{contents}")?,
    }
    Ok(())
}
