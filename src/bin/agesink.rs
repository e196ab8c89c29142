//! agesink CLI - streaming age encryption of files
//!
//! Encrypts files to X25519 public keys or to a passphrase, and checks
//! whether strings are well-formed public keys.

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use agesink::error::{AgeSinkError, ErrorCategory, Result};
use agesink::file_ops::{self, Target};
use agesink::passphrase::{PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader};
use agesink::{EncryptOptions, recipients};

#[derive(Parser)]
#[command(name = "agesink")]
#[command(version)]
#[command(about = "Streaming age encryption.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the encrypted data to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Encrypt to this public key (may be repeated)
        #[arg(short, long = "recipient", value_name = "KEY")]
        recipients: Vec<String>,

        /// Encrypt to the public keys listed in this file (may be repeated)
        #[arg(short = 'R', long = "recipients-file", value_name = "FILE")]
        recipients_files: Vec<PathBuf>,

        /// Encrypt to a passphrase instead of public keys
        #[arg(short, long, conflicts_with_all = ["recipients", "recipients_files"])]
        passphrase: bool,

        /// Write PEM-style ASCII armor instead of binary output
        #[arg(short, long)]
        armor: bool,

        /// log2 of the scrypt cost used for passphrase encryption
        #[arg(long, value_name = "N", requires = "passphrase")]
        scrypt_work_factor: Option<u8>,
    },

    /// Check whether a string is a well-formed public key
    CheckKey {
        /// The public key to check
        key: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Encrypt {
            input,
            output,
            recipients,
            recipients_files,
            passphrase,
            armor,
            scrypt_work_factor,
        } => {
            let options = EncryptOptions {
                armor,
                scrypt_work_factor,
            };
            if passphrase {
                let mut reader = get_passphrase_reader(cli.passphrase_stdin);
                file_ops::encrypt_file(&input, &output, Target::Passphrase(&mut *reader), &options)
            } else {
                collect_recipients(&recipients, &recipients_files).and_then(|keys| {
                    file_ops::encrypt_file(&input, &output, Target::Recipients(keys), &options)
                })
            }
        }
        Commands::CheckKey { key } => {
            if recipients::is_x25519_public_key(&key) {
                println!("valid");
                Ok(())
            } else {
                println!("invalid");
                process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", error_chain(&e));
        process::exit(1);
    }
}

/// Render an error followed by each of its causes, colon-separated.
fn error_chain(err: &AgeSinkError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// Gather `-r` keys and `-R` files into one recipient list, in order.
fn collect_recipients(
    keys: &[String],
    files: &[PathBuf],
) -> Result<Vec<age::x25519::Recipient>> {
    if keys.is_empty() && files.is_empty() {
        return Err(AgeSinkError::new(
            ErrorCategory::User,
            "no recipients given; use --recipient, --recipients-file, or --passphrase",
        ));
    }

    let mut all = Vec::new();
    for key in keys {
        let parsed = recipients::parse_recipients(key)
            .map_err(|e| e.with_context(format!("invalid recipient {:?}", key)))?;
        all.extend(parsed);
    }
    for path in files {
        all.extend(file_ops::read_recipients_file(path)?);
    }
    Ok(all)
}

fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader)
    }
}
