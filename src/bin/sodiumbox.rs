//! sodiumbox CLI - key-derived message encryption
//!
//! Encrypts stdin (or a file) to a `<hex nonce>.<hex ciphertext>` payload on
//! stdout, and decrypts such payloads back to the original bytes.

use clap::{Parser, Subcommand};
use std::error::Error as StdError;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use sodiumbox::keysource::{KeyReader, ReaderKeyReader, TerminalKeyReader};
use sodiumbox::{CodecError, ErrorKind, Result, SecretBoxCodec};

#[derive(Parser)]
#[command(name = "sodiumbox")]
#[command(version)]
#[command(about = "Key-derived message encryption.", long_about = None)]
struct Cli {
    /// Default key, used when no per-call key is given
    #[arg(long, global = true, env = "SODIUM_KEY", hide_env_values = true, value_name = "KEY")]
    default_key: Option<String>,

    /// Read the per-call key from a file instead of using the default key
    #[arg(long, global = true, value_name = "FILE", conflicts_with = "prompt_key")]
    key_file: Option<PathBuf>,

    /// Prompt for the per-call key on the terminal
    #[arg(long, global = true)]
    prompt_key: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a message
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted (default: stdin)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Decrypt a payload
    #[command(alias = "d")]
    Decrypt {
        /// Path to the file holding the payload (default: stdin)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", error_chain(&e));
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let codec = SecretBoxCodec::new(cli.default_key.as_deref());
    let key = match key_reader(cli.key_file.as_deref(), cli.prompt_key)? {
        Some(mut reader) => Some(reader.read_key()?),
        None => None,
    };
    let key = key.as_deref().map(Vec::as_slice);

    match cli.command {
        Commands::Encrypt { input } => {
            let message = read_input(input.as_deref())?;
            let payload = codec
                .encrypt_bytes(&message, key)
                .map_err(|e| e.with_context("encryption failed"))?;
            write_stdout(format!("{}\n", payload).as_bytes())
        }
        Commands::Decrypt { input } => {
            let raw = read_input(input.as_deref())?;
            let payload = String::from_utf8(raw).map_err(|e| {
                CodecError::with_source(ErrorKind::Malformation, "input is not valid UTF-8", e)
            })?;
            let plaintext = Zeroizing::new(
                codec
                    .decrypt_bytes(payload.trim(), key)
                    .map_err(|e| e.with_context("failed to decrypt"))?,
            );
            write_stdout(&plaintext)
        }
    }
}

fn key_reader(key_file: Option<&Path>, prompt: bool) -> Result<Option<Box<dyn KeyReader>>> {
    if let Some(path) = key_file {
        debug!(path = %path.display(), "reading key from file");
        let file = File::open(path).map_err(|e| {
            CodecError::with_source(
                ErrorKind::KeyUnavailable,
                format!("failed to open key file {}", path.display()),
                e,
            )
        })?;
        let reader: Box<dyn KeyReader> = Box::new(ReaderKeyReader::new(Box::new(file)));
        return Ok(Some(reader));
    }
    if prompt {
        let reader: Box<dyn KeyReader> = Box::new(TerminalKeyReader::new());
        return Ok(Some(reader));
    }
    Ok(None)
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => fs::read(path).map_err(|e| {
            CodecError::with_source(
                ErrorKind::Io,
                format!("failed to read from {}", path.display()),
                e,
            )
        }),
        None => {
            let mut data = Vec::new();
            io::stdin().read_to_end(&mut data).map_err(|e| {
                CodecError::with_source(ErrorKind::Io, "failed to read from stdin", e)
            })?;
            Ok(data)
        }
    }
}

fn write_stdout(data: &[u8]) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(data)
        .and_then(|()| stdout.flush())
        .map_err(|e| CodecError::with_source(ErrorKind::Io, "failed to write to stdout", e))
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: failed to install log subscriber: {}", e);
    }
}

/// Render an error followed by its sources, `outer: inner: root`.
fn error_chain(err: &CodecError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
