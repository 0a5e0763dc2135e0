use anyhow::Context;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::path::PathBuf;
use std::process;
use zeroize::Zeroizing;

use hdsign::config::{DeriveConfig, DocumentSource, GenerateConfig, SignConfig};
use hdsign::eip712;
use hdsign::utils::logging;
use hdsign::{log_debug, log_error, HdSignError, Signature};

#[derive(Parser)]
#[command(author, version, about = "Offline Ethereum key derivation and EIP-712 signing")]
struct Cli {
    /// Emit debug logs on stderr
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the address for a mnemonic
    Derive {
        /// Wordlist tag (english, japanese, chinese-simplified, ...)
        #[arg(long)]
        language: Option<String>,
        #[arg(long, default_value = hdsign::wallet::DEFAULT_PATH)]
        path: String,
        #[arg(long, default_value = "", value_parser = secret_arg)]
        passphrase: Zeroizing<String>,
        #[arg(required = true, value_parser = secret_arg)]
        words: Vec<Zeroizing<String>>,
    },
    /// Sign a typed-data document
    Sign {
        #[arg(long, value_parser = secret_arg)]
        private_key: Zeroizing<String>,
        /// Read the document from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print the EIP-712 message hash of a typed-data document
    Hash {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print the address that signed a typed-data document
    Recover {
        #[arg(long)]
        signature: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print a fresh mnemonic
    Generate {
        #[arg(long, default_value_t = 12)]
        words: usize,
        #[arg(long)]
        language: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        logging::enable_debug();
    }

    match run(cli.cmd) {
        Ok(line) => println!("{}", line),
        Err(e) => {
            match e.downcast_ref::<HdSignError>() {
                Some(err) => {
                    log_error!("cli", "Command failed", code = err.code.as_str());
                    eprintln!("error: {}", err);
                }
                None => {
                    log_error!("cli", "Command failed", code = "internal");
                    eprintln!("error: [internal] {:#}", e);
                }
            }
            process::exit(1);
        }
    }
}

/// Secret arguments are wiped when the parsed command is dropped
fn secret_arg(value: &str) -> Result<Zeroizing<String>, Infallible> {
    Ok(Zeroizing::new(value.to_owned()))
}

fn run(cmd: Command) -> anyhow::Result<String> {
    match cmd {
        Command::Derive {
            language,
            path,
            passphrase,
            words,
        } => {
            let words: Vec<&str> = words.iter().map(|w| w.as_str()).collect();
            let config = DeriveConfig::from_words(&words)?
                .with_language(language)
                .with_path(&path)?
                .with_passphrase(&passphrase);
            Ok(config.run()?.address.to_checksum())
        }
        Command::Sign { private_key, file } => {
            let config =
                SignConfig::new(&private_key).with_document(DocumentSource::from_option(file));
            Ok(config.run()?.to_hex())
        }
        Command::Hash { file } => {
            let typed_data = DocumentSource::from_option(file)
                .load()
                .context("loading typed-data document")?;
            let hash = eip712::hash_typed_data(&typed_data).map_err(HdSignError::from)?;
            Ok(format!("0x{}", hex::encode(hash)))
        }
        Command::Recover { signature, file } => {
            let signature = signature
                .parse::<Signature>()
                .map_err(HdSignError::from)
                .context("parsing --signature")?;
            let typed_data = DocumentSource::from_option(file)
                .load()
                .context("loading typed-data document")?;
            let signer = eip712::recover_typed_data_signer(&typed_data, &signature)
                .map_err(HdSignError::from)?;
            log_debug!("cli", "Recovered signer", signer = signer);
            Ok(signer.to_checksum())
        }
        Command::Generate { words, language } => {
            let config = GenerateConfig {
                word_count: words,
                language,
            };
            let phrase = config.run()?;
            Ok(phrase.phrase().to_string())
        }
    }
}
