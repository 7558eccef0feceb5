//! Decodes hex encoded CBOR, Tempo signature envelopes and Tempo transactions and prints them
//! as JSON.

use alloy_primitives::{Address, hex};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tempo_alloy_consensus::{SignatureEnvelope, TxTempo};
use tracing::info;

mod logger;
mod render;

/// The inspect command
#[derive(Parser, Debug, Clone)]
#[command(about = "Decodes Tempo wire formats and prints them as JSON")]
struct Cli {
    /// Verbosity level (0-5). Logs go to stderr.
    #[arg(long, short, action = ArgAction::Count)]
    v: u8,
    /// What to decode.
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Decode a CBOR data item.
    Cbor {
        /// Hex input, with or without `0x`.
        input: String,
    },
    /// Decode a signature envelope, with or without the magic suffix.
    Signature {
        /// Hex input, with or without `0x`.
        input: String,
    },
    /// Decode a `0x76` Tempo transaction.
    Tx {
        /// Hex input, with or without `0x`.
        input: String,
        /// Sender to compute the fee payer signing payload for.
        #[arg(long, env = "TEMPO_INSPECT_SENDER")]
        sender: Option<Address>,
    },
}

fn run(command: &Command) -> Result<serde_json::Value> {
    match command {
        Command::Cbor { input } => {
            let value = tempo_alloy_cbor::decode_hex(input).context("decoding cbor")?;
            Ok(render::cbor(&value))
        }
        Command::Signature { input } => {
            let bytes = hex::decode(input).context("decoding hex")?;
            let envelope =
                SignatureEnvelope::deserialize(&bytes).context("decoding signature envelope")?;
            info!(kind = envelope.kind(), len = bytes.len(), "decoded signature envelope");
            render::signature(&envelope)
        }
        Command::Tx { input, sender } => {
            let bytes = hex::decode(input).context("decoding hex")?;
            let tx = TxTempo::deserialize(&bytes).context("decoding tempo transaction")?;
            info!(calls = tx.calls.len(), len = bytes.len(), "decoded tempo transaction");
            render::transaction(&tx, *sender)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_tracing(cli.v);
    let output = run(&cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tempo-inspect").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parses_verbosity_and_subcommand() {
        let cli = parse(&["-vvv", "cbor", "0xf6"]);
        assert_eq!(cli.v, 3);
        assert!(matches!(cli.command, Command::Cbor { ref input } if input == "0xf6"));
    }

    #[test]
    fn runs_cbor() {
        let output = run(&Command::Cbor { input: "a1616182f5f4".into() }).unwrap();
        assert_eq!(output, json!({ "a": [true, false] }));
    }

    #[test]
    fn runs_secp256k1_signature() {
        let mut bytes = [0u8; 65];
        bytes[31] = 1;
        bytes[63] = 2;
        bytes[64] = 28;
        let output = run(&Command::Signature { input: hex::encode(bytes) }).unwrap();
        assert_eq!(output["type"], "secp256k1");
        assert_eq!(output["yParity"], "0x1");
    }

    #[test]
    fn runs_tx() {
        let tx = TxTempo {
            chain_id: 1,
            gas_limit: 21_000,
            calls: vec![Default::default()],
            ..Default::default()
        };
        let input = hex::encode(tx.encoded().unwrap());
        let sender = Some(Address::repeat_byte(0x55));
        let output = run(&Command::Tx { input, sender }).unwrap();
        assert_eq!(output["chainId"], 1);
        assert_eq!(output["calls"].as_array().unwrap().len(), 1);
        assert!(output.get("feePayerSignPayload").is_some());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(run(&Command::Tx { input: "0x02c0".into(), sender: None }).is_err());
        assert!(run(&Command::Signature { input: "zz".into() }).is_err());
    }
}
