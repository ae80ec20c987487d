use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use biometric_keyring::device::{
    AddressParameter, DeviceFailure, DeviceResult, DeviceService, SignatureParameter,
    SignedTransactionParameter, TypedDataPayload,
};
use biometric_keyring::utils::logging::init_tracing;
use biometric_keyring::wallet::CoinType;
use biometric_keyring::{resolve_path, BiometricKeyring, Keyring, KeyringOptions, KeyringSnapshot, SigningRequest};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::io::{self, Read};

#[derive(Parser)]
#[command(name = "biometric-keyring", version, about = "Biometric hardware keyring tools")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a derivation path template and its coin type
    Resolve {
        template: String,
        #[arg(long, default_value_t = 0)]
        account: u32,
        #[arg(long)]
        json: bool,
    },
    /// Restore a serialized keyring offline and describe it
    Snapshot {
        /// Snapshot JSON file, or `-` for stdin
        #[arg(default_value = "-")]
        file: String,
    },
    /// Sign a personal message with the simulated device
    #[cfg(feature = "simulation")]
    SignMessage {
        message: String,
        /// Address the signature is requested for (defaults to the device address)
        #[arg(long)]
        address: Option<String>,
    },
}

/// Device stand-in that refuses every call
struct OfflineDevice;

const OFFLINE: &str = "device is not connected";

#[async_trait]
impl DeviceService for OfflineDevice {
    async fn get_address(&self, _: CoinType, _: &str) -> DeviceResult<AddressParameter> {
        Err(DeviceFailure::Transport(OFFLINE.to_string()))
    }

    async fn get_signed_transaction(
        &self,
        _: CoinType,
        _: &SigningRequest,
        _: &str,
    ) -> DeviceResult<SignedTransactionParameter> {
        Err(DeviceFailure::Transport(OFFLINE.to_string()))
    }

    async fn get_signed_message(&self, _: &str, _: &str) -> DeviceResult<SignatureParameter> {
        Err(DeviceFailure::Transport(OFFLINE.to_string()))
    }

    async fn get_signed_data(&self, _: &str, _: &TypedDataPayload) -> DeviceResult<SignatureParameter> {
        Err(DeviceFailure::Transport(OFFLINE.to_string()))
    }

    fn close_popup(&self) {}
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Resolve {
            template,
            account,
            json,
        } => {
            let (path, coin_type) = resolve_path(&template, account)?;
            if json {
                println!("{}", json!({ "path": path.to_string(), "coinType": coin_type }));
            } else {
                println!("{} {}", path, coin_type);
            }
        }
        Command::Snapshot { file } => {
            let payload = read_input(&file)?;
            let snapshot = KeyringSnapshot::from_json(&payload).context("invalid keyring snapshot")?;
            let options = KeyringOptions::from_env()?;
            let keyring = BiometricKeyring::from_snapshot(OfflineDevice, &snapshot, options.timeout)?;
            let unlocked = keyring.is_unlocked();
            let address = if unlocked { Some(keyring.unlock().await?) } else { None };
            let summary = json!({
                "type": keyring.keyring_type(),
                "path": keyring.path(),
                "coinType": keyring.coin_type(),
                "accounts": keyring.get_accounts(),
                "unlocked": unlocked,
                "address": address,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        #[cfg(feature = "simulation")]
        Command::SignMessage { message, address } => {
            let device = biometric_keyring::SimulatedDevice::with_dev_key()?;
            let keyring = BiometricKeyring::new(device, KeyringOptions::from_env()?)?;
            let unlocked = keyring.unlock().await?;
            let address = address.unwrap_or(unlocked);
            let signature = keyring.sign_personal_message(&address, &message).await?;
            println!("{}", json!({ "address": address, "signature": signature }));
        }
    }

    Ok(())
}

fn read_input(file: &str) -> Result<String> {
    let payload = if file == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(file).with_context(|| format!("cannot read {}", file))?
    };
    if payload.trim().is_empty() {
        bail!("empty snapshot input");
    }
    Ok(payload)
}
