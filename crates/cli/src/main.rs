use alloy::primitives::{Address, Bytes};
use alloy::signers::local::PrivateKeySigner;
use automation::backend::KeyPair;
use automation::router::StaticRoutePlanner;
use automation::sdk::AutomationSdk;
use automation::types::build_options::{AutomationBuildOptions, Holder, UnwrapNativeCall};
use automation::types::config_wrapper::ConfigWrapper;
use automation::{connect, read_automation_definition};
use clap::{Args, Parser, Subcommand};
use eyre::{Result, eyre};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the config file
    #[arg(long = "config", short = 'c', global = true)]
    config: Option<String>,

    #[command(flatten)]
    session: SessionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SessionArgs {
    /// Private key of the account, required for anything that sends transactions
    #[arg(long = "private-key", env = "PRIVATE_KEY", hide_env_values = true, global = true)]
    private_key: Option<String>,

    /// Account address, used when no private key is given
    #[arg(long = "account", short = 'a', global = true)]
    account: Option<Address>,

    /// Backend access token, skips signing in with the private key
    #[arg(long = "access-token", env = "ACCESS_TOKEN", hide_env_values = true, global = true)]
    access_token: Option<String>,

    /// Attach an unwrap call when swapping wrapped native into native
    #[arg(long = "unwrap-native", global = true)]
    unwrap_native: bool,
}

#[derive(Args)]
struct AutomationArgs {
    /// Path to the automation JSON file
    #[arg(long = "automation", short = 'p')]
    automation_path: String,

    /// Pre-computed swap router call data used for every swap
    #[arg(long = "route-calldata")]
    route_calldata: Option<Bytes>,

    /// Spend tokens held by the account instead of the vault
    #[arg(long = "from-signer")]
    from_signer: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an automation and print the resulting calls
    Build {
        #[command(flatten)]
        args: AutomationArgs,
    },
    /// Build an automation and send it
    Deploy {
        #[command(flatten)]
        args: AutomationArgs,

        /// Skip the confirmation prompt
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },
    /// Deploy a vault for the account under the first free index
    DeployVault {
        /// Network ID
        #[arg(long = "network", short = 'n')]
        network_id: u64,
    },
    /// Sign in and list the account's vaults
    Authenticate {
        /// Network ID
        #[arg(long = "network", short = 'n')]
        network_id: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cw = ConfigWrapper::from_file(cli.config.as_deref())?;

    match &cli.command {
        Commands::Build { args } => {
            let definition = read_automation_definition(&args.automation_path)?;
            let chain_id = definition.chain_id;
            let automation = definition.into_automation()?;

            let sdk = open_session(&cw, &cli.session, chain_id).await?;
            let sdk = with_route(sdk, args);

            let build = sdk
                .build_automation(&automation, &build_options(chain_id, args))
                .await?;
            println!("{}", serde_json::to_string_pretty(&build)?);
        }
        Commands::Deploy { args, yes } => {
            let definition = read_automation_definition(&args.automation_path)?;
            let chain_id = definition.chain_id;
            let automation = definition.into_automation()?;

            let sdk = open_session(&cw, &cli.session, chain_id).await?;
            let sdk = with_route(sdk, args);
            let options = build_options(chain_id, args);

            let build = sdk.build_automation(&automation, &options).await?;
            println!("{}", serde_json::to_string_pretty(&build)?);

            if !*yes
                && !prompt_user_confirmation(&format!(
                    "Send {} account call(s) and the vault call to {}?",
                    build.account_relative_call_data.len(),
                    build.vault_address
                ))?
            {
                println!("Aborted");
                return Ok(());
            }

            let hash = sdk.deploy_automation(&automation, &options).await?;
            println!("Transaction Hash: {}", hash);
        }
        Commands::DeployVault { network_id } => {
            let mut sdk = open_session(&cw, &cli.session, *network_id).await?;
            let vault = sdk.deploy_vault(*network_id).await?;

            println!("Vault Address: {}", vault.address);
            println!("Vault ID: {}", vault.vault_id);
            match vault.transaction_hash {
                Some(hash) => println!("Transaction Hash: {}", hash),
                None => println!("Vault was already deployed, linked it to the account"),
            }
        }
        Commands::Authenticate { network_id } => {
            let sdk = open_session(&cw, &cli.session, *network_id).await?;

            println!("Account: {}", sdk.account_address());
            for vault in sdk.vaults() {
                println!("Vault {} on chain {}", vault.address, vault.chain_id);
            }
        }
    }

    Ok(())
}

/// Connects and authenticates, with the access token if one is given, otherwise by signing.
async fn open_session(
    cw: &ConfigWrapper,
    session: &SessionArgs,
    chain_id: u64,
) -> Result<AutomationSdk> {
    let signer = session
        .private_key
        .as_deref()
        .map(str::parse::<PrivateKeySigner>)
        .transpose()?;
    let account = match (&signer, session.account) {
        (Some(signer), _) => signer.address(),
        (None, Some(account)) => account,
        (None, None) => return Err(eyre!("Either --private-key or --account is required")),
    };
    let unwrap_native = if session.unwrap_native {
        UnwrapNativeCall::Attach
    } else {
        UnwrapNativeCall::Omit
    };

    let mut sdk = connect(cw, chain_id, account, signer.clone(), unwrap_native).await?;

    match (&session.access_token, &signer) {
        (Some(token), _) => {
            sdk = sdk.with_key_pair(KeyPair::new(token.clone(), String::new())?);
            sdk.refresh_account_data().await?;
        }
        (None, Some(signer)) => sdk.authenticate_with_signer(signer).await?,
        (None, None) => {
            return Err(eyre!(
                "An access token or a private key is needed to load account data"
            ));
        }
    }

    Ok(sdk)
}

fn with_route(sdk: AutomationSdk, args: &AutomationArgs) -> AutomationSdk {
    match &args.route_calldata {
        Some(call_data) => sdk.with_router(Arc::new(StaticRoutePlanner::new(Some(
            call_data.clone(),
        )))),
        None => sdk,
    }
}

fn build_options(chain_id: u64, args: &AutomationArgs) -> AutomationBuildOptions {
    let mut options = AutomationBuildOptions::new(chain_id);
    if args.from_signer {
        options.transfer_from = Holder::Signer;
    }
    options
}

fn prompt_user_confirmation(message: &str) -> Result<bool> {
    println!("\n{} (y/n)", message);
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_lowercase() == "y")
}
