pub mod backend;
pub mod bindings;
pub mod builders;
pub mod chain;
pub mod error;
pub mod router;
pub mod sdk;
pub mod types;
pub mod utils;

use crate::chain::ProviderChain;
use crate::sdk::{AutomationSdk, SdkOptions};
use crate::types::automation::{ActionOptions, Automation, AutomationInitOptions, TriggerOptions};
use crate::types::build_options::UnwrapNativeCall;
use crate::types::config_wrapper::ConfigWrapper;
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::ProviderBuilder;
use alloy::signers::local::PrivateKeySigner;
use eyre::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;

pub use error::AutomationError;

/// Automation as written in a JSON file: one trigger and its actions, fully configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationDefinition {
    pub chain_id: u64,
    pub trigger: TriggerOptions,
    #[serde(default)]
    pub actions: Vec<ActionOptions>,
}

impl AutomationDefinition {
    pub fn into_automation(self) -> Result<Automation> {
        let mut automation = Automation::new(AutomationInitOptions {
            trigger: self.trigger.trigger(),
            actions: self.actions.iter().map(ActionOptions::action).collect(),
            chain_id: self.chain_id,
        })
        .configure_trigger(self.trigger)?;

        for action in self.actions {
            automation = automation.configure_action(action)?;
        }

        Ok(automation)
    }
}

pub fn read_automation_definition(path: &str) -> Result<AutomationDefinition> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Sdk for `account` on `chain_id`, reading addresses, backend and rpc from the config.
///
/// Without a signer the sdk can build but not deploy.
pub async fn connect(
    cw: &ConfigWrapper,
    chain_id: u64,
    account: Address,
    signer: Option<PrivateKeySigner>,
    unwrap_native: UnwrapNativeCall,
) -> Result<AutomationSdk> {
    let rpc_url = cw.get_rpc_url(chain_id)?;
    let options = SdkOptions {
        account_address: account,
        backend_url: cw.backend_url(),
        address_book: cw.address_book()?,
        unwrap_native,
    };

    info!("Connecting to chain {} for {}", chain_id, account);

    match signer {
        Some(signer) => {
            let provider = ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .on_builtin(&rpc_url)
                .await?;
            let chain = Arc::new(ProviderChain::new(provider));
            Ok(AutomationSdk::new(options, chain.clone()).with_sender(chain))
        }
        None => {
            let provider = ProviderBuilder::new().on_builtin(&rpc_url).await?;
            Ok(AutomationSdk::new(
                options,
                Arc::new(ProviderChain::new(provider)),
            ))
        }
    }
}
