use crate::chain::ChainReader;
use crate::router::RoutePlanner;
use crate::types::address_book::ChainAddresses;
use crate::types::call_data::CallData;
use crate::types::vault::Vault;
use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What the swap builder does when asked to swap wrapped native into native.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnwrapNativeCall {
    /// Emit nothing for the unwrap.
    #[default]
    Omit,
    /// Emit `unwrapNative(amount)` to the vault.
    Attach,
}

/// Context shared by every builder invoked for one automation.
#[derive(Clone)]
pub struct BuildOptions {
    pub chain_id: u64,
    pub recipient: Address,
    pub account_address: Address,
    pub vault_address: Address,
    pub addresses: ChainAddresses,
    pub unwrap_native: UnwrapNativeCall,
    pub reader: Arc<dyn ChainReader>,
    pub router: Arc<dyn RoutePlanner>,
}

impl fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOptions")
            .field("chain_id", &self.chain_id)
            .field("recipient", &self.recipient)
            .field("account_address", &self.account_address)
            .field("vault_address", &self.vault_address)
            .field("addresses", &self.addresses)
            .field("unwrap_native", &self.unwrap_native)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VaultSelection {
    /// First known vault on the chain, or a predicted one deployed in the same batch.
    #[default]
    Automatic,
    Explicit(Vault),
}

/// Who holds the tokens an action spends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Holder {
    #[default]
    Vault,
    Signer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationBuildOptions {
    pub vault: VaultSelection,
    pub transfer_from: Holder,
    pub chain_id: u64,
}

impl AutomationBuildOptions {
    pub fn new(chain_id: u64) -> Self {
        Self {
            vault: VaultSelection::Automatic,
            transfer_from: Holder::Vault,
            chain_id,
        }
    }
}

/// Everything needed to submit an automation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationBuildResult {
    /// Native value sent with the vault call.
    pub deploy_value: U256,
    /// Vault multicall.
    pub deploy_call_data: Bytes,
    /// Calls sent from the account before the vault call, in order.
    pub account_relative_call_data: Vec<CallData>,
    pub vault_address: Address,
}
