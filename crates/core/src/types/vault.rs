use alloy::primitives::Address;
use serde::{Deserialize, Deserializer, Serialize, de::Error};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vault {
    pub id: String,
    pub account_id: String,
    pub address: Address,
    #[serde(deserialize_with = "deserialize_chain_id")]
    pub chain_id: u64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualAccount {
    pub id: String,
    pub address: Address,
    pub user_id: String,
    pub created_at: String,
    #[serde(default)]
    pub vaults: Vec<Vault>,
}

/// Account data as returned by the backend after authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootAccountData {
    pub id: String,
    #[serde(default)]
    pub accounts: Vec<VirtualAccount>,
}

impl RootAccountData {
    /// All vaults of all virtual accounts, in account order.
    pub fn vaults(&self) -> impl Iterator<Item = &Vault> {
        self.accounts.iter().flat_map(|account| account.vaults.iter())
    }

    pub fn vault(&self, index: usize, chain_id: Option<u64>) -> Option<&Vault> {
        self.vaults()
            .filter(|vault| chain_id.is_none_or(|id| vault.chain_id == id))
            .nth(index)
    }

    /// Factories share addresses across chains, so a match must also be on `chain_id`.
    pub fn has_vault(&self, address: Address, chain_id: u64) -> bool {
        self.vaults()
            .any(|vault| vault.address == address && vault.chain_id == chain_id)
    }
}

// The backend sends chain ids either as numbers or as numeric strings.
fn deserialize_chain_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ChainId {
        Number(u64),
        Text(String),
    }

    match ChainId::deserialize(deserializer)? {
        ChainId::Number(id) => Ok(id),
        ChainId::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| D::Error::custom(format!("Invalid chain id: {s}"))),
    }
}
