use crate::error::AutomationError;
use alloy::primitives::{Address, address};
use eyre::Result;
use std::collections::HashMap;

pub const POLYGON: u64 = 137;
pub const ARBITRUM: u64 = 42161;

const VAULT_FACTORY: Address = address!("0xaB5F025297E40bd5ECf340d1709008eFF230C6cA");
const UNISWAP_POOL_FACTORY: Address = address!("0x1F98431c8aD98523631AE4a59f267346ea31F984");
const PRICE_ORACLE: Address = address!("0x7b5438F5037A74fd8deaF1c5f7c1B3575A93026A");

/// Contract addresses the builders need on one chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainAddresses {
    pub vault_factory: Option<Address>,
    pub wrapped_native: Option<Address>,
    pub stable_base_token: Option<Address>,
    pub uniswap_pool_factory: Option<Address>,
    pub price_oracle: Option<Address>,
    pub latest_vault_version: Option<u16>,
}

impl ChainAddresses {
    /// Fills every unset entry from `other`.
    pub fn merge(&mut self, other: &ChainAddresses) {
        self.vault_factory = self.vault_factory.or(other.vault_factory);
        self.wrapped_native = self.wrapped_native.or(other.wrapped_native);
        self.stable_base_token = self.stable_base_token.or(other.stable_base_token);
        self.uniswap_pool_factory = self.uniswap_pool_factory.or(other.uniswap_pool_factory);
        self.price_oracle = self.price_oracle.or(other.price_oracle);
        self.latest_vault_version = self.latest_vault_version.or(other.latest_vault_version);
    }

    pub fn require_vault_factory(&self, chain_id: u64) -> Result<Address> {
        required(self.vault_factory, "vault factory", chain_id)
    }

    pub fn require_wrapped_native(&self, chain_id: u64) -> Result<Address> {
        required(self.wrapped_native, "wrapped native", chain_id)
    }

    pub fn require_price_oracle(&self, chain_id: u64) -> Result<Address> {
        required(self.price_oracle, "price oracle", chain_id)
    }

    pub fn require_uniswap_pool_factory(&self, chain_id: u64) -> Result<Address> {
        required(self.uniswap_pool_factory, "uniswap pool factory", chain_id)
    }

    pub fn require_latest_vault_version(&self, chain_id: u64) -> Result<u16> {
        self.latest_vault_version.ok_or_else(|| {
            AutomationError::MissingAddress {
                contract: "vault version",
                chain_id,
            }
            .into()
        })
    }
}

fn required(value: Option<Address>, contract: &'static str, chain_id: u64) -> Result<Address> {
    match value {
        Some(address) if address != Address::ZERO => Ok(address),
        _ => Err(AutomationError::MissingAddress { contract, chain_id }.into()),
    }
}

/// Per-chain address table handed to the sdk at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBook {
    chains: HashMap<u64, ChainAddresses>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deployments on Polygon and Arbitrum.
    pub fn builtin() -> Self {
        let mut book = Self::new();
        book.insert(
            POLYGON,
            ChainAddresses {
                vault_factory: Some(VAULT_FACTORY),
                wrapped_native: Some(address!("0x0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270")),
                stable_base_token: Some(address!("0xc2132D05D31c914a87C6611C10748AEb04B58e8F")),
                uniswap_pool_factory: Some(UNISWAP_POOL_FACTORY),
                price_oracle: Some(PRICE_ORACLE),
                latest_vault_version: Some(4),
            },
        );
        book.insert(
            ARBITRUM,
            ChainAddresses {
                vault_factory: Some(VAULT_FACTORY),
                wrapped_native: Some(address!("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1")),
                stable_base_token: Some(address!("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9")),
                uniswap_pool_factory: Some(UNISWAP_POOL_FACTORY),
                price_oracle: Some(PRICE_ORACLE),
                latest_vault_version: Some(3),
            },
        );
        book
    }

    pub fn insert(&mut self, chain_id: u64, addresses: ChainAddresses) {
        self.chains.insert(chain_id, addresses);
    }

    /// Overrides entries key by key; unset keys in `overrides` keep the current value.
    pub fn apply(&mut self, chain_id: u64, overrides: ChainAddresses) {
        let entry = self.chains.entry(chain_id).or_default();
        let mut merged = overrides;
        merged.merge(entry);
        *entry = merged;
    }

    /// Addresses for `chain_id`; unknown chains get an empty table.
    pub fn chain(&self, chain_id: u64) -> ChainAddresses {
        self.chains.get(&chain_id).cloned().unwrap_or_default()
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.chains.keys().copied()
    }
}
