use crate::types::address_book::{AddressBook, ChainAddresses};
use alloy::primitives::Address;
use dotenv::dotenv;
use eyre::{Result, eyre};
use std::{env, fs};
use toml::Value;

pub const DEFAULT_BACKEND_URL: &str = "https://backend.dittonetwork.io";

pub struct ConfigWrapper {
    raw_config: Value,
}

impl ConfigWrapper {
    pub fn new(raw_config: Value) -> Self {
        Self { raw_config }
    }

    pub fn from_file(path: Option<&str>) -> Result<Self> {
        dotenv().ok();

        let config_content = fs::read_to_string(path.unwrap_or("config.toml"))?;
        let raw_config: Value = config_content.parse::<Value>()?;

        Ok(Self { raw_config })
    }

    pub fn backend_url(&self) -> String {
        self.raw_config
            .get("backend_url")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_BACKEND_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn get_chain_config_value(&self, chain_id: u64, key: &str) -> Option<&Value> {
        // Try chain specific value first
        self.raw_config
            .get("chains")
            .and_then(|c| c.get(&chain_id.to_string()))
            .and_then(|c| c.get(key))
            .or_else(|| {
                // Fallback to default if chain specific not found
                self.raw_config
                    .get("chains")
                    .and_then(|c| c.get("default"))
                    .and_then(|c| c.get(key))
            })
    }

    pub fn get_chain_address(&self, chain_id: u64, key: &str) -> Result<Option<Address>> {
        let Some(value) = self.get_chain_config_value(chain_id, key) else {
            return Ok(None);
        };
        let address = value
            .as_str()
            .ok_or_else(|| eyre!("{} for chain {} must be a string", key, chain_id))?
            .parse::<Address>()
            .map_err(|e| eyre!("Invalid {} for chain {}: {}", key, chain_id, e))?;

        Ok(Some(address))
    }

    pub fn chain_addresses(&self, chain_id: u64) -> Result<ChainAddresses> {
        let latest_vault_version = match self.get_chain_config_value(chain_id, "latest_vault_version")
        {
            Some(value) => {
                let version = value.as_integer().ok_or_else(|| {
                    eyre!("latest_vault_version for chain {} must be an integer", chain_id)
                })?;
                Some(u16::try_from(version).map_err(|_| {
                    eyre!("latest_vault_version for chain {} out of range", chain_id)
                })?)
            }
            None => None,
        };

        Ok(ChainAddresses {
            vault_factory: self.get_chain_address(chain_id, "vault_factory")?,
            wrapped_native: self.get_chain_address(chain_id, "wrapped_native")?,
            stable_base_token: self.get_chain_address(chain_id, "stable_base_token")?,
            uniswap_pool_factory: self.get_chain_address(chain_id, "uniswap_pool_factory")?,
            price_oracle: self.get_chain_address(chain_id, "price_oracle")?,
            latest_vault_version,
        })
    }

    /// Built-in addresses overridden by every `[chains.<id>]` table in the file.
    pub fn address_book(&self) -> Result<AddressBook> {
        let mut book = AddressBook::builtin();

        let mut chain_ids: Vec<u64> = book.chain_ids().collect();
        if let Some(chains) = self.raw_config.get("chains").and_then(|c| c.as_table()) {
            for key in chains.keys().filter(|k| k.as_str() != "default") {
                let chain_id = key
                    .parse::<u64>()
                    .map_err(|_| eyre!("Invalid chain id in config: {}", key))?;
                if !chain_ids.contains(&chain_id) {
                    chain_ids.push(chain_id);
                }
            }
        }

        for chain_id in chain_ids {
            book.apply(chain_id, self.chain_addresses(chain_id)?);
        }

        Ok(book)
    }

    pub fn get_rpc_url(&self, chain_id: u64) -> Result<String> {
        let url_str = self
            .raw_config
            .get("rpc_endpoints")
            .and_then(|r| r.get(&chain_id.to_string()))
            .and_then(|v| v.as_str())
            .ok_or_else(|| eyre!("URL not found for chain_id: {}", chain_id))?;

        if let Some(env_var) = url_str.strip_prefix("env:") {
            env::var(env_var).map_err(|_| eyre!("Environment variable {} not set", env_var))
        } else {
            Ok(url_str.to_string())
        }
    }
}
