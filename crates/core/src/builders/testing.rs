use crate::chain::ChainReader;
use crate::router::{RoutePlanner, StaticRoutePlanner};
use crate::types::address_book::{AddressBook, POLYGON};
use crate::types::build_options::{BuildOptions, UnwrapNativeCall};
use crate::types::transaction::Transaction;
use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use eyre::{Result, eyre};
use std::sync::{Arc, Mutex};

pub const ACCOUNT: Address = Address::repeat_byte(0xA1);
pub const VAULT: Address = Address::repeat_byte(0xB2);

/// Answers every `eth_call` with the same bytes and records the requests.
#[derive(Default)]
pub struct FixedReader {
    pub response: Option<Bytes>,
    pub calls: Mutex<Vec<Transaction>>,
}

impl FixedReader {
    pub fn returning(response: impl Into<Bytes>) -> Self {
        Self {
            response: Some(response.into()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChainReader for FixedReader {
    async fn call(&self, tx: &Transaction) -> Result<Bytes> {
        self.calls.lock().unwrap().push(tx.clone());
        self.response.clone().ok_or_else(|| eyre!("execution reverted"))
    }

    async fn estimate_gas(&self, _tx: &Transaction) -> Result<u64> {
        Ok(21_000)
    }
}

pub fn build_options() -> BuildOptions {
    build_options_with(
        Arc::new(FixedReader::default()),
        Arc::new(StaticRoutePlanner::default()),
    )
}

pub fn build_options_with(
    reader: Arc<dyn ChainReader>,
    router: Arc<dyn RoutePlanner>,
) -> BuildOptions {
    BuildOptions {
        chain_id: POLYGON,
        recipient: VAULT,
        account_address: ACCOUNT,
        vault_address: VAULT,
        addresses: AddressBook::builtin().chain(POLYGON),
        unwrap_native: UnwrapNativeCall::Omit,
        reader,
        router,
    }
}
