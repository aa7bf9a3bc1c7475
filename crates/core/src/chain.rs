use crate::types::transaction::{Transaction, TransactionReceipt};
use alloy::contract::{CallBuilder, RawCallBuilder};
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::Provider;
use alloy::transports::BoxTransport;
use async_trait::async_trait;
use eyre::Result;
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;

/// Read access to a chain: `eth_call` and gas estimation.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn call(&self, tx: &Transaction) -> Result<Bytes>;

    async fn estimate_gas(&self, tx: &Transaction) -> Result<u64>;
}

/// Write access to a chain through a configured signer.
#[async_trait]
pub trait TransactionSender: Send + Sync {
    /// Submits `tx` without waiting for inclusion.
    async fn send_transaction(&self, tx: &Transaction) -> Result<Option<TxHash>>;

    /// Submits `tx` and waits until it is included.
    async fn send_and_confirm(&self, tx: &Transaction) -> Result<TransactionReceipt>;
}

/// `ChainReader` and `TransactionSender` over any alloy provider.
#[derive(Clone)]
pub struct ProviderChain<P> {
    provider: P,
}

impl<P> ProviderChain<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    const MAX_RETRIES: u32 = 10;
    const RETRY_DELAY: Duration = Duration::from_secs(1);

    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn builder(&self, tx: &Transaction) -> RawCallBuilder<BoxTransport, P> {
        let mut builder =
            CallBuilder::<BoxTransport, P, ()>::new_raw(self.provider.clone(), tx.data.clone())
                .to(tx.to)
                .value(tx.value);
        if tx.from != Address::ZERO {
            builder = builder.from(tx.from);
        }
        builder
    }

    // Read calls are retried while the endpoint reports rate limiting.
    async fn with_retries<T, F, Fut>(&self, what: &str, mut request: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, alloy::contract::Error>>,
    {
        let mut attempts = 0;

        while attempts < Self::MAX_RETRIES {
            match request().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    // If it's not a rate limit error, return the error immediately
                    if !e.to_string().contains("429") && !e.to_string().contains("quota") {
                        return Err(e.into());
                    }

                    info!("Rate limit error: {}", e);
                    attempts += 1;
                    tokio::time::sleep(Self::RETRY_DELAY).await;
                }
            }
        }

        Err(eyre::eyre!(
            "Failed to {} after {} attempts",
            what,
            Self::MAX_RETRIES
        ))
    }
}

#[async_trait]
impl<P> ChainReader for ProviderChain<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    async fn call(&self, tx: &Transaction) -> Result<Bytes> {
        let builder = &self.builder(tx);
        self.with_retries("make RPC call", move || async move { builder.call().await })
            .await
    }

    async fn estimate_gas(&self, tx: &Transaction) -> Result<u64> {
        let builder = &self.builder(tx);
        self.with_retries("estimate gas", move || async move {
            builder.estimate_gas().await
        })
        .await
    }
}

#[async_trait]
impl<P> TransactionSender for ProviderChain<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    async fn send_transaction(&self, tx: &Transaction) -> Result<Option<TxHash>> {
        let pending = self.builder(tx).send().await?;
        let hash = *pending.tx_hash();
        debug!("Sent transaction {} to {}", hash, tx.to);
        Ok(Some(hash))
    }

    async fn send_and_confirm(&self, tx: &Transaction) -> Result<TransactionReceipt> {
        let pending = self.builder(tx).send().await?;
        debug!("Waiting for transaction {}", pending.tx_hash());

        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            warn!("Transaction {} reverted", receipt.transaction_hash);
        }

        Ok(TransactionReceipt {
            transaction_hash: receipt.transaction_hash,
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        })
    }
}
