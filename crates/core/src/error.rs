use crate::types::automation::{Action, BuilderId, Trigger};
use thiserror::Error;

/// Failures raised by the automation pipeline.
///
/// Operations return `eyre::Result`; callers that need the category recover it with
/// `report.downcast_ref::<AutomationError>()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AutomationError {
    #[error("Account not initialized")]
    AccountNotInitialized,

    #[error("Not authenticated with the backend")]
    NotAuthenticated,

    #[error("Builder not found for {0}")]
    BuilderNotFound(BuilderId),

    #[error("Invalid action: {0} was not declared for this automation")]
    InvalidAction(Action),

    #[error("Invalid trigger: automation declares {expected}, got options for {got}")]
    InvalidTrigger { expected: Trigger, got: Trigger },

    #[error("Action {0} is not configured")]
    ActionNotConfigured(Action),

    #[error("Trigger {0} is not configured")]
    TriggerNotConfigured(Trigger),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("No base token found")]
    NoBaseToken,

    #[error("No {contract} address found for chain {chain_id}")]
    MissingAddress {
        contract: &'static str,
        chain_id: u64,
    },

    #[error("Uniswap pool not found for price-based trigger")]
    PoolNotFound,

    #[error("Target rate not calculated for price-based trigger")]
    TargetRateNotCalculated,

    #[error("Uniswap route not built")]
    RouteNotBuilt,

    #[error("Invalid route call data: {0}")]
    InvalidRouteCallData(String),

    #[error("Aggregate value overflow")]
    ValueOverflow,

    #[error("Invalid vault address")]
    InvalidVaultAddress,

    #[error("No signer found")]
    NoSigner,

    #[error("Transaction not sent")]
    TransactionNotSent,

    #[error("Vault creation event not found in receipt")]
    VaultCreationEventMissing,

    #[error("No free vault index after {attempts} attempts")]
    VaultIndexExhausted { attempts: u16 },

    #[error("Provider address and SDK address did not match")]
    AddressMismatch,

    #[error("Invalid nonce returned from backend")]
    InvalidNonce,

    #[error("Data not retrieved, possible invalid signature")]
    SignatureRejected,

    #[error("Invalid tokens provided")]
    InvalidTokens,
}
