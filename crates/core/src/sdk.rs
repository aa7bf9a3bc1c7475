use crate::backend::{AuthenticationData, Backend, HttpBackend, KeyPair};
use crate::bindings::automation_vault::AutomationVault;
use crate::bindings::vault_factory::VaultFactory;
use crate::builders::{BlockConfig, BuilderRegistry};
use crate::chain::{ChainReader, TransactionSender};
use crate::error::AutomationError;
use crate::router::{RoutePlanner, StaticRoutePlanner};
use crate::types::address_book::AddressBook;
use crate::types::automation::{Action, Automation, AutomationInitOptions, Trigger};
use crate::types::build_options::{
    AutomationBuildOptions, AutomationBuildResult, BuildOptions, Holder, UnwrapNativeCall,
    VaultSelection,
};
use crate::types::call_data::{BuildResult, CallData, CallDataSet};
use crate::types::config_wrapper::DEFAULT_BACKEND_URL;
use crate::types::transaction::Transaction;
use crate::types::vault::{RootAccountData, Vault};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::signers::Signer;
use alloy::sol_types::{SolCall, SolEvent};
use eyre::Result;
use futures::future::try_join_all;
use log::{debug, info, warn};
use std::sync::Arc;

/// Index a first vault is deployed under.
pub const DEFAULT_VAULT_INDEX: u16 = 1;
/// Number of indices `deploy_vault` tries before giving up.
pub const MAX_VAULT_INDEX_ATTEMPTS: u16 = 16;
/// Times a registered workflow runs.
pub const WORKFLOW_REPEAT_COUNT: u64 = 1;

#[derive(Debug, Clone)]
pub struct SdkOptions {
    pub account_address: Address,
    pub backend_url: String,
    pub address_book: AddressBook,
    pub unwrap_native: UnwrapNativeCall,
}

impl SdkOptions {
    pub fn new(account_address: Address) -> Self {
        Self {
            account_address,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            address_book: AddressBook::builtin(),
            unwrap_native: UnwrapNativeCall::default(),
        }
    }
}

/// Builder output split by destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionedCallData {
    /// Action calls executed by the vault, in action order.
    pub vault_relative_actions: Vec<CallData>,
    /// Trigger calls registered as checkers on the vault.
    pub vault_relative_triggers: Vec<CallData>,
    /// Everything sent straight from the account, in submission order.
    pub account_relative: CallDataSet,
}

/// Splits builder output into calls for `vault` and calls for anything else.
///
/// `account_relative` is extended in place, so calls queued before building (a factory
/// deployment) stay in front. Relative order inside each group is preserved and action
/// calls precede trigger calls.
pub fn partition_call_data(
    vault: Address,
    actions: &[BuildResult],
    trigger: &BuildResult,
    account_relative: CallDataSet,
) -> PartitionedCallData {
    let mut partitioned = PartitionedCallData {
        account_relative,
        ..Default::default()
    };

    for call in actions.iter().flat_map(|result| result.call_data.iter()) {
        if call.to == vault {
            partitioned.vault_relative_actions.push(call.clone());
        } else {
            partitioned.account_relative.insert(call.clone());
        }
    }

    for call in trigger.call_data.iter() {
        if call.to == vault {
            partitioned.vault_relative_triggers.push(call.clone());
        } else {
            partitioned.account_relative.insert(call.clone());
        }
    }

    partitioned
}

/// The single call sent to the vault.
///
/// Instant automations run their actions straight away. Everything else registers a
/// workflow whose checkers are the trigger calls.
pub fn encode_vault_call(
    trigger: Trigger,
    partitioned: &PartitionedCallData,
    vault: Address,
) -> Bytes {
    if trigger == Trigger::Instant {
        let data = partitioned
            .vault_relative_actions
            .iter()
            .map(|call| call.call_data.clone())
            .collect();
        return AutomationVault::multicallCall { data }.abi_encode().into();
    }

    let checkers = partitioned
        .vault_relative_triggers
        .iter()
        .map(|call| AutomationVault::Checker {
            data: call.call_data.clone(),
            viewData: call.view_data.clone().unwrap_or_default(),
            initData: call.init_data.clone().unwrap_or_default(),
        })
        .collect();
    let actions = partitioned
        .vault_relative_actions
        .iter()
        .map(|call| AutomationVault::Action {
            data: call.call_data.clone(),
            viewData: Bytes::new(),
            initData: Bytes::new(),
        })
        .collect();

    let add_workflow = AutomationVault::addWorkflowAndGelatoTaskCall {
        checkers,
        actions,
        executor: vault,
        count: U256::from(WORKFLOW_REPEAT_COUNT),
    };

    AutomationVault::multicallCall {
        data: vec![add_workflow.abi_encode().into()],
    }
    .abi_encode()
    .into()
}

fn sum_values(actions: &[BuildResult], trigger: &BuildResult) -> Result<U256> {
    actions
        .iter()
        .chain(std::iter::once(trigger))
        .try_fold(U256::ZERO, |total, result| {
            total
                .checked_add(result.value)
                .ok_or_else(|| AutomationError::ValueOverflow.into())
        })
}

/// A vault known to be deployed for the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedVault {
    pub address: Address,
    pub vault_id: u16,
    /// `None` when the vault already existed and was only linked.
    pub transaction_hash: Option<TxHash>,
}

pub struct AutomationSdk {
    account_address: Address,
    root_account_data: Option<RootAccountData>,
    key_pair: Option<KeyPair>,
    address_book: AddressBook,
    unwrap_native: UnwrapNativeCall,
    registry: BuilderRegistry,
    backend: Arc<dyn Backend>,
    reader: Arc<dyn ChainReader>,
    sender: Option<Arc<dyn TransactionSender>>,
    router: Arc<dyn RoutePlanner>,
}

impl AutomationSdk {
    pub fn new(options: SdkOptions, reader: Arc<dyn ChainReader>) -> Self {
        Self {
            account_address: options.account_address,
            root_account_data: None,
            key_pair: None,
            address_book: options.address_book,
            unwrap_native: options.unwrap_native,
            registry: BuilderRegistry::default(),
            backend: Arc::new(HttpBackend::new(options.backend_url)),
            reader,
            sender: None,
            router: Arc::new(StaticRoutePlanner::default()),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_sender(mut self, sender: Arc<dyn TransactionSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_router(mut self, router: Arc<dyn RoutePlanner>) -> Self {
        self.router = router;
        self
    }

    pub fn with_registry(mut self, registry: BuilderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Uses account data obtained elsewhere instead of authenticating.
    pub fn with_account_data(mut self, data: RootAccountData) -> Self {
        self.root_account_data = Some(data);
        self
    }

    pub fn with_key_pair(mut self, key_pair: KeyPair) -> Self {
        self.key_pair = Some(key_pair);
        self
    }

    pub fn account_address(&self) -> Address {
        self.account_address
    }

    pub fn account_data(&self) -> Option<&RootAccountData> {
        self.root_account_data.as_ref()
    }

    pub fn key_pair(&self) -> Option<&KeyPair> {
        self.key_pair.as_ref()
    }

    pub fn address_book(&self) -> &AddressBook {
        &self.address_book
    }

    pub fn registry_mut(&mut self) -> &mut BuilderRegistry {
        &mut self.registry
    }

    /// Switches to another account and drops the session of the previous one.
    pub fn reset_account_address(&mut self, address: Address) -> &mut Self {
        self.account_address = address;
        self.key_pair = None;
        self.root_account_data = None;
        self
    }

    pub fn create_automation(&self, options: AutomationInitOptions) -> Automation {
        Automation::new(options)
    }

    pub fn vaults(&self) -> Vec<&Vault> {
        self.root_account_data
            .as_ref()
            .map(|data| data.vaults().collect())
            .unwrap_or_default()
    }

    pub fn vault(&self, index: usize, chain_id: Option<u64>) -> Option<&Vault> {
        self.root_account_data
            .as_ref()
            .and_then(|data| data.vault(index, chain_id))
    }

    // Authentication

    pub async fn authentication_nonce(&self) -> Result<Option<String>> {
        self.backend.nonce(self.account_address).await
    }

    pub async fn verify_signature(&mut self, signature: &str) -> Result<()> {
        let data = self
            .backend
            .verify_signature(signature, self.account_address)
            .await?
            .ok_or(AutomationError::SignatureRejected)?;
        self.store_session(data)
    }

    /// Signs the backend nonce with `signer` and opens a session for the account.
    pub async fn authenticate_with_signer<S>(&mut self, signer: &S) -> Result<()>
    where
        S: Signer + Send + Sync,
    {
        if signer.address() != self.account_address {
            return Err(AutomationError::AddressMismatch.into());
        }

        let nonce = self
            .authentication_nonce()
            .await?
            .filter(|nonce| !nonce.is_empty())
            .ok_or(AutomationError::InvalidNonce)?;

        let signature = signer.sign_message(nonce.as_bytes()).await?;
        let signature = format!("0x{}", hex::encode(signature.as_bytes()));

        self.verify_signature(&signature).await
    }

    /// Exchanges the refresh token for a new key pair.
    pub async fn refresh_session(&mut self) -> Result<()> {
        let key_pair = self
            .key_pair
            .as_ref()
            .ok_or(AutomationError::NotAuthenticated)?;
        let data = self
            .backend
            .refresh_token(key_pair)
            .await?
            .ok_or(AutomationError::NotAuthenticated)?;
        self.store_session(data)
    }

    pub async fn refresh_account_data(&mut self) -> Result<()> {
        let access_token = self.access_token()?.to_string();
        match self.backend.account_data(&access_token).await? {
            Some(data) => self.root_account_data = Some(data),
            None => warn!("Backend returned no account data, keeping the cached copy"),
        }
        Ok(())
    }

    fn store_session(&mut self, data: AuthenticationData) -> Result<()> {
        self.key_pair = Some(KeyPair::new(data.access_token, data.refresh_token)?);
        self.root_account_data = Some(data.full_user_data);
        info!("Authenticated {}", self.account_address);
        Ok(())
    }

    fn access_token(&self) -> Result<&str> {
        self.key_pair
            .as_ref()
            .map(|key_pair| key_pair.access_token())
            .ok_or_else(|| AutomationError::NotAuthenticated.into())
    }

    // Building

    async fn predict_vault_address(&self, factory: Address, vault_id: u16) -> Result<Address> {
        let predict = VaultFactory::predictDeterministicVaultAddressCall {
            creator: self.account_address,
            vaultId: vault_id,
        };
        let response = self
            .reader
            .call(&Transaction {
                from: self.account_address,
                to: factory,
                value: U256::ZERO,
                data: predict.abi_encode().into(),
            })
            .await?;

        Ok(
            VaultFactory::predictDeterministicVaultAddressCall::abi_decode_returns(&response, true)?
                .predicted,
        )
    }

    fn deploy_transaction(&self, factory: Address, version: u16, vault_id: u16) -> Transaction {
        Transaction {
            from: self.account_address,
            to: factory,
            value: U256::ZERO,
            data: VaultFactory::deployCall {
                version,
                vaultId: vault_id,
            }
            .abi_encode()
            .into(),
        }
    }

    /// Existing vault for the chain, or a predicted address plus the factory call deploying it.
    async fn resolve_vault(
        &self,
        options: &AutomationBuildOptions,
    ) -> Result<(Address, CallDataSet)> {
        let mut account_calls = CallDataSet::new();

        let known = match &options.vault {
            VaultSelection::Automatic => self.vault(0, Some(options.chain_id)),
            VaultSelection::Explicit(vault) => Some(vault),
        };
        if let Some(vault) = known {
            debug!("Using vault {} on chain {}", vault.address, options.chain_id);
            return Ok((vault.address, account_calls));
        }

        let addresses = self.address_book.chain(options.chain_id);
        let factory = addresses.require_vault_factory(options.chain_id)?;
        let version = addresses.require_latest_vault_version(options.chain_id)?;

        let predicted = self
            .predict_vault_address(factory, DEFAULT_VAULT_INDEX)
            .await?;
        info!(
            "No vault on chain {}, deploying one at {}",
            options.chain_id, predicted
        );

        let deploy = self.deploy_transaction(factory, version, DEFAULT_VAULT_INDEX);
        account_calls.insert(CallData::new(deploy.to, deploy.data));

        Ok((predicted, account_calls))
    }

    async fn build_action(
        &self,
        action: Action,
        automation: &Automation,
        options: &BuildOptions,
    ) -> Result<BuildResult> {
        let builder = self
            .registry
            .get(action)
            .ok_or(AutomationError::BuilderNotFound(action.into()))?;
        let config = automation
            .action_configuration(action)
            .ok_or(AutomationError::ActionNotConfigured(action))?;

        debug!("Building action {}", action);
        builder.build(options, BlockConfig::Action(config)).await
    }

    async fn build_trigger(
        &self,
        automation: &Automation,
        options: &BuildOptions,
    ) -> Result<BuildResult> {
        let trigger = automation.trigger();
        let Some(builder) = self.registry.get(trigger) else {
            debug!("Nothing to build for trigger {}", trigger);
            return Ok(BuildResult::empty());
        };
        let config = automation
            .trigger_configuration()
            .ok_or(AutomationError::TriggerNotConfigured(trigger))?;

        debug!("Building trigger {}", trigger);
        builder.build(options, BlockConfig::Trigger(config)).await
    }

    /// Builds the vault call and the account calls that must precede it.
    pub async fn build_automation(
        &self,
        automation: &Automation,
        options: &AutomationBuildOptions,
    ) -> Result<AutomationBuildResult> {
        if self.root_account_data.is_none() {
            return Err(AutomationError::AccountNotInitialized.into());
        }

        let (vault_address, account_calls) = self.resolve_vault(options).await?;

        let recipient = match options.transfer_from {
            Holder::Vault => vault_address,
            Holder::Signer => self.account_address,
        };
        let build_options = BuildOptions {
            chain_id: automation.chain_id(),
            recipient,
            account_address: self.account_address,
            vault_address,
            addresses: self.address_book.chain(automation.chain_id()),
            unwrap_native: self.unwrap_native,
            reader: self.reader.clone(),
            router: self.router.clone(),
        };

        let actions = try_join_all(
            automation
                .actions()
                .iter()
                .map(|action| self.build_action(*action, automation, &build_options)),
        );
        let trigger = self.build_trigger(automation, &build_options);
        let (action_results, trigger_result) = futures::try_join!(actions, trigger)?;

        let deploy_value = sum_values(&action_results, &trigger_result)?;
        let partitioned =
            partition_call_data(vault_address, &action_results, &trigger_result, account_calls);

        debug!(
            "{} vault action call(s), {} checker(s), {} account call(s)",
            partitioned.vault_relative_actions.len(),
            partitioned.vault_relative_triggers.len(),
            partitioned.account_relative.len()
        );

        Ok(AutomationBuildResult {
            deploy_value,
            deploy_call_data: encode_vault_call(automation.trigger(), &partitioned, vault_address),
            account_relative_call_data: partitioned.account_relative.into_vec(),
            vault_address,
        })
    }

    // Submission

    fn sender(&self) -> Result<&Arc<dyn TransactionSender>> {
        self.sender
            .as_ref()
            .ok_or_else(|| AutomationError::NoSigner.into())
    }

    /// Sends every account call, each confirmed before the next, then the vault call.
    ///
    /// Nothing is rolled back on failure: account calls confirmed before the error stay on chain.
    pub async fn deploy_automation(
        &self,
        automation: &Automation,
        options: &AutomationBuildOptions,
    ) -> Result<TxHash> {
        let build = self.build_automation(automation, options).await?;

        if build.vault_address == Address::ZERO {
            return Err(AutomationError::InvalidVaultAddress.into());
        }
        let sender = self.sender()?;

        for call in &build.account_relative_call_data {
            let receipt = sender
                .send_and_confirm(&Transaction {
                    from: self.account_address,
                    to: call.to,
                    value: U256::ZERO,
                    data: call.call_data.clone(),
                })
                .await?;
            info!(
                "Account call to {} confirmed in {}",
                call.to, receipt.transaction_hash
            );
        }

        let hash = sender
            .send_transaction(&Transaction {
                from: self.account_address,
                to: build.vault_address,
                value: build.deploy_value,
                data: build.deploy_call_data,
            })
            .await?
            .ok_or(AutomationError::TransactionNotSent)?;
        info!("Automation sent to vault {} in {}", build.vault_address, hash);

        Ok(hash)
    }

    async fn link_vault(&mut self, chain_id: u64, vault: Address) -> Result<()> {
        let access_token = self.access_token()?.to_string();
        let linked = self
            .backend
            .link_vault(chain_id, self.account_address, vault, &access_token)
            .await?;
        if !linked {
            warn!("Backend did not confirm link of vault {}", vault);
        }
        self.refresh_account_data().await
    }

    /// Deploys a vault under the first free index and links it to the account.
    ///
    /// An index whose deployment cannot be estimated is taken. If its vault is not known
    /// to the backend yet it is linked and returned, otherwise the next index is tried.
    pub async fn deploy_vault(&mut self, chain_id: u64) -> Result<DeployedVault> {
        let addresses = self.address_book.chain(chain_id);
        let factory = addresses.require_vault_factory(chain_id)?;
        let version = addresses.require_latest_vault_version(chain_id)?;
        let sender = self.sender()?.clone();
        self.access_token()?;

        for vault_id in DEFAULT_VAULT_INDEX..DEFAULT_VAULT_INDEX + MAX_VAULT_INDEX_ATTEMPTS {
            let predicted = self.predict_vault_address(factory, vault_id).await?;
            let deploy = self.deploy_transaction(factory, version, vault_id);

            match self.reader.estimate_gas(&deploy).await {
                Ok(gas) => {
                    debug!("Deploying vault {} ({} gas)", vault_id, gas);
                    let receipt = sender.send_and_confirm(&deploy).await?;

                    let created = receipt
                        .logs
                        .iter()
                        .filter(|log| log.address == factory)
                        .find_map(|log| {
                            VaultFactory::VaultCreated::decode_log_data(&log.data, true).ok()
                        })
                        .ok_or(AutomationError::VaultCreationEventMissing)?;

                    info!("Vault {} deployed at {}", created.vaultId, created.vault);
                    self.link_vault(chain_id, created.vault).await?;

                    return Ok(DeployedVault {
                        address: created.vault,
                        vault_id: created.vaultId,
                        transaction_hash: Some(receipt.transaction_hash),
                    });
                }
                Err(e) => {
                    let known = self
                        .root_account_data
                        .as_ref()
                        .is_some_and(|data| data.has_vault(predicted, chain_id));
                    if !known {
                        info!(
                            "Vault {} already deployed at {}, linking it",
                            vault_id, predicted
                        );
                        self.link_vault(chain_id, predicted).await?;
                        return Ok(DeployedVault {
                            address: predicted,
                            vault_id,
                            transaction_hash: None,
                        });
                    }
                    debug!("Vault index {} taken: {}", vault_id, e);
                }
            }
        }

        Err(AutomationError::VaultIndexExhausted {
            attempts: MAX_VAULT_INDEX_ATTEMPTS,
        }
        .into())
    }
}
