use crate::error::AutomationError;
use crate::utils::format_seconds::TimeScale;
use alloy::primitives::{Address, U256};
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    Instant,
    Schedule,
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    SwapWithUniswap,
}

/// Key of the builder registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderId {
    Trigger(Trigger),
    Action(Action),
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Instant => write!(f, "instant"),
            Trigger::Schedule => write!(f, "schedule"),
            Trigger::Price => write!(f, "price"),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SwapWithUniswap => write!(f, "swapWithUniswap"),
        }
    }
}

impl fmt::Display for BuilderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderId::Trigger(trigger) => write!(f, "trigger {trigger}"),
            BuilderId::Action(action) => write!(f, "action {action}"),
        }
    }
}

impl From<Trigger> for BuilderId {
    fn from(trigger: Trigger) -> Self {
        BuilderId::Trigger(trigger)
    }
}

impl From<Action> for BuilderId {
    fn from(action: Action) -> Self {
        BuilderId::Action(action)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    pub frequency: f64,
    pub scale: TimeScale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTriggerOptions {
    pub start_at_timestamp: u64,
    #[serde(default)]
    pub repeat_times: Option<u64>,
    pub cycle: Cycle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTriggerOptions {
    pub token_address: Address,
    #[serde(default)]
    pub base_token_address: Option<Address>,
    pub uniswap_pool_fee_tier: u32,
    pub trigger_at_price: f64,
    #[serde(default)]
    pub price_must_be_higher_than: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniswapSwapOptions {
    pub from_token: Address,
    pub to_token: Address,
    pub from_amount: U256,
    #[serde(default)]
    pub slippage_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TriggerOptions {
    Instant,
    Schedule(ScheduleTriggerOptions),
    Price(PriceTriggerOptions),
}

impl TriggerOptions {
    pub fn trigger(&self) -> Trigger {
        match self {
            TriggerOptions::Instant => Trigger::Instant,
            TriggerOptions::Schedule(_) => Trigger::Schedule,
            TriggerOptions::Price(_) => Trigger::Price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionOptions {
    SwapWithUniswap(UniswapSwapOptions),
}

impl ActionOptions {
    pub fn action(&self) -> Action {
        match self {
            ActionOptions::SwapWithUniswap(_) => Action::SwapWithUniswap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationInitOptions {
    pub trigger: Trigger,
    pub actions: Vec<Action>,
    pub chain_id: u64,
}

/// One trigger plus the declared actions, configured once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Automation {
    options: AutomationInitOptions,
    trigger_configuration: Option<TriggerOptions>,
    action_configurations: HashMap<Action, ActionOptions>,
}

impl Automation {
    pub fn new(options: AutomationInitOptions) -> Self {
        Self {
            options,
            trigger_configuration: None,
            action_configurations: HashMap::new(),
        }
    }

    pub fn configure_trigger(mut self, options: TriggerOptions) -> Result<Self> {
        if options.trigger() != self.options.trigger {
            return Err(AutomationError::InvalidTrigger {
                expected: self.options.trigger,
                got: options.trigger(),
            }
            .into());
        }
        self.trigger_configuration = Some(options);
        Ok(self)
    }

    pub fn configure_action(mut self, options: ActionOptions) -> Result<Self> {
        let action = options.action();
        if !self.options.actions.contains(&action) {
            return Err(AutomationError::InvalidAction(action).into());
        }
        self.action_configurations.insert(action, options);
        Ok(self)
    }

    pub fn options(&self) -> &AutomationInitOptions {
        &self.options
    }

    pub fn trigger(&self) -> Trigger {
        self.options.trigger
    }

    pub fn actions(&self) -> &[Action] {
        &self.options.actions
    }

    pub fn chain_id(&self) -> u64 {
        self.options.chain_id
    }

    pub fn trigger_configuration(&self) -> Option<&TriggerOptions> {
        self.trigger_configuration.as_ref()
    }

    pub fn action_configuration(&self, action: Action) -> Option<&ActionOptions> {
        self.action_configurations.get(&action)
    }

    pub fn action_configurations(&self) -> &HashMap<Action, ActionOptions> {
        &self.action_configurations
    }
}
