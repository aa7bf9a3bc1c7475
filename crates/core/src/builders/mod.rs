pub mod price_trigger;
pub mod schedule_trigger;
pub mod uniswap_swap;

#[cfg(test)]
pub(crate) mod testing;

use crate::error::AutomationError;
use crate::types::automation::{
    Action, ActionOptions, BuilderId, PriceTriggerOptions, ScheduleTriggerOptions, Trigger,
    TriggerOptions, UniswapSwapOptions,
};
use crate::types::build_options::BuildOptions;
use crate::types::call_data::BuildResult;
use async_trait::async_trait;
use eyre::Result;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

pub use price_trigger::PriceTriggerBuilder;
pub use schedule_trigger::ScheduleTriggerBuilder;
pub use uniswap_swap::UniswapSwapBuilder;

/// Configuration handed to a builder.
#[derive(Debug, Clone, Copy)]
pub enum BlockConfig<'a> {
    Trigger(&'a TriggerOptions),
    Action(&'a ActionOptions),
}

impl BlockConfig<'_> {
    pub fn id(&self) -> BuilderId {
        match self {
            BlockConfig::Trigger(options) => options.trigger().into(),
            BlockConfig::Action(options) => options.action().into(),
        }
    }

    pub fn schedule(&self) -> Result<&ScheduleTriggerOptions> {
        match self {
            BlockConfig::Trigger(TriggerOptions::Schedule(options)) => Ok(options),
            _ => Err(self.mismatch(Trigger::Schedule.into())),
        }
    }

    pub fn price(&self) -> Result<&PriceTriggerOptions> {
        match self {
            BlockConfig::Trigger(TriggerOptions::Price(options)) => Ok(options),
            _ => Err(self.mismatch(Trigger::Price.into())),
        }
    }

    pub fn uniswap_swap(&self) -> Result<&UniswapSwapOptions> {
        match self {
            BlockConfig::Action(ActionOptions::SwapWithUniswap(options)) => Ok(options),
            _ => Err(self.mismatch(Action::SwapWithUniswap.into())),
        }
    }

    fn mismatch(&self, expected: BuilderId) -> eyre::Report {
        AutomationError::InvalidConfiguration(format!(
            "{} builder received configuration for {}",
            expected,
            self.id()
        ))
        .into()
    }
}

/// Turns one trigger or action configuration into calls.
#[async_trait]
pub trait Builder: Send + Sync {
    async fn build(&self, options: &BuildOptions, config: BlockConfig<'_>) -> Result<BuildResult>;
}

/// Builders keyed by trigger or action.
#[derive(Clone)]
pub struct BuilderRegistry {
    builders: HashMap<BuilderId, Arc<dyn Builder>>,
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Trigger::Schedule, Arc::new(ScheduleTriggerBuilder));
        registry.register(Trigger::Price, Arc::new(PriceTriggerBuilder));
        registry.register(Action::SwapWithUniswap, Arc::new(UniswapSwapBuilder));
        registry
    }
}

impl BuilderRegistry {
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Replaces any builder already registered for `id`.
    pub fn register(&mut self, id: impl Into<BuilderId>, builder: Arc<dyn Builder>) {
        let id = id.into();
        debug!("Registering builder for {}", id);
        self.builders.insert(id, builder);
    }

    /// `None` means nothing is built for `id`; callers decide whether that is an error.
    pub fn get(&self, id: impl Into<BuilderId>) -> Option<Arc<dyn Builder>> {
        self.builders.get(&id.into()).cloned()
    }

    pub fn contains(&self, id: impl Into<BuilderId>) -> bool {
        self.builders.contains_key(&id.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_no_instant_builder() {
        let registry = BuilderRegistry::default();
        assert!(registry.contains(Trigger::Schedule));
        assert!(registry.contains(Trigger::Price));
        assert!(registry.contains(Action::SwapWithUniswap));
        assert!(registry.get(Trigger::Instant).is_none());
    }

    #[test]
    fn mismatched_config_is_rejected() {
        let config = BlockConfig::Trigger(&TriggerOptions::Instant);
        let err = config.schedule().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AutomationError>(),
            Some(AutomationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn registered_builders_can_be_replaced() {
        struct Nothing;

        #[async_trait]
        impl Builder for Nothing {
            async fn build(&self, _: &BuildOptions, _: BlockConfig<'_>) -> Result<BuildResult> {
                Ok(BuildResult::empty())
            }
        }

        let mut registry = BuilderRegistry::empty();
        assert!(registry.get(Trigger::Instant).is_none());
        registry.register(Trigger::Instant, Arc::new(Nothing));
        assert!(registry.contains(Trigger::Instant));
    }
}
