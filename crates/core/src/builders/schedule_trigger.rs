use super::{BlockConfig, Builder};
use crate::bindings::automation_vault::AutomationVault::{
    checkTimeCall, checkTimeViewCall, timeCheckerInitializeCall,
};
use crate::error::AutomationError;
use crate::types::automation::ScheduleTriggerOptions;
use crate::types::build_options::BuildOptions;
use crate::types::call_data::{BuildResult, CallData, CallDataSet};
use crate::utils::format_seconds::format_seconds;
use crate::utils::nonce::{random_nonce, strip_nonce};
use alloy::primitives::{Bytes, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use eyre::Result;

/// Poll interval used when the schedule does not repeat.
pub const MIN_REPEAT_SECONDS: u64 = 60;

pub struct ScheduleTriggerBuilder;

pub fn repeat_seconds(options: &ScheduleTriggerOptions) -> u64 {
    match options.repeat_times {
        Some(times) if times > 1 => format_seconds(options.cycle.frequency, options.cycle.scale),
        _ => MIN_REPEAT_SECONDS,
    }
}

#[async_trait]
impl Builder for ScheduleTriggerBuilder {
    async fn build(&self, options: &BuildOptions, config: BlockConfig<'_>) -> Result<BuildResult> {
        let schedule = config.schedule()?;

        let repeat = repeat_seconds(schedule);
        let anchor = schedule
            .start_at_timestamp
            .checked_sub(repeat)
            .ok_or_else(|| {
                AutomationError::InvalidConfiguration(format!(
                    "start timestamp {} is earlier than one {}s period",
                    schedule.start_at_timestamp, repeat
                ))
            })?;

        let init = timeCheckerInitializeCall {
            lastActionTime: anchor,
            timePeriod: repeat,
            pointer: random_nonce(),
        };

        let call = CallData::new(
            options.vault_address,
            Bytes::copy_from_slice(&checkTimeCall::SELECTOR),
        )
        .with_init_data(strip_nonce(init.abi_encode()))
        .with_view_data(Bytes::copy_from_slice(&checkTimeViewCall::SELECTOR));

        Ok(BuildResult {
            call_data: CallDataSet::from_iter([call]),
            value: U256::ZERO,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::testing::build_options;
    use crate::types::automation::{Cycle, TriggerOptions};
    use crate::utils::format_seconds::TimeScale;

    fn schedule(repeat_times: Option<u64>, frequency: f64, scale: TimeScale) -> TriggerOptions {
        TriggerOptions::Schedule(ScheduleTriggerOptions {
            start_at_timestamp: 1_700_000_000,
            repeat_times,
            cycle: Cycle { frequency, scale },
        })
    }

    #[test]
    fn single_run_polls_every_minute() {
        for repeat_times in [None, Some(0), Some(1)] {
            let TriggerOptions::Schedule(options) = schedule(repeat_times, 5.0, TimeScale::Days)
            else {
                unreachable!()
            };
            assert_eq!(repeat_seconds(&options), MIN_REPEAT_SECONDS);
        }
    }

    #[test]
    fn repeating_schedule_uses_cycle() {
        let TriggerOptions::Schedule(options) = schedule(Some(3), 2.0, TimeScale::Hours) else {
            unreachable!()
        };
        assert_eq!(repeat_seconds(&options), 7_200);
    }

    #[tokio::test]
    async fn emits_time_checker_for_vault() {
        let options = build_options();
        let trigger = schedule(Some(4), 1.0, TimeScale::Days);

        let result = ScheduleTriggerBuilder
            .build(&options, BlockConfig::Trigger(&trigger))
            .await
            .unwrap();

        assert_eq!(result.value, U256::ZERO);
        assert_eq!(result.call_data.len(), 1);

        let call = result.call_data.iter().next().unwrap();
        assert_eq!(call.to, options.vault_address);
        assert_eq!(&call.call_data[..], &checkTimeCall::SELECTOR[..]);
        assert_eq!(
            call.view_data,
            Some(Bytes::copy_from_slice(&checkTimeViewCall::SELECTOR))
        );

        // selector + lastActionTime + timePeriod, nonce word stripped
        let init = call.init_data.as_ref().unwrap();
        assert_eq!(init.len(), 4 + 64);
        assert_eq!(&init[..4], &timeCheckerInitializeCall::SELECTOR[..]);
        assert_eq!(
            U256::from_be_slice(&init[4..36]),
            U256::from(1_700_000_000u64 - 86_400)
        );
        assert_eq!(U256::from_be_slice(&init[36..68]), U256::from(86_400u64));
    }

    #[tokio::test]
    async fn builds_are_identical_once_nonce_is_stripped() {
        let options = build_options();
        let trigger = schedule(None, 1.0, TimeScale::Minutes);

        let first = ScheduleTriggerBuilder
            .build(&options, BlockConfig::Trigger(&trigger))
            .await
            .unwrap();
        let second = ScheduleTriggerBuilder
            .build(&options, BlockConfig::Trigger(&trigger))
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn start_before_first_period_is_rejected() {
        let options = build_options();
        let trigger = TriggerOptions::Schedule(ScheduleTriggerOptions {
            start_at_timestamp: 30,
            repeat_times: None,
            cycle: Cycle {
                frequency: 1.0,
                scale: TimeScale::Minutes,
            },
        });

        let err = ScheduleTriggerBuilder
            .build(&options, BlockConfig::Trigger(&trigger))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AutomationError>(),
            Some(AutomationError::InvalidConfiguration(_))
        ));
    }
}
