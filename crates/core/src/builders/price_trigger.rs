use super::{BlockConfig, Builder};
use crate::bindings::automation_vault::AutomationVault::{
    priceCheckerUniswapInitializeCall, uniswapCheckGTTargetRateCall, uniswapCheckLTTargetRateCall,
};
use crate::bindings::price_oracle::PriceOracle::consultCall;
use crate::error::AutomationError;
use crate::types::automation::PriceTriggerOptions;
use crate::types::build_options::BuildOptions;
use crate::types::call_data::{BuildResult, CallData, CallDataSet};
use crate::types::transaction::Transaction;
use crate::utils::nonce::{random_nonce, strip_nonce};
use crate::utils::pool_address::compute_pool_address;
use alloy::primitives::{Address, Bytes, U256, aliases::U24};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use eyre::Result;
use log::debug;

const E18: u128 = 1_000_000_000_000_000_000;

pub struct PriceTriggerBuilder;

/// Pool rate comparison the vault runs on every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateCheck {
    GreaterThan,
    LessThan,
}

impl RateCheck {
    /// Picks the checker from token order and the requested direction.
    /// An unset direction counts as "lower".
    pub fn select(is_base_first_token: bool, price_must_be_higher_than: Option<bool>) -> Self {
        let higher = price_must_be_higher_than.unwrap_or(false);
        match (is_base_first_token, higher) {
            (true, true) => RateCheck::LessThan,
            (true, false) => RateCheck::GreaterThan,
            (false, true) => RateCheck::GreaterThan,
            (false, false) => RateCheck::LessThan,
        }
    }

    pub fn selector(&self) -> [u8; 4] {
        match self {
            RateCheck::GreaterThan => uniswapCheckGTTargetRateCall::SELECTOR,
            RateCheck::LessThan => uniswapCheckLTTargetRateCall::SELECTOR,
        }
    }
}

fn invalid_price(price: f64) -> eyre::Report {
    AutomationError::InvalidConfiguration(format!("invalid trigger price {price}")).into()
}

/// `price` as an 18-decimal fixed point integer.
fn scale_price(price: f64) -> Result<U256> {
    if !price.is_finite() || price <= 0.0 {
        return Err(invalid_price(price));
    }
    let scaled = (price * E18 as f64) as u128;
    if scaled == 0 {
        return Err(invalid_price(price));
    }
    Ok(U256::from(scaled))
}

/// Re-orients an oracle quote to the price the user gave: `rate / price` when the price is
/// at least one, `rate * (1 / price)` below one. Both truncate.
pub fn invert_rate(oracle_rate: U256, price: f64) -> Result<U256> {
    let e18 = U256::from(E18);
    let scaled = scale_price(price)?;

    let target = if price >= 1.0 {
        oracle_rate
            .checked_mul(e18)
            .ok_or(AutomationError::ValueOverflow)?
            / scaled
    } else {
        let inverse = e18 * e18 / scaled;
        oracle_rate
            .checked_mul(inverse)
            .ok_or(AutomationError::ValueOverflow)?
            / e18
    };

    Ok(target)
}

/// Amount the oracle is asked to quote: `price` itself when it is at least one, otherwise one.
///
/// The quote is later divided by `price`, so a fractional price above one would quote a
/// different amount than it divides by.
pub fn oracle_amount_in(price: f64) -> Result<U256> {
    scale_price(price)?;
    if price < 1.0 {
        return Ok(U256::from(1u64));
    }
    if price.fract() != 0.0 {
        return Err(AutomationError::InvalidConfiguration(format!(
            "trigger price {price} must be a whole number or below one"
        ))
        .into());
    }
    Ok(U256::from(price as u128))
}

fn integral_price(price: f64) -> Result<U256> {
    if !price.is_finite() || price <= 0.0 || price.fract() != 0.0 {
        return Err(AutomationError::InvalidConfiguration(format!(
            "trigger price {price} must be a whole number when the base token sorts first"
        ))
        .into());
    }
    Ok(U256::from(price as u128))
}

async fn oracle_target_rate(
    options: &BuildOptions,
    trigger: &PriceTriggerOptions,
    base_token: Address,
) -> Result<U256> {
    let oracle = options.addresses.require_price_oracle(options.chain_id)?;
    let pool_factory = options
        .addresses
        .require_uniswap_pool_factory(options.chain_id)?;
    let fee = U24::try_from(trigger.uniswap_pool_fee_tier).map_err(|_| {
        AutomationError::InvalidConfiguration(format!(
            "pool fee tier {} does not fit in uint24",
            trigger.uniswap_pool_fee_tier
        ))
    })?;

    let consult = consultCall {
        tokenIn: base_token,
        amountIn: oracle_amount_in(trigger.trigger_at_price)?,
        tokenOut: trigger.token_address,
        fee,
        factory: pool_factory,
    };

    let response = options
        .reader
        .call(&Transaction {
            from: Address::ZERO,
            to: oracle,
            value: U256::ZERO,
            data: Bytes::from(consult.abi_encode()),
        })
        .await?;
    if response.is_empty() {
        return Err(AutomationError::TargetRateNotCalculated.into());
    }

    let oracle_rate = consultCall::abi_decode_returns(&response, true)?.amountOut;
    debug!(
        "Oracle quoted {} for price {}",
        oracle_rate, trigger.trigger_at_price
    );

    invert_rate(oracle_rate, trigger.trigger_at_price)
}

#[async_trait]
impl Builder for PriceTriggerBuilder {
    async fn build(&self, options: &BuildOptions, config: BlockConfig<'_>) -> Result<BuildResult> {
        let trigger = config.price()?;

        let base_token = trigger
            .base_token_address
            .or(options.addresses.stable_base_token)
            .ok_or(AutomationError::NoBaseToken)?;

        let pool = compute_pool_address(
            options.addresses.uniswap_pool_factory,
            trigger.token_address,
            base_token,
            trigger.uniswap_pool_fee_tier,
        );
        if pool == Address::ZERO {
            return Err(AutomationError::PoolNotFound.into());
        }

        // Address ordering is numeric, the same as the pool's token0/token1.
        let is_base_first_token = base_token > trigger.token_address;

        let target_rate = if is_base_first_token {
            integral_price(trigger.trigger_at_price)?
        } else {
            oracle_target_rate(options, trigger, base_token).await?
        };

        let check = RateCheck::select(is_base_first_token, trigger.price_must_be_higher_than);
        debug!(
            "Price trigger on pool {} with target rate {} ({:?})",
            pool, target_rate, check
        );

        let init = priceCheckerUniswapInitializeCall {
            uniswapPool: pool,
            targetRate: target_rate,
            pointer: random_nonce(),
        };
        let selector = Bytes::copy_from_slice(&check.selector());

        let call = CallData::new(options.vault_address, selector.clone())
            .with_init_data(strip_nonce(init.abi_encode()))
            .with_view_data(selector);

        Ok(BuildResult {
            call_data: CallDataSet::from_iter([call]),
            value: U256::ZERO,
        })
    }
}
