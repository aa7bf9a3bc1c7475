use super::{BlockConfig, Builder};
use crate::bindings::automation_vault::AutomationVault::{
    uniswapSwapExactInputCall, unwrapNativeCall, wrapNativeFromVaultBalanceCall,
};
use crate::bindings::erc20::ERC20::transferCall;
use crate::error::AutomationError;
use crate::router::{
    DEFAULT_SLIPPAGE_PERCENT, MAX_SWAPS_PER_PATH, ROUTE_DEADLINE_SECONDS, RouteRequest,
};
use crate::types::automation::UniswapSwapOptions;
use crate::types::build_options::{BuildOptions, UnwrapNativeCall};
use crate::types::call_data::{BuildResult, CallData};
use crate::utils::route_parser::parse_route_call_data;
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use eyre::Result;
use log::debug;
use std::time::{SystemTime, UNIX_EPOCH};

pub struct UniswapSwapBuilder;

/// `percent * 1e16`, truncated: 0.5% becomes 5e15.
pub fn slippage_e18(percent: f64) -> U256 {
    if !percent.is_finite() || percent <= 0.0 {
        return U256::ZERO;
    }
    U256::from((percent * 1e16) as u128)
}

fn slippage_bps(percent: f64) -> u32 {
    (percent * 100.0).round().clamp(0.0, 10_000.0) as u32
}

fn route_request(options: &BuildOptions, swap: &UniswapSwapOptions) -> Result<RouteRequest> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    Ok(RouteRequest {
        chain_id: options.chain_id,
        from_token: swap.from_token,
        to_token: swap.to_token,
        amount_in: swap.from_amount,
        recipient: options.recipient,
        deadline: now + ROUTE_DEADLINE_SECONDS,
        slippage_bps: slippage_bps(swap.slippage_percent.unwrap_or(DEFAULT_SLIPPAGE_PERCENT)),
        max_swaps_per_path: MAX_SWAPS_PER_PATH,
        top_n: 1,
    })
}

#[async_trait]
impl Builder for UniswapSwapBuilder {
    async fn build(&self, options: &BuildOptions, config: BlockConfig<'_>) -> Result<BuildResult> {
        let swap = config.uniswap_swap()?;
        let mut result = BuildResult::empty();

        if swap.from_token == Address::ZERO {
            result.value = swap.from_amount;
        }

        if result.value > U256::ZERO {
            let wrap = wrapNativeFromVaultBalanceCall {
                amount: result.value,
            };
            result
                .call_data
                .insert(CallData::new(options.vault_address, wrap.abi_encode()));
        } else if options.recipient != options.vault_address {
            let transfer = transferCall {
                to: options.recipient,
                amount: swap.from_amount,
            };
            result
                .call_data
                .insert(CallData::new(swap.from_token, transfer.abi_encode()));
        }

        let wrapped_native = options.addresses.require_wrapped_native(options.chain_id)?;

        if result.value > U256::ZERO && swap.to_token == wrapped_native {
            debug!("Swap into wrapped native is covered by the wrap call");
            return Ok(result);
        }

        if swap.to_token == Address::ZERO && swap.from_token == wrapped_native {
            if options.unwrap_native == UnwrapNativeCall::Attach {
                let unwrap = unwrapNativeCall {
                    amount: swap.from_amount,
                };
                result
                    .call_data
                    .insert(CallData::new(options.vault_address, unwrap.abi_encode()));
            }
            return Ok(result);
        }

        let request = route_request(options, swap)?;
        let route = options
            .router
            .route(&request)
            .await?
            .ok_or(AutomationError::RouteNotBuilt)?;

        let hops = parse_route_call_data(&route.call_data)?;
        debug!("Route decoded into {} swap(s)", hops.len());

        let slippage = slippage_e18(swap.slippage_percent.unwrap_or(DEFAULT_SLIPPAGE_PERCENT));
        let last = hops.len() - 1;
        for (index, hop) in hops.into_iter().enumerate() {
            let call = uniswapSwapExactInputCall {
                tokens: hop.tokens,
                poolFees: hop.pool_fees,
                amountIn: hop.amount_in,
                useFullBalanceOfTokenIn: false,
                unwrapInTheEnd: index == last && swap.to_token == Address::ZERO,
                slippageE18: slippage,
            };
            result
                .call_data
                .insert(CallData::new(options.vault_address, call.abi_encode()));
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::swap_router::{RouterMulticallDeadline, SwapRouter02};
    use crate::builders::testing::{FixedReader, VAULT, build_options, build_options_with};
    use crate::router::{Route, RoutePlanner, StaticRoutePlanner};
    use crate::types::automation::ActionOptions;
    use alloy::primitives::{Bytes, aliases::U24};
    use std::sync::{Arc, Mutex};

    const WMATIC: Address = Address::repeat_byte(0x0D);
    const USDC: Address = Address::repeat_byte(0x27);
    const WETH: Address = Address::repeat_byte(0x7C);
    const RECIPIENT: Address = Address::repeat_byte(0xC0);

    fn swap(from: Address, to: Address, amount: u64, slippage: Option<f64>) -> ActionOptions {
        ActionOptions::SwapWithUniswap(UniswapSwapOptions {
            from_token: from,
            to_token: to,
            from_amount: U256::from(amount),
            slippage_percent: slippage,
        })
    }

    fn path(tokens: &[Address], fees: &[u32]) -> Bytes {
        let mut out = tokens[0].to_vec();
        for (fee, token) in fees.iter().zip(&tokens[1..]) {
            out.extend_from_slice(&fee.to_be_bytes()[1..]);
            out.extend_from_slice(token.as_slice());
        }
        Bytes::from(out)
    }

    fn route(hops: Vec<(Vec<Address>, Vec<u32>, u64)>) -> Bytes {
        let data = hops
            .iter()
            .map(|(tokens, fees, amount)| {
                Bytes::from(
                    SwapRouter02::exactInputCall {
                        params: SwapRouter02::ExactInputParams {
                            path: path(tokens, fees),
                            recipient: VAULT,
                            amountIn: U256::from(*amount),
                            amountOutMinimum: U256::ZERO,
                        },
                    }
                    .abi_encode(),
                )
            })
            .collect();
        Bytes::from(
            RouterMulticallDeadline::multicallCall {
                deadline: U256::from(1u64),
                data,
            }
            .abi_encode(),
        )
    }

    fn with_wmatic(mut options: BuildOptions) -> BuildOptions {
        options.addresses.wrapped_native = Some(WMATIC);
        options
    }

    struct RecordingPlanner {
        requests: Mutex<Vec<RouteRequest>>,
        call_data: Option<Bytes>,
    }

    #[async_trait]
    impl RoutePlanner for RecordingPlanner {
        async fn route(&self, request: &RouteRequest) -> Result<Option<Route>> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.call_data.clone().map(|call_data| Route { call_data }))
        }
    }

    #[test]
    fn slippage_scales_to_e18() {
        assert_eq!(slippage_e18(0.5), U256::from(5_000_000_000_000_000u64));
        assert_eq!(slippage_e18(1.0), U256::from(10_000_000_000_000_000u64));
        assert_eq!(slippage_e18(-1.0), U256::ZERO);
        assert_eq!(slippage_bps(0.5), 50);
    }

    #[tokio::test]
    async fn native_into_wrapped_is_a_single_wrap() {
        let options = with_wmatic(build_options());
        let config = swap(Address::ZERO, WMATIC, 1_000, None);

        let result = UniswapSwapBuilder
            .build(&options, BlockConfig::Action(&config))
            .await
            .unwrap();

        assert_eq!(result.value, U256::from(1_000u64));
        assert_eq!(result.call_data.len(), 1);
        let call = result.call_data.iter().next().unwrap();
        assert_eq!(call.to, options.vault_address);
        let wrap = wrapNativeFromVaultBalanceCall::abi_decode(&call.call_data, true).unwrap();
        assert_eq!(wrap.amount, U256::from(1_000u64));
    }

    #[tokio::test]
    async fn foreign_recipient_gets_a_transfer() {
        let mut options = with_wmatic(build_options());
        options.recipient = RECIPIENT;
        let config = swap(USDC, Address::ZERO, 500, None);
        let options = BuildOptions {
            router: Arc::new(StaticRoutePlanner::new(Some(route(vec![(
                vec![USDC, WMATIC],
                vec![500],
                500,
            )])))),
            ..options
        };

        let result = UniswapSwapBuilder
            .build(&options, BlockConfig::Action(&config))
            .await
            .unwrap();

        let calls: Vec<&CallData> = result.call_data.iter().collect();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].to, USDC);
        let transfer = transferCall::abi_decode(&calls[0].call_data, true).unwrap();
        assert_eq!(transfer.to, RECIPIENT);
        assert_eq!(transfer.amount, U256::from(500u64));

        assert_eq!(calls[1].to, options.vault_address);
        let swap = uniswapSwapExactInputCall::abi_decode(&calls[1].call_data, true).unwrap();
        assert!(swap.unwrapInTheEnd);
    }

    #[tokio::test]
    async fn wrapped_into_native_honours_unwrap_setting() {
        let config = swap(WMATIC, Address::ZERO, 700, None);

        let options = with_wmatic(build_options());
        let omitted = UniswapSwapBuilder
            .build(&options, BlockConfig::Action(&config))
            .await
            .unwrap();
        assert!(omitted.call_data.is_empty());

        let options = BuildOptions {
            unwrap_native: UnwrapNativeCall::Attach,
            ..with_wmatic(build_options())
        };
        let attached = UniswapSwapBuilder
            .build(&options, BlockConfig::Action(&config))
            .await
            .unwrap();
        let calls: Vec<&CallData> = attached.call_data.iter().collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].to, options.vault_address);
        let unwrap = unwrapNativeCall::abi_decode(&calls[0].call_data, true).unwrap();
        assert_eq!(unwrap.amount, U256::from(700u64));
    }

    #[tokio::test]
    async fn route_hops_become_vault_swaps_in_order() {
        let planner = Arc::new(RecordingPlanner {
            requests: Mutex::new(Vec::new()),
            call_data: Some(route(vec![
                (vec![USDC, WETH, WMATIC], vec![500, 3000], 600),
                (vec![USDC, WMATIC], vec![10_000], 400),
            ])),
        });
        let options = with_wmatic(build_options_with(
            Arc::new(FixedReader::default()),
            planner.clone(),
        ));
        let config = swap(USDC, WETH, 1_000, Some(1.0));

        let result = UniswapSwapBuilder
            .build(&options, BlockConfig::Action(&config))
            .await
            .unwrap();

        let swaps: Vec<uniswapSwapExactInputCall> = result
            .call_data
            .iter()
            .map(|call| {
                assert_eq!(call.to, options.vault_address);
                uniswapSwapExactInputCall::abi_decode(&call.call_data, true).unwrap()
            })
            .collect();
        assert_eq!(swaps.len(), 2);
        assert_eq!(swaps[0].tokens, vec![USDC, WETH, WMATIC]);
        assert_eq!(
            swaps[0].poolFees,
            vec![U24::from(500u32), U24::from(3000u32)]
        );
        assert_eq!(swaps[0].amountIn, U256::from(600u64));
        assert_eq!(swaps[1].amountIn, U256::from(400u64));
        assert!(swaps.iter().all(|s| !s.unwrapInTheEnd));
        assert!(swaps.iter().all(|s| !s.useFullBalanceOfTokenIn));
        assert_eq!(swaps[0].slippageE18, U256::from(10_000_000_000_000_000u64));

        let requests = planner.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].slippage_bps, 100);
        assert_eq!(requests[0].max_swaps_per_path, MAX_SWAPS_PER_PATH);
        assert_eq!(requests[0].recipient, options.recipient);
    }

    #[tokio::test]
    async fn missing_route_or_wrapped_token_fails() {
        let options = with_wmatic(build_options());
        let config = swap(USDC, WETH, 1_000, None);
        let err = UniswapSwapBuilder
            .build(&options, BlockConfig::Action(&config))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<AutomationError>(),
            Some(&AutomationError::RouteNotBuilt)
        );

        let mut options = build_options();
        options.addresses.wrapped_native = None;
        let err = UniswapSwapBuilder
            .build(&options, BlockConfig::Action(&config))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AutomationError>(),
            Some(AutomationError::MissingAddress {
                contract: "wrapped native",
                ..
            })
        ));
    }
}
