use crate::bindings::swap_router::{RouterMulticall, RouterMulticallDeadline, SwapRouter02};
use crate::error::AutomationError;
use alloy::primitives::{Address, U256, aliases::U24};
use alloy::sol_types::SolCall;
use eyre::Result;

/// One exact-input swap taken from router call data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapHop {
    pub tokens: Vec<Address>,
    pub pool_fees: Vec<U24>,
    pub amount_in: U256,
}

const ADDRESS_BYTES: usize = 20;
const FEE_BYTES: usize = 3;
const HOP_BYTES: usize = ADDRESS_BYTES + FEE_BYTES;

// A router multicall wrapping another multicall is the deepest shape planners emit.
const MAX_MULTICALL_DEPTH: usize = 2;

fn invalid(reason: &str) -> eyre::Report {
    AutomationError::InvalidRouteCallData(reason.to_string()).into()
}

/// Decodes SwapRouter02 call data into its exact-input swaps, in call order.
pub fn parse_route_call_data(data: &[u8]) -> Result<Vec<SwapHop>> {
    let mut hops = Vec::new();
    collect_hops(data, 0, &mut hops)?;
    if hops.is_empty() {
        return Err(invalid("no exact-input swap found"));
    }
    Ok(hops)
}

fn collect_hops(data: &[u8], depth: usize, hops: &mut Vec<SwapHop>) -> Result<()> {
    let Some(selector) = data.get(..4) else {
        return Err(invalid("call data shorter than a selector"));
    };
    let selector: [u8; 4] = selector.try_into()?;

    match selector {
        RouterMulticallDeadline::multicallCall::SELECTOR => {
            if depth >= MAX_MULTICALL_DEPTH {
                return Err(invalid("multicall nested too deep"));
            }
            let call = RouterMulticallDeadline::multicallCall::abi_decode(data, true)?;
            for inner in call.data {
                collect_hops(&inner, depth + 1, hops)?;
            }
        }
        RouterMulticall::multicallCall::SELECTOR => {
            if depth >= MAX_MULTICALL_DEPTH {
                return Err(invalid("multicall nested too deep"));
            }
            let call = RouterMulticall::multicallCall::abi_decode(data, true)?;
            for inner in call.data {
                collect_hops(&inner, depth + 1, hops)?;
            }
        }
        SwapRouter02::exactInputCall::SELECTOR => {
            let call = SwapRouter02::exactInputCall::abi_decode(data, true)?;
            let (tokens, pool_fees) = parse_path(&call.params.path)?;
            hops.push(SwapHop {
                tokens,
                pool_fees,
                amount_in: call.params.amountIn,
            });
        }
        SwapRouter02::exactInputSingleCall::SELECTOR => {
            let call = SwapRouter02::exactInputSingleCall::abi_decode(data, true)?;
            hops.push(SwapHop {
                tokens: vec![call.params.tokenIn, call.params.tokenOut],
                pool_fees: vec![call.params.fee],
                amount_in: call.params.amountIn,
            });
        }
        // unwrapWETH9, refundETH, sweepToken and friends carry no swap.
        _ => {}
    }

    Ok(())
}

/// Splits a packed V3 path `token (fee token)*` into tokens and fees.
pub fn parse_path(path: &[u8]) -> Result<(Vec<Address>, Vec<U24>)> {
    if path.len() < ADDRESS_BYTES + HOP_BYTES || (path.len() - ADDRESS_BYTES) % HOP_BYTES != 0 {
        return Err(invalid("malformed swap path"));
    }

    let mut tokens = vec![Address::from_slice(&path[..ADDRESS_BYTES])];
    let mut fees = Vec::new();

    let mut cursor = ADDRESS_BYTES;
    while cursor + HOP_BYTES <= path.len() {
        let fee = U24::try_from_be_slice(&path[cursor..cursor + FEE_BYTES])
            .ok_or_else(|| invalid("malformed pool fee"))?;
        fees.push(fee);
        tokens.push(Address::from_slice(
            &path[cursor + FEE_BYTES..cursor + HOP_BYTES],
        ));
        cursor += HOP_BYTES;
    }

    Ok((tokens, fees))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Bytes, aliases::U160};

    fn token(byte: u8) -> Address {
        Address::from([byte; 20])
    }

    fn encode_path(tokens: &[Address], fees: &[u32]) -> Bytes {
        let mut out = tokens[0].to_vec();
        for (i, fee) in fees.iter().enumerate() {
            out.extend_from_slice(&fee.to_be_bytes()[1..]);
            out.extend_from_slice(tokens[i + 1].as_slice());
        }
        Bytes::from(out)
    }

    fn exact_input(tokens: &[Address], fees: &[u32], amount_in: u64) -> Bytes {
        Bytes::from(
            SwapRouter02::exactInputCall {
                params: SwapRouter02::ExactInputParams {
                    path: encode_path(tokens, fees),
                    recipient: token(0x99),
                    amountIn: U256::from(amount_in),
                    amountOutMinimum: U256::from(1u64),
                },
            }
            .abi_encode(),
        )
    }

    #[test]
    fn decodes_multi_hop_path() {
        let (tokens, fees) =
            parse_path(&encode_path(&[token(1), token(2), token(3)], &[500, 3000])).unwrap();
        assert_eq!(tokens, vec![token(1), token(2), token(3)]);
        assert_eq!(fees, vec![U24::from(500u32), U24::from(3000u32)]);
    }

    #[test]
    fn rejects_truncated_path() {
        let mut path = encode_path(&[token(1), token(2)], &[500]).to_vec();
        path.pop();
        assert!(parse_path(&path).is_err());
    }

    #[test]
    fn decodes_deadline_multicall_in_order_and_skips_other_calls() {
        let unwrap_weth = Bytes::from(vec![0x49, 0x40, 0x4b, 0x7c, 0, 0, 0, 0]);
        let call = RouterMulticallDeadline::multicallCall {
            deadline: U256::from(1_700_000_000u64),
            data: vec![
                exact_input(&[token(1), token(2), token(3)], &[500, 3000], 600),
                exact_input(&[token(1), token(3)], &[10_000], 400),
                unwrap_weth,
            ],
        };

        let hops = parse_route_call_data(&call.abi_encode()).unwrap();
        assert_eq!(hops.len(), 2);
        assert_eq!(hops[0].tokens, vec![token(1), token(2), token(3)]);
        assert_eq!(hops[0].amount_in, U256::from(600u64));
        assert_eq!(hops[1].tokens, vec![token(1), token(3)]);
        assert_eq!(hops[1].pool_fees, vec![U24::from(10_000u32)]);
    }

    #[test]
    fn decodes_exact_input_single() {
        let call = SwapRouter02::exactInputSingleCall {
            params: SwapRouter02::ExactInputSingleParams {
                tokenIn: token(4),
                tokenOut: token(5),
                fee: U24::from(100u32),
                recipient: token(0x99),
                amountIn: U256::from(7u64),
                amountOutMinimum: U256::ZERO,
                sqrtPriceLimitX96: U160::ZERO,
            },
        };
        let wrapped = RouterMulticall::multicallCall {
            data: vec![Bytes::from(call.abi_encode())],
        };

        let hops = parse_route_call_data(&wrapped.abi_encode()).unwrap();
        assert_eq!(
            hops,
            vec![SwapHop {
                tokens: vec![token(4), token(5)],
                pool_fees: vec![U24::from(100u32)],
                amount_in: U256::from(7u64),
            }]
        );
    }

    #[test]
    fn call_data_without_swaps_is_rejected() {
        let err = parse_route_call_data(&[0x12, 0x34, 0x56, 0x78]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AutomationError>(),
            Some(AutomationError::InvalidRouteCallData(_))
        ));
        assert!(parse_route_call_data(&[0x01]).is_err());
    }
}
