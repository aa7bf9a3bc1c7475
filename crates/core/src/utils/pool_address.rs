use alloy::primitives::{Address, B256, U256, b256, keccak256};

const POOL_INIT_CODE_HASH: B256 =
    b256!("0xe34f199b19b2b4f47f68442619d555527d244f78a3297ea89325f843f87b8b54");

/// Orders two tokens the way Uniswap pools do: lower address first.
pub fn sort_tokens(token_a: Address, token_b: Address) -> (Address, Address) {
    if token_a < token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}

/// Computes the Uniswap V3 pool address for `(token_a, token_b, fee)` deployed by `factory`.
///
/// Returns the zero address when there is no factory or both tokens are the same.
pub fn compute_pool_address(
    factory: Option<Address>,
    token_a: Address,
    token_b: Address,
    fee: u32,
) -> Address {
    let factory = match factory {
        Some(factory) if factory != Address::ZERO => factory,
        _ => return Address::ZERO,
    };
    if token_a == token_b {
        return Address::ZERO;
    }

    let (token0, token1) = sort_tokens(token_a, token_b);

    // abi.encode(token0, token1, fee)
    let (word0, word1) = (token0.into_word(), token1.into_word());
    let fee_word = U256::from(fee).to_be_bytes::<32>();
    let encoded: [&[u8]; 3] = [word0.as_slice(), word1.as_slice(), fee_word.as_slice()];
    let salt = keccak256(encoded.concat());

    let preimage: [&[u8]; 4] = [
        &[0xFF], // Prefix
        factory.as_slice(),
        salt.as_slice(),
        POOL_INIT_CODE_HASH.as_slice(),
    ];
    let pool = keccak256(preimage.concat());

    Address::from_slice(&pool[12..])
}
