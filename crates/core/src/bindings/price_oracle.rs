use alloy::sol;

sol! {
    #[sol(rpc)]
    contract PriceOracle {
        function consult(
            address tokenIn,
            uint256 amountIn,
            address tokenOut,
            uint24 fee,
            address factory
        ) external view returns (uint256 amountOut);
    }
}
