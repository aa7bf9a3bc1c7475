use alloy::sol;

sol! {
    #[sol(rpc)]
    contract ERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
    }
}
