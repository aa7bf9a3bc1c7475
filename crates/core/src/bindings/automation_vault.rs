use alloy::sol;

sol! {
    #[sol(rpc)]
    contract AutomationVault {
        struct Checker {
            bytes data;
            bytes viewData;
            bytes initData;
        }

        struct Action {
            bytes data;
            bytes viewData;
            bytes initData;
        }

        function timeCheckerInitialize(uint64 lastActionTime, uint64 timePeriod, bytes32 pointer) external;
        function checkTime() external returns (bool);
        function checkTimeView() external view returns (bool);

        function priceCheckerUniswapInitialize(address uniswapPool, uint256 targetRate, bytes32 pointer) external;
        function uniswapCheckGTTargetRate() external view returns (bool);
        function uniswapCheckLTTargetRate() external view returns (bool);

        function wrapNativeFromVaultBalance(uint256 amount) external;
        function unwrapNative(uint256 amount) external;
        function uniswapSwapExactInput(
            address[] calldata tokens,
            uint24[] calldata poolFees,
            uint256 amountIn,
            bool useFullBalanceOfTokenIn,
            bool unwrapInTheEnd,
            uint256 slippageE18
        ) external returns (uint256 amountOut);

        function addWorkflowAndGelatoTask(
            Checker[] calldata checkers,
            Action[] calldata actions,
            address executor,
            uint256 count
        ) external;
        function multicall(bytes[] calldata data) external payable;
    }
}
