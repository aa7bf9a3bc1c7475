use alloy::sol;

sol! {
    #[sol(rpc)]
    contract VaultFactory {
        event VaultCreated(address indexed creator, address indexed vault, uint16 vaultId);

        function deploy(uint16 version, uint16 vaultId) external returns (address vault);
        function predictDeterministicVaultAddress(address creator, uint16 vaultId) external view returns (address predicted);
    }
}
