pub mod automation_vault;
pub mod erc20;
pub mod price_oracle;
pub mod swap_router;
pub mod vault_factory;
