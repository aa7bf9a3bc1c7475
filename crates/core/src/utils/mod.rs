pub mod format_seconds;
pub mod nonce;
pub mod pool_address;
pub mod route_parser;
