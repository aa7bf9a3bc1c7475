pub mod address_book;
pub mod automation;
pub mod build_options;
pub mod call_data;
pub mod config_wrapper;
pub mod transaction;
pub mod vault;
