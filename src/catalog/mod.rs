pub mod admin;
pub mod data_manager;
pub mod history;
pub mod product;
pub mod store;
