pub mod addressor;
pub mod applier;
pub mod category;
pub mod controller;
pub mod controls;
pub mod error;
pub mod inspector;
pub mod override_store;
