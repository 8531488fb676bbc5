pub mod page_model;
pub mod render;
pub mod selector;
pub mod stylesheet;
