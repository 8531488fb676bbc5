pub mod app;
pub mod modal;
pub mod notifier;
pub mod settings;
