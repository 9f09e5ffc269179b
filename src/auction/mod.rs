pub mod events;
pub mod lifecycle;
pub mod settings;
pub mod status;
