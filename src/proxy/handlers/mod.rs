// Handlers module - HTTP endpoint handlers

pub mod forward;
pub mod info;
