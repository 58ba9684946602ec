// src/services/mod.rs
pub mod composer_service;
pub mod dispatch_service;
pub mod history_service;
pub mod messaging_service;
pub mod profile_service;
pub mod template_service;
