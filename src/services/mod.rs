pub mod gallery_service;
pub mod naming;
pub mod validation;
