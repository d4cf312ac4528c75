pub mod catalog_service;
pub mod policy_service;
pub mod rotation_service;
