pub mod metadata_service;
pub mod plan_service;
pub mod rename_service;
pub mod scan_service;
pub mod validation_service;
