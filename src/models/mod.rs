pub mod metadata;
pub mod operation;
pub mod plan;
