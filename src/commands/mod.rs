pub mod export;
pub mod options;
pub mod status;
pub mod summary;
