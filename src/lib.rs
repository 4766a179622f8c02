pub mod batch;
pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod paginate;
pub mod policy;
pub mod portal;
pub mod report;
pub mod sync;
