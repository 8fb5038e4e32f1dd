pub mod schema;
pub mod snapshot_repo;
pub mod scan_repo;
