pub mod random_records;
pub mod sources;
