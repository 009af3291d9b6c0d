pub mod file_profile_store;
pub mod memory_profile_store;
