pub mod face_matcher;
pub mod face_profile;
pub mod profile_store;
