pub mod activity;
pub mod face_session;
pub mod infrastructure;
pub mod session_error;
