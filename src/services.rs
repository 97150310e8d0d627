pub mod activity_service;
pub mod admission_service;
pub mod auth;
pub mod permission_service;
pub mod permission_sync;
pub mod role_service;
pub mod school_service;
pub mod seed;
pub mod user_service;
