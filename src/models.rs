pub mod activity;
pub mod admission;
pub mod auth;
pub mod rbac;
pub mod school;
