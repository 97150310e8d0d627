pub mod auth;
pub mod guard;
pub mod i18n;
pub mod rbac;
