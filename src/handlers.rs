pub mod activity;
pub mod admission;
pub mod auth;
pub mod rbac;
pub mod school;
pub mod users;

use crate::services::{
    activity_service::{LOG_LIST, LOG_RECENT},
    admission_service::{APPLICATION_CREATE, ENQUIRY_CREATE},
    permission_service::{PERMISSION_LIST, PERMISSION_MODULES},
    role_service::{
        ROLE_ASSIGN_MODULE_PERMISSIONS, ROLE_ASSIGN_PERMISSIONS, ROLE_CREATE, ROLE_DELETE,
        ROLE_GET_WITH_PERMISSIONS, ROLE_LIST, ROLE_REMOVE_PERMISSIONS, ROLE_UPDATE,
    },
    school_service::{BRANCH_CREATE, BRANCH_LIST, SCHOOL_GET, SCHOOL_UPSERT},
    user_service::{
        USER_ASSIGN_ROLES, USER_CREATE, USER_GET_WITH_PERMISSIONS, USER_LIST, USER_REVOKE_ROLES,
    },
};

/// Operações que as rotas HTTP executam através do guardião.
/// Conferidas contra o registro na subida do servidor.
pub const ROUTED_OPERATIONS: &[&str] = &[
    ROLE_LIST,
    ROLE_CREATE,
    ROLE_UPDATE,
    ROLE_DELETE,
    ROLE_ASSIGN_PERMISSIONS,
    ROLE_ASSIGN_MODULE_PERMISSIONS,
    ROLE_GET_WITH_PERMISSIONS,
    ROLE_REMOVE_PERMISSIONS,
    PERMISSION_LIST,
    PERMISSION_MODULES,
    USER_LIST,
    USER_GET_WITH_PERMISSIONS,
    USER_CREATE,
    USER_ASSIGN_ROLES,
    USER_REVOKE_ROLES,
    SCHOOL_GET,
    SCHOOL_UPSERT,
    BRANCH_LIST,
    BRANCH_CREATE,
    ENQUIRY_CREATE,
    APPLICATION_CREATE,
    LOG_LIST,
    LOG_RECENT,
];
