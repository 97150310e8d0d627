// src/db/memory.rs

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::common::{
    error::{AppError, AppResult},
    response::Page,
};
use crate::db::{
    ActivityStore, AdmissionStore, PermissionCatalog, RbacStore, SchoolStore, UserStore,
    format_ids, missing_ids,
};
use crate::models::{
    activity::{ActivityEntry, ActivityFilter, NewActivity},
    admission::{Application, CreateApplicationPayload, CreateEnquiryPayload, Enquiry},
    auth::{NewUser, SessionRole, User},
    rbac::{
        NewPermission, NewRole, Permission, Role, RoleWithPermissions, UpdateRolePayload,
        UpsertOutcome,
    },
    school::{Branch, CreateBranchPayload, School, SchoolInput},
};

#[derive(Default)]
struct State {
    next_id: i64,
    users: BTreeMap<i64, User>,
    roles: BTreeMap<i64, Role>,
    permissions: BTreeMap<i64, Permission>,
    user_roles: BTreeSet<(i64, i64)>,
    role_permissions: BTreeSet<(i64, i64)>,
    school: Option<School>,
    branches: BTreeMap<i64, Branch>,
    activity: Vec<StoredActivity>,
    enquiries: BTreeMap<i64, Enquiry>,
    applications: BTreeMap<i64, Application>,
}

struct StoredActivity {
    id: i64,
    entry: NewActivity,
    created_at: DateTime<Utc>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn snapshot(&self, role_id: i64) -> Option<RoleWithPermissions> {
        let role = self.roles.get(&role_id)?.clone();
        let mut permissions: Vec<Permission> = self
            .role_permissions
            .iter()
            .filter(|(r, _)| *r == role_id)
            .filter_map(|(_, p)| self.permissions.get(p).cloned())
            .collect();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        Some(RoleWithPermissions { role, permissions })
    }

    // Como o LEFT JOIN com users
    fn activity_entry(&self, stored: &StoredActivity) -> ActivityEntry {
        let user = stored.entry.user_id.and_then(|id| self.users.get(&id));
        ActivityEntry {
            id: stored.id,
            action: stored.entry.action,
            module: stored.entry.module.clone(),
            description: stored.entry.description.clone(),
            user_id: stored.entry.user_id,
            user_email: user.map(|u| u.email.clone()),
            user_first_name: user.map(|u| u.first_name.clone()),
            user_last_name: user.map(|u| u.last_name.clone()),
            created_at: stored.created_at,
        }
    }

    // Mais recentes primeiro
    fn newest_activity(&self) -> impl Iterator<Item = &StoredActivity> {
        self.activity.iter().rev()
    }
}

fn page_of<T: Clone>(items: Vec<T>, page: Page) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let data = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .collect();
    (data, total)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Armazenamento em memória com a mesma semântica dos repositórios
/// PostgreSQL. Cada operação roda sob um único lock, o que faz dela atômica.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Quantidade de vínculos cargo-permissão (usado em asserções).
    pub fn role_permission_links(&self) -> usize {
        self.read().role_permissions.len()
    }

    pub fn permission_count(&self) -> usize {
        self.read().permissions.len()
    }
}

#[async_trait]
impl PermissionCatalog for MemoryStore {
    async fn upsert_permission(&self, permission: &NewPermission) -> AppResult<UpsertOutcome> {
        let mut state = self.write();

        if let Some(existing) = state
            .permissions
            .values_mut()
            .find(|p| p.name == permission.name)
        {
            if existing.module == permission.module && existing.description == permission.description
            {
                return Ok(UpsertOutcome::Unchanged);
            }
            existing.module = permission.module.clone();
            existing.description = permission.description.clone();
            return Ok(UpsertOutcome::Updated);
        }

        let id = state.next_id();
        state.permissions.insert(
            id,
            Permission {
                id,
                name: permission.name.clone(),
                module: permission.module.clone(),
                description: permission.description.clone(),
            },
        );
        Ok(UpsertOutcome::Created)
    }

    async fn all_permissions(&self) -> AppResult<Vec<Permission>> {
        let mut permissions: Vec<Permission> = self.read().permissions.values().cloned().collect();
        permissions.sort_by(|a, b| (&a.module, &a.name).cmp(&(&b.module, &b.name)));
        Ok(permissions)
    }

    async fn delete_permissions(&self, names: &[String]) -> AppResult<u64> {
        let mut state = self.write();
        let ids: Vec<i64> = state
            .permissions
            .values()
            .filter(|p| names.contains(&p.name))
            .map(|p| p.id)
            .collect();

        for id in &ids {
            state.permissions.remove(id);
        }
        state.role_permissions.retain(|(_, p)| !ids.contains(p));
        Ok(ids.len() as u64)
    }
}

#[async_trait]
impl RbacStore for MemoryStore {
    async fn user_has_permission(&self, user_id: i64, permission_name: &str) -> AppResult<bool> {
        let state = self.read();
        let Some(permission_id) = state
            .permissions
            .values()
            .find(|p| p.name == permission_name)
            .map(|p| p.id)
        else {
            return Ok(false);
        };

        Ok(state
            .user_roles
            .iter()
            .filter(|(u, _)| *u == user_id)
            .any(|(_, role_id)| state.role_permissions.contains(&(*role_id, permission_id))))
    }

    async fn list_modules(&self) -> AppResult<Vec<String>> {
        let modules: BTreeSet<String> = self
            .read()
            .permissions
            .values()
            .map(|p| p.module.clone())
            .collect();
        Ok(modules.into_iter().collect())
    }

    async fn list_permissions(
        &self,
        module: Option<&str>,
        page: Page,
    ) -> AppResult<(Vec<Permission>, i64)> {
        let filtered: Vec<Permission> = self
            .all_permissions()
            .await?
            .into_iter()
            .filter(|p| module.is_none_or(|m| p.module == m))
            .collect();
        Ok(page_of(filtered, page))
    }

    async fn create_role(&self, role: &NewRole) -> AppResult<Role> {
        let mut state = self.write();
        if state.roles.values().any(|r| r.name == role.name) {
            return Err(AppError::RoleNameAlreadyExists);
        }
        let id = state.next_id();
        let now = Utc::now();
        let created = Role {
            id,
            name: role.name.clone(),
            description: role.description.clone(),
            is_system_role: role.is_system_role,
            created_at: now,
            updated_at: now,
        };
        state.roles.insert(id, created.clone());
        Ok(created)
    }

    async fn ensure_role(&self, role: &NewRole) -> AppResult<Role> {
        {
            let mut state = self.write();
            if let Some(existing) = state.roles.values_mut().find(|r| r.name == role.name) {
                existing.is_system_role |= role.is_system_role;
                return Ok(existing.clone());
            }
        }
        self.create_role(role).await
    }

    async fn find_role(&self, id: i64) -> AppResult<Option<Role>> {
        Ok(self.read().roles.get(&id).cloned())
    }

    async fn list_roles(&self, search: Option<&str>, page: Page) -> AppResult<(Vec<Role>, i64)> {
        let mut roles: Vec<Role> = self
            .read()
            .roles
            .values()
            .filter(|r| search.is_none_or(|s| contains_ci(&r.name, s)))
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page_of(roles, page))
    }

    async fn update_role(&self, id: i64, changes: &UpdateRolePayload) -> AppResult<Role> {
        let mut state = self.write();
        if let Some(name) = &changes.name {
            if state.roles.values().any(|r| r.id != id && &r.name == name) {
                return Err(AppError::RoleNameAlreadyExists);
            }
        }
        let role = state.roles.get_mut(&id).ok_or(AppError::RoleNotFound)?;
        if let Some(name) = &changes.name {
            role.name = name.clone();
        }
        if let Some(description) = &changes.description {
            role.description = Some(description.clone());
        }
        role.updated_at = Utc::now();
        Ok(role.clone())
    }

    async fn delete_role(&self, id: i64) -> AppResult<()> {
        let mut state = self.write();
        state.roles.remove(&id).ok_or(AppError::RoleNotFound)?;
        state.role_permissions.retain(|(r, _)| *r != id);
        state.user_roles.retain(|(_, r)| *r != id);
        Ok(())
    }

    async fn assign_permissions(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> AppResult<RoleWithPermissions> {
        let mut state = self.write();
        if !state.roles.contains_key(&role_id) {
            return Err(AppError::RoleNotFound);
        }

        let found: Vec<i64> = state.permissions.keys().copied().collect();
        let missing = missing_ids(permission_ids, &found);
        if !missing.is_empty() {
            return Err(AppError::invalid_input(
                "permissionIds",
                format!("unknown permission ids: {}", format_ids(&missing)),
            ));
        }

        for id in permission_ids {
            state.role_permissions.insert((role_id, *id));
        }
        state.snapshot(role_id).ok_or(AppError::RoleNotFound)
    }

    async fn assign_module_permissions(
        &self,
        role_id: i64,
        module: &str,
    ) -> AppResult<RoleWithPermissions> {
        let mut state = self.write();
        if !state.roles.contains_key(&role_id) {
            return Err(AppError::RoleNotFound);
        }

        let module_ids: Vec<i64> = state
            .permissions
            .values()
            .filter(|p| p.module == module)
            .map(|p| p.id)
            .collect();

        if module_ids.is_empty() {
            return Err(AppError::NoModulePermissions(module.to_string()));
        }

        for id in module_ids {
            state.role_permissions.insert((role_id, id));
        }
        state.snapshot(role_id).ok_or(AppError::RoleNotFound)
    }

    async fn remove_permissions(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> AppResult<RoleWithPermissions> {
        let mut state = self.write();
        if !state.roles.contains_key(&role_id) {
            return Err(AppError::RoleNotFound);
        }
        state
            .role_permissions
            .retain(|(r, p)| *r != role_id || !permission_ids.contains(p));
        state.snapshot(role_id).ok_or(AppError::RoleNotFound)
    }

    async fn role_with_permissions(&self, role_id: i64) -> AppResult<Option<RoleWithPermissions>> {
        Ok(self.read().snapshot(role_id))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> AppResult<User> {
        let mut state = self.write();
        if state.users.values().any(|u| u.email == user.email) {
            return Err(AppError::EmailAlreadyExists);
        }
        let id = state.next_id();
        let now = Utc::now();
        let created = User {
            id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            profile_photo: user.profile_photo.clone(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(id, created.clone());
        Ok(created)
    }

    async fn upsert_user_by_email(&self, user: &NewUser) -> AppResult<User> {
        {
            let mut state = self.write();
            if let Some(existing) = state.users.values_mut().find(|u| u.email == user.email) {
                existing.password_hash = user.password_hash.clone();
                existing.updated_at = Utc::now();
                return Ok(existing.clone());
            }
        }
        self.create_user(user).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.read().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn list_users(&self, search: Option<&str>, page: Page) -> AppResult<(Vec<User>, i64)> {
        let users: Vec<User> = self
            .read()
            .users
            .values()
            .filter(|u| {
                search.is_none_or(|s| {
                    contains_ci(&u.first_name, s)
                        || contains_ci(&u.last_name, s)
                        || contains_ci(&u.email, s)
                })
            })
            .cloned()
            .collect();
        Ok(page_of(users, page))
    }

    async fn roles_for_user(&self, user_id: i64) -> AppResult<Vec<SessionRole>> {
        let state = self.read();
        let mut roles: Vec<SessionRole> = state
            .user_roles
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, role_id)| state.snapshot(*role_id))
            .map(|snapshot| SessionRole {
                name: snapshot.role.name,
                permissions: snapshot.permissions.into_iter().map(|p| p.name).collect(),
            })
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn assign_roles(&self, user_id: i64, role_ids: &[i64]) -> AppResult<()> {
        let mut state = self.write();
        if !state.users.contains_key(&user_id) {
            return Err(AppError::UserNotFound);
        }
        let found: Vec<i64> = state.roles.keys().copied().collect();
        let missing = missing_ids(role_ids, &found);
        if !missing.is_empty() {
            return Err(AppError::invalid_input(
                "roleIds",
                format!("unknown role ids: {}", format_ids(&missing)),
            ));
        }
        for role_id in role_ids {
            state.user_roles.insert((user_id, *role_id));
        }
        Ok(())
    }

    async fn revoke_roles(&self, user_id: i64, role_ids: &[i64]) -> AppResult<()> {
        let mut state = self.write();
        if !state.users.contains_key(&user_id) {
            return Err(AppError::UserNotFound);
        }
        state
            .user_roles
            .retain(|(u, r)| *u != user_id || !role_ids.contains(r));
        Ok(())
    }
}

#[async_trait]
impl SchoolStore for MemoryStore {
    async fn get_school(&self) -> AppResult<Option<School>> {
        Ok(self.read().school.clone())
    }

    async fn upsert_school(&self, input: &SchoolInput) -> AppResult<School> {
        let mut state = self.write();
        let now = Utc::now();
        let existing = state.school.as_ref().map(|s| (s.id, s.created_at));
        let (id, created_at) = match existing {
            Some(current) => current,
            None => (state.next_id(), now),
        };
        let school = School {
            id,
            legal_name: input.legal_name.clone(),
            display_name: input.display_name.clone(),
            school_type: input.school_type.clone(),
            status: input.status.clone(),
            registration_number: input.registration_number.clone(),
            email: input.email.clone(),
            phone_main: input.phone_main.clone(),
            website: input.website.clone(),
            address_line1: input.address_line1.clone(),
            city: input.city.clone(),
            motto: input.motto.clone(),
            created_at,
            updated_at: now,
        };
        state.school = Some(school.clone());
        Ok(school)
    }

    async fn list_branches(&self, school_id: i64) -> AppResult<Vec<Branch>> {
        let mut branches: Vec<Branch> = self
            .read()
            .branches
            .values()
            .filter(|b| b.school_id == school_id)
            .cloned()
            .collect();
        branches.sort_by(|a, b| a.branch_name.cmp(&b.branch_name));
        Ok(branches)
    }

    async fn create_branch(
        &self,
        school_id: i64,
        input: &CreateBranchPayload,
    ) -> AppResult<Branch> {
        let mut state = self.write();
        if state.school.as_ref().is_none_or(|s| s.id != school_id) {
            return Err(AppError::SchoolNotFound);
        }
        if state
            .branches
            .values()
            .any(|b| b.branch_code == input.branch_code)
        {
            return Err(AppError::BranchCodeAlreadyExists);
        }
        let id = state.next_id();
        let now = Utc::now();
        let branch = Branch {
            id,
            school_id,
            branch_name: input.branch_name.clone(),
            branch_code: input.branch_code.clone(),
            branch_email: input.branch_email.clone(),
            branch_phone_number: input.branch_phone_number.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.branches.insert(id, branch.clone());
        Ok(branch)
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn record_activity(&self, entry: &NewActivity) -> AppResult<()> {
        let mut state = self.write();
        let id = state.next_id();
        state.activity.push(StoredActivity {
            id,
            entry: entry.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_activity(
        &self,
        filter: &ActivityFilter,
        page: Page,
    ) -> AppResult<(Vec<ActivityEntry>, i64)> {
        let state = self.read();
        let entries: Vec<ActivityEntry> = state
            .newest_activity()
            .filter(|a| filter.user_id.is_none_or(|id| a.entry.user_id == Some(id)))
            .filter(|a| {
                filter
                    .module
                    .as_deref()
                    .is_none_or(|m| a.entry.module == m)
            })
            .map(|a| state.activity_entry(a))
            .collect();
        Ok(page_of(entries, page))
    }

    async fn recent_activity(&self, limit: i64) -> AppResult<Vec<ActivityEntry>> {
        let state = self.read();
        Ok(state
            .newest_activity()
            .take(limit.max(0) as usize)
            .map(|a| state.activity_entry(a))
            .collect())
    }
}

#[async_trait]
impl AdmissionStore for MemoryStore {
    async fn create_enquiry(&self, input: &CreateEnquiryPayload) -> AppResult<Enquiry> {
        let mut state = self.write();
        if state
            .enquiries
            .values()
            .any(|e| e.enquiry_no == input.enquiry_no)
        {
            return Err(AppError::EnquiryNoAlreadyExists);
        }
        let id = state.next_id();
        let now = Utc::now();
        let enquiry = Enquiry {
            id,
            enquiry_no: input.enquiry_no.clone(),
            student_first_name: input.student_first_name.clone(),
            student_middle_name: input.student_middle_name.clone(),
            student_last_name: input.student_last_name.clone(),
            guardian_first_name: input.guardian_first_name.clone(),
            guardian_last_name: input.guardian_last_name.clone(),
            contact_number: input.contact_number.clone(),
            email: input.email.clone(),
            academic_year: input.academic_year,
            source_of_enquiry: input.source_of_enquiry.clone(),
            status: input.status.clone(),
            remarks: input.remarks.clone(),
            next_follow_up_date: input.next_follow_up_date,
            created_at: now,
            updated_at: now,
        };
        state.enquiries.insert(id, enquiry.clone());
        Ok(enquiry)
    }

    async fn create_application(&self, input: &CreateApplicationPayload) -> AppResult<Application> {
        let mut state = self.write();
        if state
            .applications
            .values()
            .any(|a| a.application_no == input.application_no)
        {
            return Err(AppError::ApplicationNoAlreadyExists);
        }
        let id = state.next_id();
        let now = Utc::now();
        let application = Application {
            id,
            application_no: input.application_no.clone(),
            enquiry_no: input.enquiry_no.clone(),
            student_first_name: input.student_first_name.clone(),
            student_middle_name: input.student_middle_name.clone(),
            student_last_name: input.student_last_name.clone(),
            guardian_first_name: input.guardian_first_name.clone(),
            guardian_last_name: input.guardian_last_name.clone(),
            dob: input.dob,
            gender: input.gender,
            religion: input.religion.clone(),
            previous_school: input.previous_school.clone(),
            previous_class: input.previous_class.clone(),
            academic_year: input.academic_year,
            class_applied: input.class_applied.clone(),
            address: input.address.clone(),
            document: input.document.clone(),
            application_status: input.application_status.clone(),
            created_at: now,
            updated_at: now,
        };
        state.applications.insert(id, application.clone());
        Ok(application)
    }
}
