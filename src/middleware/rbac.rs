// src/middleware/rbac.rs

//! Registro estático das operações protegidas.
//!
//! Cada serviço declara, ao lado dos métodos, as operações que expõe com a
//! macro [`operation!`](crate::operation). O `inventory` junta todas as
//! declarações na ligação do binário, sem reflexão em tempo de execução:
//!
//! ```ignore
//! crate::operation!(pub SCHOOL_UPSERT = "school.upsert", permission("school", "update"));
//! crate::operation!(pub ROLE_LIST = "role.list", public);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use thiserror::Error;

/// Quem pode executar uma operação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Liberada para qualquer sessão autenticada.
    Public,
    Permission {
        module: &'static str,
        action: &'static str,
    },
}

impl Access {
    /// Nome canônico `module:action`, se houver permissão.
    pub fn permission_name(&self) -> Option<String> {
        match self {
            Access::Public => None,
            Access::Permission { module, action } => Some(format!("{module}:{action}")),
        }
    }
}

#[derive(Debug)]
pub struct OperationDef {
    pub name: &'static str,
    /// `module_path!()` do serviço que declarou a operação.
    pub service: &'static str,
    pub access: Access,
}

inventory::collect!(OperationDef);

/// Declara uma operação e a registra.
#[macro_export]
macro_rules! operation {
    ($vis:vis $ident:ident = $name:literal, public) => {
        $vis const $ident: &str = $name;

        ::inventory::submit! {
            $crate::middleware::rbac::OperationDef {
                name: $name,
                service: module_path!(),
                access: $crate::middleware::rbac::Access::Public,
            }
        }
    };
    ($vis:vis $ident:ident = $name:literal, permission($module:literal, $action:literal)) => {
        $vis const $ident: &str = $name;

        ::inventory::submit! {
            $crate::middleware::rbac::OperationDef {
                name: $name,
                service: module_path!(),
                access: $crate::middleware::rbac::Access::Permission {
                    module: $module,
                    action: $action,
                },
            }
        }
    };
}

pub fn operations() -> impl Iterator<Item = &'static OperationDef> {
    inventory::iter::<OperationDef>.into_iter()
}

fn index() -> &'static HashMap<&'static str, &'static OperationDef> {
    static INDEX: OnceLock<HashMap<&'static str, &'static OperationDef>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut map = HashMap::new();
        for op in operations() {
            map.entry(op.name).or_insert(op);
        }
        map
    })
}

pub fn lookup(name: &str) -> Option<&'static OperationDef> {
    index().get(name).copied()
}

/// Nomes `module:action` exigidos por alguma operação, sem repetição.
pub fn declared_permissions() -> BTreeSet<String> {
    operations()
        .filter_map(|op| op.access.permission_name())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryProblem {
    /// Operação usada por uma rota, mas nunca declarada.
    Undeclared(String),
    /// Mesmo nome declarado com acessos diferentes.
    Conflicting(String),
    /// Módulo ou ação vazios, ou com ':'.
    MalformedPermission(String),
}

impl std::fmt::Display for RegistryProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryProblem::Undeclared(name) => write!(f, "operação '{name}' não declarada"),
            RegistryProblem::Conflicting(name) => {
                write!(f, "operação '{name}' declarada com acessos diferentes")
            }
            RegistryProblem::MalformedPermission(name) => {
                write!(f, "operação '{name}' tem permissão malformada")
            }
        }
    }
}

#[derive(Debug, Error)]
#[error("registro de permissões inválido: {}", format_problems(.problems))]
pub struct RegistryError {
    pub problems: Vec<RegistryProblem>,
}

fn format_problems(problems: &[RegistryProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn well_formed(part: &str) -> bool {
    !part.trim().is_empty() && !part.contains(':')
}

/// Verifica, na subida do servidor, que toda operação exposta pelas rotas está
/// declarada (como pública ou com permissão) e que as declarações são coerentes.
pub fn verify(exposed: &[&str]) -> Result<(), RegistryError> {
    verify_against(operations(), exposed)
}

pub(crate) fn verify_against<'a>(
    declared: impl IntoIterator<Item = &'a OperationDef>,
    exposed: &[&str],
) -> Result<(), RegistryError> {
    let mut problems = Vec::new();
    let mut seen: HashMap<&str, Access> = HashMap::new();
    let mut conflicting = BTreeSet::new();

    for op in declared {
        if let Access::Permission { module, action } = op.access {
            if !well_formed(module) || !well_formed(action) {
                problems.push(RegistryProblem::MalformedPermission(op.name.to_string()));
            }
        }
        match seen.get(op.name) {
            Some(access) if *access != op.access => {
                conflicting.insert(op.name);
            }
            Some(_) => {}
            None => {
                seen.insert(op.name, op.access);
            }
        }
    }

    problems.extend(
        conflicting
            .into_iter()
            .map(|name| RegistryProblem::Conflicting(name.to_string())),
    );

    for name in exposed {
        if !seen.contains_key(name) {
            problems.push(RegistryProblem::Undeclared(name.to_string()));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(RegistryError { problems })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{role_service, school_service};

    #[test]
    fn lookup_returns_declared_permission() {
        let op = lookup(school_service::SCHOOL_UPSERT).expect("declarada");
        assert_eq!(
            op.access,
            Access::Permission {
                module: "school",
                action: "update"
            }
        );
        assert_eq!(op.access.permission_name().as_deref(), Some("school:update"));
        assert!(op.service.ends_with("school_service"));
    }

    #[test]
    fn public_operations_have_no_permission() {
        let op = lookup(role_service::ROLE_LIST).expect("declarada");
        assert_eq!(op.access, Access::Public);
        assert_eq!(op.access.permission_name(), None);
    }

    #[test]
    fn declared_permissions_are_deduplicated() {
        let declared = declared_permissions();
        // user.assign_roles e user.revoke_roles exigem a mesma permissão
        assert!(declared.contains("user:assign_roles"));
        assert!(!declared.iter().any(|p| p.starts_with("role:list")));
        let gated = operations().filter(|op| op.access != Access::Public).count();
        assert!(declared.len() < gated);
    }

    #[test]
    fn unknown_operation_has_no_entry() {
        assert!(lookup("school.explode").is_none());
    }

    #[test]
    fn verify_reports_undeclared_routes() {
        let err = verify(&[school_service::SCHOOL_GET, "ghost.op"]).unwrap_err();
        assert_eq!(
            err.problems,
            vec![RegistryProblem::Undeclared("ghost.op".into())]
        );
    }

    #[test]
    fn verify_detects_conflicts_and_malformed_permissions() {
        let declared = [
            OperationDef {
                name: "a.op",
                service: "tests",
                access: Access::Public,
            },
            OperationDef {
                name: "a.op",
                service: "tests",
                access: Access::Permission {
                    module: "a",
                    action: "run",
                },
            },
            OperationDef {
                name: "b.op",
                service: "tests",
                access: Access::Permission {
                    module: "b:x",
                    action: "",
                },
            },
        ];

        let err = verify_against(declared.iter(), &["a.op", "b.op"]).unwrap_err();
        assert!(err.problems.contains(&RegistryProblem::Conflicting("a.op".into())));
        assert!(
            err.problems
                .contains(&RegistryProblem::MalformedPermission("b.op".into()))
        );
    }

    #[test]
    fn every_declared_operation_passes_verification() {
        let names: Vec<&str> = operations().map(|op| op.name).collect();
        verify(&names).expect("registro coerente");
    }
}
