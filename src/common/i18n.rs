// src/common/i18n.rs

use std::collections::HashMap;

const DEFAULT_LANG: &str = "en";

// Catálogo embutido: (chave, mensagem). `{nome}` é substituído pelos parâmetros.
const EN: &[(&str, &str)] = &[
    ("unauthenticated", "You must be logged in to perform this action."),
    ("invalid_token", "Invalid or missing authentication token."),
    ("invalid_credentials", "Invalid email or password."),
    ("forbidden", "Forbidden: missing {permission} permission."),
    ("operation_not_found", "The requested operation is not available."),
    ("validation", "One or more fields are invalid."),
    ("invalid_input", "Invalid value for field '{field}': {message}"),
    ("no_module_permissions", "No permissions found for module: {module}"),
    ("email_exists", "This email is already in use."),
    ("role_exists", "A role with this name already exists."),
    ("branch_code_exists", "A branch with this code already exists."),
    ("enquiry_no_exists", "An enquiry with this number already exists."),
    ("application_no_exists", "An application with this number already exists."),
    ("system_role_protected", "System role '{role}' cannot be modified or deleted."),
    ("role_not_found", "Role not found."),
    ("user_not_found", "User not found."),
    ("school_not_found", "The school has not been set up yet."),
    ("internal", "An unexpected error occurred. Please try again later."),
];

const PT: &[(&str, &str)] = &[
    ("unauthenticated", "Você precisa estar autenticado para realizar esta ação."),
    ("invalid_token", "Token de autenticação inválido ou ausente."),
    ("invalid_credentials", "E-mail ou senha inválidos."),
    ("forbidden", "Você precisa da permissão '{permission}' para realizar esta ação."),
    ("operation_not_found", "A operação solicitada não está disponível."),
    ("validation", "Um ou mais campos são inválidos."),
    ("invalid_input", "Valor inválido para o campo '{field}': {message}"),
    ("no_module_permissions", "Nenhuma permissão encontrada para o módulo: {module}"),
    ("email_exists", "Este e-mail já está em uso."),
    ("role_exists", "Já existe um cargo com esse nome."),
    ("branch_code_exists", "Já existe uma filial com esse código."),
    ("enquiry_no_exists", "Já existe uma consulta com esse número."),
    ("application_no_exists", "Já existe uma inscrição com esse número."),
    ("system_role_protected", "O cargo de sistema '{role}' não pode ser alterado nem removido."),
    ("role_not_found", "Cargo não encontrado."),
    ("user_not_found", "Usuário não encontrado."),
    ("school_not_found", "A escola ainda não foi cadastrada."),
    ("internal", "Ocorreu um erro inesperado."),
];

/// Mensagens traduzidas por idioma, com fallback para inglês.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("en", EN.iter().copied().collect());
        catalogs.insert("pt", PT.iter().copied().collect());
        Self { catalogs }
    }

    pub fn translate(&self, lang: &str, key: &str, params: &[(&str, &str)]) -> String {
        let template = self
            .lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANG, key))
            .unwrap_or(key);

        params
            .iter()
            .fold(template.to_string(), |msg, (name, value)| {
                msg.replace(&format!("{{{name}}}"), value)
            })
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&'static str> {
        self.catalogs.get(lang).and_then(|c| c.get(key)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_parameters() {
        let store = I18nStore::new();
        let msg = store.translate("en", "forbidden", &[("permission", "school:update")]);
        assert_eq!(msg, "Forbidden: missing school:update permission.");
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let store = I18nStore::new();
        assert_eq!(
            store.translate("de", "role_not_found", &[]),
            "Role not found."
        );
    }

    #[test]
    fn every_key_exists_in_both_catalogs() {
        for (key, _) in EN {
            assert!(PT.iter().any(|(k, _)| k == key), "falta '{key}' em pt");
        }
        assert_eq!(EN.len(), PT.len());
    }
}
