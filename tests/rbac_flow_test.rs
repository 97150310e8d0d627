// tests/rbac_flow_test.rs

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{request, school_body, setup};

#[tokio::test]
async fn health_needs_no_session() {
    let app = setup().await;
    let (status, _) = app.send(request("GET", "/api/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn editor_gains_access_once_the_permission_is_assigned() {
    let app = setup().await;
    let (_, token) = app.user_with_roles("editor@escola.com", &["EDITOR"]).await;

    let (status, body) = app
        .send(request("PUT", "/api/school", Some(&token), Some(school_body())))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("school:update"));
    assert_eq!(body["details"]["permission"], json!("school:update"));

    app.grant("EDITOR", "school:update").await;

    let (status, body) = app
        .send(request("PUT", "/api/school", Some(&token), Some(school_body())))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["displayName"], json!("Colégio Aurora"));
}

#[tokio::test]
async fn super_admin_bypasses_every_guarded_operation() {
    let app = setup().await;
    let (_, token) = app.user_with_roles("super@system.com", &["SUPER_ADMIN"]).await;

    let (status, _) = app
        .send(request("PUT", "/api/school", Some(&token), Some(school_body())))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(request(
            "POST",
            "/api/branches",
            Some(&token),
            Some(json!({ "branchName": "Unidade Centro", "branchCode": "CTR-01" })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let super_id = app.role("SUPER_ADMIN").await;
    let role_uri = format!("/api/roles/{super_id}/permissions");
    for uri in ["/api/school", "/api/branches", "/api/users", role_uri.as_str()] {
        let (status, _) = app.send(request("GET", uri, Some(&token), None)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn guarded_routes_answer_401_without_a_session() {
    let app = setup().await;
    let cases = [
        ("GET", "/api/roles", None),
        ("POST", "/api/roles", Some(json!({ "name": "X" }))),
        ("GET", "/api/permissions", None),
        ("GET", "/api/permissions/modules", None),
        ("GET", "/api/users", None),
        ("GET", "/api/users/me", None),
        ("GET", "/api/school", None),
        ("PUT", "/api/school", Some(school_body())),
        ("POST", "/api/roles/assign", Some(json!({ "roleId": 1 }))),
        ("POST", "/api/roles/assign", Some(json!({ "roleId": 1, "module": "school" }))),
        ("DELETE", "/api/roles/1", None),
    ];

    for (method, uri, body) in cases {
        let (status, _) = app.send(request(method, uri, None, body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }

    // token inválido equivale a nenhuma sessão
    let (status, _) = app
        .send(request("GET", "/api/roles", Some("lixo"), None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_operations_only_need_a_session() {
    let app = setup().await;
    let (_, token) = app.user_with_roles("aluno@escola.com", &[]).await;

    let (status, body) = app.send(request("GET", "/api/roles", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["meta"]["totalItems"].is_number());

    let (status, body) = app
        .send(request("GET", "/api/permissions/modules", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    let modules: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["module"].as_str().unwrap())
        .collect();
    assert!(modules.contains(&"school"));
    assert!(modules.contains(&"permission_assignment"));
}

#[tokio::test]
async fn removing_a_permission_denies_the_next_call() {
    let app = setup().await;
    let (_, token) = app.user_with_roles("secretaria@escola.com", &["SECRETARIA"]).await;
    app.grant("SECRETARIA", "school:read").await;

    let (status, _) = app.send(request("GET", "/api/school", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);

    let role_id = app.role("SECRETARIA").await;
    let read = app.permission_id("school:read").await;
    let (_, admin) = app.user_with_roles("root@escola.com", &["SUPER_ADMIN"]).await;
    let (status, body) = app
        .send(request(
            "POST",
            "/api/roles/permissions/remove",
            Some(&admin),
            Some(json!({ "roleId": role_id, "permissionIds": [read] })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["permissions"], json!([]));

    let (status, _) = app.send(request("GET", "/api/school", Some(&token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn nonexistent_module_fails_and_changes_nothing() {
    let app = setup().await;
    let (_, admin) = app.user_with_roles("root@escola.com", &["SUPER_ADMIN"]).await;
    app.grant("EDITOR", "school:update").await;
    let role_id = app.role("EDITOR").await;

    let (status, body) = app
        .send(request(
            "POST",
            "/api/roles/assign",
            Some(&admin),
            Some(json!({ "roleId": role_id, "module": "nonexistent_module" })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("No permissions found for module")
    );

    let (_, body) = app
        .send(request(
            "GET",
            &format!("/api/roles/{role_id}/permissions"),
            Some(&admin),
            None,
        ))
        .await;
    let names: Vec<&str> = body["data"]["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["school:update"]);
}

#[tokio::test]
async fn assign_and_remove_are_idempotent_over_http() {
    let app = setup().await;
    let (_, admin) = app.user_with_roles("root@escola.com", &["SUPER_ADMIN"]).await;
    let role_id = app.role("EDITOR").await;
    let update = app.permission_id("school:update").await;
    let assign = json!({ "roleId": role_id, "permissionIds": [update] });

    for _ in 0..2 {
        let (status, body) = app
            .send(request("POST", "/api/roles/assign", Some(&admin), Some(assign.clone())))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["permissions"].as_array().unwrap().len(), 1);
    }

    let remove = json!({ "roleId": role_id, "permissionIds": [update] });
    for _ in 0..2 {
        let (status, body) = app
            .send(request(
                "POST",
                "/api/roles/permissions/remove",
                Some(&admin),
                Some(remove.clone()),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["permissions"], json!([]));
    }
}

#[tokio::test]
async fn whole_module_assignment_grants_access() {
    let app = setup().await;
    let (_, admin) = app.user_with_roles("root@escola.com", &["SUPER_ADMIN"]).await;
    let (_, token) = app.user_with_roles("diretora@escola.com", &["DIRETORIA"]).await;
    let role_id = app.role("DIRETORIA").await;

    let (status, _) = app
        .send(request(
            "POST",
            "/api/roles/assign",
            Some(&admin),
            Some(json!({ "roleId": role_id, "module": "school" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(request("GET", "/api/school", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(request("PUT", "/api/school", Some(&token), Some(school_body())))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send(request("GET", "/api/branches", Some(&token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn system_role_cannot_be_deleted() {
    let app = setup().await;
    let (_, admin) = app.user_with_roles("root@escola.com", &["SUPER_ADMIN"]).await;
    let super_id = app.role("SUPER_ADMIN").await;

    let (status, _) = app
        .send(request("DELETE", &format!("/api/roles/{super_id}"), Some(&admin), None))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_login_and_me() {
    let app = setup().await;
    let (status, body) = app
        .send(request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "firstName": "Ana",
                "lastName": "Souza",
                "email": "ana@escola.com",
                "password": "senha123"
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"]["token"].is_string());

    let (status, body) = app
        .send(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ana@escola.com", "password": "senha123" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(request("GET", "/api/users/me", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], json!("ana@escola.com"));
    assert_eq!(body["data"]["roles"], json!([]));
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn errors_follow_accept_language() {
    let app = setup().await;
    let mut req = request("GET", "/api/school", None, None);
    req.headers_mut()
        .insert("accept-language", "pt-BR,pt;q=0.9".parse().unwrap());

    let (status, body) = app.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().unwrap().contains("autenticado"));
}

#[tokio::test]
async fn huge_page_numbers_return_an_empty_page() {
    let app = setup().await;
    let (_, token) = app.user_with_roles("leitor@escola.com", &[]).await;

    let (status, body) = app
        .send(request(
            "GET",
            "/api/roles?page=9223372036854775807&limit=100",
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["data"], json!([]));
}

#[tokio::test]
async fn empty_assignment_is_authorized_before_it_is_validated() {
    let app = setup().await;
    let (_, editor) = app.user_with_roles("editor@escola.com", &["EDITOR"]).await;
    let (_, admin) = app.user_with_roles("root@escola.com", &["SUPER_ADMIN"]).await;
    let role_id = app.role("EDITOR").await;
    let body = json!({ "roleId": role_id });

    let (status, _) = app
        .send(request("POST", "/api/roles/assign", Some(&editor), Some(body.clone())))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(request("POST", "/api/roles/assign", Some(&admin), Some(body)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn super_admin_role_name_cannot_be_reused() {
    let app = setup().await;
    let (_, admin) = app.user_with_roles("root@escola.com", &["SUPER_ADMIN"]).await;

    for name in ["SUPER_ADMIN", " super_admin ", "   "] {
        let (status, _) = app
            .send(request("POST", "/api/roles", Some(&admin), Some(json!({ "name": name }))))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{name:?}");
    }
}
