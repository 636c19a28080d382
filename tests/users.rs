mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use serde_json::{json, Value};

use common::{bearer, ADMIN_EMAIL};

fn assert_no_credentials(user: &Value) {
    let object = user.as_object().unwrap();
    for field in ["contrasenia", "password", "password_hash", "passwordHash", "hash"] {
        assert!(
            !object.contains_key(field),
            "User response exposes `{}`: {}",
            field,
            user
        );
    }
    assert!(!user.to_string().contains("$2"), "Hash leaked: {}", user);
}

#[actix_rt::test]
async fn test_user_management_is_admin_only() {
    let ctx = common::context().await;
    let app = common::init_app(ctx.state.clone()).await;
    let admin = common::admin_token(&app).await;
    let (member_id, member_token) =
        common::create_member(&app, &admin, "ana@example.com").await;
    let uri = format!("/api/usuarios/{}", member_id);

    let requests = vec![
        test::TestRequest::get().uri("/api/usuarios"),
        test::TestRequest::get().uri(&uri),
        test::TestRequest::post().uri("/api/usuarios").set_json(json!({
            "nombre": "Intruso",
            "apellido": "Sin Permiso",
            "correo": "intruso@example.com",
            "contrasenia": "Password1"
        })),
        test::TestRequest::put().uri(&uri).set_json(json!({
            "nombre": "Ana",
            "apellido": "Autoascendida",
            "correo": "ana@example.com",
            "rolId": 1
        })),
        test::TestRequest::delete().uri(&uri),
    ];
    for req in requests {
        let req = req.insert_header(bearer(&member_token)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    // the member is untouched
    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&admin))
        .to_request();
    let member: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(member["apellido"], "De Prueba");
    assert_eq!(member["rolNombre"], "Miembro");
}

#[actix_rt::test]
async fn test_user_responses_never_carry_the_password() {
    let ctx = common::context().await;
    let app = common::init_app(ctx.state.clone()).await;
    let admin = common::admin_token(&app).await;
    let (member_id, _) = common::create_member(&app, &admin, "ana@example.com").await;

    let req = test::TestRequest::get()
        .uri("/api/usuarios")
        .insert_header(bearer(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let users: Vec<Value> = test::read_body_json(resp).await;
    assert_eq!(users.len(), 2);
    users.iter().for_each(assert_no_credentials);
    assert!(users.iter().any(|user| user["correo"] == ADMIN_EMAIL
        && user["rolNombre"] == "Administrador"));

    let req = test::TestRequest::get()
        .uri(&format!("/api/usuarios/{}", member_id))
        .insert_header(bearer(&admin))
        .to_request();
    let user: Value = test::call_and_read_body_json(&app, req).await;
    assert_no_credentials(&user);
    assert_eq!(user["correo"], "ana@example.com");

    let req = test::TestRequest::get()
        .uri("/api/usuarios/9999")
        .insert_header(bearer(&admin))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_rt::test]
async fn test_create_user_defaults_to_member_role() {
    let ctx = common::context().await;
    let app = common::init_app(ctx.state.clone()).await;
    let admin = common::admin_token(&app).await;

    let req = test::TestRequest::post()
        .uri("/api/usuarios")
        .insert_header(bearer(&admin))
        .set_json(json!({
            "nombre": "José",
            "apellido": "Núñez",
            "correo": "jose@example.com",
            "contrasenia": "Secreta1",
            "rolId": 0
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let created: Value = test::read_body_json(resp).await;

    assert_eq!(location, format!("/api/usuarios/{}", created["id"]));
    assert_eq!(created["nombre"], "José");
    assert_eq!(created["rolNombre"], "Miembro");
    assert_no_credentials(&created);

    // the stored password is a working credential
    let (status, body) = common::login(&app, "jose@example.com", "Secreta1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rol"], "Miembro");
}

#[actix_rt::test]
async fn test_create_user_rejects_invalid_input() {
    let ctx = common::context().await;
    let app = common::init_app(ctx.state.clone()).await;
    let admin = common::admin_token(&app).await;

    let create = |payload: Value| {
        test::TestRequest::post()
            .uri("/api/usuarios")
            .insert_header(bearer(&admin))
            .set_json(payload)
            .to_request()
    };

    let duplicate = create(json!({
        "nombre": "Otro",
        "apellido": "Administrador",
        "correo": ADMIN_EMAIL,
        "contrasenia": "Password1"
    }));
    let resp = test::call_service(&app, duplicate).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains(ADMIN_EMAIL));

    let digits_in_name = create(json!({
        "nombre": "R2D2",
        "apellido": "Droide",
        "correo": "r2d2@example.com",
        "contrasenia": "Password1"
    }));
    assert_eq!(
        test::call_service(&app, digits_in_name).await.status(),
        StatusCode::BAD_REQUEST
    );

    let short_password = create(json!({
        "nombre": "Corta",
        "apellido": "Clave",
        "correo": "corta@example.com",
        "contrasenia": "abc"
    }));
    assert_eq!(
        test::call_service(&app, short_password).await.status(),
        StatusCode::BAD_REQUEST
    );

    let unknown_role = create(json!({
        "nombre": "Sin",
        "apellido": "Rol",
        "correo": "sinrol@example.com",
        "contrasenia": "Password1",
        "rolId": 9999
    }));
    assert_eq!(
        test::call_service(&app, unknown_role).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[actix_rt::test]
async fn test_update_user_keeps_password_when_omitted() {
    let ctx = common::context().await;
    let app = common::init_app(ctx.state.clone()).await;
    let admin = common::admin_token(&app).await;
    let (member_id, _) = common::create_member(&app, &admin, "ana@example.com").await;
    let uri = format!("/api/usuarios/{}", member_id);

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&admin))
        .set_json(json!({
            "nombre": "Ana María",
            "apellido": "Pérez",
            "correo": "ana.perez@example.com",
            "contrasenia": ""
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["nombre"], "Ana María");
    assert_eq!(updated["correo"], "ana.perez@example.com");
    assert_eq!(updated["rolNombre"], "Miembro");
    assert_no_credentials(&updated);

    let (status, _) = common::login(&app, "ana.perez@example.com", "Password1").await;
    assert_eq!(status, StatusCode::OK, "Old password should still work");

    // a supplied password replaces the old one
    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&admin))
        .set_json(json!({
            "nombre": "Ana María",
            "apellido": "Pérez",
            "correo": "ana.perez@example.com",
            "contrasenia": "NuevaClave9"
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let (old, _) = common::login(&app, "ana.perez@example.com", "Password1").await;
    assert_eq!(old, StatusCode::UNAUTHORIZED);
    let (new, _) = common::login(&app, "ana.perez@example.com", "NuevaClave9").await;
    assert_eq!(new, StatusCode::OK);
}

#[actix_rt::test]
async fn test_update_user_checks_email_and_existence() {
    let ctx = common::context().await;
    let app = common::init_app(ctx.state.clone()).await;
    let admin = common::admin_token(&app).await;
    let (member_id, _) = common::create_member(&app, &admin, "ana@example.com").await;

    let update = |id: i32, email: &str| {
        test::TestRequest::put()
            .uri(&format!("/api/usuarios/{}", id))
            .insert_header(bearer(&admin))
            .set_json(json!({
                "nombre": "Ana",
                "apellido": "Pérez",
                "correo": email
            }))
            .to_request()
    };

    // keeping one's own email is fine
    assert_eq!(
        test::call_service(&app, update(member_id, "ana@example.com")).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        test::call_service(&app, update(member_id, ADMIN_EMAIL)).await.status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        test::call_service(&app, update(9999, "nadie@example.com")).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_rt::test]
async fn test_delete_user_removes_tasks_and_access() {
    let ctx = common::context().await;
    let app = common::init_app(ctx.state.clone()).await;
    let admin = common::admin_token(&app).await;
    let (member_id, member_token) =
        common::create_member(&app, &admin, "ana@example.com").await;
    let task = common::create_task(&app, &admin, member_id, "Será borrada").await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/usuarios/{}", member_id))
        .insert_header(bearer(&admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted: Value = test::read_body_json(resp).await;
    assert_eq!(deleted["id"], member_id);
    assert_no_credentials(&deleted);

    let req = test::TestRequest::get()
        .uri(&format!("/api/tareas/{}", task["id"]))
        .insert_header(bearer(&admin))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    // the token still verifies, but nobody stands behind it anymore
    let req = test::TestRequest::get()
        .uri("/api/tareas")
        .insert_header(bearer(&member_token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::delete()
        .uri(&format!("/api/usuarios/{}", member_id))
        .insert_header(bearer(&admin))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}
