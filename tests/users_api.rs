use std::sync::Arc;

use bytes::Bytes;
use serde_json::{Value, json};
use users_api::{Response, Router, User, UserStatus, UserStore, api};

fn app() -> Router {
    api::routes(Arc::new(UserStore::new()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let body = body.map(|v| Bytes::from(v.to_string())).unwrap_or_default();
    let req = http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    app.dispatch(req).await
}

fn json_body(response: &Response) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

async fn create(app: &Router, name: &str, age: u8) -> User {
    let body = json!({ "name": name, "email": format!("{}@example.com", name.to_lowercase()), "age": age });
    let response = send(app, "POST", "/users", Some(body)).await;
    assert_eq!(response.status_code(), 201);
    serde_json::from_slice(response.body()).unwrap()
}

fn error_fields(response: &Response) -> Vec<String> {
    json_body(response)["detail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap().to_owned())
        .collect()
}

#[tokio::test]
async fn root_reports_name_and_version() {
    let response = send(&app(), "GET", "/", None).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        json_body(&response),
        json!({ "message": "User Management API", "version": env!("CARGO_PKG_VERSION") })
    );
}

#[tokio::test]
async fn create_then_get_returns_same_record() {
    let app = app();
    let created = create(&app, "Ada", 36).await;
    assert_eq!(created.id, 1);
    assert_eq!(created.status, UserStatus::Active);

    let response = send(&app, "GET", "/users/1", None).await;
    assert_eq!(response.status_code(), 200);
    let fetched: User = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_sets_location_header() {
    let app = app();
    let body = json!({ "name": "Ada", "email": "ada@example.com", "age": 36, "status": "pending" });
    let response = send(&app, "POST", "/users", Some(body)).await;

    assert_eq!(response.status_code(), 201);
    assert_eq!(response.header("location"), Some("/users/1"));
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(json_body(&response)["status"], "pending");
}

#[tokio::test]
async fn ids_increase_and_are_not_reused_after_delete() {
    let app = app();
    let a = create(&app, "Ada", 1).await;
    let b = create(&app, "Bob", 2).await;
    assert!(b.id > a.id);

    assert_eq!(send(&app, "DELETE", "/users/2", None).await.status_code(), 204);
    let c = create(&app, "Cy", 3).await;
    assert_eq!(c.id, 3);
}

#[tokio::test]
async fn patch_age_keeps_other_fields() {
    let app = app();
    let created = create(&app, "Ada", 36).await;

    let response = send(&app, "PATCH", "/users/1", Some(json!({ "age": 37 }))).await;
    assert_eq!(response.status_code(), 200);
    let patched: User = serde_json::from_slice(response.body()).unwrap();

    assert_eq!(patched.age, 37);
    assert_eq!(patched.name, created.name);
    assert_eq!(patched.email, created.email);
    assert_eq!(patched.status, created.status);
}

#[tokio::test]
async fn put_replaces_all_fields_and_resets_status() {
    let app = app();
    create(&app, "Ada", 36).await;
    send(&app, "PATCH", "/users/1", Some(json!({ "status": "inactive" }))).await;

    let body = json!({ "name": "Grace", "email": "grace@example.org", "age": 45 });
    let response = send(&app, "PUT", "/users/1", Some(body)).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        json_body(&response),
        json!({ "id": 1, "name": "Grace", "email": "grace@example.org", "age": 45, "status": "active" })
    );
}

#[tokio::test]
async fn put_requires_every_creatable_field() {
    let app = app();
    create(&app, "Ada", 36).await;

    let response = send(&app, "PUT", "/users/1", Some(json!({ "age": 40 }))).await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(error_fields(&response), ["name", "email"]);
}

#[tokio::test]
async fn unknown_id_is_not_found_everywhere() {
    let app = app();
    let full = json!({ "name": "Ada", "email": "ada@example.com", "age": 36 });

    for (method, body) in [
        ("GET", None),
        ("PUT", Some(full)),
        ("PATCH", Some(json!({ "age": 1 }))),
        ("DELETE", None),
    ] {
        let response = send(&app, method, "/users/42", body).await;
        assert_eq!(response.status_code(), 404, "{method}");
        assert_eq!(json_body(&response), json!({ "detail": "User not found" }));
    }
}

#[tokio::test]
async fn delete_twice() {
    let app = app();
    create(&app, "Ada", 36).await;

    let first = send(&app, "DELETE", "/users/1", None).await;
    assert_eq!(first.status_code(), 204);
    assert!(first.body().is_empty());

    assert_eq!(send(&app, "DELETE", "/users/1", None).await.status_code(), 404);
}

#[tokio::test]
async fn list_pagination_total_is_page_length() {
    let app = app();
    for (name, age) in [("Ada", 1), ("Bob", 2), ("Cy", 3)] {
        create(&app, name, age).await;
    }

    let response = send(&app, "GET", "/users?skip=1&limit=1", None).await;
    assert_eq!(response.status_code(), 200);
    let page = json_body(&response);
    assert_eq!(page["total"], 1);
    assert_eq!(page["users"].as_array().unwrap().len(), 1);
    assert_eq!(page["users"][0]["name"], "Bob");

    let all = json_body(&send(&app, "GET", "/users", None).await);
    assert_eq!(all["total"], 3);

    let past_end = json_body(&send(&app, "GET", "/users?skip=10", None).await);
    assert_eq!(past_end, json!({ "users": [], "total": 0 }));
}

#[tokio::test]
async fn list_rejects_negative_paging() {
    let response = send(&app(), "GET", "/users?skip=-1&limit=abc", None).await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(error_fields(&response), ["skip", "limit"]);
}

#[tokio::test]
async fn age_boundaries() {
    let app = app();
    for age in [0, 150] {
        let body = json!({ "name": "Ada", "email": "ada@example.com", "age": age });
        assert_eq!(send(&app, "POST", "/users", Some(body)).await.status_code(), 201, "{age}");
    }
    for age in [-1, 151] {
        let body = json!({ "name": "Ada", "email": "ada@example.com", "age": age });
        let response = send(&app, "POST", "/users", Some(body)).await;
        assert_eq!(response.status_code(), 400, "{age}");
        assert_eq!(error_fields(&response), ["age"]);
    }
}

#[tokio::test]
async fn create_rejects_unknown_fields() {
    let body = json!({ "name": "Ada", "email": "ada@example.com", "age": 36, "id": 99 });
    let response = send(&app(), "POST", "/users", Some(body)).await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(error_fields(&response), ["id"]);
}

#[tokio::test]
async fn create_rejects_bad_email_and_status() {
    let body = json!({ "name": "Ada", "email": "not-an-email", "age": 36, "status": "banned" });
    let response = send(&app(), "POST", "/users", Some(body)).await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(error_fields(&response), ["email", "status"]);
}

#[tokio::test]
async fn malformed_json_and_bad_ids_are_client_errors() {
    let app = app();

    let req = http::Request::builder()
        .method("POST")
        .uri("/users")
        .body(Bytes::from_static(b"{not json"))
        .unwrap();
    let response = app.dispatch(req).await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(error_fields(&response), ["body"]);

    for uri in ["/users/abc", "/users/1.5", "/users/-"] {
        let response = send(&app, "GET", uri, None).await;
        assert_eq!(response.status_code(), 400, "{uri}");
        assert_eq!(error_fields(&response), ["id"]);
    }
}

#[tokio::test]
async fn impossible_integer_ids_are_not_found() {
    let app = app();
    create(&app, "Ada", 36).await;

    for (method, uri) in [
        ("GET", "/users/0"),
        ("DELETE", "/users/-3"),
        ("GET", "/users/99999999999999999999999"),
        ("PATCH", "/users/-1"),
    ] {
        let body = (method == "PATCH").then(|| json!({ "age": 1 }));
        let response = send(&app, method, uri, body).await;
        assert_eq!(response.status_code(), 404, "{method} {uri}");
        assert_eq!(json_body(&response), json!({ "detail": "User not found" }));
    }
}

#[tokio::test]
async fn create_coerces_whole_number_ages() {
    let app = app();
    for age in [json!(30.0), json!("30")] {
        let body = json!({ "name": "Ada", "email": "ada@example.com", "age": age });
        let response = send(&app, "POST", "/users", Some(body)).await;
        assert_eq!(response.status_code(), 201, "{age}");
        assert_eq!(json_body(&response)["age"], 30);
    }
}

#[tokio::test]
async fn unrouted_requests() {
    let app = app();
    assert_eq!(send(&app, "GET", "/accounts", None).await.status_code(), 404);
    assert_eq!(send(&app, "DELETE", "/users", None).await.status_code(), 405);
}
