//! Integration tests for API endpoints.
//!
//! The real user and group services run over an in-memory Unit of Work, so
//! the membership rules are exercised end to end without a database. The
//! in-memory store mirrors the relational one: unique natural keys, cascading
//! deletes, unknown names dropped on replace, rollback on a failed unit.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use serde_json::{json, Value};
use tower::ServiceExt;

use membership_service::api::{create_router, AppState};
use membership_service::domain::{Group, User, UserData};
use membership_service::errors::{AppError, AppResult};
use membership_service::infra::{
    Database, GroupRepository, MembershipRepository, MembershipWriter, TransactionContext,
    UnitOfWork, UserRepository, UserWriter,
};
use membership_service::services::{GroupManager, UserManager};

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Clone, Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    groups: BTreeMap<i64, Group>,
    links: BTreeSet<(i64, i64)>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_id(&self, userid: &str) -> Option<i64> {
        self.users
            .values()
            .find(|u| u.userid == userid)
            .map(|u| u.id)
    }

    fn group_id(&self, name: &str) -> Option<i64> {
        self.groups.values().find(|g| g.name == name).map(|g| g.id)
    }
}

#[derive(Clone, Default)]
struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_user_links: Arc<AtomicBool>,
}

impl MemoryStore {
    fn with<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut tables = self.tables.lock().unwrap();
        f(&mut tables)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_userid(&self, userid: &str) -> AppResult<Option<User>> {
        Ok(self.with(|t| t.user_id(userid).map(|id| t.users[&id].clone())))
    }

    async fn delete(&self, userid: &str) -> AppResult<()> {
        self.with(|t| {
            let id = t
                .user_id(userid)
                .ok_or_else(|| AppError::not_found(format!("user {}", userid)))?;
            t.users.remove(&id);
            t.links.retain(|(user_id, _)| *user_id != id);
            Ok(())
        })
    }
}

#[async_trait]
impl UserWriter for MemoryStore {
    async fn insert(&self, user: UserData) -> AppResult<i64> {
        self.with(|t| {
            if t.user_id(&user.userid).is_some() {
                return Err(AppError::conflict("duplicate key value violates users_userid_key"));
            }
            let id = t.next_id();
            t.users.insert(
                id,
                User {
                    id,
                    userid: user.userid,
                    first_name: user.first_name,
                    last_name: user.last_name,
                },
            );
            Ok(id)
        })
    }

    async fn update(&self, user: UserData) -> AppResult<i64> {
        self.with(|t| {
            let id = t
                .user_id(&user.userid)
                .ok_or_else(|| AppError::not_found(format!("user {}", user.userid)))?;
            if let Some(row) = t.users.get_mut(&id) {
                row.first_name = user.first_name;
                row.last_name = user.last_name;
            }
            Ok(id)
        })
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Group>> {
        Ok(self.with(|t| t.group_id(name).map(|id| t.groups[&id].clone())))
    }

    async fn insert(&self, name: String) -> AppResult<i64> {
        self.with(|t| {
            if t.group_id(&name).is_some() {
                return Err(AppError::conflict("duplicate key value violates groups_name_key"));
            }
            let id = t.next_id();
            t.groups.insert(id, Group { id, name });
            Ok(id)
        })
    }

    async fn delete(&self, name: &str) -> AppResult<()> {
        self.with(|t| {
            let id = t
                .group_id(name)
                .ok_or_else(|| AppError::not_found(format!("group {}", name)))?;
            t.groups.remove(&id);
            t.links.retain(|(_, group_id)| *group_id != id);
            Ok(())
        })
    }
}

#[async_trait]
impl MembershipRepository for MemoryStore {
    async fn groups_for_user(&self, user_id: i64) -> AppResult<Vec<Group>> {
        Ok(self.with(|t| {
            let mut groups: Vec<Group> = t
                .links
                .iter()
                .filter(|(u, _)| *u == user_id)
                .map(|(_, g)| t.groups[g].clone())
                .collect();
            groups.sort_by(|a, b| a.name.cmp(&b.name));
            groups
        }))
    }

    async fn users_for_group(&self, group_id: i64) -> AppResult<Vec<User>> {
        Ok(self.with(|t| {
            let mut users: Vec<User> = t
                .links
                .iter()
                .filter(|(_, g)| *g == group_id)
                .map(|(u, _)| t.users[u].clone())
                .collect();
            users.sort_by(|a, b| a.userid.cmp(&b.userid));
            users
        }))
    }

    async fn replace_links_for_group(&self, group_name: &str, userids: Vec<String>) -> AppResult<()> {
        if userids.is_empty() {
            return Ok(());
        }
        self.with(|t| {
            let group_id = t
                .group_id(group_name)
                .ok_or_else(|| AppError::not_found(format!("group {}", group_name)))?;
            let user_ids: Vec<i64> = userids.iter().filter_map(|u| t.user_id(u)).collect();
            t.links.retain(|(_, g)| *g != group_id);
            t.links.extend(user_ids.into_iter().map(|u| (u, group_id)));
            Ok(())
        })
    }
}

#[async_trait]
impl MembershipWriter for MemoryStore {
    async fn replace_links_for_user(&self, user_id: i64, group_names: Vec<String>) -> AppResult<()> {
        if self.fail_user_links.load(Ordering::SeqCst) {
            return Err(AppError::internal("link table unavailable"));
        }
        if group_names.is_empty() {
            return Ok(());
        }
        self.with(|t| {
            let group_ids: Vec<i64> = group_names.iter().filter_map(|g| t.group_id(g)).collect();
            t.links.retain(|(u, _)| *u != user_id);
            t.links.extend(group_ids.into_iter().map(|g| (user_id, g)));
        });
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryStore {
    fn users(&self) -> Arc<dyn UserRepository> {
        Arc::new(self.clone())
    }

    fn groups(&self) -> Arc<dyn GroupRepository> {
        Arc::new(self.clone())
    }

    fn memberships(&self) -> Arc<dyn MembershipRepository> {
        Arc::new(self.clone())
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        let snapshot = self.with(|t| t.clone());

        let outcome = f(TransactionContext::new(self, self)).await;

        if outcome.is_err() {
            self.with(|t| *t = snapshot);
        }
        outcome
    }
}

// =============================================================================
// Harness
// =============================================================================

fn app_with(store: MemoryStore, db: MockDatabase) -> Router {
    let uow = Arc::new(store);
    let state = AppState::new(
        Arc::new(UserManager::new(uow.clone())),
        Arc::new(GroupManager::new(uow)),
        Arc::new(Database::from_connection(db.into_connection())),
    );
    create_router(state, Duration::from_secs(5))
}

fn app(store: MemoryStore) -> Router {
    app_with(store, MockDatabase::new(DatabaseBackend::Postgres))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn user_body(userid: &str, groups: Value) -> Value {
    json!({
        "first_name": "Jane",
        "last_name": "Doe",
        "userid": userid,
        "groups": groups,
    })
}

async fn create_group(app: &Router, name: &str) {
    let (status, _) = send(app, Method::POST, "/groups", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_create_then_get_user_without_groups() {
    let app = app(MemoryStore::default());

    let (status, body) = send(&app, Method::POST, "/users", Some(user_body("jdoe", Value::Null))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "result": "user jdoe created" }));

    let (status, body) = send(&app, Method::GET, "/users/jdoe", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "first_name": "Jane", "last_name": "Doe", "userid": "jdoe", "groups": [] })
    );
}

#[tokio::test]
async fn test_user_created_into_existing_group_is_visible_from_both_sides() {
    let app = app(MemoryStore::default());
    create_group(&app, "admins").await;

    let (status, _) = send(&app, Method::POST, "/users", Some(user_body("jdoe", json!(["admins"])))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, user) = send(&app, Method::GET, "/users/jdoe", None).await;
    assert_eq!(user["groups"], json!(["admins"]));

    let (_, group) = send(&app, Method::GET, "/groups/admins", None).await;
    assert_eq!(group, json!({ "userids": ["jdoe"] }));
}

#[tokio::test]
async fn test_unknown_group_name_is_silently_dropped() {
    let app = app(MemoryStore::default());
    create_group(&app, "admins").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/users",
        Some(user_body("jdoe", json!(["admins", "nonexistent"]))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, user) = send(&app, Method::GET, "/users/jdoe", None).await;
    assert_eq!(user["groups"], json!(["admins"]));
}

#[tokio::test]
async fn test_duplicate_userid_is_bad_request() {
    let app = app(MemoryStore::default());

    send(&app, Method::POST, "/users", Some(user_body("jdoe", Value::Null))).await;
    let (status, body) = send(&app, Method::POST, "/users", Some(user_body("jdoe", Value::Null))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "user jdoe already exists" }));
}

#[tokio::test]
async fn test_missing_required_field_is_bad_request() {
    let app = app(MemoryStore::default());

    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({ "first_name": "Jane", "userid": "jdoe" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "last_name must be populated" }));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app(MemoryStore::default());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_absent_user_is_not_found() {
    let app = app(MemoryStore::default());

    let (status, body) = send(&app, Method::GET, "/users/ghost", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "user ghost not found" }));
}

#[tokio::test]
async fn test_update_targets_payload_userid_not_path() {
    let app = app(MemoryStore::default());
    send(&app, Method::POST, "/users", Some(user_body("jdoe", Value::Null))).await;

    let mut body = user_body("ghost", Value::Null);
    body["first_name"] = json!("Changed");
    let (status, _) = send(&app, Method::PUT, "/users/jdoe", Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, user) = send(&app, Method::GET, "/users/jdoe", None).await;
    assert_eq!(user["first_name"], "Jane");
}

#[tokio::test]
async fn test_update_replaces_names_and_groups() {
    let app = app(MemoryStore::default());
    create_group(&app, "admins").await;
    create_group(&app, "users").await;
    send(&app, Method::POST, "/users", Some(user_body("jdoe", json!(["admins"])))).await;

    let mut body = user_body("jdoe", json!(["users"]));
    body["last_name"] = json!("Smith");
    let (status, result) = send(&app, Method::PUT, "/users/jdoe", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result, json!({ "result": "user jdoe updated" }));

    let (_, user) = send(&app, Method::GET, "/users/jdoe", None).await;
    assert_eq!(user["last_name"], "Smith");
    assert_eq!(user["groups"], json!(["users"]));
}

#[tokio::test]
async fn test_update_with_null_groups_keeps_existing_links() {
    let app = app(MemoryStore::default());
    create_group(&app, "admins").await;
    send(&app, Method::POST, "/users", Some(user_body("jdoe", json!(["admins"])))).await;

    let (status, _) = send(&app, Method::PUT, "/users/jdoe", Some(user_body("jdoe", Value::Null))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, user) = send(&app, Method::GET, "/users/jdoe", None).await;
    assert_eq!(user["groups"], json!(["admins"]));
}

#[tokio::test]
async fn test_failed_link_step_rolls_back_user_insert() {
    let store = MemoryStore::default();
    let app = app(store.clone());
    create_group(&app, "admins").await;

    store.fail_user_links.store(true, Ordering::SeqCst);
    let (status, body) = send(&app, Method::POST, "/users", Some(user_body("jdoe", json!(["admins"])))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "An internal error occurred" }));

    store.fail_user_links.store(false, Ordering::SeqCst);
    let (status, _) = send(&app, Method::GET, "/users/jdoe", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_user_twice() {
    let app = app(MemoryStore::default());
    send(&app, Method::POST, "/users", Some(user_body("jdoe", Value::Null))).await;

    let (status, body) = send(&app, Method::DELETE, "/users/jdoe", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": "user jdoe deleted" }));

    let (status, _) = send(&app, Method::DELETE, "/users/jdoe", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_user_leaves_group_membership() {
    let app = app(MemoryStore::default());
    create_group(&app, "admins").await;
    send(&app, Method::POST, "/users", Some(user_body("jdoe", json!(["admins"])))).await;

    send(&app, Method::DELETE, "/users/jdoe", None).await;

    let (_, group) = send(&app, Method::GET, "/groups/admins", None).await;
    assert_eq!(group, json!({ "userids": [] }));
}

// =============================================================================
// Groups
// =============================================================================

#[tokio::test]
async fn test_new_group_is_empty() {
    let app = app(MemoryStore::default());

    let (status, body) = send(&app, Method::POST, "/groups", Some(json!({ "name": "admins" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "result": "group admins created" }));

    let (status, group) = send(&app, Method::GET, "/groups/admins", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(group, json!({ "userids": [] }));
}

#[tokio::test]
async fn test_group_validation_and_duplicates() {
    let app = app(MemoryStore::default());

    let (status, body) = send(&app, Method::POST, "/groups", Some(json!({ "name": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "name field must be populated" }));

    create_group(&app, "admins").await;
    let (status, body) = send(&app, Method::POST, "/groups", Some(json!({ "name": "admins" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "group admins already exists" }));
}

#[tokio::test]
async fn test_replace_group_membership_keeps_only_valid_new_members() {
    let app = app(MemoryStore::default());
    create_group(&app, "admins").await;
    for userid in ["alice", "bob", "carol"] {
        send(&app, Method::POST, "/users", Some(user_body(userid, Value::Null))).await;
    }
    send(
        &app,
        Method::PUT,
        "/groups/admins",
        Some(json!({ "userids": ["alice", "bob"] })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/groups/admins",
        Some(json!({ "userids": ["carol", "bob", "mallory"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": "group admins updated" }));

    let (_, group) = send(&app, Method::GET, "/groups/admins", None).await;
    assert_eq!(group, json!({ "userids": ["bob", "carol"] }));

    let (_, alice) = send(&app, Method::GET, "/users/alice", None).await;
    assert_eq!(alice["groups"], json!([]));
}

#[tokio::test]
async fn test_replace_membership_of_absent_group_is_not_found() {
    let app = app(MemoryStore::default());

    let (status, body) = send(&app, Method::PUT, "/groups/ghosts", Some(json!({ "userids": [] }))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "group ghosts not found" }));
}

#[tokio::test]
async fn test_delete_group_with_members_unlinks_them() {
    let app = app(MemoryStore::default());
    create_group(&app, "admins").await;
    send(&app, Method::POST, "/users", Some(user_body("jdoe", json!(["admins"])))).await;

    let (status, _) = send(&app, Method::DELETE, "/groups/admins", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, user) = send(&app, Method::GET, "/users/jdoe", None).await;
    assert_eq!(user["groups"], json!([]));

    let (status, _) = send(&app, Method::GET, "/groups/admins", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/groups/admins", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Service endpoints
// =============================================================================

#[tokio::test]
async fn test_root_endpoint() {
    let app = app(MemoryStore::default());

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Membership service");
}

#[tokio::test]
async fn test_health_reports_database_state() {
    let healthy = app_with(
        MemoryStore::default(),
        MockDatabase::new(DatabaseBackend::Postgres).append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }]),
    );
    let (status, body) = send(&healthy, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    // No exec result queued, so the ping fails.
    let degraded = app(MemoryStore::default());
    let (status, body) = send(&degraded, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = app(MemoryStore::default());

    let (status, doc) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/groups/{name}"].is_object());
}
