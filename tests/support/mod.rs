//! In-process mock of the commissions backend, bound to an ephemeral localhost port.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use commission_desk::api::ApiClient;
use commission_desk::config::ClientConfig;
use commission_desk::identity::SessionStore;

pub const ADMIN_EMAIL: &str = "admin@example.de";
pub const MANAGER_EMAIL: &str = "mia@example.de";
pub const PASSWORD: &str = "secret";

/// One request as the backend saw it.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: &'static str,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct MockState {
    tokens: Mutex<HashMap<String, Value>>,
    pub hits: Mutex<Vec<Hit>>,
    pub genealogy: Mutex<Vec<Value>>,
    pub last_body: Mutex<Option<Value>>,
    pub upload_body: Mutex<Option<Vec<u8>>>,
    /// Response delay per route path, milliseconds.
    delays: Mutex<HashMap<String, u64>>,
    next_id: AtomicUsize,
}

type Shared = Arc<MockState>;

pub fn admin_user() -> Value {
    json!({"id": "u1", "email": ADMIN_EMAIL, "firstName": "Ada", "lastName": "Admin", "role": "admin"})
}

pub fn manager_user() -> Value {
    json!({
        "id": "u2", "email": MANAGER_EMAIL, "firstName": "Mia", "lastName": "Live", "role": "manager",
        "manager": {"id": "m2", "name": "Mia Live", "type": "live"}
    })
}

pub fn earnings_record(id: &str, name: &str, kind: &str, period: &str, total: f64) -> Value {
    json!({
        "managerId": id,
        "managerName": name,
        "managerType": kind,
        "period": period,
        "baseCommission": total,
        "milestoneEarnings": {"halfMilestone": 0.0, "milestone1": 0.0, "milestone2": 0.0, "retention": 0.0, "total": 0.0},
        "graduationBonus": 0.0,
        "diamondBonus": 0.0,
        "recruitmentBonus": 0.0,
        "downlineEarnings": 0.0,
        "totalEarnings": total,
        "creatorCount": 3,
        "totalRevenue": total * 10.0
    })
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"statusCode": status.as_u16(), "message": message}))).into_response()
}

impl MockState {
    fn record(&self, method: &'static str, path: &str, headers: &HeaderMap) {
        let authorization = headers.get("authorization").and_then(|v| v.to_str().ok()).map(str::to_string);
        self.hits.lock().push(Hit { method, path: path.to_string(), authorization });
    }

    fn authorize(&self, method: &'static str, path: &str, headers: &HeaderMap) -> Result<Value, Response> {
        self.record(method, path, headers);
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);
        match token.and_then(|t| self.tokens.lock().get(&t).cloned()) {
            Some(user) => Ok(user),
            None => Err(error(StatusCode::UNAUTHORIZED, "Unauthorized")),
        }
    }

    fn authorize_admin(&self, method: &'static str, path: &str, headers: &HeaderMap) -> Result<Value, Response> {
        let user = self.authorize(method, path, headers)?;
        if user["role"] != "admin" {
            return Err(error(StatusCode::FORBIDDEN, "Forbidden resource"));
        }
        Ok(user)
    }

    fn issue(&self, user: Value) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let token = format!("{}-token-{}", user["role"].as_str().unwrap_or("user"), n);
        self.tokens.lock().insert(token.clone(), user);
        token
    }

    /// Grant a token directly, as if issued in an earlier run.
    pub fn grant(&self, token: &str, user: Value) {
        self.tokens.lock().insert(token.to_string(), user);
    }

    /// Server-side expiry of every token.
    pub fn revoke_all(&self) {
        self.tokens.lock().clear();
    }

    /// Hold responses on `path` for `ms` before answering.
    pub fn delay(&self, path: &str, ms: u64) {
        self.delays.lock().insert(path.to_string(), ms);
    }

    async fn pause(&self, path: &str) {
        let ms = self.delays.lock().get(path).copied().unwrap_or(0);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    pub fn hits_for(&self, path: &str) -> Vec<Hit> {
        self.hits.lock().iter().filter(|h| h.path == path).cloned().collect()
    }

    pub fn last_hit(&self) -> Option<Hit> {
        self.hits.lock().last().cloned()
    }
}

async fn login(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    s.record("POST", "/auth/login", &headers);
    let user = match (body["email"].as_str(), body["password"].as_str()) {
        (Some(ADMIN_EMAIL), Some(PASSWORD)) => admin_user(),
        (Some(MANAGER_EMAIL), Some(PASSWORD)) => manager_user(),
        _ => return error(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    };
    let token = s.issue(user.clone());
    Json(json!({"access_token": token, "user": user})).into_response()
}

async fn register(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    s.record("POST", "/auth/register", &headers);
    if body["email"] == ADMIN_EMAIL || body["email"] == MANAGER_EMAIL {
        return error(StatusCode::CONFLICT, "Email already registered");
    }
    let user = json!({
        "id": "u9", "email": body["email"], "firstName": body["firstName"], "lastName": body["lastName"], "role": "manager"
    });
    let token = s.issue(user.clone());
    (StatusCode::CREATED, Json(json!({"access_token": token, "user": user}))).into_response()
}

async fn me(State(s): State<Shared>, headers: HeaderMap) -> Response {
    s.pause("/auth/me").await;
    match s.authorize("GET", "/auth/me", &headers) {
        Ok(user) => Json(user).into_response(),
        Err(r) => r,
    }
}

async fn refresh(State(s): State<Shared>, headers: HeaderMap) -> Response {
    match s.authorize("POST", "/auth/refresh", &headers) {
        Ok(user) => {
            s.pause("/auth/refresh").await;
            let token = s.issue(user.clone());
            (StatusCode::CREATED, Json(json!({"access_token": token, "user": user}))).into_response()
        }
        Err(r) => r,
    }
}

async fn all_earnings(State(s): State<Shared>, headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> Response {
    if let Err(r) = s.authorize_admin("GET", "/managers/earnings", &headers) {
        return r;
    }
    s.pause("/managers/earnings").await;
    match q.get("month").map(String::as_str) {
        Some("202609") => Json(json!([
            earnings_record("m1", "Tom Team", "team", "202609", 80.5),
            earnings_record("m2", "Lia Live", "live", "202609", 120.0)
        ]))
        .into_response(),
        Some(m) if m.len() == 6 => Json(json!([])).into_response(),
        _ => error(StatusCode::BAD_REQUEST, "month must be YYYYMM"),
    }
}

async fn manager_earnings(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let user = match s.authorize("GET", &format!("/managers/{}/earnings", id), &headers) {
        Ok(u) => u,
        Err(r) => return r,
    };
    if user["role"] != "admin" && user["manager"]["id"] != id.as_str() {
        return error(StatusCode::FORBIDDEN, "Forbidden resource");
    }
    let month = q.get("month").cloned().unwrap_or_default();
    let total = if month == "202609" { 42.5 } else { 0.0 };
    Json(earnings_record(&id, "Mia Live", "live", &month, total)).into_response()
}

async fn recruitment_bonus(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(r) = s.authorize_admin("POST", "/managers/recruitment-bonus", &headers) {
        return r;
    }
    let amount = if body["managerType"] == "team" { 60 } else { 50 };
    *s.last_body.lock() = Some(body);
    (StatusCode::CREATED, Json(json!({"id": "rb1", "amount": amount}))).into_response()
}

async fn commission_rates(State(s): State<Shared>, headers: HeaderMap) -> Response {
    match s.authorize_admin("GET", "/managers/commission-rates", &headers) {
        Ok(_) => Json(json!({"live": {"base": 0.3}, "team": {"A": 10, "B": 7.5, "C": 5}})).into_response(),
        Err(r) => r,
    }
}

async fn payouts(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(r) = s.authorize("POST", "/payouts", &headers) {
        return r;
    }
    *s.last_body.lock() = Some(body.clone());
    (
        StatusCode::CREATED,
        Json(json!({
            "id": "p1", "managerId": body["managerId"], "period": body["period"], "amount": body["amount"],
            "status": "pending", "requestedAt": "2026-10-18T09:00:00Z"
        })),
    )
        .into_response()
}

fn batch(id: &str) -> Value {
    json!({
        "id": id, "dataMonth": "202609", "fileName": "x.xlsx", "originalFileName": "september.xlsx", "uploadedBy": "u1",
        "totalRows": 10, "processedRows": 9, "skippedRows": 1, "warnings": ["row 7: unknown creator"],
        "newCreatorsCount": 2, "newManagersCount": 0, "transactionsCreated": 9, "bonusesCreated": 1,
        "createdAt": "2026-10-02T08:00:00Z"
    })
}

async fn upload_excel(State(s): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    if let Err(r) = s.authorize_admin("POST", "/uploads/excel", &headers) {
        return r;
    }
    let text = String::from_utf8_lossy(&body).to_string();
    *s.upload_body.lock() = Some(body.to_vec());
    if !text.contains("name=\"file\"") {
        return error(StatusCode::BAD_REQUEST, "No file uploaded");
    }
    Json(json!({
        "success": true, "message": "Upload processed", "processedRows": 9, "newCreatorsCount": 2,
        "newManagersCount": 0, "transactionsCreated": 9, "warnings": ["row 7: unknown creator"]
    }))
    .into_response()
}

async fn batches(State(s): State<Shared>, headers: HeaderMap) -> Response {
    match s.authorize_admin("GET", "/uploads/batches", &headers) {
        Ok(_) => Json(json!([batch("b2"), batch("b1")])).into_response(),
        Err(r) => r,
    }
}

async fn batch_by_id(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(r) = s.authorize_admin("GET", &format!("/uploads/batches/{}", id), &headers) {
        return r;
    }
    if id == "b1" || id == "b2" { Json(batch(&id)).into_response() } else { error(StatusCode::NOT_FOUND, "Upload batch not found") }
}

fn node(id: &str, body: &Value) -> Value {
    json!({
        "id": id,
        "manager": {"id": body["managerId"], "name": format!("Manager {}", body["managerId"].as_str().unwrap_or("?")), "type": "live"},
        "parentManager": {"id": body["parentManagerId"], "name": "Tom Team", "type": "team"},
        "level": body["level"],
        "commissionRate": body["commissionRate"],
        "createdAt": "2026-10-18T09:00:00Z"
    })
}

async fn genealogy_list(State(s): State<Shared>, headers: HeaderMap) -> Response {
    match s.authorize_admin("GET", "/genealogy", &headers) {
        Ok(_) => Json(Value::Array(s.genealogy.lock().clone())).into_response(),
        Err(r) => r,
    }
}

async fn genealogy_create(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(r) = s.authorize_admin("POST", "/genealogy", &headers) {
        return r;
    }
    s.pause("/genealogy").await;
    let id = format!("g{}", s.next_id.fetch_add(1, Ordering::SeqCst));
    let n = node(&id, &body);
    s.genealogy.lock().push(n.clone());
    (StatusCode::CREATED, Json(n)).into_response()
}

async fn genealogy_update(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    if let Err(r) = s.authorize_admin("PUT", &format!("/genealogy/{}", id), &headers) {
        return r;
    }
    let mut all = s.genealogy.lock();
    match all.iter_mut().find(|n| n["id"] == id.as_str()) {
        Some(slot) => {
            *slot = node(&id, &body);
            Json(slot.clone()).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Genealogy assignment not found"),
    }
}

async fn genealogy_delete(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(r) = s.authorize_admin("DELETE", &format!("/genealogy/{}", id), &headers) {
        return r;
    }
    let mut all = s.genealogy.lock();
    let before = all.len();
    all.retain(|n| n["id"] != id.as_str());
    if all.len() == before { error(StatusCode::NOT_FOUND, "Genealogy assignment not found") } else { StatusCode::OK.into_response() }
}

async fn team_downline(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    match s.authorize_admin("GET", &format!("/genealogy/team/{}", id), &headers) {
        Ok(_) => Json(json!({"teamManagerId": id, "downline": s.genealogy.lock().clone()})).into_response(),
        Err(r) => r,
    }
}

pub struct MockBackend {
    pub base: String,
    pub state: Shared,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(MockState::default());
        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/me", get(me))
            .route("/auth/refresh", post(refresh))
            .route("/managers/earnings", get(all_earnings))
            .route("/managers/commission-rates", get(commission_rates))
            .route("/managers/recruitment-bonus", post(recruitment_bonus))
            .route("/managers/{id}/earnings", get(manager_earnings))
            .route("/payouts", post(payouts))
            .route("/uploads/excel", post(upload_excel))
            .route("/uploads/batches", get(batches))
            .route("/uploads/batches/{id}", get(batch_by_id))
            .route("/genealogy", get(genealogy_list).post(genealogy_create))
            .route("/genealogy/team/{id}", get(team_downline))
            .route("/genealogy/{id}", put(genealogy_update).delete(genealogy_delete))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind 127.0.0.1:0");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { base: format!("http://{}", addr), state }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base).expect("mock base url")
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.config()).expect("api client")
    }

    pub fn store(&self) -> SessionStore {
        SessionStore::new(self.client())
    }
}

/// Fresh backend plus a store already logged in as admin.
pub async fn admin_session() -> (MockBackend, SessionStore) {
    let backend = MockBackend::start().await;
    let store = backend.store();
    store.check_session().await;
    store.login(ADMIN_EMAIL, PASSWORD).await.expect("admin login");
    (backend, store)
}
