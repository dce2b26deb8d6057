//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! In-process stand-in for the FileMaker Data API, used by the integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Multipart, Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::Mutex};

pub const DATABASE: &str = "Contacts";
pub const LAYOUT: &str = "People";
pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";
pub const PREEXISTING_TOKEN: &str = "token-preexisting";

#[derive(Clone, Debug)]
pub struct LoggedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl LoggedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Clone, Debug)]
pub struct StoredRecord {
    pub field_data: Map<String, Value>,
    pub mod_id: u64,
}

#[derive(Clone, Debug)]
pub struct Upload {
    pub record_id: u64,
    pub field: String,
    pub filename: String,
    pub data: Vec<u8>,
}

#[derive(Default, Debug)]
pub struct MockState {
    pub requests: Vec<LoggedRequest>,
    pub tokens: HashSet<String>,
    pub records: BTreeMap<u64, StoredRecord>,
    pub uploads: Vec<Upload>,
    next_token: u64,
    next_id: u64,
}

pub type Shared = Arc<Mutex<MockState>>;

pub struct MockServer {
    pub base: String,
    pub state: Shared,
}

impl MockServer {
    pub async fn request_count(&self) -> usize {
        self.state.lock().await.requests.len()
    }

    pub async fn requests(&self) -> Vec<LoggedRequest> {
        self.state.lock().await.requests.clone()
    }

    pub async fn last_request(&self) -> LoggedRequest {
        let st = self.state.lock().await;
        st.requests.last().cloned().expect("no request recorded")
    }

    pub fn path(&self, rest: &str) -> String {
        format!("/fmi/data/v1/databases/{}{}", DATABASE, rest)
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_ansi(false)
        .compact()
        .try_init();
}

fn seed() -> MockState {
    let mut st = MockState {
        next_token: 1,
        next_id: 100,
        ..Default::default()
    };
    st.tokens.insert(PREEXISTING_TOKEN.to_string());
    let rows = [
        (
            1,
            json!({"Name": "Ann", "City": "Boston", "Age": 31, "VIP": "1",
                   "Created": "03/15/2024 09:30:00", "Status": "Active", "Photo": ""}),
        ),
        (
            2,
            json!({"Name": "Bob", "City": "Boston", "Age": 45, "VIP": "",
                   "Created": "2023-11-02", "Status": "Inactive", "Photo": ""}),
        ),
        (
            3,
            json!({"Name": "Cara", "City": "Denver", "Age": 28, "VIP": 0,
                   "Created": "not a date", "Status": "Active", "Photo": ""}),
        ),
    ];
    for (id, v) in rows {
        if let Value::Object(field_data) = v {
            st.records.insert(id, StoredRecord { field_data, mod_id: 1 });
        }
    }
    st
}

pub async fn start() -> MockServer {
    init_tracing();
    let state: Shared = Arc::new(Mutex::new(seed()));
    let app = Router::new()
        .route("/fmi/data/v1/databases/{db}/sessions", post(login))
        .route("/fmi/data/v1/databases/{db}/sessions/{token}", delete(logout))
        .route("/fmi/data/v1/databases/{db}/layouts/{layout}/_find", post(find))
        .route(
            "/fmi/data/v1/databases/{db}/layouts/{layout}/records",
            post(create_record),
        )
        .route(
            "/fmi/data/v1/databases/{db}/layouts/{layout}/records/{id}",
            get(get_record).patch(edit_record).delete(delete_record),
        )
        .route(
            "/fmi/data/v1/databases/{db}/layouts/{layout}/records/{id}/containers/{field}",
            post(upload),
        )
        .layer(from_fn_with_state(state.clone(), record_request))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    MockServer {
        base: format!("http://{}", addr),
        state,
    }
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

async fn record_request(State(st): State<Shared>, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();
    st.lock().await.requests.push(LoggedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        authorization: header_string(&parts.headers, header::AUTHORIZATION),
        user_agent: header_string(&parts.headers, header::USER_AGENT),
        content_type: header_string(&parts.headers, header::CONTENT_TYPE),
        body: bytes.to_vec(),
    });
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

type Reply = (StatusCode, Json<Value>);

fn envelope(status: StatusCode, code: &str, message: &str, response: Value) -> Reply {
    (
        status,
        Json(json!({
            "response": response,
            "messages": [{"code": code, "message": message}]
        })),
    )
}

fn ok(response: Value) -> Reply {
    envelope(StatusCode::OK, "0", "OK", response)
}

fn invalid_token() -> Reply {
    envelope(
        StatusCode::UNAUTHORIZED,
        "952",
        "Invalid FileMaker Data API token (*)",
        json!({}),
    )
}

fn record_missing() -> Reply {
    envelope(
        StatusCode::INTERNAL_SERVER_ERROR,
        "101",
        "Record is missing",
        json!({}),
    )
}

fn authorized(st: &MockState, headers: &HeaderMap) -> bool {
    match header_string(headers, header::AUTHORIZATION) {
        Some(a) => match a.strip_prefix("Bearer ") {
            Some(t) => st.tokens.contains(t),
            None => false,
        },
        None => false,
    }
}

fn row(id: u64, r: &StoredRecord) -> Value {
    json!({
        "fieldData": r.field_data,
        "portalData": {},
        "recordId": id.to_string(),
        "modId": r.mod_id.to_string(),
    })
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches(field_data: &Map<String, Value>, criteria: &Map<String, Value>) -> bool {
    criteria
        .iter()
        .filter(|(k, _)| k.as_str() != "omit")
        .all(|(k, v)| {
            let want = value_text(v);
            let want = want.strip_prefix("==").unwrap_or(&want).to_string();
            field_data.get(k).map(value_text) == Some(want)
        })
}

async fn login(State(st): State<Shared>, headers: HeaderMap) -> Reply {
    use base64::prelude::{Engine as _, BASE64_STANDARD};
    let expected = format!(
        "Basic {}",
        BASE64_STANDARD.encode(format!("{}:{}", USERNAME, PASSWORD))
    );
    if header_string(&headers, header::AUTHORIZATION) != Some(expected) {
        return envelope(
            StatusCode::UNAUTHORIZED,
            "212",
            "Invalid user account and/or password; please try again",
            json!({}),
        );
    }
    let mut st = st.lock().await;
    let token = format!("token-{}", st.next_token);
    st.next_token += 1;
    st.tokens.insert(token.clone());
    ok(json!({ "token": token }))
}

async fn logout(State(st): State<Shared>, Path((_db, token)): Path<(String, String)>) -> Reply {
    let mut st = st.lock().await;
    if !st.tokens.remove(&token) {
        return invalid_token();
    }
    ok(json!({}))
}

async fn find(
    State(st): State<Shared>,
    Path((db, layout)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let st = st.lock().await;
    if !authorized(&st, &headers) {
        return invalid_token();
    }
    let mut found: Vec<u64> = Vec::new();
    if let Some(query) = body["query"].as_array() {
        for req in query {
            let criteria = match req.as_object() {
                Some(c) => c,
                None => continue,
            };
            let omit = criteria.get("omit").map(value_text).as_deref() == Some("true");
            for (id, r) in &st.records {
                if !matches(&r.field_data, criteria) {
                    continue;
                }
                if omit {
                    found.retain(|f| f != id);
                } else if !found.contains(id) {
                    found.push(*id);
                }
            }
        }
    }
    if found.is_empty() {
        return envelope(
            StatusCode::INTERNAL_SERVER_ERROR,
            "401",
            "No records match the request",
            json!({}),
        );
    }
    let found_count = found.len();
    let offset = body["offset"].as_u64().unwrap_or(1).max(1) as usize;
    let limit = body["limit"].as_u64().map(|l| l as usize).unwrap_or(100);
    let data: Vec<Value> = found
        .iter()
        .skip(offset - 1)
        .take(limit)
        .filter_map(|id| st.records.get(id).map(|r| row(*id, r)))
        .collect();
    ok(json!({
        "dataInfo": {
            "database": db,
            "layout": layout,
            "table": layout,
            "totalRecordCount": st.records.len(),
            "foundCount": found_count,
            "returnedCount": data.len(),
        },
        "data": data,
    }))
}

async fn get_record(
    State(st): State<Shared>,
    Path((db, layout, id)): Path<(String, String, u64)>,
    headers: HeaderMap,
) -> Reply {
    let st = st.lock().await;
    if !authorized(&st, &headers) {
        return invalid_token();
    }
    match st.records.get(&id) {
        Some(r) => ok(json!({
            "dataInfo": {
                "database": db,
                "layout": layout,
                "table": layout,
                "totalRecordCount": st.records.len(),
                "foundCount": 1,
                "returnedCount": 1,
            },
            "data": [row(id, r)],
        })),
        None => record_missing(),
    }
}

async fn create_record(
    State(st): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut st = st.lock().await;
    if !authorized(&st, &headers) {
        return invalid_token();
    }
    let id = st.next_id;
    st.next_id += 1;
    // auto-entered values
    let mut field_data = Map::new();
    field_data.insert("Serial".to_string(), json!(id));
    field_data.insert("CreatedBy".to_string(), json!(USERNAME));
    if let Some(given) = body["fieldData"].as_object() {
        for (k, v) in given {
            field_data.insert(k.clone(), v.clone());
        }
    }
    st.records.insert(id, StoredRecord { field_data, mod_id: 0 });
    ok(json!({ "recordId": id.to_string(), "modId": "0" }))
}

async fn edit_record(
    State(st): State<Shared>,
    Path((_db, _layout, id)): Path<(String, String, u64)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut st = st.lock().await;
    if !authorized(&st, &headers) {
        return invalid_token();
    }
    let r = match st.records.get_mut(&id) {
        Some(r) => r,
        None => return record_missing(),
    };
    if let Some(given) = body["fieldData"].as_object() {
        for (k, v) in given {
            r.field_data.insert(k.clone(), v.clone());
        }
    }
    r.mod_id += 1;
    ok(json!({ "modId": r.mod_id.to_string() }))
}

async fn delete_record(
    State(st): State<Shared>,
    Path((_db, _layout, id)): Path<(String, String, u64)>,
    headers: HeaderMap,
) -> Reply {
    let mut st = st.lock().await;
    if !authorized(&st, &headers) {
        return invalid_token();
    }
    match st.records.remove(&id) {
        Some(_) => ok(json!({})),
        None => record_missing(),
    }
}

async fn upload(
    State(st): State<Shared>,
    Path((_db, _layout, id, field)): Path<(String, String, u64, String)>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Reply {
    let mut parts: Vec<(String, String, Vec<u8>)> = Vec::new();
    while let Ok(Some(part)) = multipart.next_field().await {
        let name = part.name().unwrap_or_default().to_string();
        let filename = part.file_name().unwrap_or_default().to_string();
        let data = part.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        parts.push((name, filename, data));
    }
    let mut st = st.lock().await;
    if !authorized(&st, &headers) {
        return invalid_token();
    }
    let (_, filename, data) = match parts.into_iter().find(|(n, _, _)| n == "upload") {
        Some(p) => p,
        None => {
            return envelope(
                StatusCode::BAD_REQUEST,
                "1708",
                "Parameter value is invalid",
                json!({}),
            )
        }
    };
    let r = match st.records.get_mut(&id) {
        Some(r) => r,
        None => return record_missing(),
    };
    r.mod_id += 1;
    r.field_data.insert(
        field.clone(),
        json!(format!("https://fms.example.com/Streaming/{}", filename)),
    );
    let mod_id = r.mod_id;
    st.uploads.push(Upload {
        record_id: id,
        field,
        filename,
        data,
    });
    ok(json!({ "modId": mod_id.to_string() }))
}
