//! In-memory fake of the LoadTest REST service.
//!
//! Serves the authentication point and the project-scoped resources the SDK
//! talks to. Every request is recorded (method, path with query, cookie
//! header, body) so tests can assert on exactly what went over the wire.
//! DTOs here are defined independently from the SDK's entities; integration
//! tests catch schema drift between the two.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    body::Body,
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use uuid::Uuid;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";
pub const SESSION_COOKIE: &str = "LWSSO_COOKIE_KEY";
pub const NAMESPACE: &str = "http://www.hp.com/PC/REST/API";

const PROJECT: &str = "/LoadTest/rest/domains/{domain}/projects/{project}";
const DEFAULT_RESULT_DATA_LEN: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Wire DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "Exception")]
pub struct ErrorBody {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,
    #[serde(rename = "ExceptionMessage")]
    pub message: String,
    #[serde(rename = "ErrorCode")]
    pub code: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeslot {
    #[serde(rename = "Hours")]
    pub hours: u32,
    #[serde(rename = "Minutes")]
    pub minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartRun {
    #[serde(rename = "PostRunAction")]
    pub post_run_action: String,
    #[serde(rename = "TestID")]
    pub test_id: u32,
    #[serde(rename = "TestInstanceID")]
    pub test_instance_id: u32,
    #[serde(rename = "TimeslotDuration")]
    pub timeslot_duration: Timeslot,
    #[serde(rename = "VudsMode")]
    pub vuds_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "Run")]
pub struct Run {
    #[serde(rename = "TestID")]
    pub test_id: u32,
    #[serde(rename = "TestInstanceID")]
    pub test_instance_id: u32,
    #[serde(rename = "PostRunAction")]
    pub post_run_action: String,
    #[serde(rename = "TimeslotID")]
    pub timeslot_id: u32,
    #[serde(rename = "VudsMode")]
    pub vuds_mode: bool,
    #[serde(rename = "ID")]
    pub id: u32,
    #[serde(rename = "Duration")]
    pub duration: u32,
    #[serde(rename = "RunState")]
    pub run_state: String,
    #[serde(rename = "RunSLAStatus")]
    pub run_sla_status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostRunActions {
    #[serde(rename = "ReleaseTimeslot")]
    pub release_timeslot: bool,
    #[serde(rename = "PostRunAction")]
    pub post_run_action: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "TestInstance")]
pub struct TestInstance {
    #[serde(rename = "TestInstanceID", default)]
    pub id: u32,
    #[serde(rename = "TestID")]
    pub test_id: u32,
    #[serde(rename = "TestSetID")]
    pub test_set_id: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename = "TestInstances")]
struct TestInstanceList {
    #[serde(rename = "TestInstance")]
    instances: Vec<TestInstance>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename = "TestSet")]
pub struct TestSet {
    #[serde(rename = "TestSetName")]
    pub name: String,
    #[serde(rename = "TestSetID")]
    pub id: u32,
    #[serde(rename = "TestSetParentId")]
    pub parent_id: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename = "TestSets")]
struct TestSetList {
    #[serde(rename = "TestSet")]
    test_sets: Vec<TestSet>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename = "Test")]
pub struct Test {
    #[serde(rename = "ID")]
    pub id: u32,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "TestFolderPath")]
    pub folder_path: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename = "RunResult")]
struct RunResult {
    #[serde(rename = "ID")]
    id: u32,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Type")]
    result_type: String,
    #[serde(rename = "RunID")]
    run_id: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename = "RunResults")]
struct RunResultList {
    #[serde(rename = "RunResult")]
    results: Vec<RunResult>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename = "Record")]
struct EventRecord {
    #[serde(rename = "Type")]
    event_type: String,
    #[serde(rename = "ID")]
    id: u32,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Responsible")]
    responsible: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename = "EventLog")]
struct EventLog {
    #[serde(rename = "Record")]
    records: Vec<EventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "TrendedRun")]
pub struct TrendedRun {
    #[serde(rename = "RUN_ID")]
    pub run_id: u32,
    #[serde(rename = "STATE", default)]
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "TrendReport")]
pub struct TrendReport {
    #[serde(rename = "Project", default, skip_serializing)]
    pub project: String,
    #[serde(rename = "TrendedRun", default)]
    pub runs: Vec<TrendedRun>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename = "Transaction")]
struct Transaction {
    #[serde(rename = "@Name")]
    name: String,
    #[serde(rename = "@RunID")]
    run_id: u32,
    #[serde(rename = "@Type")]
    measurement_type: String,
    #[serde(rename = "@Minimum")]
    minimum: f64,
    #[serde(rename = "@Maximum")]
    maximum: f64,
    #[serde(rename = "@Average")]
    average: f64,
    #[serde(rename = "@Percentile90")]
    percentile_90: f64,
    #[serde(rename = "@Count")]
    count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename = "TrendReportTransactionData")]
struct TransactionData {
    #[serde(rename = "Transaction")]
    transactions: Vec<Transaction>,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// One request as received by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub cookie: Option<String>,
    pub body: String,
}

#[derive(Debug)]
struct Store {
    sessions: HashSet<String>,
    tests: HashMap<u32, Test>,
    test_sets: Vec<TestSet>,
    instances: Vec<TestInstance>,
    runs: HashMap<u32, Run>,
    trend_reports: HashMap<String, Vec<TrendedRun>>,
    next_run_id: u32,
    next_instance_id: u32,
    result_data_len: usize,
    requests: Vec<RecordedRequest>,
}

impl Store {
    fn seeded() -> Self {
        let tests = [
            Test {
                id: 5,
                name: "Checkout flow".to_string(),
                folder_path: "Subject\\Web".to_string(),
            },
            Test {
                id: 6,
                name: "Search".to_string(),
                folder_path: "Subject\\Web".to_string(),
            },
        ]
        .into_iter()
        .map(|test| (test.id, test))
        .collect();

        Self {
            sessions: HashSet::new(),
            tests,
            test_sets: vec![
                TestSet {
                    name: "Default".to_string(),
                    id: 1,
                    parent_id: 0,
                },
                TestSet {
                    name: "Nightly".to_string(),
                    id: 2,
                    parent_id: 0,
                },
            ],
            instances: vec![TestInstance {
                id: 10,
                test_id: 5,
                test_set_id: 1,
            }],
            runs: HashMap::new(),
            trend_reports: HashMap::from([(
                "1".to_string(),
                vec![TrendedRun {
                    run_id: 1,
                    state: "Trended".to_string(),
                }],
            )]),
            next_run_id: 100,
            next_instance_id: 11,
            result_data_len: DEFAULT_RESULT_DATA_LEN,
            requests: Vec::new(),
        }
    }
}

/// Shared handle to the server's state. Clones see the same store.
#[derive(Debug, Clone)]
pub struct MockState {
    store: Arc<Mutex<Store>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self::new()
    }
}

impl MockState {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::seeded())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Size of the body served for every result-data download.
    pub fn set_result_data_len(&self, len: usize) {
        self.lock().result_data_len = len;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|req| req.path.ends_with(path))
            .cloned()
            .collect()
    }

    pub fn run_state(&self, run_id: u32) -> Option<String> {
        self.lock().runs.get(&run_id).map(|run| run.run_state.clone())
    }

    pub fn trended_runs(&self, trend_report_id: &str) -> Option<Vec<TrendedRun>> {
        self.lock().trend_reports.get(trend_report_id).cloned()
    }

    pub fn active_sessions(&self) -> usize {
        self.lock().sessions.len()
    }

    fn record(&self, request: RecordedRequest) {
        self.lock().requests.push(request);
    }

    fn require_session(&self, headers: &HeaderMap) -> Result<(), Response> {
        let token = session_token(headers);
        match token {
            Some(token) if self.lock().sessions.contains(&token) => Ok(()),
            _ => Err(error_xml(StatusCode::UNAUTHORIZED, "Authentication required", 1001)),
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn app() -> Router {
    app_with_state(MockState::new())
}

pub fn app_with_state(state: MockState) -> Router {
    Router::new()
        .route("/LoadTest/rest/authentication-point/authenticate", get(authenticate))
        .route("/LoadTest/rest/authentication-point/logout", get(logout))
        .route(&format!("{PROJECT}/Runs"), post(start_run))
        .route(&format!("{PROJECT}/Runs/{{run_id}}"), get(get_run))
        .route(&format!("{PROJECT}/Runs/{{run_id}}/{{mode}}"), post(stop_run))
        .route(&format!("{PROJECT}/Runs/{{run_id}}/Results"), get(run_results))
        .route(
            &format!("{PROJECT}/Runs/{{run_id}}/Results/{{result_id}}/data"),
            get(result_data),
        )
        .route(&format!("{PROJECT}/Runs/{{run_id}}/EventLog"), get(event_log))
        .route(&format!("{PROJECT}/tests/{{test_id}}"), get(get_test))
        .route(&format!("{PROJECT}/testsets"), get(test_sets))
        .route(
            &format!("{PROJECT}/testinstances"),
            get(test_instances).post(create_test_instance),
        )
        .route(
            &format!("{PROJECT}/TrendReports/{{report_id}}"),
            get(trend_report_metadata).post(update_trend_report),
        )
        .route(
            &format!("{PROJECT}/TrendReports/{{report_id}}/{{item}}"),
            get(trend_report_item),
        )
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, MockState::new()).await
}

pub async fn serve(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

async fn record_request(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };
    state.record(RecordedRequest {
        method: parts.method.to_string(),
        path: parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default(),
        cookie: parts
            .headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    });
    tracing::debug!(method = %parts.method, uri = %parts.uri, "request");
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn xml<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match quick_xml::se::to_string(value) {
        Ok(body) => (status, [(header::CONTENT_TYPE, "application/xml")], body).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

pub fn error_xml(status: StatusCode, message: &str, code: u32) -> Response {
    xml(
        status,
        &ErrorBody {
            xmlns: NAMESPACE.to_string(),
            message: message.to_string(),
            code,
        },
    )
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, Response> {
    quick_xml::de::from_str(body)
        .map_err(|err| error_xml(StatusCode::BAD_REQUEST, &format!("Malformed request: {err}"), 1000))
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(BASE64.decode(encoded).ok()?).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn authenticate(State(state): State<MockState>, headers: HeaderMap) -> Response {
    let Some((user, password)) = basic_credentials(&headers) else {
        return (StatusCode::UNAUTHORIZED, "missing credentials").into_response();
    };
    if user != USERNAME || password != PASSWORD {
        return error_xml(StatusCode::UNAUTHORIZED, "Invalid username or password", 1002);
    }
    let token = Uuid::new_v4().to_string();
    state.lock().sessions.insert(token.clone());
    (
        StatusCode::OK,
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}={token}; Path=/"))],
        (),
    )
        .into_response()
}

async fn logout(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.lock().sessions.remove(&token);
    }
    StatusCode::OK.into_response()
}

async fn start_run(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, Response> {
    state.require_session(&headers)?;
    let request: StartRun = parse_body(&body)?;
    let mut store = state.lock();
    let instance_matches = store
        .instances
        .iter()
        .any(|i| i.id == request.test_instance_id && i.test_id == request.test_id);
    if !instance_matches {
        return Err(error_xml(StatusCode::BAD_REQUEST, "Test instance not found", 1100));
    }
    let id = store.next_run_id;
    store.next_run_id += 1;
    let timeslot_id = 1000 + id;
    let run = Run {
        test_id: request.test_id,
        test_instance_id: request.test_instance_id,
        post_run_action: request.post_run_action,
        timeslot_id,
        vuds_mode: request.vuds_mode,
        id,
        duration: request
            .timeslot_duration
            .hours
            .saturating_mul(60)
            .saturating_add(request.timeslot_duration.minutes),
        run_state: "Initializing".to_string(),
        run_sla_status: "Not Completed".to_string(),
    };
    store.runs.insert(id, run.clone());
    Ok(xml(StatusCode::CREATED, &run))
}

fn run_not_found(run_id: u32) -> Response {
    error_xml(StatusCode::NOT_FOUND, &format!("Run {run_id} does not exist"), 2001)
}

async fn get_run(
    State(state): State<MockState>,
    Path((_, _, run_id)): Path<(String, String, u32)>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    state.require_session(&headers)?;
    let store = state.lock();
    let run = store.runs.get(&run_id).ok_or_else(|| run_not_found(run_id))?;
    Ok(xml(StatusCode::OK, run))
}

async fn stop_run(
    State(state): State<MockState>,
    Path((_, _, run_id, mode)): Path<(String, String, u32, String)>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, Response> {
    state.require_session(&headers)?;
    let new_state = match mode.as_str() {
        "stop" => "Stopping",
        "stopNow" => "Aborted",
        _ => return Err(StatusCode::NOT_FOUND.into_response()),
    };
    let actions: PostRunActions = parse_body(&body)?;
    let mut store = state.lock();
    let run = store.runs.get_mut(&run_id).ok_or_else(|| run_not_found(run_id))?;
    run.run_state = new_state.to_string();
    run.post_run_action = actions.post_run_action;
    tracing::debug!(run_id, release_timeslot = actions.release_timeslot, "run stopped");
    Ok(StatusCode::OK.into_response())
}

async fn run_results(
    State(state): State<MockState>,
    Path((_, _, run_id)): Path<(String, String, u32)>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    state.require_session(&headers)?;
    if !state.lock().runs.contains_key(&run_id) {
        return Err(run_not_found(run_id));
    }
    let results = RunResultList {
        results: vec![
            RunResult {
                id: 1,
                name: "Reports.zip".to_string(),
                result_type: "HTML REPORT".to_string(),
                run_id,
            },
            RunResult {
                id: 2,
                name: "RawResults.zip".to_string(),
                result_type: "RAW RESULTS".to_string(),
                run_id,
            },
        ],
    };
    Ok(xml(StatusCode::OK, &results))
}

async fn result_data(
    State(state): State<MockState>,
    Path((_, _, run_id, result_id)): Path<(String, String, u32, u32)>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    state.require_session(&headers)?;
    let store = state.lock();
    if !store.runs.contains_key(&run_id) {
        return Err(run_not_found(run_id));
    }
    if result_id != 1 && result_id != 2 {
        return Err(error_xml(StatusCode::NOT_FOUND, "Result does not exist", 2002));
    }
    let data: Vec<u8> = (0..store.result_data_len).map(|i| (i % 251) as u8).collect();
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        data,
    )
        .into_response())
}

async fn event_log(
    State(state): State<MockState>,
    Path((_, _, run_id)): Path<(String, String, u32)>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    state.require_session(&headers)?;
    if !state.lock().runs.contains_key(&run_id) {
        return Err(run_not_found(run_id));
    }
    let log = EventLog {
        records: vec![
            EventRecord {
                event_type: "Info".to_string(),
                id: 1,
                time: "2026-01-01 10:00:00".to_string(),
                name: "Run initialized".to_string(),
                description: format!("Run {run_id} initialized"),
                responsible: USERNAME.to_string(),
            },
            EventRecord {
                event_type: "Info".to_string(),
                id: 2,
                time: "2026-01-01 10:01:00".to_string(),
                name: "Run started".to_string(),
                description: format!("Run {run_id} started"),
                responsible: USERNAME.to_string(),
            },
        ],
    };
    Ok(xml(StatusCode::OK, &log))
}

async fn get_test(
    State(state): State<MockState>,
    Path((_, _, test_id)): Path<(String, String, u32)>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    state.require_session(&headers)?;
    let store = state.lock();
    let test = store.tests.get(&test_id).ok_or_else(|| {
        error_xml(StatusCode::NOT_FOUND, &format!("Test {test_id} does not exist"), 1101)
    })?;
    Ok(xml(StatusCode::OK, test))
}

async fn test_sets(State(state): State<MockState>, headers: HeaderMap) -> Result<Response, Response> {
    state.require_session(&headers)?;
    let list = TestSetList {
        test_sets: state.lock().test_sets.clone(),
    };
    Ok(xml(StatusCode::OK, &list))
}

/// Accepts the `query={test-id[<id>]}` filter; without it every instance is listed.
async fn test_instances(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    state.require_session(&headers)?;
    let filter = match params.get("query") {
        Some(query) => {
            let id = query
                .strip_prefix("{test-id[")
                .and_then(|rest| rest.strip_suffix("]}"))
                .and_then(|id| id.parse::<u32>().ok())
                .ok_or_else(|| error_xml(StatusCode::BAD_REQUEST, "Malformed query", 1000))?;
            Some(id)
        }
        None => None,
    };
    let instances = state
        .lock()
        .instances
        .iter()
        .filter(|i| filter.map_or(true, |id| i.test_id == id))
        .cloned()
        .collect();
    Ok(xml(StatusCode::OK, &TestInstanceList { instances }))
}

async fn create_test_instance(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, Response> {
    state.require_session(&headers)?;
    let request: TestInstance = parse_body(&body)?;
    let mut store = state.lock();
    if !store.tests.contains_key(&request.test_id) {
        return Err(error_xml(StatusCode::NOT_FOUND, "Test does not exist", 1101));
    }
    if !store.test_sets.iter().any(|set| set.id == request.test_set_id) {
        return Err(error_xml(StatusCode::NOT_FOUND, "Test set does not exist", 1102));
    }
    let instance = TestInstance {
        id: store.next_instance_id,
        test_id: request.test_id,
        test_set_id: request.test_set_id,
    };
    store.next_instance_id += 1;
    store.instances.push(instance.clone());
    Ok(xml(StatusCode::CREATED, &instance))
}

/// Unknown reports answer with a plain-text body rather than an error document.
async fn trend_report_metadata(
    State(state): State<MockState>,
    Path((_, _, report_id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    state.require_session(&headers)?;
    let store = state.lock();
    let runs = store
        .trend_reports
        .get(&report_id)
        .cloned()
        .ok_or_else(|| (StatusCode::NOT_FOUND, "no such trend report").into_response())?;
    Ok(xml(
        StatusCode::OK,
        &TrendReport {
            project: String::new(),
            runs,
        },
    ))
}

async fn update_trend_report(
    State(state): State<MockState>,
    Path((_, project, report_id)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, Response> {
    state.require_session(&headers)?;
    let update: TrendReport = parse_body(&body)?;
    if update.project != project {
        return Err(error_xml(StatusCode::BAD_REQUEST, "Project mismatch", 3002));
    }
    let mut store = state.lock();
    let runs = store.trend_reports.get_mut(&report_id).ok_or_else(|| {
        error_xml(StatusCode::NOT_FOUND, "Trend report does not exist", 3001)
    })?;
    runs.extend(update.runs.into_iter().map(|run| TrendedRun {
        run_id: run.run_id,
        state: "Pending".to_string(),
    }));
    Ok(StatusCode::OK.into_response())
}

/// `TrendReports/{id}/data` serves the rendered document, `TrendReports/{id}/{runId}`
/// the transaction data for one run.
async fn trend_report_item(
    State(state): State<MockState>,
    Path((_, _, report_id, item)): Path<(String, String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    state.require_session(&headers)?;
    if !state.lock().trend_reports.contains_key(&report_id) {
        return Err(error_xml(StatusCode::NOT_FOUND, "Trend report does not exist", 3001));
    }
    if item == "data" {
        let document = format!("%PDF-1.4\n% trend report {report_id}\n%%EOF\n");
        return Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/pdf")],
            document,
        )
            .into_response());
    }
    let run_id: u32 = item
        .parse()
        .map_err(|_| error_xml(StatusCode::BAD_REQUEST, "Invalid run id", 1000))?;
    let data = TransactionData {
        transactions: vec![
            Transaction {
                name: "login".to_string(),
                run_id,
                measurement_type: "TRT".to_string(),
                minimum: 0.5,
                maximum: 3.0,
                average: 1.25,
                percentile_90: 2.5,
                count: 120,
            },
            Transaction {
                name: "checkout".to_string(),
                run_id,
                measurement_type: "TRT".to_string(),
                minimum: 1.0,
                maximum: 6.0,
                average: 2.75,
                percentile_90: 5.0,
                count: 80,
            },
        ],
    };
    Ok(xml(StatusCode::OK, &data))
}
