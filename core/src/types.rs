//! XML entities exchanged with the LoadTest REST API.
//!
//! # Design
//! Request entities carry the API namespace as an `xmlns` attribute and are
//! built through constructors. Response entities ignore unknown elements so
//! newer server versions keep parsing. Collections map repeated child
//! elements onto a `Vec`, defaulting to empty when the server sends none.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace declared on every request body.
pub const API_NAMESPACE: &str = "http://www.hp.com/PC/REST/API";

fn api_namespace() -> String {
    API_NAMESPACE.to_string()
}

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

/// What the service does with the results once a run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PostRunAction {
    CollateResults,
    CollateAndAnalyze,
    DoNotCollate,
}

impl PostRunAction {
    pub fn as_str(self) -> &'static str {
        match self {
            PostRunAction::CollateResults => "Collate Results",
            PostRunAction::CollateAndAnalyze => "Collate And Analyze",
            PostRunAction::DoNotCollate => "Do Not Collate",
        }
    }
}

impl fmt::Display for PostRunAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PostRunAction> for String {
    fn from(action: PostRunAction) -> Self {
        action.as_str().to_string()
    }
}

impl TryFrom<String> for PostRunAction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim() {
            "Collate Results" => Ok(PostRunAction::CollateResults),
            "Collate And Analyze" => Ok(PostRunAction::CollateAndAnalyze),
            "Do Not Collate" => Ok(PostRunAction::DoNotCollate),
            other => Err(format!("unknown post-run action '{other}'")),
        }
    }
}

/// How a running test is stopped. Used as the last path segment of the stop URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopMode {
    /// Graceful stop: virtual users finish their current iteration.
    #[default]
    Stop,
    StopNow,
}

impl StopMode {
    pub fn as_str(self) -> &'static str {
        match self {
            StopMode::Stop => "stop",
            StopMode::StopNow => "stopNow",
        }
    }
}

/// Length of the reserved timeslot. Minutes past 59 are carried into hours;
/// both conversions saturate at `u32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeslotDuration {
    #[serde(rename = "Hours")]
    pub hours: u32,
    #[serde(rename = "Minutes")]
    pub minutes: u32,
}

impl TimeslotDuration {
    pub fn new(hours: u32, minutes: u32) -> Self {
        Self {
            hours: hours.saturating_add(minutes / 60),
            minutes: minutes % 60,
        }
    }

    pub fn from_minutes(total: u32) -> Self {
        Self::new(0, total)
    }

    pub fn total_minutes(&self) -> u32 {
        self.hours.saturating_mul(60).saturating_add(self.minutes)
    }
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// Body of `POST Runs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Run")]
pub struct RunRequest {
    #[serde(rename = "@xmlns", default = "api_namespace")]
    xmlns: String,
    #[serde(rename = "PostRunAction")]
    pub post_run_action: PostRunAction,
    #[serde(rename = "TestID")]
    pub test_id: u32,
    #[serde(rename = "TestInstanceID")]
    pub test_instance_id: u32,
    #[serde(rename = "TimeslotDuration")]
    pub timeslot_duration: TimeslotDuration,
    #[serde(rename = "TimeslotID")]
    pub timeslot_id: u32,
    #[serde(rename = "VudsMode")]
    pub vuds_mode: bool,
}

impl RunRequest {
    /// A run in a new timeslot (`TimeslotID` 0).
    pub fn new(
        test_id: u32,
        test_instance_id: u32,
        timeslot_duration: TimeslotDuration,
        post_run_action: PostRunAction,
        vuds_mode: bool,
    ) -> Self {
        Self {
            xmlns: api_namespace(),
            post_run_action,
            test_id,
            test_instance_id,
            timeslot_duration,
            timeslot_id: 0,
            vuds_mode,
        }
    }
}

/// A run as reported by `POST Runs` and `GET Runs/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Run")]
pub struct RunResponse {
    #[serde(rename = "ID")]
    pub id: u32,
    #[serde(rename = "TestID", default)]
    pub test_id: u32,
    #[serde(rename = "TestInstanceID", default)]
    pub test_instance_id: u32,
    #[serde(rename = "PostRunAction", default, skip_serializing_if = "Option::is_none")]
    pub post_run_action: Option<String>,
    #[serde(rename = "TimeslotID", default)]
    pub timeslot_id: u32,
    #[serde(rename = "VudsMode", default)]
    pub vuds_mode: bool,
    /// Elapsed run time in minutes.
    #[serde(rename = "Duration", default)]
    pub duration: u32,
    #[serde(rename = "RunState", default)]
    pub run_state: String,
    #[serde(rename = "RunSLAStatus", default)]
    pub run_sla_status: String,
}

/// Body of `POST Runs/{id}/{stopMode}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "PostRunActions")]
pub struct ReleaseTimeslot {
    #[serde(rename = "@xmlns", default = "api_namespace")]
    xmlns: String,
    #[serde(rename = "ReleaseTimeslot")]
    pub release_timeslot: bool,
    #[serde(rename = "PostRunAction")]
    pub post_run_action: PostRunAction,
}

impl ReleaseTimeslot {
    pub fn new(release_timeslot: bool, post_run_action: PostRunAction) -> Self {
        Self {
            xmlns: api_namespace(),
            release_timeslot,
            post_run_action,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "RunResult")]
pub struct RunResult {
    #[serde(rename = "ID")]
    pub id: u32,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Type", default)]
    pub result_type: String,
    #[serde(rename = "RunID", default)]
    pub run_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename = "RunResults")]
pub struct RunResults {
    #[serde(rename = "RunResult", default)]
    pub results: Vec<RunResult>,
}

impl RunResults {
    /// First result whose name matches, e.g. `Reports.zip`.
    pub fn find_by_name(&self, name: &str) -> Option<&RunResult> {
        self.results.iter().find(|result| result.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Record")]
pub struct EventRecord {
    #[serde(rename = "ID")]
    pub id: u32,
    #[serde(rename = "Type", default)]
    pub event_type: String,
    #[serde(rename = "Time", default)]
    pub time: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Responsible", default)]
    pub responsible: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename = "EventLog")]
pub struct EventLog {
    #[serde(rename = "Record", default)]
    pub records: Vec<EventRecord>,
}

// ---------------------------------------------------------------------------
// Tests, test sets and test instances
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Test")]
pub struct Test {
    #[serde(rename = "ID")]
    pub id: u32,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "TestFolderPath", default, skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<String>,
    #[serde(rename = "CreatedBy", default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(rename = "LastModified", default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

/// Body of `POST testinstances`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "TestInstance")]
pub struct TestInstanceCreateRequest {
    #[serde(rename = "@xmlns", default = "api_namespace")]
    xmlns: String,
    #[serde(rename = "TestID")]
    pub test_id: u32,
    #[serde(rename = "TestSetID")]
    pub test_set_id: u32,
}

impl TestInstanceCreateRequest {
    pub fn new(test_id: u32, test_set_id: u32) -> Self {
        Self {
            xmlns: api_namespace(),
            test_id,
            test_set_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "TestInstance")]
pub struct TestInstance {
    #[serde(rename = "TestInstanceID")]
    pub test_instance_id: u32,
    #[serde(rename = "TestID", default)]
    pub test_id: u32,
    #[serde(rename = "TestSetID", default)]
    pub test_set_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename = "TestInstances")]
pub struct TestInstances {
    #[serde(rename = "TestInstance", default)]
    pub instances: Vec<TestInstance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "TestSet")]
pub struct TestSet {
    #[serde(rename = "TestSetID")]
    pub test_set_id: u32,
    #[serde(rename = "TestSetName", default)]
    pub name: String,
    #[serde(rename = "TestSetComment", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "TestSetParentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename = "TestSets")]
pub struct TestSets {
    #[serde(rename = "TestSet", default)]
    pub test_sets: Vec<TestSet>,
}

// ---------------------------------------------------------------------------
// Trend reports
// ---------------------------------------------------------------------------

/// A run that belongs to a trend report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "TrendedRun")]
pub struct TrendedRun {
    #[serde(rename = "RUN_ID")]
    pub run_id: u32,
    #[serde(rename = "STATE", default)]
    pub state: String,
}

/// Body of `GET TrendReports/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename = "TrendReport")]
pub struct TrendReportMetadata {
    #[serde(rename = "TrendedRun", default)]
    pub runs: Vec<TrendedRun>,
}

/// Body of `POST TrendReports/{id}`: appends runs to the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "TrendReport")]
pub struct TrendReportRequest {
    #[serde(rename = "@xmlns", default = "api_namespace")]
    xmlns: String,
    #[serde(rename = "Project")]
    pub project: String,
    #[serde(rename = "TrendedRun", default)]
    pub runs: Vec<TrendedRun>,
}

impl TrendReportRequest {
    pub fn new(project: impl Into<String>, runs: Vec<TrendedRun>) -> Self {
        Self {
            xmlns: api_namespace(),
            project: project.into(),
            runs,
        }
    }

    /// Append a single run in its default state.
    pub fn for_run(project: impl Into<String>, run_id: u32) -> Self {
        Self::new(
            project,
            vec![TrendedRun {
                run_id,
                state: String::new(),
            }],
        )
    }
}

/// One transaction's measurements for one run of a trend report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Transaction")]
pub struct TransactionMeasurement {
    #[serde(rename = "@Name")]
    pub name: String,
    #[serde(rename = "@RunID")]
    pub run_id: u32,
    #[serde(rename = "@Type", default)]
    pub measurement_type: String,
    #[serde(rename = "@Minimum", default)]
    pub minimum: f64,
    #[serde(rename = "@Maximum", default)]
    pub maximum: f64,
    #[serde(rename = "@Average", default)]
    pub average: f64,
    #[serde(rename = "@Percentile90", default)]
    pub percentile_90: f64,
    #[serde(rename = "@Count", default)]
    pub count: u64,
}

/// Body of `GET TrendReports/{id}/{runId}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename = "TrendReportTransactionData")]
pub struct TrendReportTransactionData {
    #[serde(rename = "Transaction", default)]
    pub transactions: Vec<TransactionMeasurement>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error document returned alongside a rejected status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Exception")]
pub struct ErrorResponse {
    #[serde(rename = "ExceptionMessage")]
    pub exception_message: String,
    #[serde(rename = "ErrorCode")]
    pub error_code: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Error code: {}", self.exception_message, self.error_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::XmlCodec;

    #[test]
    fn timeslot_minutes_carry_into_hours() {
        let slot = TimeslotDuration::new(1, 95);
        assert_eq!(slot, TimeslotDuration { hours: 2, minutes: 35 });
        assert_eq!(slot.total_minutes(), 155);
        assert_eq!(TimeslotDuration::from_minutes(30).hours, 0);
    }

    #[test]
    fn timeslot_arithmetic_saturates() {
        let slot = TimeslotDuration::new(u32::MAX, 120);
        assert_eq!(slot.hours, u32::MAX);
        assert_eq!(slot.minutes, 0);
        assert_eq!(slot.total_minutes(), u32::MAX);
        assert_eq!(TimeslotDuration::from_minutes(u32::MAX).total_minutes(), u32::MAX);
    }

    #[test]
    fn post_run_action_uses_service_labels() {
        assert_eq!(PostRunAction::CollateAndAnalyze.to_string(), "Collate And Analyze");
        assert_eq!(
            PostRunAction::try_from("Do Not Collate".to_string()).unwrap(),
            PostRunAction::DoNotCollate
        );
        assert!(PostRunAction::try_from("Shred".to_string()).is_err());
    }

    #[test]
    fn run_request_serializes_in_service_shape() {
        let request = RunRequest::new(
            5,
            4,
            TimeslotDuration::new(0, 30),
            PostRunAction::CollateAndAnalyze,
            false,
        );
        let xml = request.to_xml().unwrap();
        assert_eq!(
            xml,
            "<Run xmlns=\"http://www.hp.com/PC/REST/API\">\
             <PostRunAction>Collate And Analyze</PostRunAction>\
             <TestID>5</TestID>\
             <TestInstanceID>4</TestInstanceID>\
             <TimeslotDuration><Hours>0</Hours><Minutes>30</Minutes></TimeslotDuration>\
             <TimeslotID>0</TimeslotID>\
             <VudsMode>false</VudsMode>\
             </Run>"
        );
    }

    #[test]
    fn release_timeslot_serializes_in_service_shape() {
        let xml = ReleaseTimeslot::new(true, PostRunAction::DoNotCollate).to_xml().unwrap();
        assert_eq!(
            xml,
            "<PostRunActions xmlns=\"http://www.hp.com/PC/REST/API\">\
             <ReleaseTimeslot>true</ReleaseTimeslot>\
             <PostRunAction>Do Not Collate</PostRunAction>\
             </PostRunActions>"
        );
    }

    #[test]
    fn run_response_tolerates_unknown_elements() {
        let xml = r#"<Run xmlns="http://www.hp.com/PC/REST/API">
            <TestID>5</TestID>
            <TestInstanceID>4</TestInstanceID>
            <PostRunAction>Collate And Analyze</PostRunAction>
            <TimeslotID>1001</TimeslotID>
            <VudsMode>false</VudsMode>
            <ID>42</ID>
            <Duration>30</Duration>
            <RunState>Initializing</RunState>
            <RunSLAStatus>Not Completed</RunSLAStatus>
            <SomethingNew>ignored</SomethingNew>
        </Run>"#;
        let run = RunResponse::from_xml(xml).unwrap();
        assert_eq!(run.id, 42);
        assert_eq!(run.timeslot_id, 1001);
        assert_eq!(run.run_state, "Initializing");
        assert_eq!(run.post_run_action.as_deref(), Some("Collate And Analyze"));
    }

    #[test]
    fn empty_collections_parse_to_empty_vecs() {
        let sets = TestSets::from_xml(r#"<TestSets xmlns="http://www.hp.com/PC/REST/API"/>"#).unwrap();
        assert!(sets.test_sets.is_empty());
        let log = EventLog::from_xml("<EventLog></EventLog>").unwrap();
        assert!(log.records.is_empty());
    }

    #[test]
    fn test_sets_parse_repeated_children() {
        let xml = r#"<TestSets>
            <TestSet><TestSetName>Default</TestSetName><TestSetID>1</TestSetID><TestSetParentId>0</TestSetParentId></TestSet>
            <TestSet><TestSetName>Nightly</TestSetName><TestSetID>2</TestSetID></TestSet>
        </TestSets>"#;
        let sets = TestSets::from_xml(xml).unwrap();
        assert_eq!(sets.test_sets.len(), 2);
        assert_eq!(sets.test_sets[0].parent_id, Some(0));
        assert_eq!(sets.test_sets[1].name, "Nightly");
        assert_eq!(sets.test_sets[1].parent_id, None);
    }

    #[test]
    fn trend_report_request_round_trips() {
        let request = TrendReportRequest::new(
            "perf",
            vec![
                TrendedRun {
                    run_id: 10,
                    state: "Trended".to_string(),
                },
                TrendedRun {
                    run_id: 11,
                    state: String::new(),
                },
            ],
        );
        let xml = request.to_xml().unwrap();
        assert!(xml.starts_with("<TrendReport xmlns=\"http://www.hp.com/PC/REST/API\">"));
        assert_eq!(TrendReportRequest::from_xml(&xml).unwrap(), request);
    }

    #[test]
    fn transaction_data_reads_attributes() {
        let xml = r#"<TrendReportTransactionData>
            <Transaction Name="login" RunID="7" Type="TRT" Minimum="0.1" Maximum="2.5" Average="1.25" Percentile90="2" Count="120"/>
            <Transaction Name="logout" RunID="7"/>
        </TrendReportTransactionData>"#;
        let data = TrendReportTransactionData::from_xml(xml).unwrap();
        assert_eq!(data.transactions.len(), 2);
        assert_eq!(data.transactions[0].name, "login");
        assert_eq!(data.transactions[0].average, 1.25);
        assert_eq!(data.transactions[0].count, 120);
        assert_eq!(data.transactions[1].count, 0);
    }

    #[test]
    fn error_response_formats_message_and_code() {
        let err = ErrorResponse {
            exception_message: "Run not found".to_string(),
            error_code: "2001".to_string(),
        };
        assert_eq!(err.to_string(), "Run not found Error code: 2001");
    }
}
