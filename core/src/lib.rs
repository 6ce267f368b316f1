//! Blocking client SDK for the LoadTest performance-testing REST API.
//!
//! # Overview
//! Authenticates, starts and stops load-test runs, polls run state, fetches
//! results and manages trend reports. All traffic is XML over HTTP(S).
//!
//! # Design
//! - `LoadTestClient` is stateless: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an accepted `HttpResponse`.
//! - `Session` owns the pooled agent, cookie jar and proxy, dispatches the
//!   requests and validates statuses (200/201/202/204).
//! - Rejected statuses become `LoadTestError::Request`, with the message
//!   taken from the service error document or, failing that, the status line.
//! - Entities implement `XmlCodec` through serde and quick-xml.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod proxy;
pub mod session;
pub mod types;
pub mod urls;

pub use client::{check_status, LoadTestClient, ACCEPTED_STATUS_CODES};
pub use codec::XmlCodec;
pub use config::SessionConfig;
pub use error::{LoadTestError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use proxy::{ProxyConfig, ProxyCredentials};
pub use session::Session;
pub use types::{
    ErrorResponse, EventLog, EventRecord, PostRunAction, ReleaseTimeslot, RunRequest, RunResponse,
    RunResult, RunResults, StopMode, Test, TestInstance, TestInstanceCreateRequest, TestInstances,
    TestSet, TestSets, TimeslotDuration, TransactionMeasurement, TrendReportMetadata,
    TrendReportRequest, TrendReportTransactionData, TrendedRun,
};
pub use urls::{ResourceUrls, WebProtocol};
