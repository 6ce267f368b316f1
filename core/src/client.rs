//! Request builder and response codec for the LoadTest REST API.
//!
//! # Design
//! `LoadTestClient` holds only the resource URLs and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an accepted
//! `HttpResponse`. `check_status` sits between the two and turns rejected
//! responses into `LoadTestError::Request`. `Session` wires the three
//! together over a real connection; tests can drive them with plain data.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::codec::XmlCodec;
use crate::error::{LoadTestError, Result};
use crate::http::{HttpRequest, HttpResponse, AUTHORIZATION};
use crate::types::{
    ErrorResponse, PostRunAction, ReleaseTimeslot, RunRequest, StopMode, TestInstance,
    TestInstanceCreateRequest, TrendReportMetadata, TrendReportRequest, TrendedRun,
};
use crate::urls::{ResourceUrls, WebProtocol};

/// Status codes the service uses for success.
pub const ACCEPTED_STATUS_CODES: [u16; 4] = [200, 201, 202, 204];

pub fn is_accepted(status: u16) -> bool {
    ACCEPTED_STATUS_CODES.contains(&status)
}

/// Pass accepted responses through; turn every other status into a
/// `Request` error.
///
/// The message comes from the service error document when the body parses
/// as one, and from the raw status line otherwise.
pub fn check_status(operation: &'static str, response: HttpResponse) -> Result<HttpResponse> {
    if is_accepted(response.status) {
        return Ok(response);
    }

    let status = response.status;
    let status_line = response.status_line.clone();
    let message = match response.into_text() {
        Ok(body) => match ErrorResponse::from_xml(&body) {
            Ok(error) => error.to_string(),
            Err(err) => {
                tracing::debug!(operation, %err, "error body is not a service error document");
                status_line
            }
        },
        Err(err) => {
            tracing::debug!(operation, %err, "error body could not be read");
            status_line
        }
    };

    tracing::warn!(operation, status, %message, "request rejected");
    Err(LoadTestError::Request {
        operation,
        status,
        message,
    })
}

#[derive(Debug, Clone)]
pub struct LoadTestClient {
    urls: ResourceUrls,
}

impl LoadTestClient {
    pub fn new(protocol: WebProtocol, server: &str, domain: &str, project: &str) -> Self {
        Self {
            urls: ResourceUrls::new(protocol, server, domain, project),
        }
    }

    pub fn urls(&self) -> &ResourceUrls {
        &self.urls
    }

    // -- authentication -----------------------------------------------------

    pub fn build_authenticate(&self, username: &str, password: &str) -> HttpRequest {
        let credentials = BASE64.encode(format!("{username}:{password}"));
        HttpRequest::get(self.urls.authenticate())
            .with_header(AUTHORIZATION, format!("Basic {credentials}"))
    }

    pub fn build_logout(&self) -> HttpRequest {
        HttpRequest::get(self.urls.logout())
    }

    // -- runs ---------------------------------------------------------------

    pub fn build_start_run(&self, request: &RunRequest) -> Result<HttpRequest> {
        Ok(HttpRequest::post_xml(self.urls.runs(), request.to_xml()?))
    }

    /// Stop a run and release its timeslot without collating results.
    pub fn build_stop_run(&self, run_id: u32, mode: StopMode) -> Result<HttpRequest> {
        let body = ReleaseTimeslot::new(true, PostRunAction::DoNotCollate).to_xml()?;
        Ok(HttpRequest::post_xml(self.urls.stop_run(run_id, mode), body))
    }

    pub fn build_run_data(&self, run_id: u32) -> HttpRequest {
        HttpRequest::get(self.urls.run(run_id))
    }

    pub fn build_run_results(&self, run_id: u32) -> HttpRequest {
        HttpRequest::get(self.urls.run_results(run_id))
    }

    pub fn build_run_result_data(&self, run_id: u32, result_id: u32) -> HttpRequest {
        HttpRequest::get(self.urls.run_result_data(run_id, result_id))
    }

    pub fn build_run_event_log(&self, run_id: u32) -> HttpRequest {
        HttpRequest::get(self.urls.run_event_log(run_id))
    }

    // -- tests --------------------------------------------------------------

    pub fn build_test_data(&self, test_id: u32) -> HttpRequest {
        HttpRequest::get(self.urls.test(test_id))
    }

    pub fn build_create_test_instance(&self, test_id: u32, test_set_id: u32) -> Result<HttpRequest> {
        let body = TestInstanceCreateRequest::new(test_id, test_set_id).to_xml()?;
        Ok(HttpRequest::post_xml(self.urls.test_instances(), body))
    }

    pub fn build_test_instances_by_test_id(&self, test_id: u32) -> HttpRequest {
        HttpRequest::get(self.urls.test_instances_by_test_id(test_id))
    }

    pub fn build_test_sets(&self) -> HttpRequest {
        HttpRequest::get(self.urls.test_sets())
    }

    // -- trend reports ------------------------------------------------------

    pub fn build_trend_report_transactions(&self, trend_report_id: &str, run_id: u32) -> HttpRequest {
        HttpRequest::get(self.urls.trend_report_run(trend_report_id, run_id))
    }

    pub fn build_update_trend_report(
        &self,
        trend_report_id: &str,
        request: &TrendReportRequest,
    ) -> Result<HttpRequest> {
        Ok(HttpRequest::post_xml(
            self.urls.trend_report(trend_report_id),
            request.to_xml()?,
        ))
    }

    pub fn build_trend_report_pdf(&self, trend_report_id: &str) -> HttpRequest {
        HttpRequest::get(self.urls.trend_report_data(trend_report_id))
    }

    pub fn build_trend_report_metadata(&self, trend_report_id: &str) -> HttpRequest {
        HttpRequest::get(self.urls.trend_report(trend_report_id))
    }

    // -- parsing ------------------------------------------------------------

    /// Read an accepted response body and decode it as `T`.
    pub fn parse_entity<T: XmlCodec>(&self, response: HttpResponse) -> Result<T> {
        let body = response.into_bytes()?;
        T::from_xml_bytes(&body)
    }

    /// Extract `TestInstanceID` from the body returned by `POST testinstances`.
    pub fn parse_test_instance_id(&self, response: HttpResponse) -> Result<u32> {
        let created: TestInstance = self.parse_entity(response)?;
        Ok(created.test_instance_id)
    }

    pub fn parse_trend_report_metadata(&self, response: HttpResponse) -> Result<Vec<TrendedRun>> {
        let metadata: TrendReportMetadata = self.parse_entity(response)?;
        Ok(metadata.runs)
    }
}
