//! Resource URL construction.
//!
//! `ResourceUrls` fixes the service base (`{protocol}://{server}/LoadTest/rest`)
//! and the project base (`.../domains/{domain}/projects/{project}`) once, at
//! construction. Every resource URL is derived from those two strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::LoadTestError;
use crate::types::StopMode;

const RUNS: &str = "Runs";
const TESTS: &str = "tests";
const TEST_INSTANCES: &str = "testinstances";
const TEST_SETS: &str = "testsets";
const RESULTS: &str = "Results";
const EVENT_LOG: &str = "EventLog";
const TREND_REPORTS: &str = "TrendReports";
const DATA: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebProtocol {
    Http,
    #[default]
    Https,
}

impl WebProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            WebProtocol::Http => "http",
            WebProtocol::Https => "https",
        }
    }
}

impl fmt::Display for WebProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebProtocol {
    type Err = LoadTestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(WebProtocol::Http),
            "https" => Ok(WebProtocol::Https),
            other => Err(LoadTestError::configuration(format!(
                "Unsupported web protocol '{other}', expected 'http' or 'https'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUrls {
    service_base: String,
    project_base: String,
}

impl ResourceUrls {
    pub fn new(protocol: WebProtocol, server: &str, domain: &str, project: &str) -> Self {
        let server = server.trim_end_matches('/');
        let service_base = format!("{protocol}://{server}/LoadTest/rest");
        let project_base = format!("{service_base}/domains/{domain}/projects/{project}");
        Self {
            service_base,
            project_base,
        }
    }

    pub fn service_base(&self) -> &str {
        &self.service_base
    }

    pub fn project_base(&self) -> &str {
        &self.project_base
    }

    pub fn authenticate(&self) -> String {
        format!("{}/authentication-point/authenticate", self.service_base)
    }

    pub fn logout(&self) -> String {
        format!("{}/authentication-point/logout", self.service_base)
    }

    fn resource(&self, path: &str) -> String {
        format!("{}/{path}", self.project_base)
    }

    pub fn runs(&self) -> String {
        self.resource(RUNS)
    }

    pub fn run(&self, run_id: u32) -> String {
        self.resource(&format!("{RUNS}/{run_id}"))
    }

    pub fn stop_run(&self, run_id: u32, mode: StopMode) -> String {
        self.resource(&format!("{RUNS}/{run_id}/{}", mode.as_str()))
    }

    pub fn run_results(&self, run_id: u32) -> String {
        self.resource(&format!("{RUNS}/{run_id}/{RESULTS}"))
    }

    pub fn run_result_data(&self, run_id: u32, result_id: u32) -> String {
        self.resource(&format!("{RUNS}/{run_id}/{RESULTS}/{result_id}/{DATA}"))
    }

    pub fn run_event_log(&self, run_id: u32) -> String {
        self.resource(&format!("{RUNS}/{run_id}/{EVENT_LOG}"))
    }

    pub fn test(&self, test_id: u32) -> String {
        self.resource(&format!("{TESTS}/{test_id}"))
    }

    pub fn test_instances(&self) -> String {
        self.resource(TEST_INSTANCES)
    }

    /// `testinstances?query={test-id[<id>]}` with the query value form-encoded.
    pub fn test_instances_by_test_id(&self, test_id: u32) -> String {
        let query = encode_query_value(&format!("{{test-id[{test_id}]}}"));
        format!("{}?query={query}", self.test_instances())
    }

    pub fn test_sets(&self) -> String {
        self.resource(TEST_SETS)
    }

    pub fn trend_report(&self, trend_report_id: &str) -> String {
        self.resource(&format!("{TREND_REPORTS}/{trend_report_id}"))
    }

    pub fn trend_report_run(&self, trend_report_id: &str, run_id: u32) -> String {
        self.resource(&format!("{TREND_REPORTS}/{trend_report_id}/{run_id}"))
    }

    pub fn trend_report_data(&self, trend_report_id: &str) -> String {
        self.resource(&format!("{TREND_REPORTS}/{trend_report_id}/{DATA}"))
    }
}

/// Percent-encode a query value as UTF-8 `application/x-www-form-urlencoded`.
pub fn encode_query_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls() -> ResourceUrls {
        ResourceUrls::new(WebProtocol::Http, "pc.example.com", "DEFAULT", "perf")
    }

    const PROJECT: &str = "http://pc.example.com/LoadTest/rest/domains/DEFAULT/projects/perf";

    #[test]
    fn bases_follow_the_template() {
        let urls = urls();
        assert_eq!(urls.service_base(), "http://pc.example.com/LoadTest/rest");
        assert_eq!(urls.project_base(), PROJECT);
    }

    #[test]
    fn authentication_urls_sit_outside_the_project() {
        let urls = urls();
        assert_eq!(
            urls.authenticate(),
            "http://pc.example.com/LoadTest/rest/authentication-point/authenticate"
        );
        assert_eq!(
            urls.logout(),
            "http://pc.example.com/LoadTest/rest/authentication-point/logout"
        );
    }

    #[test]
    fn run_resources() {
        let urls = urls();
        assert_eq!(urls.runs(), format!("{PROJECT}/Runs"));
        assert_eq!(urls.run(7), format!("{PROJECT}/Runs/7"));
        assert_eq!(urls.stop_run(7, StopMode::Stop), format!("{PROJECT}/Runs/7/stop"));
        assert_eq!(urls.stop_run(7, StopMode::StopNow), format!("{PROJECT}/Runs/7/stopNow"));
        assert_eq!(urls.run_results(7), format!("{PROJECT}/Runs/7/Results"));
        assert_eq!(urls.run_result_data(7, 3), format!("{PROJECT}/Runs/7/Results/3/data"));
        assert_eq!(urls.run_event_log(7), format!("{PROJECT}/Runs/7/EventLog"));
    }

    #[test]
    fn test_resources() {
        let urls = urls();
        assert_eq!(urls.test(12), format!("{PROJECT}/tests/12"));
        assert_eq!(urls.test_instances(), format!("{PROJECT}/testinstances"));
        assert_eq!(urls.test_sets(), format!("{PROJECT}/testsets"));
    }

    #[test]
    fn test_instance_query_is_encoded() {
        assert_eq!(
            urls().test_instances_by_test_id(5),
            format!("{PROJECT}/testinstances?query=%7Btest-id%5B5%5D%7D")
        );
    }

    #[test]
    fn trend_report_resources() {
        let urls = urls();
        assert_eq!(urls.trend_report("9"), format!("{PROJECT}/TrendReports/9"));
        assert_eq!(urls.trend_report_run("9", 4), format!("{PROJECT}/TrendReports/9/4"));
        assert_eq!(urls.trend_report_data("9"), format!("{PROJECT}/TrendReports/9/data"));
    }

    #[test]
    fn query_values_use_utf8_form_encoding() {
        assert_eq!(encode_query_value("a b&c"), "a+b%26c");
        assert_eq!(encode_query_value("é"), "%C3%A9");
    }

    #[test]
    fn protocol_parsing() {
        assert_eq!("HTTPS".parse::<WebProtocol>().unwrap(), WebProtocol::Https);
        assert_eq!("http".parse::<WebProtocol>().unwrap(), WebProtocol::Http);
        assert!(matches!(
            "ftp".parse::<WebProtocol>(),
            Err(LoadTestError::Configuration { .. })
        ));
    }

    #[test]
    fn trailing_slash_on_server_is_stripped() {
        let urls = ResourceUrls::new(WebProtocol::Https, "pc.example.com/", "D", "P");
        assert_eq!(urls.runs(), "https://pc.example.com/LoadTest/rest/domains/D/projects/P/Runs");
    }
}
