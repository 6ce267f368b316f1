//! Session manager and dispatcher.
//!
//! # Design
//! `Session` owns one ureq `Agent`: a pooled connection manager with a cookie
//! jar and an optional outbound proxy. Every operation goes through
//! `execute`, so the session cookie captured by `authenticate` and the proxy
//! settings apply uniformly. Requests are built and parsed by
//! `LoadTestClient`; the session only performs the I/O in between.
//!
//! The agent is a shared handle, so a `Session` can serve concurrent calls.
//! `authenticate` and `logout` mutate the shared cookie jar and must be
//! serialized by the caller.

use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::client::{check_status, LoadTestClient};
use crate::codec::XmlCodec;
use crate::config::SessionConfig;
use crate::error::{LoadTestError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::proxy::ProxyConfig;
use crate::types::{
    EventLog, PostRunAction, RunRequest, RunResponse, RunResults, StopMode, Test, TestInstances,
    TestSets, TimeslotDuration, TrendReportRequest, TrendReportTransactionData, TrendedRun,
};

pub struct Session {
    client: LoadTestClient,
    agent: ureq::Agent,
    proxy: Option<ProxyConfig>,
}

impl Session {
    /// Create a session from a full configuration.
    ///
    /// Fails with `Configuration` when the proxy URL is malformed; no request
    /// is sent.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let proxy = ProxyConfig::from_parts(
            config.proxy_url.as_deref(),
            config.proxy_user.as_deref(),
            config.proxy_password.as_deref(),
        )?;
        let agent_proxy = proxy.as_ref().map(ProxyConfig::to_ureq).transpose()?;

        let mut builder = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_idle_connections(config.max_idle_connections)
            .max_idle_connections_per_host(config.max_idle_connections_per_host)
            .timeout_global(config.timeout())
            .proxy(agent_proxy);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        let agent = builder.build().new_agent();

        let client = LoadTestClient::new(
            config.protocol,
            &config.server,
            &config.domain,
            &config.project,
        );
        tracing::debug!(
            base = client.urls().project_base(),
            proxy = proxy.as_ref().map(|p| p.host.as_str()),
            "session created"
        );

        Ok(Self {
            client,
            agent,
            proxy,
        })
    }

    /// Create a session from the individual connection settings.
    pub fn connect(
        protocol: &str,
        server: &str,
        domain: &str,
        project: &str,
        proxy_url: Option<&str>,
        proxy_user: Option<&str>,
        proxy_password: Option<&str>,
    ) -> Result<Self> {
        let mut config = SessionConfig::new(protocol.parse()?, server, domain, project);
        config.proxy_url = proxy_url.map(str::to_string);
        config.proxy_user = proxy_user.map(str::to_string);
        config.proxy_password = proxy_password.map(str::to_string);
        Self::new(&config)
    }

    pub fn client(&self) -> &LoadTestClient {
        &self.client
    }

    pub fn proxy(&self) -> Option<&ProxyConfig> {
        self.proxy.as_ref()
    }

    // -- dispatch -----------------------------------------------------------

    /// Send `request` and validate the status.
    ///
    /// The returned body is unread so callers can either parse it or stream it.
    pub fn execute(&self, operation: &'static str, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(
            operation,
            method = request.method.as_str(),
            url = %request.url,
            "dispatching request"
        );
        let response = self.send(request)?;
        let status = response.status().as_u16();
        let line = status_line(response.version(), response.status());
        tracing::debug!(operation, status, "response received");

        let body = response.into_body().into_reader();
        check_status(operation, HttpResponse::new(status, line, body))
    }

    fn send(&self, request: HttpRequest) -> Result<ureq::http::Response<ureq::Body>> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        let response = match method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&url);
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()?
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&url);
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match body {
                    Some(body) => builder.send(body.as_bytes())?,
                    None => builder.send_empty()?,
                }
            }
        };
        Ok(response)
    }

    /// Execute and decode the body as `T`.
    fn call<T: XmlCodec>(&self, operation: &'static str, request: HttpRequest) -> Result<T> {
        let response = self.execute(operation, request)?;
        self.client.parse_entity(response)
    }

    /// Execute and discard the body.
    fn call_unit(&self, operation: &'static str, request: HttpRequest) -> Result<()> {
        let response = self.execute(operation, request)?;
        response.copy_to(&mut io::sink())?;
        Ok(())
    }

    // -- authentication -----------------------------------------------------

    /// Log in with Basic credentials. The session cookie set by the server is
    /// kept by the agent and sent with every later request.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<()> {
        tracing::info!(username, "authenticating");
        let request = self.client.build_authenticate(username, password);
        match self.call_unit("authenticate", request) {
            Ok(()) => Ok(()),
            Err(LoadTestError::Request { message, .. }) => {
                Err(LoadTestError::Authentication { message })
            }
            Err(other) => Err(other),
        }
    }

    /// Invalidate the session cookie on the server. Local state is kept; drop
    /// the session afterwards.
    pub fn logout(&self) -> Result<()> {
        tracing::info!("logging out");
        self.call_unit("logout", self.client.build_logout())
    }

    // -- runs ---------------------------------------------------------------

    pub fn start_run(
        &self,
        test_id: u32,
        test_instance_id: u32,
        timeslot_duration: TimeslotDuration,
        post_run_action: PostRunAction,
        vuds_mode: bool,
    ) -> Result<RunResponse> {
        tracing::info!(test_id, test_instance_id, %post_run_action, vuds_mode, "starting run");
        let run = RunRequest::new(
            test_id,
            test_instance_id,
            timeslot_duration,
            post_run_action,
            vuds_mode,
        );
        self.call("start_run", self.client.build_start_run(&run)?)
    }

    /// Stop a run and release its timeslot without collating results.
    pub fn stop_run(&self, run_id: u32, mode: StopMode) -> Result<()> {
        tracing::info!(run_id, mode = mode.as_str(), "stopping run");
        self.call_unit("stop_run", self.client.build_stop_run(run_id, mode)?)
    }

    pub fn run_data(&self, run_id: u32) -> Result<RunResponse> {
        self.call("run_data", self.client.build_run_data(run_id))
    }

    pub fn run_results(&self, run_id: u32) -> Result<RunResults> {
        self.call("run_results", self.client.build_run_results(run_id))
    }

    pub fn run_event_log(&self, run_id: u32) -> Result<EventLog> {
        self.call("run_event_log", self.client.build_run_event_log(run_id))
    }

    /// Stream a result file into `sink`, returning the number of bytes written.
    pub fn copy_run_result_data<W: Write + ?Sized>(
        &self,
        run_id: u32,
        result_id: u32,
        sink: &mut W,
    ) -> Result<u64> {
        let request = self.client.build_run_result_data(run_id, result_id);
        let response = self.execute("run_result_data", request)?;
        let written = response.copy_to(sink)?;
        tracing::debug!(run_id, result_id, written, "result data copied");
        Ok(written)
    }

    /// Stream a result file to `path`.
    ///
    /// The body is written to a temporary file next to `path` and moved into
    /// place only after the whole stream arrived. A rejected status or a
    /// broken stream leaves nothing at `path`.
    pub fn download_run_result_data(
        &self,
        run_id: u32,
        result_id: u32,
        path: impl AsRef<Path>,
    ) -> Result<u64> {
        let path = path.as_ref();
        let request = self.client.build_run_result_data(run_id, result_id);
        let response = self.execute("run_result_data", request)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staging = BufWriter::new(NamedTempFile::new_in(dir)?);
        let written = response.copy_to(&mut staging)?;
        let staged = staging.into_inner().map_err(|e| e.into_error())?;
        staged.persist(path).map_err(|e| e.error)?;

        tracing::info!(
            run_id,
            result_id,
            written,
            path = %path.display(),
            "result data downloaded"
        );
        Ok(written)
    }

    // -- tests --------------------------------------------------------------

    /// Create a test instance and return its id.
    pub fn create_test_instance(&self, test_id: u32, test_set_id: u32) -> Result<u32> {
        let request = self.client.build_create_test_instance(test_id, test_set_id)?;
        let response = self.execute("create_test_instance", request)?;
        self.client.parse_test_instance_id(response)
    }

    pub fn test_sets(&self) -> Result<TestSets> {
        self.call("test_sets", self.client.build_test_sets())
    }

    pub fn test_instances_by_test_id(&self, test_id: u32) -> Result<TestInstances> {
        self.call(
            "test_instances_by_test_id",
            self.client.build_test_instances_by_test_id(test_id),
        )
    }

    pub fn test_data(&self, test_id: u32) -> Result<Test> {
        self.call("test_data", self.client.build_test_data(test_id))
    }

    // -- trend reports ------------------------------------------------------

    pub fn trend_report_transactions(
        &self,
        trend_report_id: &str,
        run_id: u32,
    ) -> Result<TrendReportTransactionData> {
        self.call(
            "trend_report_transactions",
            self.client.build_trend_report_transactions(trend_report_id, run_id),
        )
    }

    pub fn update_trend_report(
        &self,
        trend_report_id: &str,
        request: &TrendReportRequest,
    ) -> Result<()> {
        self.call_unit(
            "update_trend_report",
            self.client.build_update_trend_report(trend_report_id, request)?,
        )
    }

    /// The rendered trend report document as an unread stream.
    pub fn trend_report_pdf(&self, trend_report_id: &str) -> Result<Box<dyn Read>> {
        let request = self.client.build_trend_report_pdf(trend_report_id);
        Ok(self.execute("trend_report_pdf", request)?.into_reader())
    }

    pub fn trend_report_metadata(&self, trend_report_id: &str) -> Result<Vec<TrendedRun>> {
        let request = self.client.build_trend_report_metadata(trend_report_id);
        let response = self.execute("trend_report_metadata", request)?;
        self.client.parse_trend_report_metadata(response)
    }
}

/// Reassemble the status line. The transport does not keep the server's
/// reason phrase, so the canonical one is used when the code has one.
fn status_line(version: ureq::http::Version, status: ureq::http::StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{version:?} {} {reason}", status.as_u16()),
        None => format!("{version:?} {}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urls::WebProtocol;

    #[test]
    fn session_without_proxy() {
        let session = Session::connect("http", "localhost", "D", "P", None, None, None).unwrap();
        assert!(session.proxy().is_none());
        assert_eq!(
            session.client().urls().project_base(),
            "http://localhost/LoadTest/rest/domains/D/projects/P"
        );
    }

    #[test]
    fn session_with_proxy_and_credentials() {
        let session = Session::connect(
            "https",
            "pc.example.com",
            "D",
            "P",
            Some("http://proxy.example.com:8080"),
            Some("alice"),
            Some("pw"),
        )
        .unwrap();
        let proxy = session.proxy().unwrap();
        assert_eq!(proxy.host, "proxy.example.com");
        assert_eq!(proxy.port, 8080);
        assert!(proxy.credentials.is_some());
    }

    #[test]
    fn malformed_proxy_fails_construction() {
        let result = Session::connect("http", "s", "D", "P", Some("not-a-url"), None, None);
        assert!(matches!(result, Err(LoadTestError::Configuration { .. })));
    }

    #[test]
    fn unknown_protocol_fails_construction() {
        let result = Session::connect("gopher", "s", "D", "P", None, None, None);
        assert!(matches!(result, Err(LoadTestError::Configuration { .. })));
    }

    #[test]
    fn config_pool_limits_are_accepted() {
        let mut config = SessionConfig::new(WebProtocol::Http, "s", "D", "P");
        config.max_idle_connections = 4;
        config.max_idle_connections_per_host = 2;
        config.timeout_secs = Some(5);
        config.user_agent = Some("loadtest-core-tests".to_string());
        assert!(Session::new(&config).is_ok());
    }

    #[test]
    fn status_line_uses_canonical_reason_when_known() {
        use ureq::http::{StatusCode, Version};

        let line = status_line(Version::HTTP_11, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(line, "HTTP/1.1 500 Internal Server Error");

        let custom = StatusCode::from_u16(599).unwrap();
        assert_eq!(status_line(Version::HTTP_11, custom), "HTTP/1.1 599");
        assert_eq!(status_line(Version::HTTP_10, StatusCode::NOT_FOUND), "HTTP/1.0 404 Not Found");
    }

    #[test]
    fn session_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Session>();
    }

    #[test]
    fn connection_refused_surfaces_as_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let session =
            Session::connect("http", &addr.to_string(), "D", "P", None, None, None).unwrap();
        let err = session.run_data(1).unwrap_err();
        assert!(matches!(err, LoadTestError::Transport(_)), "got {err:?}");
    }
}
