//! HTTP envelope types passed between the request builder, the dispatcher
//! and the codec.
//!
//! # Design
//! `HttpRequest` is plain data: `LoadTestClient::build_*` produces it without
//! touching the network and `Session::execute` sends it. `HttpResponse` keeps
//! the body as a reader so binary downloads can be streamed to their sink
//! while XML bodies are read into a string for parsing.

use std::fmt;
use std::io::{self, Read, Write};

pub const CONTENT_TYPE: &str = "content-type";
pub const AUTHORIZATION: &str = "authorization";
pub const APPLICATION_XML: &str = "application/xml";

/// HTTP method for a request. The service only uses GET and POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: String) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// A POST carrying an `application/xml` body.
    pub fn post_xml(url: String, body: String) -> Self {
        Self {
            method: HttpMethod::Post,
            url,
            headers: vec![(CONTENT_TYPE.to_string(), APPLICATION_XML.to_string())],
            body: Some(body),
        }
    }

    pub fn with_header(mut self, name: &str, value: String) -> Self {
        self.headers.push((name.to_string(), value));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response whose body has not been read yet.
pub struct HttpResponse {
    pub status: u16,
    /// Raw status line, e.g. `HTTP/1.1 404 Not Found`.
    pub status_line: String,
    body: Box<dyn Read>,
}

impl HttpResponse {
    pub fn new(status: u16, status_line: impl Into<String>, body: impl Read + 'static) -> Self {
        Self {
            status,
            status_line: status_line.into(),
            body: Box::new(body),
        }
    }

    /// Build a response from an in-memory body. Mostly useful in tests.
    pub fn from_text(status: u16, status_line: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(status, status_line, io::Cursor::new(body.into().into_bytes()))
    }

    /// Read the whole body as UTF-8 text.
    pub fn into_text(mut self) -> io::Result<String> {
        let mut text = String::new();
        self.body.read_to_string(&mut text)?;
        Ok(text)
    }

    /// Read the whole body without interpreting it.
    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.body.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Stream the body into `sink` without buffering it, returning the byte count.
    pub fn copy_to<W: Write + ?Sized>(mut self, sink: &mut W) -> io::Result<u64> {
        let copied = io::copy(&mut self.body, sink)?;
        sink.flush()?;
        Ok(copied)
    }

    pub fn into_reader(self) -> Box<dyn Read> {
        self.body
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("status_line", &self.status_line)
            .finish_non_exhaustive()
    }
}
