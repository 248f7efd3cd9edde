/*
 fiware-stack
 Copyright 2025 Peter Pearson.
 Licensed under the Apache License, Version 2.0 (the "License");
 You may not use this file except in compliance with the License.
 You may obtain a copy of the License at
 http://www.apache.org/licenses/LICENSE-2.0
 Unless required by applicable law or agreed to in writing, software
 distributed under the License is distributed on an "AS IS" BASIS,
 WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 See the License for the specific language governing permissions and
 limitations under the License.
 ---------
*/

use std::fmt;

use serde_json::Value;
use thiserror::Error;

pub const HEADER_AUTH_TOKEN: &str = "X-Auth-Token";
pub const HEADER_SUBJECT_TOKEN: &str = "X-Subject-Token";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_ACCEPT: &str = "Accept";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_JSON_PATCH: &str = "application/openstack-images-v2.1-json-patch";

// the only content type which is passed through without trying to decode it as JSON
pub const CONTENT_TYPE_PLAIN_TEXT: &str = "text/plain; charset=utf-8";

#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(Copy)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get     => "GET",
            HttpMethod::Head    => "HEAD",
            HttpMethod::Post    => "POST",
            HttpMethod::Put     => "PUT",
            HttpMethod::Patch   => "PATCH",
            HttpMethod::Delete  => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fully-assembled request, as handed to an `HttpTransport`: all header defaults
/// have been applied and the body (if any) has already been serialised.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    pub method:     HttpMethod,
    pub url:        String,
    pub headers:    Vec<(String, String)>,
    pub body:       Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Raw outcome of a single exchange, whatever the status code was.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    pub status:     u16,
    pub headers:    Vec<(String, String)>,
    pub body:       String,
}

impl HttpResponse {
    pub fn new(status: u16, body: &str) -> HttpResponse {
        HttpResponse { status, headers: Vec::new(), body: body.to_string() }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> HttpResponse {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// The exchange never produced a status code (DNS, connection refused, TLS, bad url...).
#[derive(Clone, Debug, PartialEq)]
pub struct TransportFailure {
    pub detail:     String,
}

impl TransportFailure {
    pub fn new(detail: &str) -> TransportFailure {
        TransportFailure { detail: detail.to_string() }
    }
}

// header names are case-insensitive on the wire
pub fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// One request as the rest of the crate describes it, before header defaults
/// and serialisation are applied by `Comm::send()`.
#[derive(Clone, Debug)]
pub struct CommRequest {
    pub method:                 HttpMethod,
    pub url:                    String,
    pub body:                   Option<Value>,
    pub token:                  Option<String>,
    pub headers:                Vec<(String, String)>,
    pub skip_token_recheck:     bool,
}

impl CommRequest {
    pub fn new(method: HttpMethod, url: &str) -> CommRequest {
        CommRequest { method, url: url.to_string(), body: None, token: None, headers: Vec::new(),
                      skip_token_recheck: false }
    }

    pub fn get(url: &str) -> CommRequest {
        CommRequest::new(HttpMethod::Get, url)
    }

    pub fn head(url: &str) -> CommRequest {
        CommRequest::new(HttpMethod::Head, url)
    }

    pub fn post(url: &str, body: Value) -> CommRequest {
        CommRequest::new(HttpMethod::Post, url).with_body(body)
    }

    pub fn put(url: &str, body: Value) -> CommRequest {
        CommRequest::new(HttpMethod::Put, url).with_body(body)
    }

    // image service patches want their own content type
    pub fn patch(url: &str, body: Value) -> CommRequest {
        CommRequest::new(HttpMethod::Patch, url).with_body(body)
            .with_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON_PATCH)
    }

    pub fn delete(url: &str) -> CommRequest {
        CommRequest::new(HttpMethod::Delete, url)
    }

    pub fn with_body(mut self, body: Value) -> CommRequest {
        self.body = Some(body);
        self
    }

    pub fn with_token(mut self, token: Option<&str>) -> CommRequest {
        self.token = token.map(|t| t.to_string());
        self
    }

    /// Extra headers are applied verbatim, after the auth token header.
    pub fn with_header(mut self, name: &str, value: &str) -> CommRequest {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn skip_token_recheck(mut self) -> CommRequest {
        self.skip_token_recheck = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    Empty,
    Text(String),
    Json(Value),
}

impl ResponseBody {
    pub fn json(&self) -> Option<&Value> {
        if let ResponseBody::Json(value) = self {
            return Some(value);
        }

        None
    }
}

/// Successful outcome of `Comm::send()`.
#[derive(Clone, Debug)]
pub struct CommResponse {
    pub status:         u16,
    pub result:         ResponseBody,
    pub headers:        Vec<(String, String)>,

    // identity v3 hands the new token back in a header rather than in the body
    pub subject_token:  Option<String>,
}

impl CommResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Decode the JSON body into a concrete type. An empty or plain-text body is
    /// reported as a malformed body, as callers asking for a type expect JSON.
    pub fn parse<T: serde::de::DeserializeOwned>(self) -> Result<T, CommError> {
        match self.result {
            ResponseBody::Json(value) => {
                serde_json::from_value(value)
                    .map_err(|e| CommError::MalformedBody { status: self.status, detail: e.to_string() })
            },
            ResponseBody::Text(_) => {
                Err(CommError::MalformedBody { status: self.status, detail: "expected JSON, got plain text".to_string() })
            },
            ResponseBody::Empty => {
                Err(CommError::MalformedBody { status: self.status, detail: "expected JSON, got an empty body".to_string() })
            }
        }
    }
}

#[derive(Error, Clone, Debug, PartialEq)]
pub enum CommError {
    /// The server answered with a status outside of the success set.
    #[error("{message}")]
    Status { status: u16, message: String, body: String },

    /// A success status, but a body which couldn't be decoded.
    #[error("malformed response body ({status}): {detail}")]
    MalformedBody { status: u16, detail: String },

    /// No response at all.
    #[error("{message}: {detail}")]
    Transport { message: String, detail: String },
}

impl CommError {
    pub fn from_status(status: u16, body: &str) -> CommError {
        CommError::Status { status, message: format!("{} Error", status), body: body.to_string() }
    }

    pub fn from_failure(failure: TransportFailure) -> CommError {
        CommError::Transport { message: "Error".to_string(), detail: failure.detail }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            CommError::Status { status, .. } => Some(*status),
            CommError::MalformedBody { status, .. } => Some(*status),
            CommError::Transport { .. } => None
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CommError::Status { status: 401, .. })
    }
}
