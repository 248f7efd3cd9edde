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

use tracing::{debug, warn};

use super::comm_common::{CommRequest, CommResponse, CommError, ResponseBody, HttpRequest, HttpResponse};
use super::comm_common::{HEADER_AUTH_TOKEN, HEADER_SUBJECT_TOKEN, HEADER_CONTENT_TYPE, HEADER_ACCEPT};
use super::comm_common::{CONTENT_TYPE_JSON, CONTENT_TYPE_PLAIN_TEXT};
use super::comm_transport::HttpTransport;

/// Side-channel invoked when a request comes back with 401 Unauthorized.
/// Whatever the hook does, the original 401 error is still returned to the caller.
pub trait UnauthorizedHook {
    fn on_unauthorized(&self, request: &CommRequest);
}

pub fn is_success_status(status: u16) -> bool {
    status == 100 || (200..=207).contains(&status)
}

pub struct Comm {
    transport:      Box<dyn HttpTransport>,
}

impl Comm {
    pub fn new(transport: Box<dyn HttpTransport>) -> Comm {
        Comm { transport }
    }

    /// Perform exactly one HTTP exchange and normalise it into a single success or error.
    pub fn send(&self, request: &CommRequest, hook: Option<&dyn UnauthorizedHook>) -> Result<CommResponse, CommError> {
        let http_request = Comm::build_http_request(request)?;

        debug!(method = %request.method, url = %request.url, "sending request");

        let response = self.transport.execute(&http_request).map_err(|failure| {
            warn!(method = %request.method, url = %request.url, detail = %failure.detail, "request failed without a response");
            CommError::from_failure(failure)
        })?;

        if !is_success_status(response.status) {
            debug!(status = response.status, url = %request.url, "error response");

            if response.status == 401 && !request.skip_token_recheck {
                if let Some(hook) = hook {
                    hook.on_unauthorized(request);
                }
            }

            return Err(CommError::from_status(response.status, &response.body));
        }

        Comm::convert_success(response)
    }

    fn build_http_request(request: &CommRequest) -> Result<HttpRequest, CommError> {
        let mut headers = Vec::with_capacity(request.headers.len() + 3);

        // an explicit header from the caller wins over the token
        let caller_token = request.headers.iter().any(|(name, _)| name.eq_ignore_ascii_case(HEADER_AUTH_TOKEN));
        if let Some(token) = &request.token {
            if !caller_token {
                headers.push((HEADER_AUTH_TOKEN.to_string(), token.clone()));
            }
        }

        let mut has_content_type = false;
        let mut has_accept = false;
        for (name, value) in &request.headers {
            if name.eq_ignore_ascii_case(HEADER_CONTENT_TYPE) {
                has_content_type = true;
            }
            if name.eq_ignore_ascii_case(HEADER_ACCEPT) {
                has_accept = true;
            }
            headers.push((name.clone(), value.clone()));
        }

        let body = match &request.body {
            Some(value) => {
                let serialised = serde_json::to_string(value)
                    .map_err(|e| CommError::Transport { message: "Error".to_string(), detail: format!("couldn't serialise request body: {}", e) })?;
                Some(serialised)
            },
            None => None
        };

        if body.is_some() && !has_content_type {
            headers.push((HEADER_CONTENT_TYPE.to_string(), CONTENT_TYPE_JSON.to_string()));
        }

        if !has_accept {
            headers.push((HEADER_ACCEPT.to_string(), CONTENT_TYPE_JSON.to_string()));
        }

        Ok(HttpRequest { method: request.method, url: request.url.clone(), headers, body })
    }

    fn convert_success(response: HttpResponse) -> Result<CommResponse, CommError> {
        let subject_token = response.header(HEADER_SUBJECT_TOKEN).map(|t| t.to_string());

        let result = if response.body.is_empty() {
            ResponseBody::Empty
        }
        else if response.header(HEADER_CONTENT_TYPE) == Some(CONTENT_TYPE_PLAIN_TEXT) {
            ResponseBody::Text(response.body.clone())
        }
        else {
            let value = serde_json::from_str(&response.body)
                .map_err(|e| CommError::MalformedBody { status: response.status, detail: e.to_string() })?;
            ResponseBody::Json(value)
        };

        Ok(CommResponse { status: response.status, result, headers: response.headers, subject_token })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;
    use crate::comm::comm_common::HttpMethod;
    use crate::comm::comm_transport::scripted::ScriptedTransport;

    struct CountingHook {
        calls:  Cell<u32>,
    }

    impl UnauthorizedHook for CountingHook {
        fn on_unauthorized(&self, _request: &CommRequest) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    fn comm_with_script() -> (Comm, ScriptedTransport) {
        let script = ScriptedTransport::new();
        (Comm::new(Box::new(script.clone())), script)
    }

    #[test]
    fn test_success_status_set() {
        assert!(is_success_status(100));
        assert!(is_success_status(200));
        assert!(is_success_status(204));
        assert!(is_success_status(207));

        assert!(!is_success_status(101));
        assert!(!is_success_status(208));
        assert!(!is_success_status(301));
        assert!(!is_success_status(401));
        assert!(!is_success_status(500));
    }

    #[test]
    fn test_default_headers_with_body() {
        let (comm, script) = comm_with_script();
        script.push(HttpResponse::new(204, ""));

        let request = CommRequest::post("http://host/things", json!({"a": 1})).with_token(Some("tok"));
        let res = comm.send(&request, None).unwrap();
        assert_eq!(res.result, ResponseBody::Empty);

        let sent = script.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].header("x-auth-token"), Some("tok"));
        assert_eq!(sent[0].header("Content-Type"), Some("application/json"));
        assert_eq!(sent[0].header("Accept"), Some("application/json"));
        assert_eq!(sent[0].body.as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_no_content_type_without_body() {
        let (comm, script) = comm_with_script();
        script.push(HttpResponse::new(200, ""));

        comm.send(&CommRequest::get("http://host/things"), None).unwrap();

        let sent = script.sent();
        assert!(sent[0].header("Content-Type").is_none());
        assert!(sent[0].header("X-Auth-Token").is_none());
        assert_eq!(sent[0].header("Accept"), Some("application/json"));
    }

    #[test]
    fn test_caller_headers_override_defaults() {
        let (comm, script) = comm_with_script();
        script.push(HttpResponse::new(200, ""));

        let request = CommRequest::patch("http://host/images/1", json!([]))
                            .with_header("Accept", "text/plain");
        comm.send(&request, None).unwrap();

        let sent = script.sent();
        assert_eq!(sent[0].header("Content-Type"), Some("application/openstack-images-v2.1-json-patch"));
        assert_eq!(sent[0].header("Accept"), Some("text/plain"));
        // no doubled-up defaults
        assert_eq!(sent[0].headers.len(), 2);
    }

    #[test]
    fn test_caller_token_header_not_doubled() {
        let (comm, script) = comm_with_script();
        script.push(HttpResponse::new(200, ""));

        let request = CommRequest::get("http://host/things").with_token(Some("session-tok"))
                            .with_header("x-auth-token", "other-tok");
        comm.send(&request, None).unwrap();

        let sent = script.sent();
        let tokens: Vec<&(String, String)> = sent[0].headers.iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("X-Auth-Token"))
            .collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(sent[0].header("X-Auth-Token"), Some("other-tok"));
    }

    #[test]
    fn test_put_and_head() {
        let (comm, script) = comm_with_script();
        script.push(HttpResponse::new(200, r#"{"ok": true}"#));
        script.push(HttpResponse::new(204, ""));

        let res = comm.send(&CommRequest::put("http://host/things/1", json!({"name": "b"})), None).unwrap();
        assert_eq!(res.result.json(), Some(&json!({"ok": true})));

        let res = comm.send(&CommRequest::head("http://host/things/1"), None).unwrap();
        assert_eq!(res.result, ResponseBody::Empty);

        let sent = script.sent();
        assert_eq!(sent[0].method, HttpMethod::Put);
        assert_eq!(sent[0].header("Content-Type"), Some("application/json"));
        assert_eq!(sent[1].method, HttpMethod::Head);
        assert!(sent[1].body.is_none());
    }

    #[test]
    fn test_plain_text_passthrough() {
        let (comm, script) = comm_with_script();
        script.push(HttpResponse::new(200, "not { json")
                        .with_header("content-type", "text/plain; charset=utf-8"));

        let res = comm.send(&CommRequest::get("http://host/console"), None).unwrap();
        assert_eq!(res.result, ResponseBody::Text("not { json".to_string()));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let (comm, script) = comm_with_script();
        // a near-miss of the plain text content type still means JSON
        script.push(HttpResponse::new(200, "not { json")
                        .with_header("Content-Type", "text/plain"));

        let res = comm.send(&CommRequest::get("http://host/console"), None);
        assert!(matches!(res, Err(CommError::MalformedBody { status: 200, .. })));
    }

    #[test]
    fn test_subject_token_extracted() {
        let (comm, script) = comm_with_script();
        script.push(HttpResponse::new(201, r#"{"token": {}}"#)
                        .with_header("x-subject-token", "abc123"));

        let res = comm.send(&CommRequest::post("http://host/v3/auth/tokens", json!({})), None).unwrap();
        assert_eq!(res.subject_token, Some("abc123".to_string()));
        assert_eq!(res.result.json(), Some(&json!({"token": {}})));
    }

    #[test]
    fn test_error_status_message() {
        let (comm, script) = comm_with_script();
        script.push(HttpResponse::new(404, "itemNotFound"));

        let res = comm.send(&CommRequest::get("http://host/servers/1"), None);
        assert_eq!(res.err(), Some(CommError::Status { status: 404, message: "404 Error".to_string(),
                                                        body: "itemNotFound".to_string() }));
    }

    #[test]
    fn test_unauthorized_calls_hook_once() {
        let (comm, script) = comm_with_script();
        script.push(HttpResponse::new(401, "denied"));

        let hook = CountingHook { calls: Cell::new(0) };
        let res = comm.send(&CommRequest::get("http://host/servers"), Some(&hook));

        assert_eq!(hook.calls.get(), 1);
        let err = res.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "401 Error");
    }

    #[test]
    fn test_unauthorized_skip_recheck() {
        let (comm, script) = comm_with_script();
        script.push(HttpResponse::new(401, "denied"));
        script.push(HttpResponse::new(403, "forbidden"));

        let hook = CountingHook { calls: Cell::new(0) };
        let res = comm.send(&CommRequest::get("http://host/servers").skip_token_recheck(), Some(&hook));
        assert!(res.unwrap_err().is_unauthorized());

        // only 401 triggers the hook
        let res = comm.send(&CommRequest::get("http://host/servers"), Some(&hook));
        assert_eq!(res.unwrap_err().status(), Some(403));

        assert_eq!(hook.calls.get(), 0);
    }

    #[test]
    fn test_transport_failure() {
        let (comm, script) = comm_with_script();
        script.push_failure("connection refused");

        let res = comm.send(&CommRequest::get("http://host/servers"), None);
        assert_eq!(res.err(), Some(CommError::Transport { message: "Error".to_string(),
                                                           detail: "connection refused".to_string() }));
    }
}
