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

use super::comm_common::{HttpRequest, HttpResponse, TransportFailure};

/// A single HTTP exchange. Implementations must hand back every response which
/// has a status code (including 4xx/5xx) as an `HttpResponse`, and only use
/// `TransportFailure` when there is no response at all.
pub trait HttpTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure>;
}

pub struct UreqTransport {
    agent:      ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> UreqTransport {
        UreqTransport { agent: ureq::AgentBuilder::new().build() }
    }

    // Use a pre-configured agent (proxy, tls or timeout settings).
    pub fn with_agent(agent: ureq::Agent) -> UreqTransport {
        UreqTransport { agent }
    }

    fn convert_response(response: ureq::Response) -> Result<HttpResponse, TransportFailure> {
        let status = response.status();
        let mut headers = Vec::new();
        for name in response.headers_names() {
            if let Some(value) = response.header(&name) {
                headers.push((name.clone(), value.to_string()));
            }
        }

        let body = response.into_string()
            .map_err(|e| TransportFailure::new(&format!("couldn't read response body: {}", e)))?;

        Ok(HttpResponse { status, headers, body })
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        UreqTransport::new()
    }
}

impl HttpTransport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
        let mut ureq_request = self.agent.request(request.method.as_str(), &request.url);
        for (name, value) in &request.headers {
            ureq_request = ureq_request.set(name, value);
        }

        let resp = match &request.body {
            Some(body) => ureq_request.send_string(body),
            None => ureq_request.call()
        };

        match resp {
            Ok(response) => UreqTransport::convert_response(response),
            // ureq treats >= 400 as an error, but status dispatch is done by the caller...
            Err(ureq::Error::Status(_code, response)) => UreqTransport::convert_response(response),
            Err(ureq::Error::Transport(transport)) => {
                Err(TransportFailure::new(&transport.to_string()))
            }
        }
    }
}

#[cfg(test)]
pub mod scripted {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;

    #[derive(Default)]
    struct ScriptState {
        responses:  VecDeque<Result<HttpResponse, TransportFailure>>,
        sent:       Vec<HttpRequest>,
    }

    /// Test transport which replays canned responses in order and records what was sent.
    /// Clones share the same script, so a test can keep one handle while the session owns another.
    #[derive(Clone, Default)]
    pub struct ScriptedTransport {
        state:      Rc<RefCell<ScriptState>>,
    }

    impl ScriptedTransport {
        pub fn new() -> ScriptedTransport {
            ScriptedTransport::default()
        }

        pub fn push(&self, response: HttpResponse) {
            self.state.borrow_mut().responses.push_back(Ok(response));
        }

        pub fn push_json(&self, status: u16, body: &serde_json::Value) {
            self.push(HttpResponse::new(status, &body.to_string())
                            .with_header("Content-Type", "application/json"));
        }

        pub fn push_failure(&self, detail: &str) {
            self.state.borrow_mut().responses.push_back(Err(TransportFailure::new(detail)));
        }

        pub fn sent(&self) -> Vec<HttpRequest> {
            self.state.borrow().sent.clone()
        }

        pub fn sent_count(&self) -> usize {
            self.state.borrow().sent.len()
        }
    }

    impl HttpTransport for ScriptedTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportFailure> {
            let mut state = self.state.borrow_mut();
            state.sent.push(request.clone());
            state.responses.pop_front()
                .unwrap_or_else(|| Err(TransportFailure::new("no scripted response left")))
        }
    }
}
