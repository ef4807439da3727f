use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow, bail};
use credo_oid4vp::Siopv2Request;
use credo_oid4vp::provider::{HttpResponse, Transport};
use http::StatusCode;
use serde_json::{Value, json};

pub const VERIFIER_URL: &str = "https://verifier.example";
pub const REDIRECT_URI: &str = "https://verifier.example/siop";
pub const SUCCESS_URI: &str = "https://verifier.example/success";

/// A request body received by the verifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Received {
    Form { url: String, body: String },
    Json { url: String, body: Value },
}

/// An in-memory Verifier: serves one authentication request and records
/// the responses posted to it.
#[derive(Clone, Debug)]
pub struct MockVerifier {
    request: Siopv2Request,
    offline: bool,
    received: Arc<Mutex<Vec<Received>>>,
}

impl MockVerifier {
    /// A verifier requesting presentations matching `definition`.
    #[must_use]
    pub fn new(definition: Value) -> Self {
        let mut request = Siopv2Request::new(REDIRECT_URI).presentation_definition(definition);
        request.client_id = Some(VERIFIER_URL.to_string());
        Self {
            request,
            offline: false,
            received: Arc::default(),
        }
    }

    /// A verifier that cannot be reached.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::new(json!({"id": "offline"}))
        }
    }

    #[must_use]
    pub const fn request(&self) -> &Siopv2Request {
        &self.request
    }

    /// Responses posted so far.
    pub fn received(&self) -> Result<Vec<Received>> {
        let received = self.received.lock().map_err(|_| anyhow!("lock poisoned"))?;
        Ok(received.clone())
    }

    fn record(&self, received: Received) -> Result<()> {
        if self.offline {
            bail!("connection refused");
        }
        self.received.lock().map_err(|_| anyhow!("lock poisoned"))?.push(received);
        Ok(())
    }
}

impl Transport for MockVerifier {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        if self.offline {
            bail!("connection refused");
        }
        if url != format!("{VERIFIER_URL}/authentication-requests") {
            return Ok(HttpResponse::new(StatusCode::NOT_FOUND, "not found"));
        }
        Ok(HttpResponse::new(StatusCode::OK, self.request.to_uri("openid://")?))
    }

    async fn post_form(&self, url: &str, body: &str) -> Result<HttpResponse> {
        self.record(Received::Form {
            url: url.to_string(),
            body: body.to_string(),
        })?;
        let state = self.request.state.clone().unwrap_or_default();
        Ok(HttpResponse::redirect(format!("{SUCCESS_URI}?state={state}")))
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse> {
        self.record(Received::Json {
            url: url.to_string(),
            body: body.clone(),
        })?;
        Ok(HttpResponse::new(StatusCode::OK, r#"{"result":"ok"}"#))
    }
}
