//! # Authorization Request
//!
//! A Self-Issued OpenID Provider v2 authentication request, as sent by a
//! Verifier in a request URI (e.g. `openid://?response_type=id_token&...`).
//! Parameters carried in a `request` object override those in the query.

use credo_core::urlencode;
use credo_vdc::w3c::jose;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::invalid;
use crate::{Result, generate};

const DEFAULT_RESPONSE_MODE: &str = "fragment";

/// A SIOPv2 authentication request.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Siopv2Request {
    /// The response type, usually `id_token` or `vp_token id_token`.
    #[serde(default = "default_response_type")]
    pub response_type: String,

    /// The Verifier's client identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Where the response is sent.
    #[serde(default)]
    pub redirect_uri: String,

    /// How the response is returned: `fragment`, `query`, `form_post` or
    /// `post`.
    #[serde(default = "default_response_mode")]
    pub response_mode: String,

    /// The request scope, e.g. `openid`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Binds the ID Token to this request.
    #[serde(default)]
    pub nonce: String,

    /// Requested claims, including the `vp_token` presentation definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<Map<String, Value>>,

    /// Opaque Verifier state, returned unchanged in the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// A request object (JWT) carrying request parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
}

fn default_response_type() -> String {
    "id_token".to_string()
}

fn default_response_mode() -> String {
    DEFAULT_RESPONSE_MODE.to_string()
}

impl Siopv2Request {
    /// Create a request for a response at `redirect_uri`, with a fresh nonce
    /// and state.
    #[must_use]
    pub fn new(redirect_uri: impl Into<String>) -> Self {
        Self {
            response_type: default_response_type(),
            redirect_uri: redirect_uri.into(),
            response_mode: default_response_mode(),
            scope: Some("openid".to_string()),
            nonce: generate::nonce(),
            state: Some(generate::state()),
            ..Self::default()
        }
    }

    /// Request presentations matching `definition`.
    #[must_use]
    pub fn presentation_definition(mut self, definition: Value) -> Self {
        let mut vp_token = Map::new();
        vp_token.insert("presentation_definition".to_string(), definition);
        self.claims
            .get_or_insert_with(Map::new)
            .insert("vp_token".to_string(), Value::Object(vp_token));
        self.response_type = "vp_token id_token".to_string();
        self
    }

    /// Parse a request from a request URI or a bare query string.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidRequest`] when the query cannot be
    /// decoded, the request object is not a JWT, or no `redirect_uri` is
    /// given.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let query = urlencode::query(uri.trim());
        let mut request: Self =
            urlencode::decode(query).map_err(|e| invalid!("issue decoding request: {e}"))?;

        if let Some(jwt) = request.request.take() {
            let object: Map<String, Value> = jose::decode_payload(&jwt)?;
            request.apply(object)?;
        }
        if request.redirect_uri.is_empty() {
            return Err(invalid!("request has no `redirect_uri`"));
        }

        tracing::debug!("parsed request for {}", request.redirect_uri);
        Ok(request)
    }

    /// Render the request as a URI under `base`, e.g. `openid://`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ServerError`] when the request cannot be
    /// encoded.
    pub fn to_uri(&self, base: &str) -> Result<String> {
        let query = urlencode::encode(self)?;
        Ok(format!("{base}?{query}"))
    }

    /// The presentation definition the Verifier requested, if any.
    #[must_use]
    pub fn requested_definition(&self) -> Option<&Value> {
        self.claims.as_ref()?.get("vp_token")?.get("presentation_definition")
    }

    // Overlay request object claims onto the query parameters.
    fn apply(&mut self, mut object: Map<String, Value>) -> Result<()> {
        // the request object is authoritative for the parameters it carries
        object.retain(|_, v| !v.is_null());
        let mut current = match serde_json::to_value(&*self) {
            Ok(Value::Object(current)) => current,
            _ => return Err(invalid!("issue reading request")),
        };
        current.extend(object);
        *self = serde_json::from_value(Value::Object(current))
            .map_err(|e| invalid!("issue decoding request object: {e}"))?;
        Ok(())
    }
}
