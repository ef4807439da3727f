//! # Authorization Response
//!
//! The Self-Issued OpenID Provider's response: a Self-Issued ID Token and the
//! `vp_token` holding the presentations, described to the Verifier by a
//! presentation submission.

use chrono::serde::ts_seconds;
use chrono::{DateTime, TimeDelta, Utc};
use credo_core::{Kind, urlencode};
use credo_vdc::w3c::VerifiablePresentation;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::types::request::Siopv2Request;
use crate::{Result, generate};

/// The issuer of every Self-Issued ID Token.
pub const SELF_ISSUED_V2: &str = "https://self-issued.me/v2";

const ID_TOKEN_LIFETIME: TimeDelta = TimeDelta::hours(1);

/// How the response is delivered to the Verifier.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompatibilityMode {
    /// A form-encoded `POST`, per the `OpenID` specifications.
    #[default]
    Oidc,

    /// A JSON `POST` with each presentation wrapped in a `jwt_vp` envelope,
    /// as the EBSI Wallet Conformance Testing service expects.
    EbsiWct,
}

/// Describes where a presentation sits in the `vp_token`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DescriptorMapping {
    /// Identifies the input descriptor the presentation satisfies.
    pub id: String,

    /// The presentation format: `ldp_vp` or `jwt_vp`.
    pub format: String,

    /// JSON path to the presentation: `$` for a single presentation,
    /// otherwise `$[i]`.
    pub path: String,
}

impl DescriptorMapping {
    /// Describe the presentation at `index` of a `vp_token` holding `count`
    /// presentations.
    #[must_use]
    pub fn from_vp(vp: &Kind<VerifiablePresentation>, index: usize, count: usize) -> Self {
        let (id, format) = match vp {
            Kind::String(_) => (None, "jwt_vp"),
            Kind::Object(vp) => (vp.id.clone(), "ldp_vp"),
        };
        Self {
            id: id.unwrap_or_else(|| index.to_string()),
            format: format.to_string(),
            path: if count == 1 { "$".to_string() } else { format!("$[{index}]") },
        }
    }
}

/// Maps the presentations in a `vp_token` to the Verifier's presentation
/// definition.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PresentationSubmission {
    /// Unique identifier for the submission.
    pub id: String,

    /// The `id` of the presentation definition being satisfied.
    pub definition_id: String,

    /// One entry per presentation.
    pub descriptor_map: Vec<DescriptorMapping>,
}

/// References the `vp_token` from within the ID Token.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct VpTokenRef {
    /// The presentation submission for the `vp_token`.
    pub presentation_submission: PresentationSubmission,
}

/// A Self-Issued ID Token.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct IdToken {
    /// Always [`SELF_ISSUED_V2`].
    pub iss: String,

    /// The subject's DID.
    pub sub: String,

    /// The Verifier the token is intended for.
    pub aud: String,

    /// The `nonce` from the request.
    pub nonce: String,

    /// Issued at, encoded as a UNIX timestamp.
    #[serde(with = "ts_seconds")]
    pub iat: DateTime<Utc>,

    /// Expiry, encoded as a UNIX timestamp.
    #[serde(with = "ts_seconds")]
    pub exp: DateTime<Utc>,

    /// Describes the accompanying `vp_token`.
    #[serde(rename = "_vp_token")]
    pub vp_token: VpTokenRef,
}

/// A SIOPv2 authentication response.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Siopv2Response {
    /// The (unsigned) ID Token.
    pub id_token: IdToken,

    /// Presentations, as JSON documents or compact JWTs.
    pub vp_token: Vec<Kind<VerifiablePresentation>>,
}

#[derive(Serialize)]
struct FormBody<'a> {
    vp_token: Value,
    id_token: &'a str,
    state: Option<&'a str>,
}

impl Siopv2Response {
    /// Respond to `request` as `subject_did`, presenting `presentations`.
    #[must_use]
    pub fn new(
        request: &Siopv2Request, subject_did: impl Into<String>,
        presentations: Vec<Kind<VerifiablePresentation>>,
    ) -> Self {
        let count = presentations.len();
        let descriptor_map = presentations
            .iter()
            .enumerate()
            .map(|(i, vp)| DescriptorMapping::from_vp(vp, i, count))
            .collect();
        let definition_id = request
            .requested_definition()
            .and_then(|d| d.get("id"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let iat = Utc::now();
        Self {
            id_token: IdToken {
                iss: SELF_ISSUED_V2.to_string(),
                sub: subject_did.into(),
                aud: request.client_id.clone().unwrap_or_else(|| request.redirect_uri.clone()),
                nonce: request.nonce.clone(),
                iat,
                exp: iat + ID_TOKEN_LIFETIME,
                vp_token: VpTokenRef {
                    presentation_submission: PresentationSubmission {
                        id: generate::token(),
                        definition_id,
                        descriptor_map,
                    },
                },
            },
            vp_token: presentations,
        }
    }

    /// The `vp_token` value: the presentation itself when there is one,
    /// otherwise an array.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ServerError`] when a presentation cannot be
    /// serialized.
    pub fn vp_token_value(&self) -> Result<Value> {
        let value = match self.vp_token.as_slice() {
            [single] => serde_json::to_value(single),
            many => serde_json::to_value(many),
        };
        Ok(value.map_err(anyhow::Error::from)?)
    }

    /// Encode the response as an `application/x-www-form-urlencoded` body,
    /// using the signed `id_token`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ServerError`] when the response cannot be
    /// encoded.
    pub fn to_form_body(&self, id_token: &str, state: Option<&str>) -> Result<String> {
        let body = FormBody {
            vp_token: self.vp_token_value()?,
            id_token,
            state,
        };
        Ok(urlencode::encode(&body)?)
    }

    /// Encode the response as the JSON body the EBSI conformance service
    /// expects, using the signed `id_token`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ServerError`] when a presentation cannot be
    /// serialized.
    pub fn to_ebsi_wct_json(&self, id_token: &str) -> Result<Value> {
        let mut vp_token = vec![];
        for vp in &self.vp_token {
            let presentation = match vp {
                Kind::String(jwt) => jwt.clone(),
                Kind::Object(vp) => serde_json::to_string(vp).map_err(anyhow::Error::from)?,
            };
            vp_token.push(json!({"format": "jwt_vp", "presentation": presentation}));
        }
        Ok(json!({"id_token": id_token, "vp_token": vp_token}))
    }
}

#[cfg(test)]
mod tests {
    use credo_vdc::W3cCredential;

    use super::*;

    fn request() -> Siopv2Request {
        Siopv2Request {
            redirect_uri: "https://verifier.example/siop".to_string(),
            nonce: "n-0S6".to_string(),
            state: Some("af0if".to_string()),
            ..Siopv2Request::default()
        }
        .presentation_definition(json!({"id": "vid-definition"}))
    }

    fn presentation() -> VerifiablePresentation {
        let vc = W3cCredential::from_json(r#"{"type": ["VerifiableCredential", "VerifiableId"]}"#)
            .expect("should parse");
        VerifiablePresentation::new("did:example:holder", vec![Kind::Object(vc)])
    }

    #[test]
    fn id_token() {
        let vp = presentation();
        let response = Siopv2Response::new(&request(), "did:example:holder", vec![Kind::Object(vp.clone())]);

        let token = &response.id_token;
        assert_eq!(token.iss, SELF_ISSUED_V2);
        assert_eq!(token.sub, "did:example:holder");
        assert_eq!(token.aud, "https://verifier.example/siop");
        assert_eq!(token.nonce, "n-0S6");
        assert_eq!(token.exp - token.iat, ID_TOKEN_LIFETIME);

        let submission = &token.vp_token.presentation_submission;
        assert_eq!(submission.definition_id, "vid-definition");
        assert_eq!(
            submission.descriptor_map,
            [DescriptorMapping {
                id: vp.id.clone().expect("should have id"),
                format: "ldp_vp".to_string(),
                path: "$".to_string(),
            }]
        );

        let value = serde_json::to_value(token).expect("should serialize");
        assert!(value.get("_vp_token").is_some());
    }

    #[test]
    fn many_presentations() {
        let response = Siopv2Response::new(
            &request(),
            "did:example:holder",
            vec![Kind::Object(presentation()), Kind::String("eyJ.eyJ.sig".to_string())],
        );

        let map = &response.id_token.vp_token.presentation_submission.descriptor_map;
        assert_eq!(map[0].path, "$[0]");
        assert_eq!(map[1].path, "$[1]");
        assert_eq!(map[1].format, "jwt_vp");
        assert!(response.vp_token_value().expect("should serialize").is_array());
    }

    #[test]
    fn form_body() {
        let response =
            Siopv2Response::new(&request(), "did:example:holder", vec![Kind::String("eyJ.eyJ.sig".to_string())]);
        let body = response.to_form_body("eyJh.eyJp.c2ln", Some("af0if")).expect("should encode");
        assert_eq!(body, "vp_token=eyJ.eyJ.sig&id_token=eyJh.eyJp.c2ln&state=af0if");

        let body = response.to_form_body("eyJh.eyJp.c2ln", None).expect("should encode");
        assert!(!body.contains("state="));
    }

    #[test]
    fn ebsi_wct_json() {
        let vp = presentation();
        let response = Siopv2Response::new(&request(), "did:example:holder", vec![Kind::Object(vp.clone())]);
        let body = response.to_ebsi_wct_json("eyJh.eyJp.c2ln").expect("should encode");

        assert_eq!(body["id_token"], json!("eyJh.eyJp.c2ln"));
        assert_eq!(body["vp_token"][0]["format"], json!("jwt_vp"));
        let presentation = body["vp_token"][0]["presentation"].as_str().expect("should be a string");
        let parsed: VerifiablePresentation = serde_json::from_str(presentation).expect("should parse");
        assert_eq!(parsed, vp);
    }
}
