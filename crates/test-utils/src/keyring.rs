use anyhow::{Context, Result, anyhow, bail};
use chrono::{TimeDelta, Utc};
use credo_core::did::DidUrl;
use credo_oid4vp::IdToken;
use credo_oid4vp::provider::IdTokenSigner;
use credo_vdc::w3c::jose::{self, Algorithm, Header, VcClaims, VpClaims};
use credo_vdc::w3c::{Proof, VerifiablePresentation, W3cCredential, format_date};
use credo_vdc::{DidResolver, ProofConfig, ProofType, Signer, Verifier};
use ed25519_dalek::pkcs8::{EncodePrivateKey, KeypairBytes};
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Validation};
use serde_json::Value;
use sha2::{Digest, Sha256};

// multicodec prefix for an Ed25519 public key
const ED25519_PUB: [u8; 2] = [0xed, 0x01];
const PROOF_TYPE: &str = "Ed25519Signature2020";
const DEFAULT_PURPOSE: &str = "assertionMethod";

/// An Ed25519 key pair identified by a `did:key` DID.
#[derive(Clone, Debug)]
pub struct Keyring {
    signing_key: SigningKey,
    did: String,
}

impl Default for Keyring {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyring {
    /// A keyring with a freshly generated key.
    #[must_use]
    pub fn new() -> Self {
        Self::from_seed(rand::random())
    }

    /// A keyring with a key derived from `seed`.
    #[must_use]
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let mut multikey = ED25519_PUB.to_vec();
        multikey.extend_from_slice(signing_key.verifying_key().as_bytes());
        let did = format!("did:key:z{}", bs58::encode(multikey).into_string());
        Self { signing_key, did }
    }

    #[must_use]
    pub fn did(&self) -> &str {
        &self.did
    }

    /// The key's verification method: `did:key:z...#z...`.
    #[must_use]
    pub fn verification_method(&self) -> String {
        let identifier = self.did.trim_start_matches("did:key:");
        format!("{}#{identifier}", self.did)
    }

    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Present `vp` to `audience` as a JWT signed by the holder's key,
    /// valid for an hour.
    pub fn present(
        &self, vp: VerifiablePresentation, audience: &str, nonce: &str,
    ) -> Result<String> {
        let claims = VpClaims::from_vp(vp, audience, nonce, Utc::now(), TimeDelta::hours(1));
        self.sign_jwt(self.verification_method(), &claims)
    }

    fn sign_jwt<T: serde::Serialize>(&self, kid: String, claims: &T) -> Result<String> {
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some(kid);

        // PKCS#8 v1: secret key only
        let keypair = KeypairBytes {
            secret_key: self.signing_key.to_bytes(),
            public_key: None,
        };
        let der = keypair.to_pkcs8_der().map_err(|e| anyhow!("issue encoding key: {e}"))?;
        Ok(jsonwebtoken::encode(&header, claims, &EncodingKey::from_ed_der(der.as_bytes()))?)
    }
}

impl Signer for Keyring {
    fn sign(&self, credential: &W3cCredential, config: &ProofConfig) -> Result<String> {
        let method =
            config.issuer_verification_method.clone().unwrap_or_else(|| self.verification_method());

        match config.proof_type {
            ProofType::Jwt => {
                let claims = VcClaims::from_vc(credential, config.issue_date.unwrap_or_else(Utc::now));
                self.sign_jwt(method, &claims)
            }
            ProofType::LdProof => {
                let document = credential.without_proof();
                let mut proof = Proof::new(PROOF_TYPE);
                proof.created = Some(format_date(&config.issue_date.unwrap_or_else(Utc::now)));
                proof.proof_purpose =
                    Some(config.proof_purpose.clone().unwrap_or_else(|| DEFAULT_PURPOSE.to_string()));
                proof.verification_method = Some(method);
                proof.domain.clone_from(&config.domain);
                proof.nonce.clone_from(&config.nonce);

                let signature = self.signing_key.sign(&ld_message(&document, &proof)?);
                proof.proof_value =
                    Some(format!("z{}", bs58::encode(signature.to_bytes()).into_string()));
                Ok(document.with_proof(proof).to_json())
            }
        }
    }
}

impl Verifier for Keyring {
    fn verify(&self, credential: &str) -> Result<bool> {
        let credential = credential.trim();
        if !credential.starts_with('{') {
            let header = jose::decode_header(credential)?;
            let kid = header.kid.context("JWT has no `kid`")?;
            let key = resolve_key(&kid)?;

            let mut validation = Validation::new(Algorithm::EdDSA);
            validation.required_spec_claims.clear();
            validation.validate_exp = false;
            validation.validate_aud = false;
            let decoding_key = DecodingKey::from_ed_der(key.as_bytes());
            return match jsonwebtoken::decode::<Value>(credential, &decoding_key, &validation) {
                Ok(_) => Ok(true),
                Err(e) if matches!(e.kind(), ErrorKind::InvalidSignature) => Ok(false),
                Err(e) => Err(e.into()),
            };
        }

        let document = W3cCredential::from_json(credential)?;
        let Some(mut proof) = document.proof() else {
            return Ok(false);
        };
        let Some(value) = proof.proof_value.take() else {
            return Ok(false);
        };
        let method = proof.verification_method.clone().context("proof has no verification method")?;

        let bytes = bs58::decode(value.trim_start_matches('z')).into_vec()?;
        let Ok(signature) = Signature::from_slice(&bytes) else {
            return Ok(false);
        };
        let message = ld_message(&document.without_proof(), &proof)?;
        Ok(resolve_key(&method)?.verify(&message, &signature).is_ok())
    }
}

impl DidResolver for Keyring {
    fn verification_method(&self, did: &str) -> Result<String> {
        let url = DidUrl::parse(did)?;
        if url.method() != "key" {
            bail!("unsupported DID method: {}", url.method());
        }
        Ok(format!("{}#{}", url.did(), url.identifier()))
    }
}

impl IdTokenSigner for Keyring {
    async fn sign_id_token(&self, token: &IdToken) -> Result<String> {
        self.sign_jwt(self.verification_method(), token)
    }
}

// Hash of the proof options followed by the hash of the unsecured document.
fn ld_message(document: &W3cCredential, options: &Proof) -> Result<Vec<u8>> {
    let options = serde_json::to_vec(&options.to_object())?;
    let mut message = Sha256::digest(options).to_vec();
    message.extend_from_slice(&Sha256::digest(document.to_json().as_bytes()));
    Ok(message)
}

// Recover the public key from a `did:key` DID or verification method.
fn resolve_key(method: &str) -> Result<VerifyingKey> {
    let url = DidUrl::parse(method)?;
    if url.method() != "key" {
        bail!("unsupported DID method: {}", url.method());
    }
    let Some(encoded) = url.identifier().strip_prefix('z') else {
        bail!("identifier is not multibase base58btc");
    };
    let multikey = bs58::decode(encoded).into_vec()?;
    let Some(key) = multikey.strip_prefix(&ED25519_PUB) else {
        bail!("not an Ed25519 key");
    };
    let bytes: [u8; 32] = key.try_into().map_err(|_| anyhow!("invalid key length"))?;
    Ok(VerifyingKey::from_bytes(&bytes)?)
}
