//! Issue credentials with an Ed25519 keyring and check them the way a
//! verifier would.

use chrono::{TimeZone, Utc};
use credo_vdc::w3c::jose::{self, Algorithm, VcClaims};
use credo_vdc::w3c::{CredentialBuilder, Issuer, W3cCredential};
use credo_vdc::{
    Error, MergingDataProvider, ProofConfig, ProofType, Signatory, TypedCredential, Verifier,
};
use serde_json::{Map, Value, json};
use test_utils::Keyring;

fn inco() -> CredentialBuilder {
    CredentialBuilder::from_partial_json(r#"{"type": ["VerifiableCredential"]}"#)
        .expect("should parse")
        .subject(|s| s.property("firstName", "Inco").property("familyName", "GNITO"))
}

#[test]
fn ld_proof() {
    let keyring = Keyring::new();
    let signatory = Signatory::new(&keyring, &keyring);
    let config = ProofConfig::new(keyring.did(), keyring.did());

    let issued = signatory.issue(inco(), &config, None).expect("should issue");
    let vc = W3cCredential::from_any(&issued).expect("should parse");

    assert_eq!(vc.subject_claim("firstName"), Some(&json!("Inco")));
    assert_eq!(vc.subject_claim("familyName"), Some(&json!("GNITO")));
    assert_eq!(vc.issuer_id(), Some(keyring.did()));
    assert_eq!(vc.subject(), Some(keyring.did()));
    assert!(vc.id().is_some_and(|id| id.starts_with("urn:uuid:")));
    assert!(vc.issued().is_some());

    let proof = vc.proof().expect("should have proof");
    assert_eq!(proof.verification_method, Some(keyring.verification_method()));
    assert_eq!(proof.proof_purpose.as_deref(), Some("assertionMethod"));
    assert!(keyring.verify(&issued).expect("should verify"));
}

#[test]
fn tampered_ld_proof() {
    let keyring = Keyring::new();
    let signatory = Signatory::new(&keyring, &keyring);
    let config = ProofConfig::new(keyring.did(), keyring.did());

    let issued = signatory.issue(inco(), &config, None).expect("should issue");
    let tampered = issued.replace("Inco", "Mallory");
    assert!(!keyring.verify(&tampered).expect("should check"));
}

#[test]
fn jwt() {
    let keyring = Keyring::new();
    let signatory = Signatory::new(&keyring, &keyring);
    let issued_at = Utc.with_ymd_and_hms(2020, 11, 3, 0, 0, 0).unwrap();
    let config = ProofConfig::new(keyring.did(), keyring.did())
        .proof_type(ProofType::Jwt)
        .issue_date(issued_at);

    let jwt = signatory.issue(inco(), &config, None).expect("should issue");

    let header = jose::decode_header(&jwt).expect("should decode header");
    assert_eq!(header.alg, Algorithm::EdDSA);
    assert_eq!(header.kid, Some(keyring.verification_method()));

    let claims: VcClaims = jose::decode_payload(&jwt).expect("should decode claims");
    assert_eq!(claims.iss, keyring.did());
    assert_eq!(claims.sub, keyring.did());
    assert_eq!(claims.iat, issued_at);
    assert_eq!(claims.nbf, Some(issued_at));
    assert!(claims.vc.proof().is_none());
    assert_eq!(claims.vc.issued(), Some("2020-11-03T00:00:00Z"));

    let vc = W3cCredential::from_any(&jwt).expect("should parse");
    assert_eq!(vc.subject_claim("firstName"), Some(&json!("Inco")));
    assert!(keyring.verify(&jwt).expect("should verify"));

    // a signature by another key over another credential
    let other = Keyring::new();
    let other_config = ProofConfig::new(other.did(), other.did()).proof_type(ProofType::Jwt);
    let other_jwt = Signatory::new(&other, &other).issue(inco(), &other_config, None).unwrap();
    let (input, _) = jwt.rsplit_once('.').unwrap();
    let (_, signature) = other_jwt.rsplit_once('.').unwrap();
    assert!(!keyring.verify(&format!("{input}.{signature}")).expect("should check"));
}

#[test]
fn structured_issuer() {
    let keyring = Keyring::new();
    let signatory = Signatory::new(&keyring, &keyring);
    let config = ProofConfig::new(keyring.did(), keyring.did());

    let mut properties = Map::new();
    properties.insert("name".to_string(), json!("Test Issuer"));
    let issuer = Issuer::new("did:example:placeholder", properties);

    let issued = signatory.issue(inco(), &config, Some(issuer)).expect("should issue");
    let vc = W3cCredential::from_any(&issued).expect("should parse");
    assert_eq!(vc.property("issuer"), Some(&json!({"id": keyring.did(), "name": "Test Issuer"})));
    assert!(keyring.verify(&issued).expect("should verify"));
}

#[test]
fn verifiable_id_template() {
    let keyring = Keyring::new();
    let signatory = Signatory::new(&keyring, &keyring);
    let config = ProofConfig::new(keyring.did(), keyring.did());
    let provider = MergingDataProvider::from_json(r#"{"credentialSubject": {"firstName": "Yves"}}"#)
        .expect("should parse");

    let issued =
        signatory.issue_template("VerifiableId", &config, &provider).expect("should issue");
    assert!(keyring.verify(&issued).expect("should verify"));

    let vc = W3cCredential::from_any(&issued).expect("should parse");
    let TypedCredential::VerifiableId(id) = TypedCredential::from(vc) else {
        panic!("should resolve to VerifiableId");
    };
    assert_eq!(id.first_name(), Some("Yves"));
    assert_eq!(id.family_name(), Some("DOE"));
    assert_eq!(id.subject(), Some(keyring.did()));
    assert_eq!(id.issuer_id(), Some(keyring.did()));
    assert_ne!(id.id(), Some("urn:uuid:3add94f4-28ec-42a1-8704-4e4aa51006b4"));
}

#[test]
fn verifiable_diploma_template() {
    let keyring = Keyring::new();
    let signatory = Signatory::new(&keyring, &keyring);
    let config = ProofConfig::new(keyring.did(), keyring.did()).proof_type(ProofType::Jwt);

    let jwt = signatory
        .issue_template("VerifiableDiploma", &config, &MergingDataProvider::default())
        .expect("should issue");
    assert!(keyring.verify(&jwt).expect("should verify"));

    let vc = W3cCredential::from_any(&jwt).expect("should parse");
    let TypedCredential::VerifiableDiploma(diploma) = TypedCredential::from(vc) else {
        panic!("should resolve to VerifiableDiploma");
    };
    assert_eq!(diploma.awarding_body_name(), Some("Leaston University"));
    assert_eq!(
        diploma.learning_achievement_title(),
        Some("MASTERS LAW, ECONOMICS AND MANAGEMENT")
    );
}

#[test]
fn unknown_template() {
    let keyring = Keyring::new();
    let signatory = Signatory::new(&keyring, &keyring);
    let config = ProofConfig::new(keyring.did(), keyring.did());

    let result = signatory.issue_template("PassportCredential", &config, &MergingDataProvider::default());
    assert!(matches!(result, Err(Error::TemplateNotFound(_))));
}

#[test]
fn unresolvable_issuer() {
    let keyring = Keyring::new();
    let signatory = Signatory::new(&keyring, &keyring);
    let config = ProofConfig::new("did:web:issuer.example", keyring.did());

    let result = signatory.issue(inco(), &config, None);
    assert!(matches!(result, Err(Error::Resolution(_))));
}

#[test]
fn round_trip_preserves_extensions() {
    let keyring = Keyring::new();
    let signatory = Signatory::new(&keyring, &keyring);
    let config = ProofConfig::new(keyring.did(), keyring.did());

    let builder = inco().property("evidence", json!([{"type": ["DocumentVerification"]}]));
    let issued = signatory.issue(builder, &config, None).expect("should issue");
    let vc = W3cCredential::from_any(&issued).expect("should parse");

    assert_eq!(vc.property("evidence"), Some(&json!([{"type": ["DocumentVerification"]}])));
    let reparsed = W3cCredential::from_json(&vc.to_json()).expect("should reparse");
    assert_eq!(reparsed, vc);
    assert!(matches!(vc.property("proof"), Some(Value::Object(_))));
}
