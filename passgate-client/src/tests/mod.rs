use passgate_types::{
    encoding,
    provider::{
        ApiResponse, ChallengeBundle, RegisteredCredential, RegistrationChallenge,
        RegistrationResult,
    },
    token::TokenBundle,
    webauthn::{
        AttestationConveyancePreference, AuthenticatedPublicKeyCredential,
        AuthenticatorAssertionResponse, AuthenticatorAttachment, AuthenticatorAttestationResponse,
        AuthenticatorTransport, CreatedPublicKeyCredential, PublicKeyCredential,
        PublicKeyCredentialType,
    },
};
use serde_json::json;

use super::*;
use crate::{
    authenticator::MockPlatformAuthenticator, backend::MockIdentityBackend,
    prompt::MockCredentialPrompt,
};

fn config() -> ClientConfig {
    ClientConfig::new("app.example.com", "https://app.example.com/oauth2/code")
}

/// A compact serialized token whose payload segment carries `claims`.
fn compact_token(claims: serde_json::Value) -> String {
    format!(
        "header.{}.signature",
        encoding::base64url(claims.to_string().as_bytes())
    )
}

fn token_envelope(access_token: &str) -> ApiResponse<TokenBundle> {
    ApiResponse {
        success: true,
        message: None,
        error: None,
        data: Some(TokenBundle {
            access_token: Some(access_token.to_owned()),
            refresh_token: Some("refresh-token-1".to_owned()),
            token_type: Some("Bearer".to_owned()),
            expires_in: Some(3600),
            ..TokenBundle::default()
        }),
    }
}

fn rejection<T>(detail: &str) -> ApiResponse<T> {
    ApiResponse {
        success: false,
        message: Some("see the error field".to_owned()),
        error: Some(detail.to_owned()),
        data: None,
    }
}

/// A backend that answers one password login for `alice` with `token`.
fn backend_with_login(token: &str) -> MockIdentityBackend {
    let envelope_token = token.to_owned();
    let mut backend = MockIdentityBackend::new();
    backend
        .expect_password_login()
        .withf(|username, _| username == "alice")
        .returning(move |_, _| Ok(token_envelope(&envelope_token)))
        .times(1);
    backend
}

fn registration_challenge() -> RegistrationChallenge {
    RegistrationChallenge {
        public_key_credential_creation_options: serde_json::from_value(json!({
            "rp": { "name": "Example" },
            "user": {
                "id": "YWxpY2UtaWQ",
                "name": "alice",
                "displayName": "Alice A"
            },
            "challenge": "cmVnaXN0cmF0aW9uLWNoYWxsZW5nZQ",
            "pubKeyCredParams": [{ "type": "public-key", "alg": -7 }]
        }))
        .expect("failed to parse the creation options fixture"),
        request_id: Some("registration-request-1".to_owned()),
    }
}

fn assertion_challenge_envelope() -> ApiResponse<ChallengeBundle> {
    ApiResponse {
        success: true,
        message: None,
        error: None,
        data: Some(
            serde_json::from_value(json!({
                "publicKeyCredentialRequestOptions": {
                    "challenge": "YXNzZXJ0aW9uLWNoYWxsZW5nZQ",
                    "allowCredentials": [{
                        "type": "public-key",
                        "id": "Y3JlZDEyMw",
                        "transports": ["internal"]
                    }]
                },
                "requestId": "assertion-request-1"
            }))
            .expect("failed to parse the challenge bundle fixture"),
        ),
    }
}

fn created_credential(raw_id: &[u8]) -> CreatedPublicKeyCredential {
    PublicKeyCredential {
        id: encoding::base64url(raw_id),
        raw_id: raw_id.to_vec().into(),
        ty: PublicKeyCredentialType::PublicKey,
        response: AuthenticatorAttestationResponse {
            client_data_json: b"client-data".to_vec().into(),
            authenticator_data: b"authenticator-data".to_vec().into(),
            attestation_object: b"attestation-object".to_vec().into(),
            transports: Some(vec![AuthenticatorTransport::Internal]),
        },
        authenticator_attachment: Some(AuthenticatorAttachment::Platform),
    }
}

fn assertion_credential(raw_id: &[u8]) -> AuthenticatedPublicKeyCredential {
    PublicKeyCredential {
        id: encoding::base64url(raw_id),
        raw_id: raw_id.to_vec().into(),
        ty: PublicKeyCredentialType::PublicKey,
        response: AuthenticatorAssertionResponse {
            client_data_json: b"client-data".to_vec().into(),
            authenticator_data: b"assertion-data".to_vec().into(),
            signature: b"assertion-signature".to_vec().into(),
            user_handle: None,
        },
        authenticator_attachment: Some(AuthenticatorAttachment::Platform),
    }
}

/// An authenticator that answers one assertion request with a credential
/// whose raw id is `raw_id`.
fn assertion_mock(raw_id: &'static [u8]) -> MockPlatformAuthenticator {
    let mut authenticator = MockPlatformAuthenticator::new();
    authenticator
        .expect_prevent_silent_access()
        .returning(|| ())
        .times(1);
    authenticator
        .expect_get_assertion()
        .returning(move |_| Ok(assertion_credential(raw_id)))
        .times(1);
    authenticator
}

#[tokio::test]
async fn password_login_establishes_the_session() {
    let token = compact_token(json!({ "sub": "alice", "name": "Alice A" }));
    let mut client = Client::new(
        config(),
        backend_with_login(&token),
        MockPlatformAuthenticator::new(),
        MemoryStore::new(),
        NoPrompt,
    );

    client
        .login("alice", "correct horse")
        .await
        .expect("login failed");

    assert_eq!(client.session().principal(), Some("alice"));
    assert_eq!(client.session().display_name(), Some("Alice A"));
    assert_eq!(client.session().access_token(), Some(token.as_str()));
    assert!(client.session().is_authenticated());

    let stored = client
        .store()
        .stored_tokens()
        .expect("login should persist the token bundle");
    assert_eq!(stored.access_token.as_deref(), Some(token.as_str()));
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-token-1"));
}

#[tokio::test]
async fn a_rejected_login_carries_the_provider_detail() {
    let mut backend = MockIdentityBackend::new();
    backend
        .expect_password_login()
        .returning(|_, _| Ok(rejection("invalid credentials")))
        .times(1);
    let mut client = Client::new(
        config(),
        backend,
        MockPlatformAuthenticator::new(),
        MemoryStore::new(),
        NoPrompt,
    );

    let error = client
        .login("alice", "wrong")
        .await
        .expect_err("login should fail");

    assert_eq!(
        error,
        CeremonyError::Backend {
            stage: CeremonyState::Initiating,
            source: BackendError::Rejected("invalid credentials".to_owned()),
        }
    );
    assert!(!error.is_verify_failure());
    assert!(client.session().access_token().is_none());
    assert!(client.store().stored_tokens().is_none());
}

#[tokio::test]
async fn registration_sends_the_attestation_and_keeps_the_echoed_id() {
    let token = compact_token(json!({ "sub": "alice", "name": "Alice A" }));
    let options_bearer = token.clone();
    let verify_bearer = token.clone();

    let mut backend = backend_with_login(&token);
    backend
        .expect_registration_options()
        .withf(move |request, bearer| {
            request.username == "alice"
                && request.display_name == "Alice A"
                && bearer == &options_bearer
        })
        .returning(|_, _| Ok(registration_challenge()))
        .times(1);
    backend
        .expect_register()
        .withf(move |request, bearer| {
            request.username == "alice"
                && request.display_name == "Alice A"
                && request.request_id.as_deref() == Some("registration-request-1")
                && *request.raw_id == b"cred123".to_vec()
                && *request.attestation_object == b"attestation-object".to_vec()
                && *request.client_data_json == b"client-data".to_vec()
                && bearer == &verify_bearer
        })
        .returning(|_, _| {
            Ok(ApiResponse {
                success: true,
                message: Some("Passkey registered".to_owned()),
                error: None,
                data: Some(RegistrationResult {
                    credential: Some(RegisteredCredential {
                        id: Some("cred123".to_owned()),
                    }),
                }),
            })
        })
        .times(1);

    let mut authenticator = MockPlatformAuthenticator::new();
    authenticator
        .expect_prevent_silent_access()
        .returning(|| ())
        .times(1);
    authenticator
        .expect_create_credential()
        .withf(|options| {
            options.rp.id.as_deref() == Some("app.example.com")
                && *options.challenge == b"registration-challenge".to_vec()
                && options.attestation == AttestationConveyancePreference::Direct
        })
        .returning(|_| Ok(created_credential(b"cred123")))
        .times(1);

    let mut client = Client::new(config(), backend, authenticator, MemoryStore::new(), NoPrompt);
    client
        .login("alice", "correct horse")
        .await
        .expect("login failed");

    let credential_id = client.register().await.expect("registration failed");

    assert_eq!(credential_id, "cred123");
    assert_eq!(client.store().credential_id().as_deref(), Some("cred123"));
    assert_eq!(client.session().cached_credential_id(), Some("cred123"));
}

#[tokio::test]
async fn registration_falls_back_to_the_created_id_without_an_echo() {
    let token = compact_token(json!({ "sub": "alice", "name": "Alice A" }));
    let mut backend = backend_with_login(&token);
    backend
        .expect_registration_options()
        .returning(|_, _| Ok(registration_challenge()))
        .times(1);
    backend
        .expect_register()
        .returning(|_, _| {
            Ok(ApiResponse {
                success: true,
                message: None,
                error: None,
                data: Some(RegistrationResult { credential: None }),
            })
        })
        .times(1);

    let mut authenticator = MockPlatformAuthenticator::new();
    authenticator
        .expect_prevent_silent_access()
        .returning(|| ())
        .times(1);
    authenticator
        .expect_create_credential()
        .returning(|_| Ok(created_credential(b"cred123")))
        .times(1);

    let mut client = Client::new(config(), backend, authenticator, MemoryStore::new(), NoPrompt);
    client
        .login("alice", "correct horse")
        .await
        .expect("login failed");

    let credential_id = client.register().await.expect("registration failed");

    // The authenticator reported base64url("cred123").
    assert_eq!(credential_id, "Y3JlZDEyMw");
    assert_eq!(client.store().credential_id().as_deref(), Some("Y3JlZDEyMw"));
}

#[tokio::test]
async fn registration_needs_a_logged_in_session() {
    let mut client = Client::new(
        config(),
        MockIdentityBackend::new(),
        MockPlatformAuthenticator::new(),
        MemoryStore::new(),
        NoPrompt,
    );

    let error = client.register().await.expect_err("registration should fail");

    assert!(matches!(error, CeremonyError::Precondition(_)));
}

#[tokio::test]
async fn a_cancelled_assertion_never_reaches_the_verify_route() {
    let token = compact_token(json!({ "sub": "alice" }));
    let mut backend = backend_with_login(&token);
    backend
        .expect_authentication_options()
        .returning(|_, _| Ok(assertion_challenge_envelope()))
        .times(1);
    backend.expect_authenticate().times(0);

    let mut client = Client::new(
        config(),
        backend,
        MockPlatformAuthenticator::cancelling(),
        MemoryStore::new(),
        NoPrompt,
    );
    client
        .login("alice", "correct horse")
        .await
        .expect("login failed");

    let error = client
        .authenticate("alice")
        .await
        .expect_err("the ceremony should fail");

    assert_eq!(error, CeremonyError::Platform(PlatformError::UserCancelled));
    assert!(!error.is_verify_failure());
    // The established session survives a failed ceremony.
    assert_eq!(client.session().access_token(), Some(token.as_str()));
}

#[tokio::test]
async fn direct_authentication_merges_the_fresh_tokens() {
    let login_token = compact_token(json!({ "sub": "alice", "name": "Alice A" }));
    let fresh_token = compact_token(json!({ "sub": "alice", "name": "Alice Anderson" }));
    let options_bearer = login_token.clone();
    let answered_token = fresh_token.clone();

    let mut backend = backend_with_login(&login_token);
    backend
        .expect_authentication_options()
        .withf(move |request, bearer| request.username == "alice" && bearer == &options_bearer)
        .returning(|_, _| Ok(assertion_challenge_envelope()))
        .times(1);
    backend
        .expect_authenticate()
        .withf(|request, _| {
            request.username == "alice"
                && *request.assertion_object == b"assertion-data".to_vec()
                && *request.signature == b"assertion-signature".to_vec()
                && *request.client_data_json == b"client-data".to_vec()
                && *request.raw_id == b"cred123".to_vec()
        })
        .returning(move |_, _| {
            Ok(ApiResponse {
                success: true,
                message: None,
                error: None,
                data: Some(TokenBundle {
                    access_token: Some(answered_token.clone()),
                    expires_in: Some(3600),
                    ..TokenBundle::default()
                }),
            })
        })
        .times(1);

    let mut authenticator = MockPlatformAuthenticator::new();
    authenticator
        .expect_prevent_silent_access()
        .returning(|| ())
        .times(1);
    authenticator
        .expect_get_assertion()
        .withf(|options| {
            *options.challenge == b"assertion-challenge".to_vec()
                && options.rp_id.as_deref() == Some("app.example.com")
        })
        .returning(|_| Ok(assertion_credential(b"cred123")))
        .times(1);

    let mut client = Client::new(config(), backend, authenticator, MemoryStore::new(), NoPrompt);
    client
        .login("alice", "correct horse")
        .await
        .expect("login failed");

    client
        .authenticate("alice")
        .await
        .expect("authentication failed");

    assert_eq!(client.session().access_token(), Some(fresh_token.as_str()));
    assert_eq!(client.session().display_name(), Some("Alice Anderson"));

    // The fresh bundle had no refresh token, so the stored one survives.
    let stored = client
        .store()
        .stored_tokens()
        .expect("authentication should persist the token bundle");
    assert_eq!(stored.access_token.as_deref(), Some(fresh_token.as_str()));
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-token-1"));
}

#[tokio::test]
async fn a_rejected_assertion_is_a_verify_failure() {
    let token = compact_token(json!({ "sub": "alice" }));
    let mut backend = backend_with_login(&token);
    backend
        .expect_authentication_options()
        .returning(|_, _| Ok(assertion_challenge_envelope()))
        .times(1);
    backend
        .expect_authenticate()
        .returning(|_, _| Ok(rejection("Invalid assertion")))
        .times(1);

    let mut client = Client::new(
        config(),
        backend,
        assertion_mock(b"cred123"),
        MemoryStore::new(),
        NoPrompt,
    );
    client
        .login("alice", "correct horse")
        .await
        .expect("login failed");

    let error = client
        .authenticate("alice")
        .await
        .expect_err("the ceremony should fail");

    assert_eq!(
        error,
        CeremonyError::Backend {
            stage: CeremonyState::Verifying,
            source: BackendError::Rejected("Invalid assertion".to_owned()),
        }
    );
    assert!(error.is_verify_failure());
    assert_eq!(client.session().access_token(), Some(token.as_str()));
}

#[tokio::test]
async fn the_native_flow_synthesizes_a_descriptor_when_the_step_is_empty() {
    let mut backend = MockIdentityBackend::new();
    backend
        .expect_native_init()
        .withf(|request| {
            request.redirect_uri == "https://app.example.com/oauth2/code"
                && request.scope == "openid profile"
                && request.response_type == "code"
                && request.response_mode == "direct"
        })
        .returning(|_| {
            Ok(serde_json::from_value(json!({ "flowId": "flow-1" }))
                .expect("failed to parse the init fixture"))
        })
        .times(1);
    backend.expect_native_challenge().times(0);
    backend
        .expect_native_verify()
        .withf(|request| {
            request.flow_id == "flow-1"
                && request.authenticator_id == "MANUAL_FIDO"
                && request.request_id.as_deref() == Some("manual-request-id")
                && request.credentials.credential_id == "Y3JlZDEyMw"
                && *request.credentials.authenticator_data == b"assertion-data".to_vec()
                && *request.credentials.signature == b"assertion-signature".to_vec()
        })
        .returning(|_| {
            Ok(ApiResponse {
                success: true,
                message: None,
                error: None,
                data: Some(json!({ "code": "SUCCESS" })),
            })
        })
        .times(1);

    let mut authenticator = MockPlatformAuthenticator::new();
    authenticator
        .expect_prevent_silent_access()
        .returning(|| ())
        .times(1);
    authenticator
        .expect_get_assertion()
        .withf(|options| {
            *options.challenge == b"mock-challenge-for-webauthn".to_vec()
                && options.rp_id.as_deref() == Some("app.example.com")
                && options
                    .allow_credentials
                    .as_ref()
                    .is_some_and(|list| list.len() == 1 && *list[0].id == b"cred123".to_vec())
        })
        .returning(|_| Ok(assertion_credential(b"cred123")))
        .times(1);

    let mut store = MemoryStore::new();
    store.set_credential_id("Y3JlZDEyMw");

    // A prompt without expectations panics if consulted.
    let mut client = Client::new(
        config(),
        backend,
        authenticator,
        store,
        MockCredentialPrompt::new(),
    );

    client.native_authenticate().await.expect("the flow failed");

    assert_eq!(
        client.store().last_used_credential_id().as_deref(),
        Some("Y3JlZDEyMw")
    );
}

#[tokio::test]
async fn the_native_flow_fetches_the_challenge_when_the_step_only_names_the_method() {
    let mut backend = MockIdentityBackend::new();
    backend
        .expect_native_init()
        .returning(|_| {
            Ok(serde_json::from_value(json!({
                "flowId": "flow-2",
                "nextStep": {
                    "stepType": "AUTHENTICATOR_PROMPT",
                    "authenticators": [{
                        "authenticatorId": "FIDOAuthenticator:LOCAL",
                        "authenticator": "Passkey"
                    }]
                }
            }))
            .expect("failed to parse the init fixture"))
        })
        .times(1);
    backend
        .expect_native_challenge()
        .withf(|request| {
            request.flow_id == "flow-2" && request.authenticator_id == "FIDOAuthenticator:LOCAL"
        })
        .returning(|_| {
            Ok(ApiResponse {
                success: true,
                message: None,
                error: None,
                data: Some(
                    serde_json::from_value(json!({
                        "publicKeyCredentialRequestOptions": {
                            "challenge": "bmF0aXZlLWNoYWxsZW5nZQ",
                            "allowCredentials": [{
                                "type": "public-key",
                                "id": "Y3JlZDEyMw",
                                "transports": ["internal"]
                            }]
                        },
                        "requestId": "native-request-7"
                    }))
                    .expect("failed to parse the challenge payload fixture"),
                ),
            })
        })
        .times(1);
    backend
        .expect_native_verify()
        .withf(|request| {
            request.flow_id == "flow-2"
                && request.authenticator_id == "FIDOAuthenticator:LOCAL"
                && request.request_id.as_deref() == Some("native-request-7")
                && request.credentials.credential_id == "Y3JlZDEyMw"
        })
        .returning(|_| {
            Ok(ApiResponse {
                success: true,
                message: None,
                error: None,
                data: Some(json!({ "code": "SUCCESS" })),
            })
        })
        .times(1);

    let mut authenticator = MockPlatformAuthenticator::new();
    authenticator
        .expect_prevent_silent_access()
        .returning(|| ())
        .times(1);
    authenticator
        .expect_get_assertion()
        .withf(|options| *options.challenge == b"native-challenge".to_vec())
        .returning(|_| Ok(assertion_credential(b"cred123")))
        .times(1);

    // The allow list inside the challenge names the credential, so neither
    // the empty store nor the prompt is consulted.
    let mut client = Client::new(
        config(),
        backend,
        authenticator,
        MemoryStore::new(),
        MockCredentialPrompt::new(),
    );

    client.native_authenticate().await.expect("the flow failed");

    assert_eq!(
        client.store().last_used_credential_id().as_deref(),
        Some("Y3JlZDEyMw")
    );
}

#[tokio::test]
async fn the_native_flow_adopts_tokens_when_the_verify_answer_carries_them() {
    let mut backend = MockIdentityBackend::new();
    backend
        .expect_native_init()
        .returning(|_| {
            Ok(serde_json::from_value(json!({ "flowId": "flow-3" }))
                .expect("failed to parse the init fixture"))
        })
        .times(1);
    backend
        .expect_native_verify()
        .returning(|_| {
            Ok(ApiResponse {
                success: true,
                message: None,
                error: None,
                data: Some(json!({ "access_token": "native-access-token" })),
            })
        })
        .times(1);

    let mut store = MemoryStore::new();
    store.set_credential_id("Y3JlZDEyMw");

    let mut client = Client::new(
        config(),
        backend,
        assertion_mock(b"cred123"),
        store,
        NoPrompt,
    );

    client.native_authenticate().await.expect("the flow failed");

    assert_eq!(
        client.session().access_token(),
        Some("native-access-token")
    );
    assert!(client.session().is_authenticated());
    let stored = client
        .store()
        .stored_tokens()
        .expect("the delivered bundle should be persisted");
    assert_eq!(stored.access_token.as_deref(), Some("native-access-token"));
}

#[tokio::test]
async fn the_native_flow_tolerates_an_unsuccessful_verify_envelope() {
    let mut backend = MockIdentityBackend::new();
    backend
        .expect_native_init()
        .returning(|_| {
            Ok(serde_json::from_value(json!({ "flowId": "flow-4" }))
                .expect("failed to parse the init fixture"))
        })
        .times(1);
    backend
        .expect_native_verify()
        .returning(|_| Ok(rejection("flow still pending upstream")))
        .times(1);

    let mut store = MemoryStore::new();
    store.set_credential_id("Y3JlZDEyMw");

    let mut client = Client::new(
        config(),
        backend,
        assertion_mock(b"cred123"),
        store,
        NoPrompt,
    );

    // The verify answer was delivered, so the ceremony completes even though
    // the envelope reports a failure.
    client.native_authenticate().await.expect("the flow failed");

    assert_eq!(
        client.store().last_used_credential_id().as_deref(),
        Some("Y3JlZDEyMw")
    );
    assert!(client.session().access_token().is_none());
}

#[tokio::test]
async fn a_dismissed_credential_prompt_stops_the_native_flow() {
    let challenge = encoding::base64(
        json!({
            "publicKeyCredentialRequestOptions": { "challenge": "bmF0aXZlLWNoYWxsZW5nZQ" }
        })
        .to_string()
        .as_bytes(),
    );
    let mut backend = MockIdentityBackend::new();
    backend
        .expect_native_init()
        .returning(move |_| {
            Ok(serde_json::from_value(json!({
                "flowId": "flow-5",
                "nextStep": {
                    "authenticators": [{
                        "authenticatorId": "FIDOAuthenticator:LOCAL",
                        "authenticator": "Passkey",
                        "metadata": { "additionalData": { "challengeData": challenge } }
                    }]
                }
            }))
            .expect("failed to parse the init fixture"))
        })
        .times(1);
    backend.expect_native_verify().times(0);

    let mut authenticator = MockPlatformAuthenticator::new();
    authenticator
        .expect_prevent_silent_access()
        .returning(|| ())
        .times(1);
    authenticator.expect_get_assertion().times(0);

    let mut prompt = MockCredentialPrompt::new();
    prompt
        .expect_request_credential_id()
        .returning(|| Some("   ".to_owned()))
        .times(1);

    let mut client = Client::new(config(), backend, authenticator, MemoryStore::new(), prompt);

    let error = client
        .native_authenticate()
        .await
        .expect_err("the flow should fail");

    assert_eq!(error, CeremonyError::MissingCredential);
}

#[tokio::test]
async fn deregistration_clears_the_slot_and_the_cache() {
    let token = compact_token(json!({ "sub": "alice", "name": "Alice A" }));
    let bearer_token = token.clone();
    let mut backend = backend_with_login(&token);
    backend
        .expect_deregister()
        .withf(move |credential_id, bearer| {
            credential_id == "Y3JlZDEyMw" && bearer == &bearer_token
        })
        .returning(|_, _| {
            Ok(ApiResponse {
                success: true,
                message: Some("Passkey removed".to_owned()),
                error: None,
                data: None,
            })
        })
        .times(1);

    let mut store = MemoryStore::new();
    store.set_credential_id("Y3JlZDEyMw");

    let mut client = Client::new(
        config(),
        backend,
        MockPlatformAuthenticator::new(),
        store,
        NoPrompt,
    );
    client
        .login("alice", "correct horse")
        .await
        .expect("login failed");
    client.restore_session();
    assert_eq!(client.session().cached_credential_id(), Some("Y3JlZDEyMw"));

    client.deregister().await.expect("deregistration failed");

    assert_eq!(client.store().credential_id(), None);
    assert_eq!(client.session().cached_credential_id(), None);
}

#[tokio::test]
async fn logout_drops_the_tokens_but_keeps_the_credential() {
    let token = compact_token(json!({ "sub": "alice" }));
    let mut client = Client::new(
        config(),
        backend_with_login(&token),
        MockPlatformAuthenticator::new(),
        MemoryStore::new(),
        NoPrompt,
    );
    client
        .login("alice", "correct horse")
        .await
        .expect("login failed");
    client.store_mut().set_credential_id("Y3JlZDEyMw");

    client.logout();

    assert!(client.session().access_token().is_none());
    assert!(!client.session().is_authenticated());
    assert!(client.store().stored_tokens().is_none());
    assert_eq!(client.store().credential_id().as_deref(), Some("Y3JlZDEyMw"));
}

#[test]
fn restore_session_rebuilds_identity_from_the_stored_bundle() {
    let token = compact_token(json!({ "sub": "alice", "name": "Alice A" }));
    let mut store = MemoryStore::new();
    store.store_tokens(&TokenBundle {
        access_token: Some(token.clone()),
        refresh_token: Some("refresh-token-1".to_owned()),
        ..TokenBundle::default()
    });
    store.set_credential_id("Y3JlZDEyMw");

    let mut client = Client::new(
        config(),
        MockIdentityBackend::new(),
        MockPlatformAuthenticator::new(),
        store,
        NoPrompt,
    );

    client.restore_session();

    assert!(client.session().is_authenticated());
    assert_eq!(client.session().access_token(), Some(token.as_str()));
    assert_eq!(client.session().principal(), Some("alice"));
    assert_eq!(client.session().display_name(), Some("Alice A"));
    assert_eq!(client.session().cached_credential_id(), Some("Y3JlZDEyMw"));
}
