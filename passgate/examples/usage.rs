//! Sample app driving every passgate ceremony against a scripted provider.
use std::sync::Mutex;

use passgate::{
    client::{
        BackendError, Client, ClientConfig, IdentityBackend, MemoryStore, NoPrompt,
        PlatformAuthenticator, PlatformError,
    },
    types::{
        encoding,
        provider::{
            ApiResponse, AssertionOptionsRequest, AssertionVerifyRequest, ChallengeBundle,
            NativeChallengeRequest, NativeInitRequest, NativeInitResponse, NativeVerifyRequest,
            NextStepPayload, RegisteredCredential, RegistrationChallenge,
            RegistrationOptionsRequest, RegistrationResult, RegistrationVerifyRequest,
        },
        rand::random_vec,
        token::TokenBundle,
        webauthn::{
            AttestationConveyancePreference, AuthenticatedPublicKeyCredential,
            AuthenticatorAssertionResponse, AuthenticatorAttachment,
            AuthenticatorAttestationResponse, AuthenticatorTransport, CreatedPublicKeyCredential,
            PublicKeyCredential, PublicKeyCredentialCreationOptions, PublicKeyCredentialDescriptor,
            PublicKeyCredentialParameters, PublicKeyCredentialRequestOptions,
            PublicKeyCredentialRpEntity, PublicKeyCredentialType, PublicKeyCredentialUserEntity,
            UserVerificationRequirement,
        },
        Bytes,
    },
};

/// Mints the compact serialized token the scripted provider hands out.
fn demo_token(username: &str) -> String {
    let claims = serde_json::json!({ "sub": username, "name": "Johnny Passkey" });
    format!(
        "header.{}.signature",
        encoding::base64url(claims.to_string().as_bytes())
    )
}

fn token_envelope(username: &str) -> ApiResponse<TokenBundle> {
    ApiResponse {
        success: true,
        message: None,
        error: None,
        data: Some(TokenBundle {
            access_token: Some(demo_token(username)),
            refresh_token: Some("demo-refresh-token".to_owned()),
            token_type: Some("Bearer".to_owned()),
            expires_in: Some(3600),
            ..TokenBundle::default()
        }),
    }
}

/// A scripted identity provider, standing in for the HTTP proxy so the demo
/// runs without a network. It remembers the one credential the demo registers
/// and answers every route the way the real proxy would.
#[derive(Default)]
struct DemoProvider {
    registered: Mutex<Option<String>>,
}

impl DemoProvider {
    fn allow_list(&self) -> Option<Vec<PublicKeyCredentialDescriptor>> {
        let registered = self.registered.lock().unwrap();
        let raw_id = encoding::try_from_base64url(registered.as_ref()?)?;
        Some(vec![PublicKeyCredentialDescriptor {
            ty: PublicKeyCredentialType::PublicKey,
            id: raw_id.into(),
            transports: Some(vec![AuthenticatorTransport::Internal]),
        }])
    }
}

#[async_trait::async_trait]
impl IdentityBackend for DemoProvider {
    async fn password_login(
        &self,
        username: String,
        _password: String,
    ) -> Result<ApiResponse<TokenBundle>, BackendError> {
        Ok(token_envelope(&username))
    }

    async fn registration_options(
        &self,
        request: RegistrationOptionsRequest,
        _bearer: String,
    ) -> Result<RegistrationChallenge, BackendError> {
        Ok(RegistrationChallenge {
            public_key_credential_creation_options: PublicKeyCredentialCreationOptions {
                rp: PublicKeyCredentialRpEntity {
                    id: None,
                    name: "Passgate Demo".to_owned(),
                },
                user: PublicKeyCredentialUserEntity {
                    id: request.username.clone().into_bytes().into(),
                    display_name: request.display_name,
                    name: request.username,
                },
                challenge: random_vec(32).into(),
                pub_key_cred_params: PublicKeyCredentialParameters::default_algorithms(),
                timeout: None,
                exclude_credentials: None,
                authenticator_selection: None,
                attestation: AttestationConveyancePreference::None,
            },
            request_id: Some("demo-registration-request".to_owned()),
        })
    }

    async fn register(
        &self,
        request: RegistrationVerifyRequest,
        _bearer: String,
    ) -> Result<ApiResponse<RegistrationResult>, BackendError> {
        let credential_id = encoding::base64url(&request.raw_id);
        *self.registered.lock().unwrap() = Some(credential_id.clone());
        Ok(ApiResponse {
            success: true,
            message: Some("Passkey registered".to_owned()),
            error: None,
            data: Some(RegistrationResult {
                credential: Some(RegisteredCredential {
                    id: Some(credential_id),
                }),
            }),
        })
    }

    async fn deregister(
        &self,
        credential_id: String,
        _bearer: String,
    ) -> Result<ApiResponse<serde_json::Value>, BackendError> {
        let mut registered = self.registered.lock().unwrap();
        if registered.as_deref() == Some(credential_id.as_str()) {
            *registered = None;
        }
        Ok(ApiResponse {
            success: true,
            message: Some("Passkey removed".to_owned()),
            error: None,
            data: None,
        })
    }

    async fn authentication_options(
        &self,
        _request: AssertionOptionsRequest,
        _bearer: String,
    ) -> Result<ApiResponse<ChallengeBundle>, BackendError> {
        Ok(ApiResponse {
            success: true,
            message: None,
            error: None,
            data: Some(ChallengeBundle {
                public_key_credential_request_options: PublicKeyCredentialRequestOptions {
                    challenge: random_vec(32).into(),
                    timeout: Some(120_000),
                    rp_id: None,
                    allow_credentials: self.allow_list(),
                    user_verification: UserVerificationRequirement::default(),
                },
                request_id: Some("demo-assertion-request".to_owned()),
                credential_id: None,
                metadata: None,
                additional_data: None,
            }),
        })
    }

    async fn authenticate(
        &self,
        request: AssertionVerifyRequest,
        _bearer: String,
    ) -> Result<ApiResponse<TokenBundle>, BackendError> {
        Ok(token_envelope(&request.username))
    }

    async fn native_init(
        &self,
        _request: NativeInitRequest,
    ) -> Result<NativeInitResponse, BackendError> {
        // Answering without a step exercises the synthesized descriptor path.
        Ok(NativeInitResponse {
            flow_id: Some("demo-flow".to_owned()),
            next_step: None,
        })
    }

    async fn native_challenge(
        &self,
        _request: NativeChallengeRequest,
    ) -> Result<ApiResponse<NextStepPayload>, BackendError> {
        Err(BackendError::Payload(
            "the demo flow embeds no challenge step".to_owned(),
        ))
    }

    async fn native_verify(
        &self,
        request: NativeVerifyRequest,
    ) -> Result<ApiResponse<serde_json::Value>, BackendError> {
        let known = self.registered.lock().unwrap().as_deref()
            == Some(request.credentials.credential_id.as_str());
        Ok(ApiResponse {
            success: known,
            message: None,
            error: if known {
                None
            } else {
                Some("unknown credential".to_owned())
            },
            data: Some(serde_json::json!({
                "access_token": demo_token("jpasskey@example.org"),
            })),
        })
    }
}

fn client_data(ty: &str, challenge: &[u8]) -> Bytes {
    serde_json::json!({
        "type": ty,
        "challenge": encoding::base64url(challenge),
        "origin": "https://app.example.com",
    })
    .to_string()
    .into_bytes()
    .into()
}

/// A software authenticator minting deterministic demo credentials in place
/// of the host credential container.
struct DemoAuthenticator;

#[async_trait::async_trait]
impl PlatformAuthenticator for DemoAuthenticator {
    async fn create_credential(
        &self,
        options: PublicKeyCredentialCreationOptions,
    ) -> Result<CreatedPublicKeyCredential, PlatformError> {
        let raw_id = b"demo-credential".to_vec();
        Ok(PublicKeyCredential {
            id: encoding::base64url(&raw_id),
            raw_id: raw_id.into(),
            ty: PublicKeyCredentialType::PublicKey,
            response: AuthenticatorAttestationResponse {
                client_data_json: client_data("webauthn.create", &options.challenge),
                authenticator_data: b"demo-authenticator-data".to_vec().into(),
                attestation_object: b"demo-attestation-object".to_vec().into(),
                transports: Some(vec![AuthenticatorTransport::Internal]),
            },
            authenticator_attachment: Some(AuthenticatorAttachment::Platform),
        })
    }

    async fn get_assertion(
        &self,
        options: PublicKeyCredentialRequestOptions,
    ) -> Result<AuthenticatedPublicKeyCredential, PlatformError> {
        let raw_id = options
            .allow_credentials
            .as_ref()
            .and_then(|list| list.first())
            .map(|descriptor| descriptor.id.to_vec())
            .ok_or(PlatformError::NoCredential)?;
        Ok(PublicKeyCredential {
            id: encoding::base64url(&raw_id),
            raw_id: raw_id.into(),
            ty: PublicKeyCredentialType::PublicKey,
            response: AuthenticatorAssertionResponse {
                client_data_json: client_data("webauthn.get", &options.challenge),
                authenticator_data: b"demo-assertion-data".to_vec().into(),
                signature: b"demo-signature".to_vec().into(),
                user_handle: None,
            },
            authenticator_attachment: Some(AuthenticatorAttachment::Platform),
        })
    }

    async fn prevent_silent_access(&self) {}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::new("app.example.com", "https://app.example.com/oauth2/code");
    let mut client = Client::new(
        config,
        DemoProvider::default(),
        DemoAuthenticator,
        MemoryStore::new(),
        NoPrompt,
    );

    // Establish a session the classic way.
    client
        .login("jpasskey@example.org", "correct horse battery staple")
        .await?;
    println!(
        "logged in as {} ({})",
        client.session().principal().unwrap_or("?"),
        client.session().display_name().unwrap_or("?"),
    );

    // Mint a passkey on this device and register it with the provider.
    let credential_id = client.register().await?;
    println!("registered passkey {credential_id}");

    // Prove possession of the passkey while the session is live.
    client.authenticate("jpasskey@example.org").await?;
    println!("passkey authentication succeeded");

    // Drop the session and sign back in through the app-native flow, where
    // the passkey is the only factor.
    client.logout();
    client.native_authenticate().await?;
    println!(
        "app-native authentication succeeded, session {}",
        if client.session().is_authenticated() {
            "established"
        } else {
            "absent"
        },
    );

    // Finally remove the passkey again.
    client.deregister().await?;
    println!("passkey removed");

    Ok(())
}
