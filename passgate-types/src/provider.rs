//! Wire contracts for the identity provider proxy.
//!
//! The provider fronts a WSO2-style identity server. Most endpoints wrap their
//! payload in a [`ApiResponse`] envelope; the registration options and
//! app-native initiation endpoints return their payload raw. Response types
//! are lenient: every field the client does not strictly need is optional,
//! and unexpected step payloads degrade to [`NextStepPayload::Opaque`]
//! instead of failing deserialization.

use serde::{Deserialize, Serialize};

use crate::{
    webauthn::{PublicKeyCredentialCreationOptions, PublicKeyCredentialRequestOptions},
    Bytes,
};

/// The `{success, data}` envelope the proxy wraps around most JSON responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    /// Whether the proxied call succeeded. Distinct from the HTTP status: the
    /// proxy answers `200 OK` with `success: false` for provider-side
    /// rejections.
    #[serde(default)]
    pub success: bool,

    /// Human readable success detail, when the provider sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Human readable failure detail, when the provider sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// The proxied payload. Absent on most failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// The most specific failure or status detail available on this envelope.
    pub fn detail(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

/// Form body of the resource-owner-password token call.
///
/// The proxy fills in the OAuth2 grant type and scope itself, so the client
/// only forwards the entered credentials.
#[derive(Debug, Serialize)]
pub struct PasswordGrantRequest<'a> {
    /// The resource owner's username.
    pub username: &'a str,
    /// The resource owner's password, forwarded as entered.
    pub password: &'a str,
}

/// Body of the app-native authentication initiation call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeInitRequest {
    /// The OAuth2 redirect URI registered for this client.
    pub redirect_uri: String,
    /// Space separated scopes to request.
    pub scope: String,
    /// Always `code` for this flow.
    pub response_type: String,
    /// Always `direct`; the provider answers in-band instead of redirecting.
    pub response_mode: String,
}

/// Raw (unenveloped) response of the app-native initiation call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeInitResponse {
    /// Correlates every subsequent step of this authentication flow.
    pub flow_id: Option<String>,

    /// The first step the provider wants the client to complete. A missing
    /// step is treated like a step with no authenticators.
    #[serde(default)]
    pub next_step: Option<NextStep>,
}

/// One step of a multi-step authentication flow.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextStep {
    /// Step discriminator, e.g. `AUTHENTICATOR_PROMPT`. Informational only.
    pub step_type: Option<String>,

    /// The authenticator options the user may complete this step with.
    #[serde(default)]
    pub authenticators: Vec<AuthenticatorEntry>,
}

/// One authenticator option within a [`NextStep`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorEntry {
    /// Opaque identifier echoed back on the verify call.
    pub authenticator_id: Option<String>,

    /// Display name of the authenticator, e.g. `Passkey`.
    pub authenticator: Option<String>,

    /// Additional provider data about this option.
    #[serde(default)]
    pub metadata: Option<AuthenticatorMetadata>,
}

/// Provider metadata attached to an [`AuthenticatorEntry`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorMetadata {
    /// Nested data bag, notably the embedded challenge.
    #[serde(default)]
    pub additional_data: Option<AdditionalData>,

    /// Some provider versions surface the credential id here rather than in
    /// the challenge payload.
    pub credential_id: Option<String>,
}

/// The `additionalData` bag inside authenticator metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalData {
    /// Base64 of a JSON [`ChallengeBundle`], when the provider embeds the
    /// webauthn challenge directly in the step.
    pub challenge_data: Option<String>,

    /// Credential id hint, another of its known locations.
    pub credential_id: Option<String>,
}

/// A webauthn challenge as carried by the provider: the request options plus
/// the correlation and credential hints that ride along with them.
///
/// This shape arrives both as the decoded `challengeData` payload and as the
/// enveloped data of the dedicated challenge and assertion-options endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeBundle {
    /// The webauthn request options to hand to the platform authenticator.
    pub public_key_credential_request_options: PublicKeyCredentialRequestOptions,

    /// Correlation id echoed back on the verify call.
    pub request_id: Option<String>,

    /// Credential id hint, tried before the locally stored one.
    pub credential_id: Option<String>,

    /// Metadata as some provider versions attach it to the bundle.
    #[serde(default)]
    pub metadata: Option<AuthenticatorMetadata>,

    /// Data bag as some provider versions attach it to the bundle.
    #[serde(default)]
    pub additional_data: Option<AdditionalData>,
}

/// A full flow step as it appears inside a challenge payload.
///
/// Unlike [`NativeInitResponse`] the step member is required here, which is
/// what lets the untagged [`NextStepPayload`] tell this shape apart from the
/// others.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStep {
    /// The flow this step belongs to.
    pub flow_id: Option<String>,
    /// The step to complete.
    pub next_step: NextStep,
}

/// Every shape the provider is known to answer a challenge request with.
///
/// Variants are tried strictest first; anything unrecognized lands in
/// [`Self::Opaque`] so the caller can reject it with context instead of a
/// deserialization error.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NextStepPayload {
    /// A nested flow step, requiring another round of authenticator selection.
    Step(FlowStep),
    /// Request options with their correlation hints.
    Bundle(Box<ChallengeBundle>),
    /// Bare request options with nothing wrapped around them.
    Options(Box<PublicKeyCredentialRequestOptions>),
    /// None of the known shapes.
    Opaque(serde_json::Value),
}

/// Body of the app-native challenge retrieval call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeChallengeRequest {
    /// The flow being continued.
    pub flow_id: String,
    /// The authenticator option the challenge is requested for.
    pub authenticator_id: String,
}

/// The signed assertion material submitted on app-native verification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeCredentials {
    /// The serialized client data the assertion was computed over.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Bytes,
    /// The raw authenticator data of the assertion.
    pub authenticator_data: Bytes,
    /// The assertion signature.
    pub signature: Bytes,
    /// The user handle, when the authenticator returned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<Bytes>,
    /// Encoded id of the credential that produced the assertion.
    pub credential_id: String,
}

/// Body of the app-native verification call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeVerifyRequest {
    /// The flow being completed.
    pub flow_id: String,
    /// The authenticator option that was completed.
    pub authenticator_id: String,
    /// The signed assertion material.
    pub credentials: NativeCredentials,
    /// The correlation id of the challenge, when one was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Body of the registration options call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptionsRequest {
    /// The account the credential will belong to.
    pub username: String,
    /// Display name forwarded into the user entity.
    pub display_name: String,
}

/// Raw (unenveloped) response of the registration options call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationChallenge {
    /// The webauthn creation options to hand to the platform authenticator.
    pub public_key_credential_creation_options: PublicKeyCredentialCreationOptions,

    /// Correlation id echoed back on the registration verify call.
    pub request_id: Option<String>,
}

/// Body of the registration verify call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationVerifyRequest {
    /// The account the credential belongs to.
    pub username: String,
    /// Display name as sent on the options call.
    pub display_name: String,
    /// The correlation id echoed from the registration challenge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// The attestation object produced by the authenticator.
    pub attestation_object: Bytes,
    /// The serialized client data the attestation was computed over.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Bytes,
    /// The raw id of the created credential.
    pub raw_id: Bytes,
}

/// Enveloped data of a successful registration verify call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResult {
    /// The stored credential, when the provider echoes it.
    #[serde(default)]
    pub credential: Option<RegisteredCredential>,
}

/// The provider's record of a newly registered credential.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredCredential {
    /// Encoded credential id as the provider stored it.
    pub id: Option<String>,
}

/// Body of the username-first assertion options call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionOptionsRequest {
    /// The account to assert for.
    pub username: String,
}

/// Body of the username-first assertion verify call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionVerifyRequest {
    /// The account being asserted for.
    pub username: String,
    /// The raw authenticator data of the assertion. The provider contract
    /// names this field `assertionObject` even though it does not carry a
    /// CBOR attestation object.
    pub assertion_object: Bytes,
    /// The serialized client data the assertion was computed over.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Bytes,
    /// The assertion signature.
    pub signature: Bytes,
    /// The raw id of the credential that signed.
    pub raw_id: Bytes,
}
