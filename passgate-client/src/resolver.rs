//! Challenge resolution across the provider's answer shapes.
//!
//! The initiation step of an app-native flow can answer in several forms: a
//! step whose passkey authenticator embeds the full challenge bundle, a step
//! that merely offers the authenticator and expects a follow-up challenge
//! call, a bare bundle or bare request options from that follow-up call, or
//! no authenticators at all. This module normalizes every form into a
//! [`ResolvedChallenge`] and hosts the credential id resolution that goes
//! with it.

use passgate_types::{
    encoding,
    provider::{AuthenticatorEntry, ChallengeBundle, NextStep, NextStepPayload},
    webauthn::{
        AttestationConveyancePreference, AuthenticatorTransport, PublicKeyCredentialCreationOptions,
        PublicKeyCredentialDescriptor, PublicKeyCredentialParameters, PublicKeyCredentialType,
        PublicKeyCredentialRequestOptions, ResidentKeyRequirement, UserVerificationRequirement,
    },
    Bytes,
};

use crate::{
    backend::BackendError, ceremony::CeremonyState, prompt::CredentialPrompt,
    session::SessionState, store::CredentialStore, CeremonyError,
};

/// Authenticator ids the provider is known to use for its passkey method.
pub(crate) const KNOWN_PASSKEY_AUTHENTICATOR_IDS: [&str; 3] = [
    "RklET0F1dGhlbnRpY2F0b3I6TE9DQUw",
    "FIDOAuthenticator:LOCAL",
    "FIDOAuthenticator",
];

/// Display name the provider uses for its passkey method.
const PASSKEY_AUTHENTICATOR_NAME: &str = "Passkey";

/// Authenticator id reported when the descriptor was synthesized locally.
pub(crate) const MANUAL_AUTHENTICATOR_ID: &str = "MANUAL_FIDO";

/// Challenge bytes of a synthesized descriptor.
pub(crate) const MANUAL_CHALLENGE: &[u8] = b"mock-challenge-for-webauthn";

/// Request id reported for a synthesized descriptor.
pub(crate) const MANUAL_REQUEST_ID: &str = "manual-request-id";

const DEFAULT_TIMEOUT_MS: u32 = 60_000;

/// A challenge descriptor ready for the platform authenticator.
#[derive(Debug)]
pub(crate) struct ResolvedChallenge {
    pub(crate) options: PublicKeyCredentialRequestOptions,
    pub(crate) request_id: Option<String>,
    /// Credential id named by the payload itself, if any.
    pub(crate) embedded_credential_id: Option<String>,
}

/// What an initiation step resolved to.
#[derive(Debug)]
pub(crate) enum StepResolution {
    /// The passkey authenticator entry embedded a usable challenge.
    Ready {
        authenticator_id: String,
        challenge: ResolvedChallenge,
    },
    /// A passkey authenticator was offered without an embedded challenge, so
    /// the dedicated challenge endpoint has to be asked for one.
    NeedsChallenge { authenticator_id: String },
    /// No authenticators were offered. A placeholder descriptor is
    /// synthesized locally so the ceremony can still run against whatever
    /// credential resolution comes up with.
    Synthesized {
        authenticator_id: String,
        challenge: ResolvedChallenge,
    },
}

fn is_passkey_entry(entry: &AuthenticatorEntry) -> bool {
    entry.authenticator.as_deref() == Some(PASSKEY_AUTHENTICATOR_NAME)
        || entry
            .authenticator_id
            .as_deref()
            .is_some_and(|id| KNOWN_PASSKEY_AUTHENTICATOR_IDS.contains(&id))
}

fn embedded_challenge_data(entry: &AuthenticatorEntry) -> Option<&str> {
    entry
        .metadata
        .as_ref()?
        .additional_data
        .as_ref()?
        .challenge_data
        .as_deref()
}

fn payload_error(detail: impl Into<String>) -> CeremonyError {
    CeremonyError::backend(
        CeremonyState::Initiating,
        BackendError::Payload(detail.into()),
    )
}

/// Classify the authenticator selection step of a freshly initiated flow.
pub(crate) fn resolve_step(step: &NextStep) -> Result<StepResolution, CeremonyError> {
    if step.authenticators.is_empty() {
        return Ok(StepResolution::Synthesized {
            authenticator_id: MANUAL_AUTHENTICATOR_ID.to_owned(),
            challenge: synthesized_challenge(),
        });
    }

    let entry = step
        .authenticators
        .iter()
        .find(|entry| is_passkey_entry(entry))
        .ok_or_else(|| payload_error("no passkey authenticator among the offered options"))?;

    let authenticator_id = entry
        .authenticator_id
        .clone()
        .ok_or_else(|| payload_error("passkey authenticator entry carries no id"))?;

    match embedded_challenge_data(entry) {
        Some(encoded) => Ok(StepResolution::Ready {
            authenticator_id,
            challenge: decode_embedded_bundle(encoded)?,
        }),
        None => Ok(StepResolution::NeedsChallenge { authenticator_id }),
    }
}

/// Decode a base64 `challengeData` blob into a usable challenge.
pub(crate) fn decode_embedded_bundle(encoded: &str) -> Result<ResolvedChallenge, CeremonyError> {
    let raw = encoding::decode(encoded)?;
    let bundle: ChallengeBundle = serde_json::from_slice(&raw)
        .map_err(|err| payload_error(format!("embedded challenge data: {err}")))?;
    Ok(from_bundle(bundle))
}

/// Flatten a challenge bundle, collecting the credential id hint from the
/// places the provider is known to put it: a known-type allow list entry,
/// the bundle itself, its metadata, and its additional data, in that order.
pub(crate) fn from_bundle(bundle: ChallengeBundle) -> ResolvedChallenge {
    let embedded_credential_id = bundle
        .public_key_credential_request_options
        .allow_credentials
        .as_ref()
        .and_then(|list| list.iter().find(|descriptor| descriptor.is_known()))
        .map(|descriptor| encoding::base64url(&descriptor.id))
        .or(bundle.credential_id)
        .or(bundle.metadata.and_then(|metadata| metadata.credential_id))
        .or(bundle
            .additional_data
            .and_then(|additional| additional.credential_id));

    ResolvedChallenge {
        options: bundle.public_key_credential_request_options,
        request_id: bundle.request_id,
        embedded_credential_id,
    }
}

fn synthesized_challenge() -> ResolvedChallenge {
    ResolvedChallenge {
        options: PublicKeyCredentialRequestOptions {
            challenge: MANUAL_CHALLENGE.to_vec().into(),
            timeout: Some(DEFAULT_TIMEOUT_MS),
            rp_id: None,
            allow_credentials: None,
            user_verification: UserVerificationRequirement::Preferred,
        },
        request_id: Some(MANUAL_REQUEST_ID.to_owned()),
        embedded_credential_id: None,
    }
}

/// Interpret the answer of the dedicated challenge endpoint.
///
/// The provider answering with yet another authenticator prompt means the
/// flow is stuck in selection, so only a step with an embedded challenge is
/// accepted in that shape.
pub(crate) fn resolve_challenge_payload(
    payload: NextStepPayload,
) -> Result<ResolvedChallenge, CeremonyError> {
    match payload {
        NextStepPayload::Step(step) => match resolve_step(&step.next_step)? {
            StepResolution::Ready { challenge, .. } => Ok(challenge),
            StepResolution::NeedsChallenge { .. } | StepResolution::Synthesized { .. } => Err(
                payload_error("challenge response repeated the authenticator prompt"),
            ),
        },
        NextStepPayload::Bundle(bundle) => Ok(from_bundle(*bundle)),
        NextStepPayload::Options(options) => Ok(from_bundle(ChallengeBundle {
            public_key_credential_request_options: *options,
            request_id: None,
            credential_id: None,
            metadata: None,
            additional_data: None,
        })),
        NextStepPayload::Opaque(value) => {
            Err(payload_error(format!("unrecognized challenge payload: {value}")))
        }
    }
}

/// Resolve the credential id for an assertion.
///
/// Fixed precedence: the id embedded in the challenge payload, the id cached
/// earlier in this process, the stored id, and finally a manual prompt. The
/// prompt is asked at most once; a dismissed or blank answer fails the
/// resolution.
pub(crate) fn resolve_credential_id<S, P>(
    embedded: Option<String>,
    session: &SessionState,
    store: &S,
    prompt: &P,
) -> Result<String, CeremonyError>
where
    S: CredentialStore,
    P: CredentialPrompt,
{
    if let Some(credential_id) = embedded {
        return Ok(credential_id);
    }
    if let Some(credential_id) = session.cached_credential_id() {
        return Ok(credential_id.to_owned());
    }
    if let Some(credential_id) = store.credential_id() {
        return Ok(credential_id);
    }
    prompt
        .request_credential_id()
        .map(|entered| entered.trim().to_owned())
        .filter(|entered| !entered.is_empty())
        .ok_or(CeremonyError::MissingCredential)
}

/// Fill the gaps the provider leaves in assertion options.
///
/// The relying party id and timeout get local fallbacks, and when the allow
/// list has no usable entry it is rebuilt around the resolved credential id
/// as a single platform-attached descriptor.
pub(crate) fn finalize_assertion_options(
    options: &mut PublicKeyCredentialRequestOptions,
    fallback_rp_id: &str,
    credential_id: &str,
) -> Result<(), CeremonyError> {
    if options.rp_id.as_deref().map_or(true, str::is_empty) {
        options.rp_id = Some(fallback_rp_id.to_owned());
    }
    if options.timeout.is_none() {
        options.timeout = Some(DEFAULT_TIMEOUT_MS);
    }

    let has_usable_entry = options
        .allow_credentials
        .as_ref()
        .is_some_and(|list| list.iter().any(PublicKeyCredentialDescriptor::is_known));
    if !has_usable_entry {
        options.allow_credentials = Some(vec![PublicKeyCredentialDescriptor {
            ty: PublicKeyCredentialType::PublicKey,
            id: Bytes::try_from(credential_id)?,
            transports: Some(vec![AuthenticatorTransport::Internal]),
        }]);
    }
    Ok(())
}

/// Apply the forced creation policy and local fallbacks to creation options.
///
/// The relying party id falls back to the configured host when the provider
/// sends none or an empty one. Resident keys are discouraged, user
/// verification is set to `preferred` and a direct attestation is requested,
/// regardless of what the provider asked for. An empty algorithm list is
/// replaced with the defaults.
pub(crate) fn prepare_creation_options(
    mut options: PublicKeyCredentialCreationOptions,
    fallback_rp_id: &str,
) -> PublicKeyCredentialCreationOptions {
    if options.rp.id.as_deref().map_or(true, str::is_empty) {
        options.rp.id = Some(fallback_rp_id.to_owned());
    }

    let mut selection = options.authenticator_selection.take().unwrap_or_default();
    selection.require_resident_key = false;
    selection.resident_key = Some(ResidentKeyRequirement::Discouraged);
    selection.user_verification = UserVerificationRequirement::Preferred;
    options.authenticator_selection = Some(selection);

    options.attestation = AttestationConveyancePreference::Direct;

    if options.pub_key_cred_params.is_empty() {
        options.pub_key_cred_params = PublicKeyCredentialParameters::default_algorithms();
    }
    options
}
