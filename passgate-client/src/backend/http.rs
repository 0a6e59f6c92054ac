//! [`IdentityBackend`] over HTTP.

use passgate_types::{
    provider::{
        ApiResponse, AssertionOptionsRequest, AssertionVerifyRequest, ChallengeBundle,
        NativeChallengeRequest, NativeInitRequest, NativeInitResponse, NativeVerifyRequest,
        NextStepPayload, PasswordGrantRequest, RegistrationChallenge, RegistrationOptionsRequest,
        RegistrationResult, RegistrationVerifyRequest,
    },
    token::TokenBundle,
};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use url::Url;

use super::{BackendError, IdentityBackend};

const TOKEN_ROUTE: &str = "wso2-proxy/token";
const REGISTRATION_OPTIONS_ROUTE: &str = "fido/registration-options";
const REGISTER_ROUTE: &str = "fido/register";
const DEREGISTER_ROUTE: &str = "fido/deregister";
const AUTHENTICATION_OPTIONS_ROUTE: &str = "fido/authentication-options";
const AUTHENTICATE_ROUTE: &str = "fido/authenticate";
const NATIVE_INIT_ROUTE: &str = "native-auth/init";
const NATIVE_CHALLENGE_ROUTE: &str = "native-auth/challenge";
const NATIVE_VERIFY_ROUTE: &str = "native-auth/verify";

/// An [`IdentityBackend`] that talks to the provider proxy with [`reqwest`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend for the proxy at the given origin.
    ///
    /// Routes are joined onto `base_url`, so it should end with a `/` when it
    /// carries a path.
    pub fn new(base_url: Url) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a backend reusing an existing [`reqwest::Client`], for callers
    /// that need custom TLS or proxy settings.
    pub fn with_client(base_url: Url, http: reqwest::Client) -> Self {
        Self { base_url, http }
    }

    fn route(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|err| BackendError::Transport(err.to_string()))
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        serde_json::from_slice(&body).map_err(|err| BackendError::Payload(err.to_string()))
    }
}

#[async_trait::async_trait]
impl IdentityBackend for HttpBackend {
    async fn password_login(
        &self,
        username: String,
        password: String,
    ) -> Result<ApiResponse<TokenBundle>, BackendError> {
        let form = PasswordGrantRequest {
            username: &username,
            password: &password,
        };
        self.read_json(self.http.post(self.route(TOKEN_ROUTE)?).form(&form))
            .await
    }

    async fn registration_options(
        &self,
        request: RegistrationOptionsRequest,
        bearer: String,
    ) -> Result<RegistrationChallenge, BackendError> {
        self.read_json(
            self.http
                .post(self.route(REGISTRATION_OPTIONS_ROUTE)?)
                .bearer_auth(bearer)
                .json(&request),
        )
        .await
    }

    async fn register(
        &self,
        request: RegistrationVerifyRequest,
        bearer: String,
    ) -> Result<ApiResponse<RegistrationResult>, BackendError> {
        self.read_json(
            self.http
                .post(self.route(REGISTER_ROUTE)?)
                .bearer_auth(bearer)
                .json(&request),
        )
        .await
    }

    async fn deregister(
        &self,
        credential_id: String,
        bearer: String,
    ) -> Result<ApiResponse<serde_json::Value>, BackendError> {
        let route = self.route(&format!("{DEREGISTER_ROUTE}/{credential_id}"))?;
        self.read_json(self.http.delete(route).bearer_auth(bearer))
            .await
    }

    async fn authentication_options(
        &self,
        request: AssertionOptionsRequest,
        bearer: String,
    ) -> Result<ApiResponse<ChallengeBundle>, BackendError> {
        self.read_json(
            self.http
                .post(self.route(AUTHENTICATION_OPTIONS_ROUTE)?)
                .bearer_auth(bearer)
                .json(&request),
        )
        .await
    }

    async fn authenticate(
        &self,
        request: AssertionVerifyRequest,
        bearer: String,
    ) -> Result<ApiResponse<TokenBundle>, BackendError> {
        self.read_json(
            self.http
                .post(self.route(AUTHENTICATE_ROUTE)?)
                .bearer_auth(bearer)
                .json(&request),
        )
        .await
    }

    async fn native_init(
        &self,
        request: NativeInitRequest,
    ) -> Result<NativeInitResponse, BackendError> {
        self.read_json(self.http.post(self.route(NATIVE_INIT_ROUTE)?).json(&request))
            .await
    }

    async fn native_challenge(
        &self,
        request: NativeChallengeRequest,
    ) -> Result<ApiResponse<NextStepPayload>, BackendError> {
        self.read_json(
            self.http
                .post(self.route(NATIVE_CHALLENGE_ROUTE)?)
                .json(&request),
        )
        .await
    }

    async fn native_verify(
        &self,
        request: NativeVerifyRequest,
    ) -> Result<ApiResponse<serde_json::Value>, BackendError> {
        self.read_json(
            self.http
                .post(self.route(NATIVE_VERIFY_ROUTE)?)
                .json(&request),
        )
        .await
    }
}
