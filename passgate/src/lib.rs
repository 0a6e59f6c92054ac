//! # Passgate
//!
//! The `passgate` library is a collection of Rust crates for driving
//! passwordless login ceremonies against a WSO2-style identity provider from
//! an application runtime. It covers the classic password-for-tokens
//! exchange, WebAuthn passkey registration and authentication through the
//! provider's FIDO endpoints, and the provider's multi-step app-native
//! authentication flow. It is comprised of two sub-libraries:
//!
//! - `passgate-client` - a library, usable as [`client`], which orchestrates
//!   the ceremonies and tracks the resulting session.
//! - `passgate-types` - type definitions, usable as [`types`], covering the
//!   provider's wire contract and the WebAuthn options and credential shapes
//!   it exchanges.
//!
//! ## Basic Concepts
//!
//! Conceptually, a ceremony is a short conversation with two parties: the
//! identity provider, reached over HTTP through a backend proxy, and the
//! platform authenticator, the credential container of the host (for example
//! `navigator.credentials` in a browser runtime, or an OS passkey API). The
//! [`Client`](client::Client) sits between them:
//!
//! IdentityProvider <-> [`Client`](client::Client) <-> [`PlatformAuthenticator`](client::PlatformAuthenticator) <-> credential container
//!
//! The [`Client`](client::Client) owns the ceremony sequencing and exposes
//! one method per ceremony:
//!
//! - [`login()`](client::Client::login()) - exchange a username and password
//!   for a token bundle and establish the session.
//! - [`register()`](client::Client::register()) - mint a passkey on this
//!   device and register it with the provider.
//! - [`authenticate()`](client::Client::authenticate()) - prove possession of
//!   the registered passkey and refresh the session tokens.
//! - [`native_authenticate()`](client::Client::native_authenticate()) - run
//!   the provider's multi-step app-native flow with the passkey, no password
//!   involved.
//! - [`deregister()`](client::Client::deregister()) - remove the registered
//!   passkey from the provider and forget it locally.
//!
//! The [`Client`](client::Client) performs no I/O of its own. Each of its
//! collaborators is a trait at a seam you can implement for your host:
//!
//! - [`IdentityBackend`](client::IdentityBackend) reaches the provider proxy.
//!   [`HttpBackend`](client::HttpBackend) is the ready-made `reqwest`
//!   implementation.
//! - [`PlatformAuthenticator`](client::PlatformAuthenticator) performs the
//!   WebAuthn operations and gathers user presence.
//! - [`CredentialStore`](client::CredentialStore) and
//!   [`TokenStore`](client::TokenStore) persist the registered credential id
//!   and the token bundle between runs. [`MemoryStore`](client::MemoryStore)
//!   keeps them for the lifetime of the process.
//! - [`CredentialPrompt`](client::CredentialPrompt) asks the user for a
//!   credential id when no other source can name one, the last resort of the
//!   lookup chain. [`NoPrompt`](client::NoPrompt) declines every request.
//!
//! A runnable demonstration binary is provided in `passgate/examples/usage.rs`.
//!
//! ### Example: Running Ceremonies Against a Provider Proxy
//!
//! The following example stands up a [`Client`](client::Client) with the
//! `reqwest`-backed proxy transport, establishes a session with a password,
//! then registers and exercises a passkey. The platform authenticator is
//! stubbed; a real integration bridges it to the host credential container.
//!
//! ```no_run
//! use passgate::{
//!     client::{Client, ClientConfig, HttpBackend, MemoryStore, NoPrompt},
//!     types::webauthn::*,
//! };
//! use url::Url;
//! #
//! # struct DeviceAuthenticator;
//! # #[async_trait::async_trait]
//! # impl passgate::client::PlatformAuthenticator for DeviceAuthenticator {
//! #     async fn create_credential(
//! #         &self,
//! #         _options: PublicKeyCredentialCreationOptions,
//! #     ) -> Result<CreatedPublicKeyCredential, passgate::client::PlatformError> {
//! #         Err(passgate::client::PlatformError::UnsupportedDevice)
//! #     }
//! #
//! #     async fn get_assertion(
//! #         &self,
//! #         _options: PublicKeyCredentialRequestOptions,
//! #     ) -> Result<AuthenticatedPublicKeyCredential, passgate::client::PlatformError> {
//! #         Err(passgate::client::PlatformError::UnsupportedDevice)
//! #     }
//! #
//! #     async fn prevent_silent_access(&self) {}
//! # }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // The proxy in front of the identity provider.
//!     let backend = HttpBackend::new(Url::parse("https://gateway.example.com/api/")?);
//!     let config = ClientConfig::new("app.example.com", "https://app.example.com/oauth2/code");
//!     let mut client = Client::new(
//!         config,
//!         backend,
//!         DeviceAuthenticator,
//!         MemoryStore::new(),
//!         NoPrompt,
//!     );
//!
//!     // Establish a session, then mint and register a passkey for it.
//!     client.login("jpasskey@example.org", "correct horse").await?;
//!     let credential_id = client.register().await?;
//!     println!("registered passkey {credential_id}");
//!
//!     // Prove possession of the passkey.
//!     client.authenticate("jpasskey@example.org").await?;
//!     assert!(client.session().is_authenticated());
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Example: Parsing Provider Payloads
//!
//! The [`types`] crate carries the provider's wire shapes, including the
//! untagged [`NextStepPayload`](types::provider::NextStepPayload) that
//! absorbs the several forms a challenge answer can take:
//!
//! ```
//! use passgate::types::provider::NextStepPayload;
//!
//! let payload: NextStepPayload = serde_json::from_str(
//!     r#"{
//!         "publicKeyCredentialRequestOptions": { "challenge": "YXNzZXJ0aW9uLWNoYWxsZW5nZQ" },
//!         "requestId": "request-1"
//!     }"#,
//! )?;
//! assert!(matches!(payload, NextStepPayload::Bundle(_)));
//! # Ok::<(), serde_json::Error>(())
//! ```

pub use passgate_client as client;
pub use passgate_types as types;
