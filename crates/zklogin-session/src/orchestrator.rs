//! Login orchestrator: drives one login attempt from key generation to a
//! persisted session.
//!
//! ```text
//! Idle ──start──> AttemptStarted ──> AwaitingCallback ──handle_callback──> Authenticated
//!  ^                   │                    │                                  │
//!  │             (init failure)             └──────────> Failed                │
//!  └───────────────────┴──────────── logout / reset / start ──────────────────┘
//! ```
//!
//! Every mutating method takes `&mut self`, so one orchestrator can only drive
//! one flow at a time. Persisted records are replaced whole; a second `start`
//! while a callback is pending overwrites the first attempt.

use std::sync::Arc;

use url::Url;
use zklogin_auth::{
    bind_nonce, build_auth_url, ensure_structure, generate_randomness, parse_token_response,
    synthetic_token, verify_nonce, AddressDeriver, MockIdentity, PlaceholderAddressDeriver,
    ProviderConfig, ProviderId, TokenRequest, UserInfo,
};
use zklogin_crypto::EphemeralKeypair;

use crate::config::LoginOptions;
use crate::epoch::{EpochSource, EstimatedEpochSource};
use crate::error::LoginError;
use crate::exchange::TokenExchanger;
use crate::records::{self, ContextRecord, SessionRecord};
use crate::salt::{SaltProvider, StoredSaltProvider};
use crate::store::KeyValueStore;

/// Where the orchestrator is in the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Idle,
    AttemptStarted,
    AwaitingCallback,
    Authenticated,
    Failed,
}

impl std::fmt::Display for LoginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LoginState::Idle => "idle",
            LoginState::AttemptStarted => "attempt started",
            LoginState::AwaitingCallback => "awaiting callback",
            LoginState::Authenticated => "authenticated",
            LoginState::Failed => "failed",
        })
    }
}

/// An authenticated user.
///
/// `jwt` is only present for sessions established in this process; restored
/// sessions carry the address and profile alone.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub address: String,
    pub user_info: UserInfo,
    pub jwt: Option<String>,
    /// Unix milliseconds
    pub timestamp: i64,
}

impl Session {
    fn from_record(record: SessionRecord) -> Self {
        Self {
            address: record.user_address,
            user_info: record.user_info,
            jwt: None,
            timestamp: record.timestamp,
        }
    }

    fn to_record(&self) -> SessionRecord {
        SessionRecord {
            user_address: self.address.clone(),
            user_info: self.user_info.clone(),
            timestamp: self.timestamp,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address)
            .field("user_info", &self.user_info)
            .field("jwt", &self.jwt.as_ref().map(|_| "<redacted>"))
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// Returned by `start`. The caller redirects the user agent to `auth_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttempt {
    pub auth_url: Url,
    pub nonce: String,
    pub max_epoch: u64,
}

/// Collaborators for `LoginOrchestrator`.
pub struct LoginOrchestratorOptions {
    pub store: Arc<dyn KeyValueStore>,
    /// Epoch lookup (default: clock estimate)
    pub epoch_source: Arc<dyn EpochSource>,
    /// Code exchange; `handle_callback` fails without one
    pub token_exchanger: Option<Arc<dyn TokenExchanger>>,
    /// Salt resolution (default: `StoredSaltProvider` over `store`)
    pub salt_provider: Option<Arc<dyn SaltProvider>>,
    /// Address derivation (default: `PlaceholderAddressDeriver`)
    pub address_deriver: Option<Arc<dyn AddressDeriver>>,
    pub options: LoginOptions,
}

impl LoginOrchestratorOptions {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            epoch_source: Arc::new(EstimatedEpochSource),
            token_exchanger: None,
            salt_provider: None,
            address_deriver: None,
            options: LoginOptions::default(),
        }
    }

    pub fn with_epoch_source(mut self, source: Arc<dyn EpochSource>) -> Self {
        self.epoch_source = source;
        self
    }

    pub fn with_token_exchanger(mut self, exchanger: Arc<dyn TokenExchanger>) -> Self {
        self.token_exchanger = Some(exchanger);
        self
    }

    pub fn with_salt_provider(mut self, provider: Arc<dyn SaltProvider>) -> Self {
        self.salt_provider = Some(provider);
        self
    }

    pub fn with_address_deriver(mut self, deriver: Arc<dyn AddressDeriver>) -> Self {
        self.address_deriver = Some(deriver);
        self
    }

    pub fn with_options(mut self, options: LoginOptions) -> Self {
        self.options = options;
        self
    }
}

/// Ephemeral material for one attempt, before it is persisted.
struct PreparedAttempt {
    keypair: EphemeralKeypair,
    randomness: String,
    max_epoch: u64,
    nonce: String,
}

pub struct LoginOrchestrator {
    store: Arc<dyn KeyValueStore>,
    epoch_source: Arc<dyn EpochSource>,
    token_exchanger: Option<Arc<dyn TokenExchanger>>,
    salt_provider: Arc<dyn SaltProvider>,
    address_deriver: Arc<dyn AddressDeriver>,
    options: LoginOptions,
    state: LoginState,
    session: Option<Session>,
    last_error: Option<String>,
}

impl LoginOrchestrator {
    /// Build an orchestrator and restore state from the store.
    ///
    /// A valid session record restores `Authenticated`; otherwise a valid
    /// context record restores `AwaitingCallback`; otherwise `Idle`. Malformed
    /// records are removed.
    ///
    /// # Errors
    /// Only storage failures; malformed records are not errors.
    pub fn new(opts: LoginOrchestratorOptions) -> Result<Self, LoginError> {
        let salt_provider: Arc<dyn SaltProvider> = match opts.salt_provider {
            Some(provider) => provider,
            None => Arc::new(StoredSaltProvider::new(opts.store.clone())),
        };
        let address_deriver: Arc<dyn AddressDeriver> = match opts.address_deriver {
            Some(deriver) => deriver,
            None => Arc::new(PlaceholderAddressDeriver),
        };

        let mut orchestrator = Self {
            store: opts.store,
            epoch_source: opts.epoch_source,
            token_exchanger: opts.token_exchanger,
            salt_provider,
            address_deriver,
            options: opts.options,
            state: LoginState::Idle,
            session: None,
            last_error: None,
        };
        orchestrator.restore()?;
        Ok(orchestrator)
    }

    fn restore(&mut self) -> Result<(), LoginError> {
        let store = &*self.store;
        if let Some(record) = records::load::<SessionRecord>(store)? {
            if records::load::<ContextRecord>(store)?.is_some() {
                tracing::debug!("discarding stale login context alongside a session");
                records::clear::<ContextRecord>(store)?;
            }
            tracing::debug!(address = %record.user_address, "restored session");
            self.session = Some(Session::from_record(record));
            self.state = LoginState::Authenticated;
        } else if records::load::<ContextRecord>(store)?.is_some() {
            tracing::debug!("restored pending login attempt");
            self.state = LoginState::AwaitingCallback;
        }
        Ok(())
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Message of the most recent failure, cleared by the next successful step.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == LoginState::Authenticated
    }

    /// Begin a login attempt against `config`'s provider.
    ///
    /// Generates the ephemeral keypair and randomness, binds the nonce to the
    /// max epoch, persists the context, and returns the authorization URL.
    ///
    /// # Errors
    /// - `InvalidState` while authenticated
    /// - `Auth(Config)` for a missing or placeholder client id
    /// - `Initialization` if epoch lookup, key generation, or URL building fails;
    ///   the state returns to `Idle`
    pub async fn start(&mut self, config: &ProviderConfig) -> Result<LoginAttempt, LoginError> {
        self.ensure_can_start("start a login")?;
        config.validate()?;

        self.state = LoginState::AttemptStarted;
        match self.begin_attempt(config).await {
            Ok(attempt) => {
                self.state = LoginState::AwaitingCallback;
                self.last_error = None;
                tracing::info!(
                    provider = %config.provider,
                    max_epoch = attempt.max_epoch,
                    "login attempt started"
                );
                Ok(attempt)
            }
            Err(e) => Err(self.abort_attempt(e)),
        }
    }

    /// Finish the pending attempt with the authorization `code` from the
    /// redirect. `config` must be the provider configuration passed to `start`.
    ///
    /// The context is cleared whatever the outcome. On any failure the state
    /// becomes `Failed`.
    ///
    /// # Errors
    /// - `InvalidState` unless awaiting a callback
    /// - `NoPendingAttempt` if the persisted context is gone
    /// - `TokenExchange` for transport failures, provider errors, or a
    ///   response without `id_token`
    /// - `Auth(MalformedToken | Encoding | InvalidToken)` for structural problems
    /// - `Auth(NonceMismatch)` if the token was not issued for this attempt
    /// - `Auth(MissingClaim)` if the key claim is absent
    pub async fn handle_callback(
        &mut self,
        config: &ProviderConfig,
        code: &str,
    ) -> Result<Session, LoginError> {
        if self.state != LoginState::AwaitingCallback {
            return Err(LoginError::InvalidState {
                state: self.state,
                operation: "handle a callback",
            });
        }

        let result = match records::load::<ContextRecord>(&*self.store) {
            Ok(Some(context)) => self.complete_callback(config, code, &context).await,
            Ok(None) => Err(LoginError::NoPendingAttempt),
            Err(e) => Err(e.into()),
        };
        self.finish(result)
    }

    /// Log in with a locally built synthetic token instead of a provider.
    ///
    /// Runs the same key, epoch, and nonce setup as `start`, then completes
    /// through the same validation, nonce check, and derivation as
    /// `handle_callback`.
    pub async fn simulate_login(
        &mut self,
        provider: ProviderId,
        identity: &MockIdentity,
    ) -> Result<Session, LoginError> {
        self.ensure_can_start("simulate a login")?;

        self.state = LoginState::AttemptStarted;
        let attempt = match self.prepare_attempt().await {
            Ok(attempt) => attempt,
            Err(e) => return Err(self.abort_attempt(e)),
        };
        if let Err(e) = self.persist_attempt(&attempt) {
            return Err(self.abort_attempt(e));
        }
        self.state = LoginState::AwaitingCallback;
        tracing::info!(%provider, max_epoch = attempt.max_epoch, "simulated login started");

        let now = chrono::Utc::now().timestamp();
        let result = match synthetic_token(provider, identity, &attempt.nonce, now) {
            Ok(jwt) => self.complete(&jwt, &attempt.nonce).await,
            Err(e) => Err(e.into()),
        };
        self.finish(result)
    }

    /// Clear the session and any pending attempt. Salt records are kept.
    pub fn logout(&mut self) -> Result<(), LoginError> {
        records::clear::<SessionRecord>(&*self.store)?;
        records::clear::<ContextRecord>(&*self.store)?;
        self.session = None;
        self.last_error = None;
        self.state = LoginState::Idle;
        tracing::info!("logged out");
        Ok(())
    }

    /// Acknowledge a failure and return to `Idle`.
    pub fn reset(&mut self) -> Result<(), LoginError> {
        if self.state != LoginState::Failed {
            return Err(LoginError::InvalidState {
                state: self.state,
                operation: "reset",
            });
        }
        self.state = LoginState::Idle;
        self.last_error = None;
        Ok(())
    }

    fn ensure_can_start(&self, operation: &'static str) -> Result<(), LoginError> {
        if self.state == LoginState::Authenticated {
            return Err(LoginError::InvalidState {
                state: self.state,
                operation,
            });
        }
        Ok(())
    }

    async fn prepare_attempt(&self) -> Result<PreparedAttempt, LoginError> {
        let current = self
            .epoch_source
            .current_epoch()
            .await
            .map_err(|e| LoginError::Initialization(format!("epoch lookup: {}", e)))?;
        let max_epoch = current.saturating_add(self.options.epoch_buffer);

        let keypair = EphemeralKeypair::generate()
            .map_err(|e| LoginError::Initialization(format!("key generation: {}", e)))?;
        let randomness = generate_randomness()
            .map_err(|e| LoginError::Initialization(format!("randomness: {}", e)))?;
        let nonce = bind_nonce(&keypair.public_key_bytes(), max_epoch, &randomness);

        tracing::debug!(current_epoch = current, max_epoch, "prepared login attempt");
        Ok(PreparedAttempt {
            keypair,
            randomness,
            max_epoch,
            nonce,
        })
    }

    async fn begin_attempt(&self, config: &ProviderConfig) -> Result<LoginAttempt, LoginError> {
        let attempt = self.prepare_attempt().await?;
        let auth_url = build_auth_url(config, &attempt.nonce)
            .map_err(|e| LoginError::Initialization(format!("authorization URL: {}", e)))?;
        self.persist_attempt(&attempt)?;
        Ok(LoginAttempt {
            auth_url,
            nonce: attempt.nonce.clone(),
            max_epoch: attempt.max_epoch,
        })
    }

    fn persist_attempt(&self, attempt: &PreparedAttempt) -> Result<(), LoginError> {
        let record = ContextRecord::new(&attempt.keypair, &attempt.randomness, attempt.max_epoch);
        records::save(&*self.store, &record)?;
        Ok(())
    }

    /// Initialization failed: drop any context and go back to `Idle`.
    fn abort_attempt(&mut self, error: LoginError) -> LoginError {
        self.discard_context();
        self.state = LoginState::Idle;
        self.last_error = Some(error.to_string());
        tracing::warn!(%error, "login attempt could not be started");
        error
    }

    async fn complete_callback(
        &self,
        config: &ProviderConfig,
        code: &str,
        context: &ContextRecord,
    ) -> Result<Session, LoginError> {
        let keypair = context.keypair()?;
        let nonce = context.nonce(&keypair);
        let jwt = self.exchange_code(config, code).await?;
        self.complete(&jwt, &nonce).await
    }

    async fn exchange_code(&self, config: &ProviderConfig, code: &str) -> Result<String, LoginError> {
        let exchanger = self
            .token_exchanger
            .as_ref()
            .ok_or_else(|| LoginError::TokenExchange("no token exchanger configured".to_string()))?;

        let request = TokenRequest::new(config, code);
        let response = exchanger
            .exchange(&request)
            .await
            .map_err(|e| LoginError::TokenExchange(e.to_string()))?;
        parse_token_response(&response).map_err(|e| LoginError::TokenExchange(e.to_string()))
    }

    /// Shared completion path for real and synthetic tokens.
    async fn complete(&self, jwt: &str, expected_nonce: &str) -> Result<Session, LoginError> {
        let payload = ensure_structure(jwt)?;
        verify_nonce(expected_nonce, &payload)?;

        let salt = self
            .salt_provider
            .salt_for(&payload)
            .await
            .map_err(|e| LoginError::Salt(e.to_string()))?;
        let address = self
            .address_deriver
            .derive(jwt, &salt, &self.options.key_claim_name)?;

        let session = Session {
            address,
            user_info: UserInfo::from_payload(&payload),
            jwt: Some(jwt.to_string()),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        Ok(session)
    }

    /// Remove the ephemeral key, then record the session. A session is never
    /// persisted while the key it was created with is still stored.
    fn persist_session(&self, session: Session) -> Result<Session, LoginError> {
        records::clear::<ContextRecord>(&*self.store)?;
        records::save(&*self.store, &session.to_record())?;
        Ok(session)
    }

    fn finish(&mut self, result: Result<Session, LoginError>) -> Result<Session, LoginError> {
        let result = result.and_then(|session| self.persist_session(session));
        if result.is_err() {
            self.discard_context();
        }
        match result {
            Ok(session) => {
                tracing::info!(
                    address = %session.address,
                    provider = %session.user_info.provider,
                    "authenticated"
                );
                self.state = LoginState::Authenticated;
                self.last_error = None;
                self.session = Some(session.clone());
                Ok(session)
            }
            Err(error) => {
                tracing::warn!(%error, "login failed");
                self.state = LoginState::Failed;
                self.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }

    fn discard_context(&self) {
        if let Err(e) = records::clear::<ContextRecord>(&*self.store) {
            tracing::warn!(error = %e, "failed to clear login context");
        }
    }
}
