//! zkLogin login flow: orchestration, persistence, and configuration.
//!
//! [`LoginOrchestrator`] drives the state machine
//! `Idle → AttemptStarted → AwaitingCallback → Authenticated | Failed`.
//! Everything that touches the outside world is injected:
//! - [`KeyValueStore`] for the session, login context, and salt records
//! - [`TokenExchanger`] for the authorization-code exchange (HTTP)
//! - [`EpochSource`] for the current network epoch
//! - [`SaltProvider`] and `AddressDeriver` for address derivation
//!
//! The browser redirect is left to the caller: `start` returns the URL.

mod config;
mod epoch;
mod error;
mod exchange;
mod orchestrator;
pub mod records;
mod salt;
mod store;

pub use config::{
    LoginOptions, ProviderSettings, DEFAULT_EPOCH_BUFFER, DEFAULT_REDIRECT_ORIGIN,
    FACEBOOK_CLIENT_ID_ENV, FACEBOOK_CLIENT_SECRET_ENV, GOOGLE_CLIENT_ID_ENV,
    GOOGLE_CLIENT_SECRET_ENV, REDIRECT_ORIGIN_ENV,
};
pub use epoch::{
    EpochSource, EstimatedEpochSource, FallbackEpochSource, EPOCH_DURATION_MS, EPOCH_GENESIS_MS,
    MINIMUM_EPOCH,
};
pub use error::{ExternalError, ExternalErrorKind, LoginError, StoreError};
pub use exchange::TokenExchanger;
pub use orchestrator::{
    LoginAttempt, LoginOrchestrator, LoginOrchestratorOptions, LoginState, Session,
};
pub use records::{ContextRecord, SessionRecord, CONTEXT_KEY, SESSION_KEY};
pub use salt::{salt_key, SaltProvider, StoredSaltProvider, SALT_KEY_PREFIX};
pub use store::{KeyValueStore, MemoryStore};
