//! Capability boundary: every effect that leaves this workspace (wall-clock
//! reads, randomness, question selection, blob storage, content addressing,
//! blockchain I/O, secrets, token verification) is expressed here as an
//! `#[async_trait]`, object-safe trait. Nothing in this crate — or any
//! engine crate that depends on it — implements one against a live
//! backend; this core does not mandate implementations. `fakes` ships
//! deterministic in-memory stand-ins so the rest of the workspace can be
//! tested without a network.

pub mod auth;
pub mod blockchain;
pub mod clock;
pub mod content_address;
pub mod questions;
pub mod rng;
pub mod secrets;
pub mod storage;

pub mod fakes;

pub use auth::{AuthClaims, Authenticator};
pub use blockchain::{Blockchain, TxEnvelope};
pub use clock::Clock;
pub use content_address::ContentAddressing;
pub use questions::QuestionSource;
pub use rng::Rng;
pub use secrets::SecretStore;
pub use storage::BlobStore;
