//! Shared domain types for the trivia-NFT coordination core.
//!
//! Every entity lives here so the engine crates (ledger,
//! leaderboard, session, workflow, scheduler) and the store adapters share a
//! single definition instead of redefining rows at each boundary.

pub mod category;
pub mod eligibility;
pub mod ids;
pub mod nft;
pub mod player;
pub mod scope;
pub mod season;
pub mod session;

pub use category::{Category, Question, QuestionFlag};
pub use eligibility::{Eligibility, EligibilityStatus};
pub use ids::{
    AnonId, CatalogItemId, CategoryId, EligibilityId, ForgeOperationId, MintOperationId, OwnedAssetId,
    PlayerId, PlayerIdentity, QuestionId, SeasonId, SessionId, Stake,
};
pub use nft::{
    AssetSource, CatalogStockState, ForgeOperation, MintOperation, NftCatalogItem, OperationStatus,
    OwnedAsset, OwnedAssetStatus,
};
pub use player::Player;
pub use scope::{AssetTier, ScopeKind};
pub use season::{Cycle, LeaderboardSnapshot, Season, SeasonPoints, DEFAULT_GRACE_DAYS};
pub use session::{
    ServedQuestionPublic, ServedQuestionRecord, Session, SessionStatus, QUESTIONS_PER_SESSION,
    WIN_THRESHOLD,
};
