//! One `FromRow` struct per table plus a fallible conversion into the
//! shared `trivia_types` entity, so every engine crate consumes the same
//! domain type regardless of which query produced it. Kept separate from
//! `trivia_types` itself so that crate stays free of a `sqlx` dependency.

use sqlx::types::Json;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use trivia_error::Error;
use trivia_types::{
    AssetSource, AssetTier, Category, Eligibility, EligibilityStatus, ForgeOperation, MintOperation,
    NftCatalogItem, OperationStatus, OwnedAsset, OwnedAssetStatus, Player, PlayerIdentity, Question,
    ScopeKind, Season, SeasonPoints, ServedQuestionRecord, Session, SessionStatus,
};

fn identity_from_columns(stake: Option<String>, anon_id: Option<String>) -> Result<PlayerIdentity, Error> {
    match (stake, anon_id) {
        (Some(stake), None) => Ok(PlayerIdentity::Stake(stake)),
        (None, Some(anon)) => Ok(PlayerIdentity::Anon(anon)),
        _ => Err(Error::fatal("player row has neither or both of stake/anon_id set")),
    }
}

#[derive(Debug, FromRow)]
pub struct PlayerRow {
    pub id: Uuid,
    pub stake: Option<String>,
    pub anon_id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub payment_address: Option<String>,
    pub created_at: OffsetDateTime,
    pub last_seen_at: OffsetDateTime,
}

impl TryFrom<PlayerRow> for Player {
    type Error = Error;

    fn try_from(row: PlayerRow) -> Result<Self, Self::Error> {
        Ok(Player {
            id: row.id,
            identity: identity_from_columns(row.stake, row.anon_id)?,
            username: row.username,
            email: row.email,
            payment_address: row.payment_address,
            created_at: row.created_at,
            last_seen_at: row.last_seen_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct CategoryRow {
    pub id: Uuid,
    pub slug: String,
    pub code: String,
    pub active: bool,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category { id: row.id, slug: row.slug, code: row.code, active: row.active }
    }
}

#[derive(Debug, FromRow)]
pub struct QuestionRow {
    pub id: Uuid,
    pub category_id: Uuid,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: i16,
    pub explanation: String,
    pub source: String,
    pub content_hash: String,
}

impl TryFrom<QuestionRow> for Question {
    type Error = Error;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let options: [String; 4] = row
            .options
            .try_into()
            .map_err(|_| Error::fatal("question row does not have exactly 4 options"))?;
        Ok(Question {
            id: row.id,
            category_id: row.category_id,
            text: row.text,
            options,
            correct_index: row.correct_index as u8,
            explanation: row.explanation,
            source: row.source,
            content_hash: row.content_hash,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub player_id: Uuid,
    pub stake: Option<String>,
    pub anon_id: Option<String>,
    pub category_id: Uuid,
    pub status: String,
    pub current_question_index: i16,
    pub questions: Json<Vec<ServedQuestionRecord>>,
    pub score: i16,
    pub started_at: OffsetDateTime,
    pub ended_at: Option<OffsetDateTime>,
    pub total_duration_ms: Option<i64>,
}

fn session_status_from_str(s: &str) -> Result<SessionStatus, Error> {
    match s {
        "active" => Ok(SessionStatus::Active),
        "won" => Ok(SessionStatus::Won),
        "lost" => Ok(SessionStatus::Lost),
        "forfeit" => Ok(SessionStatus::Forfeit),
        other => Err(Error::fatal(format!("unknown session status in row: {other}"))),
    }
}

impl TryFrom<SessionRow> for Session {
    type Error = Error;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Session {
            id: row.id,
            player_id: row.player_id,
            identity: identity_from_columns(row.stake, row.anon_id)?,
            category_id: row.category_id,
            status: session_status_from_str(&row.status)?,
            current_question_index: row.current_question_index as u8,
            questions: row.questions.0,
            score: row.score as u8,
            started_at: row.started_at,
            ended_at: row.ended_at,
            total_duration_ms: row.total_duration_ms.map(|v| v as u64),
        })
    }
}

fn scope_from_str(s: &str) -> Result<ScopeKind, Error> {
    match s {
        "category" => Ok(ScopeKind::Category),
        "master" => Ok(ScopeKind::Master),
        "season" => Ok(ScopeKind::Season),
        other => Err(Error::fatal(format!("unknown scope in row: {other}"))),
    }
}

fn eligibility_status_from_str(s: &str) -> Result<EligibilityStatus, Error> {
    match s {
        "active" => Ok(EligibilityStatus::Active),
        "used" => Ok(EligibilityStatus::Used),
        "expired" => Ok(EligibilityStatus::Expired),
        other => Err(Error::fatal(format!("unknown eligibility status in row: {other}"))),
    }
}

#[derive(Debug, FromRow)]
pub struct EligibilityRow {
    pub id: Uuid,
    pub eligibility_type: String,
    pub category_id: Option<Uuid>,
    pub season_id: Option<String>,
    pub player_id: Uuid,
    pub issued_from_session: Uuid,
    pub status: String,
    pub issued_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl TryFrom<EligibilityRow> for Eligibility {
    type Error = Error;

    fn try_from(row: EligibilityRow) -> Result<Self, Self::Error> {
        Ok(Eligibility {
            id: row.id,
            eligibility_type: scope_from_str(&row.eligibility_type)?,
            category_id: row.category_id,
            season_id: row.season_id,
            player_id: row.player_id,
            issued_from_session: row.issued_from_session,
            status: eligibility_status_from_str(&row.status)?,
            issued_at: row.issued_at,
            expires_at: row.expires_at,
        })
    }
}

fn tier_from_str(s: &str) -> Result<AssetTier, Error> {
    match s {
        "category" => Ok(AssetTier::Category),
        "category_ultimate" => Ok(AssetTier::CategoryUltimate),
        "master_ultimate" => Ok(AssetTier::MasterUltimate),
        "seasonal_ultimate" => Ok(AssetTier::SeasonalUltimate),
        other => Err(Error::fatal(format!("unknown asset tier in row: {other}"))),
    }
}

fn stock_state_from_str(s: &str) -> Result<trivia_types::CatalogStockState, Error> {
    use trivia_types::CatalogStockState::*;
    match s {
        "available" => Ok(Available),
        "reserved" => Ok(Reserved),
        "minted" => Ok(Minted),
        other => Err(Error::fatal(format!("unknown stock state in row: {other}"))),
    }
}

#[derive(Debug, FromRow)]
pub struct NftCatalogRow {
    pub id: Uuid,
    pub category_id: Uuid,
    pub display_name: String,
    pub artwork_blob_key: String,
    pub metadata_blob_key: String,
    pub content_address: Option<String>,
    pub stock_state: String,
    pub tier: String,
}

impl TryFrom<NftCatalogRow> for NftCatalogItem {
    type Error = Error;

    fn try_from(row: NftCatalogRow) -> Result<Self, Self::Error> {
        Ok(NftCatalogItem {
            id: row.id,
            category_id: row.category_id,
            display_name: row.display_name,
            artwork_blob_key: row.artwork_blob_key,
            metadata_blob_key: row.metadata_blob_key,
            content_address: row.content_address,
            stock_state: stock_state_from_str(&row.stock_state)?,
            tier: tier_from_str(&row.tier)?,
        })
    }
}

fn operation_status_from_str(s: &str) -> Result<OperationStatus, Error> {
    match s {
        "pending" => Ok(OperationStatus::Pending),
        "confirmed" => Ok(OperationStatus::Confirmed),
        "failed" => Ok(OperationStatus::Failed),
        other => Err(Error::fatal(format!("unknown operation status in row: {other}"))),
    }
}

#[derive(Debug, FromRow)]
pub struct MintOperationRow {
    pub id: Uuid,
    pub eligibility_id: Uuid,
    pub catalog_id: Uuid,
    pub player_id: Uuid,
    pub stake: String,
    pub policy_id: String,
    pub status: String,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
    pub created_at: OffsetDateTime,
    pub confirmed_at: Option<OffsetDateTime>,
}

impl TryFrom<MintOperationRow> for MintOperation {
    type Error = Error;

    fn try_from(row: MintOperationRow) -> Result<Self, Self::Error> {
        Ok(MintOperation {
            id: row.id,
            eligibility_id: row.eligibility_id,
            catalog_id: row.catalog_id,
            player_id: row.player_id,
            stake: row.stake,
            policy_id: row.policy_id,
            status: operation_status_from_str(&row.status)?,
            tx_hash: row.tx_hash,
            error: row.error,
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct ForgeOperationRow {
    pub id: Uuid,
    pub scope: String,
    pub stake: String,
    pub category_id: Option<Uuid>,
    pub season_id: Option<String>,
    pub input_fingerprints: Vec<String>,
    pub burn_tx_hash: Option<String>,
    pub mint_tx_hash: Option<String>,
    pub output_fingerprint: Option<String>,
    pub status: String,
    pub error: Option<String>,
    pub created_at: OffsetDateTime,
    pub confirmed_at: Option<OffsetDateTime>,
}

impl TryFrom<ForgeOperationRow> for ForgeOperation {
    type Error = Error;

    fn try_from(row: ForgeOperationRow) -> Result<Self, Self::Error> {
        Ok(ForgeOperation {
            id: row.id,
            scope: scope_from_str(&row.scope)?,
            stake: row.stake,
            category_id: row.category_id,
            season_id: row.season_id,
            input_fingerprints: row.input_fingerprints,
            burn_tx_hash: row.burn_tx_hash,
            mint_tx_hash: row.mint_tx_hash,
            output_fingerprint: row.output_fingerprint,
            status: operation_status_from_str(&row.status)?,
            error: row.error,
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct OwnedAssetRow {
    pub id: Uuid,
    pub stake: String,
    pub policy_id: String,
    pub fingerprint: String,
    pub asset_name: String,
    pub source: String,
    pub category_id: Option<Uuid>,
    pub season_id: Option<String>,
    pub tier: String,
    pub status: String,
    pub minted_at: OffsetDateTime,
    pub burned_at: Option<OffsetDateTime>,
    pub metadata: serde_json::Value,
}

impl TryFrom<OwnedAssetRow> for OwnedAsset {
    type Error = Error;

    fn try_from(row: OwnedAssetRow) -> Result<Self, Self::Error> {
        let source = match row.source.as_str() {
            "mint" => AssetSource::Mint,
            "forge" => AssetSource::Forge,
            other => return Err(Error::fatal(format!("unknown asset source in row: {other}"))),
        };
        let status = match row.status.as_str() {
            "confirmed" => OwnedAssetStatus::Confirmed,
            "burned" => OwnedAssetStatus::Burned,
            other => return Err(Error::fatal(format!("unknown owned asset status in row: {other}"))),
        };
        Ok(OwnedAsset {
            id: row.id,
            stake: row.stake,
            policy_id: row.policy_id,
            fingerprint: row.fingerprint,
            asset_name: row.asset_name,
            source,
            category_id: row.category_id,
            season_id: row.season_id,
            tier: tier_from_str(&row.tier)?,
            status,
            minted_at: row.minted_at,
            burned_at: row.burned_at,
            metadata: row.metadata,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct SeasonRow {
    pub id: String,
    pub display_name: String,
    pub starts_at: OffsetDateTime,
    pub ends_at: OffsetDateTime,
    pub grace_days: i32,
    pub active: bool,
}

impl From<SeasonRow> for Season {
    fn from(row: SeasonRow) -> Self {
        Season {
            id: row.id,
            display_name: row.display_name,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            grace_days: row.grace_days as u32,
            active: row.active,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct SeasonPointsRow {
    pub season_id: String,
    pub stake: String,
    pub points: i64,
    pub perfect_count: i32,
    pub nfts_minted: i32,
    pub avg_answer_ms: f64,
    pub sessions_used: i32,
    pub first_achieved_at: Option<OffsetDateTime>,
}

impl From<SeasonPointsRow> for SeasonPoints {
    fn from(row: SeasonPointsRow) -> Self {
        SeasonPoints {
            season_id: row.season_id,
            stake: row.stake,
            points: row.points,
            perfect_count: row.perfect_count as u32,
            nfts_minted: row.nfts_minted as u32,
            avg_answer_ms: row.avg_answer_ms,
            sessions_used: row.sessions_used as u32,
            first_achieved_at: row.first_achieved_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct LeaderboardSnapshotRow {
    pub season_id: String,
    pub snapshot_date: time::Date,
    pub stake: String,
    pub rank: i32,
    pub points: i64,
    pub nfts_minted: i32,
    pub perfect_count: i32,
    pub avg_answer_ms: f64,
    pub sessions_used: i32,
    pub first_achieved_at: Option<OffsetDateTime>,
}

impl From<LeaderboardSnapshotRow> for trivia_types::LeaderboardSnapshot {
    fn from(row: LeaderboardSnapshotRow) -> Self {
        trivia_types::LeaderboardSnapshot {
            season_id: row.season_id,
            snapshot_date: row.snapshot_date,
            stake: row.stake,
            rank: row.rank as u32,
            points: row.points,
            nfts_minted: row.nfts_minted as u32,
            perfect_count: row.perfect_count as u32,
            avg_answer_ms: row.avg_answer_ms,
            sessions_used: row.sessions_used as u32,
            first_achieved_at: row.first_achieved_at,
        }
    }
}
