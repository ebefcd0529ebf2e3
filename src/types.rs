//! Common types used throughout the session broker
//!
//! Backend-facing records use the hosting service's PascalCase wire names so
//! they can be decoded from, and echoed back to clients in, the same shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::utils::epoch_seconds;

/// Unique identifier for players
pub type PlayerId = String;

/// Unique identifier for game sessions
pub type GameSessionId = String;

/// Unique identifier for placements
pub type PlacementId = Uuid;

/// Operation requested by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpCode {
    FindMatch,
    Unknown(String),
}

impl OpCode {
    /// Wire value of the find-match operation
    pub const FIND_MATCH: &'static str = "1";

    pub fn parse(raw: &str) -> Self {
        match raw {
            Self::FIND_MATCH => OpCode::FindMatch,
            other => OpCode::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpCode::FindMatch => write!(f, "FindMatch"),
            OpCode::Unknown(raw) => write!(f, "Unknown({})", raw),
        }
    }
}

/// A parsed inbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRequest {
    pub op_code: OpCode,
    pub player_id: PlayerId,
}

/// One routable target inside a routing queue (alias or fleet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DestinationRef {
    pub destination_arn: String,
}

impl DestinationRef {
    pub fn new(destination_arn: impl Into<String>) -> Self {
        Self {
            destination_arn: destination_arn.into(),
        }
    }

    /// Whether this destination points at an alias rather than a fleet
    pub fn is_alias(&self) -> bool {
        self.destination_arn.contains(":alias/") || self.destination_arn.starts_with("alias-")
    }
}

/// A configured routing queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoutingQueue {
    pub name: String,
    #[serde(
        default,
        rename = "GameSessionQueueArn",
        skip_serializing_if = "Option::is_none"
    )]
    pub arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_in_seconds: Option<u32>,
    #[serde(default)]
    pub destinations: Vec<DestinationRef>,
}

impl RoutingQueue {
    /// The destination consulted when searching for sessions
    pub fn first_destination(&self) -> Option<&DestinationRef> {
        self.destinations.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameSessionStatus {
    Active,
    Activating,
    Terminated,
    Terminating,
    Error,
}

/// A live hosting unit, owned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GameSession {
    pub game_session_id: GameSessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fleet_id: Option<String>,
    pub status: GameSessionStatus,
    /// Not part of the hosted wire shape; set by the backend client from
    /// the search it ran.
    #[serde(default)]
    pub has_available_player_sessions: bool,
    #[serde(default)]
    pub current_player_session_count: u32,
    #[serde(default)]
    pub maximum_player_session_count: u32,
    #[serde(with = "epoch_seconds")]
    pub creation_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// A player slot requested as part of a placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DesiredPlayer {
    pub player_id: PlayerId,
}

/// Request to create and place a new game session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementRequest {
    pub placement_id: PlacementId,
    pub queue_name: String,
    pub max_players: u32,
    pub desired_players: Vec<DesiredPlayer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacementStatus {
    Pending,
    Fulfilled,
    Cancelled,
    TimedOut,
    Failed,
}

/// The backend's view of a placement; `Pending` until fulfilled out of band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlacementResult {
    pub placement_id: PlacementId,
    pub game_session_queue_name: String,
    pub status: PlacementStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_player_session_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_session_id: Option<GameSessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_session_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(
        default,
        with = "epoch_seconds::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "epoch_seconds::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<DateTime<Utc>>,
    /// Attributes this service does not interpret, passed through unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlayerSessionStatus {
    Reserved,
    Active,
    Completed,
    Timedout,
}

/// A player's reserved slot in an existing game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerAdmission {
    pub player_session_id: String,
    pub player_id: PlayerId,
    pub game_session_id: GameSessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fleet_id: Option<String>,
    pub status: PlayerSessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(
        default,
        with = "epoch_seconds::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response body for a successful join: the admission plus session summary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JoinedSession {
    #[serde(flatten)]
    pub player_session: PlayerAdmission,
    pub player_session_status: PlayerSessionStatus,
    pub game_session_status: GameSessionStatus,
}

impl JoinedSession {
    pub fn new(admission: PlayerAdmission, session: &GameSession) -> Self {
        Self {
            player_session_status: admission.status,
            game_session_status: session.status,
            player_session: PlayerAdmission {
                game_session_id: session.game_session_id.clone(),
                ..admission
            },
        }
    }
}

/// Outcome of one handled request
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Unknown or missing op code; answered with an empty object
    NoOp,
    /// Player was admitted into an existing session
    Joined(JoinedSession),
    /// A new session placement was requested
    Placed(PlacementResult),
}
