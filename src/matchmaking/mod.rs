//! Find-or-create matchmaking
//!
//! Resolves the routing queue, searches for a joinable session, and either
//! admits the player into it or requests a new session placement.

pub mod admission;
pub mod handler;
pub mod placement;
pub mod queue_selector;
pub mod session_search;

pub use admission::AdmissionService;
pub use handler::{parse_request, HandlerResponse, MatchRequestHandler};
pub use placement::PlacementOrchestrator;
pub use queue_selector::{QueueSelection, QueueSelector};
pub use session_search::{select_oldest_joinable, SessionSearchEngine};
