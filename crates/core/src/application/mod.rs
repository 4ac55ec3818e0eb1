// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod search;
pub mod shop_floor;
pub mod ticker;

// Re-exports
pub use search::{search, SearchQuery, SearchResults};
pub use shop_floor::{
    default_roster, validate_roster, AddJobRequest, Command, CommandOutcome, CompletionOutcome,
    MachineSeed, PersistenceStatus, ShopFloorService, Submission,
};
pub use ticker::{shutdown_channel, ElapsedTicker, ShutdownSender, ShutdownToken};
