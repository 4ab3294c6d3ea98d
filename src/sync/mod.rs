pub mod career;
pub mod config;
pub mod events;
pub mod league_import;

pub use career::{CareerSync, CareerSyncSummary};
pub use config::SyncConfig;
pub use events::{EventCatchUp, EventSyncReport};
pub use league_import::{
    AvailabilityStatus, AvailableSeasons, BatchItem, BatchOutcome, ImportSummary, LeagueImporter,
    LeagueRef,
};
