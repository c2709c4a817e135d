//! Planning domain models.
//!
//! Read-only snapshots of what the external scheduling service owns:
//! divisions with their phases, courts grouped into resource groups, and
//! the encounters to be placed on them.
//!
//! # Domain Mappings
//!
//! | u-courtboard | Tournament | Generic scheduling |
//! |--------------|------------|--------------------|
//! | Encounter | Match | Activity |
//! | Court | Court / Field / Table | Resource |
//! | ResourceGroup | Venue / Hall | Resource pool |
//! | Division | Age group / Category | Task family |
//! | Phase | Pool round / Bracket | Stage |

mod dataset;
mod division;
mod encounter;
mod palette;
mod resource;

pub use dataset::PlanningData;
pub use division::{Division, Phase};
pub use encounter::{Encounter, EncounterStatus, TBD_LABEL};
pub use palette::{palette_color, ColorToken, PALETTE};
pub use resource::{Court, ResourceGroup};

/// Instant with the timezone offset it was reported in.
pub type Timestamp = chrono::DateTime<chrono::FixedOffset>;
