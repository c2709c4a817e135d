//! Interactive court scheduling board.
//!
//! Turns a flat planning dataset (divisions, phases, courts, encounters)
//! into the derived structures a court/time board renders, and coordinates
//! the user's edits against an external scheduling service. The service is
//! the source of truth: every mutation is followed by a full reload.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Encounter`, `Division`, `Phase`, `Court`,
//!   `ResourceGroup`, `PlanningData`, division palette
//! - **`layout`**: Derived views: `TimeAxisBuilder`, `HierarchyAggregator`,
//!   `ResourceGridIndex`
//! - **`interaction`**: Client-side state: `PlacementController` (move mode),
//!   `ViewStateManager` (expansion, filter, granularity)
//! - **`service`**: `SchedulingService` contract and `InMemoryService`
//! - **`orchestrator`**: `ScheduleOrchestrator`, the load/mutate/reload pipeline
//! - **`validation`**: Dataset integrity checks (duplicate IDs, dangling refs)
//! - **`config`**: `BoardConfig`
//! - **`error`**: `BoardError`, `ServiceError`
//!
//! # Data flow
//!
//! ```text
//! render:   PlanningData ─▶ Hierarchy / ResourceGridIndex / TimeAxis ─▶ UI
//! mutation: PlacementController / ScheduleOrchestrator ─▶ SchedulingService
//!           ─▶ reload PlanningData ─▶ render
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use u_courtboard::{AutoAssignScope, BoardConfig, InMemoryService, PlanningData, ScheduleOrchestrator};
//!
//! # async fn run(data: PlanningData) -> Result<(), u_courtboard::BoardError> {
//! let service = Arc::new(InMemoryService::new(data));
//! let board = ScheduleOrchestrator::new(service, "E1", BoardConfig::default())?;
//! board.load_all().await;
//! let notice = board.auto_assign(AutoAssignScope::WholeEvent).await;
//! println!("{}", notice.message);
//! for row in board.grid()? {
//!     println!("{:?} {}", row.label, row.cells.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod interaction;
pub mod layout;
pub mod models;
pub mod orchestrator;
pub mod service;
mod sync;
pub mod validation;

pub use config::BoardConfig;
pub use error::{BoardError, ServiceError};
pub use interaction::{DivisionFilter, PlacementController, PlacementState, ViewStateManager};
pub use layout::{CellKind, HierarchyAggregator, ResourceGridIndex, TimeAxis, TimeAxisBuilder};
pub use models::PlanningData;
pub use orchestrator::{AutoAssignScope, Notice, NoticeLevel, ScheduleOrchestrator};
pub use service::{InMemoryService, SchedulingService};
