//! UI-side interaction state.
//!
//! - **`placement`**: the Idle / Selected / Moving state machine
//! - **`view_state`**: expansion sets, division filter, granularity
//!
//! Neither is persisted or sent to the service.

pub mod placement;
pub mod view_state;

pub use placement::{MoveRequest, PlacementController, PlacementState};
pub use view_state::{DivisionFilter, ViewState, ViewStateManager};
