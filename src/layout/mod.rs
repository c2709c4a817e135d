//! Derived board layout.
//!
//! Everything here is a pure function of a planning snapshot:
//!
//! - **`axis`**: vertical time axis (`TimeAxisBuilder`, `TimeAxis`)
//! - **`hierarchy`**: division → phase → encounter tree with counts
//! - **`grid`**: court × slot cell classification and overlap detection
//!
//! Data flows one way: snapshot → layout → render. Nothing here talks to
//! the scheduling service or keeps state between reloads.

pub mod axis;
pub mod grid;
pub mod hierarchy;

pub use axis::{TimeAxis, TimeAxisBuilder};
pub use grid::{CellKind, GridCell, GridEntry, GridRow, Overlap, ResourceGridIndex};
pub use hierarchy::{
    DivisionNode, Hierarchy, HierarchyAggregator, NodeStats, PhaseKey, PhaseNode, PhaseNodeKey,
    TimeBounds,
};
