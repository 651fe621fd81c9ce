//! Selection lifecycle
//!
//! Explicit state machine for the text-selection toolbox: a pointer-up
//! with a usable selection shows the toolbox, confirming commits a
//! highlight, and the last committed highlight is tracked so a superseding
//! selection or a closed context preamble can remove it deterministically.

pub mod controller;

pub use controller::{
    CommitOutcome, CommittedHighlight, ControllerState, Rect, RemovalPlan, SelectionController,
    SelectionSnapshot, ToolboxPlacement, TOOLBOX_LIFT,
};
