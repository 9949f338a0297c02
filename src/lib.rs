//! formflow - multi-step form wizards with draft persistence
//!
//! The engine ([`wizard`], [`drafts`], [`form_data`]) is independent of the
//! terminal front end ([`ui`], [`app`]) and of declarative forms ([`forms`]).

pub mod app;
pub mod config;
pub mod drafts;
pub mod form_data;
pub mod forms;
pub mod logging;
pub mod ui;
pub mod wizard;
