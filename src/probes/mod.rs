//! Independent signal probes.
//!
//! Each probe measures one demand or supply signal for a keyword.
//! Probes are independent: a failure in one degrades that signal to
//! its zero default in the pipeline and never aborts the others.

pub mod marketplace;
pub mod social;
pub mod volume;

pub use marketplace::SupplyProbe;
pub use social::SocialClient;
pub use volume::VolumeClient;
