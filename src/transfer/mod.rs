//! Transfer module
//!
//! Data channel negotiation, the streaming loops for files and listings,
//! and the engine that sequences one transfer on the control channel.

pub mod data_channel;
pub mod engine;
pub mod file_ops;
pub mod listing;
pub mod modes;
pub mod stats;

pub use data_channel::DataChannel;
pub use engine::{TransferBody, TransferContext, TransferOutcome};
pub use listing::ListingTarget;
pub use modes::{DataMode, TransferType};
pub use stats::TransferStats;
