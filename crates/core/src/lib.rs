#![warn(clippy::all, missing_docs)]

//! Core logic for procedurally generated transit networks.
//!
//! This crate hosts seed handling, station-name synthesis, the network
//! model and its growth operations, plus the configuration used by the
//! command-line frontend.

pub mod config;
pub mod error;
pub mod growth;
pub mod naming;
pub mod network;
pub mod relation;
pub mod seed;

pub use config::AppConfig;
pub use error::NetworkError;
pub use growth::{GrowthEngine, SharedEngine};
pub use naming::{
    FilePartSource, NameSynthesizer, NameWeights, PartKind, PartSource, StaticPartSource,
    WeightUpdate,
};
pub use network::{Colour, Line, LineId, Network, NetworkSnapshot, Station, StationId};
pub use relation::ContainerRelation;
