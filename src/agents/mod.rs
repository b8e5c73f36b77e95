//! Agent populations.
//!
//! The crate knows a small closed set of agent kinds; cell contents are
//! classified by tag, never by downcasting.

mod farmers;
mod grazing;

pub use farmers::{Farmer, FarmerPopulation};
pub use grazing::{Critter, GrassPatch, GrazingParams, GrazingPopulation};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Farmer,
    Grass,
    Sheep,
    Wolf,
}

impl AgentKind {
    pub fn label(self) -> &'static str {
        match self {
            AgentKind::Farmer => "farmer",
            AgentKind::Grass => "grass",
            AgentKind::Sheep => "sheep",
            AgentKind::Wolf => "wolf",
        }
    }
}
