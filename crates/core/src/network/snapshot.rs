use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Colour, Network, StationId};

/// Read-only, serializable view of a network at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Raw seed the network was grown from.
    pub seed: u64,
    /// When the snapshot was taken.
    pub generated_at: DateTime<Utc>,
    /// Station names in creation order.
    pub stations: Vec<String>,
    /// Lines in creation order.
    pub lines: Vec<LineSnapshot>,
    /// Edges between stations.
    pub edges: Vec<EdgeSnapshot>,
}

/// One line and the stations registered on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSnapshot {
    /// Line name.
    pub name: String,
    /// Colour as `#rrggbb`.
    pub colour: Colour,
    /// Member station names in joining order.
    pub stations: Vec<String>,
}

/// An edge, identified by station and line names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    /// One endpoint.
    pub from: String,
    /// The other endpoint.
    pub to: String,
    /// Line labelling the edge.
    pub line: String,
}

impl NetworkSnapshot {
    /// Capture the current state of `network`.
    pub fn capture(network: &Network, seed: u64) -> Self {
        let name_of = |id: StationId| {
            network
                .station(id)
                .map(|station| station.name.clone())
                .unwrap_or_default()
        };

        let stations = network
            .stations()
            .map(|(_, station)| station.name.clone())
            .collect();
        let lines = network
            .lines()
            .map(|(id, line)| LineSnapshot {
                name: line.name().to_string(),
                colour: line.colour(),
                stations: network.stations_on(id).iter().copied().map(name_of).collect(),
            })
            .collect();
        let edges = network
            .edges()
            .into_iter()
            .map(|(a, b, line)| EdgeSnapshot {
                from: name_of(a),
                to: name_of(b),
                line: network
                    .line(line)
                    .map(|line| line.name().to_string())
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            seed,
            generated_at: Utc::now(),
            stations,
            lines,
            edges,
        }
    }

    /// Pretty-printed JSON form.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
