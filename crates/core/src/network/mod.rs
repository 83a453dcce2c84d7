//! Stations, lines and the graph that ties them together.

mod colour;
mod snapshot;

pub use colour::Colour;
pub use snapshot::{EdgeSnapshot, LineSnapshot, NetworkSnapshot};

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use serde::{Deserialize, Serialize};

use crate::{
    error::{NetworkError, Result},
    relation::ContainerRelation,
};

/// Handle to a station node in a [`Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId(NodeIndex);

impl StationId {
    /// Position of the node in the underlying graph.
    pub fn index(self) -> usize {
        self.0.index()
    }
}

/// Handle to a line in a [`Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineId(usize);

impl LineId {
    /// Position of the line in creation order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named stop. Names are unique within a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Display name.
    pub name: String,
}

/// A named, coloured group of edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    name: String,
    colour: Colour,
}

impl Line {
    /// Build a line from raw colour components, each of which must lie in
    /// `0..=255`.
    pub fn new(name: impl Into<String>, colour: [i64; 3]) -> Result<Self> {
        Ok(Self::with_colour(name, Colour::from_components(colour)?))
    }

    /// Build a line from an already validated colour.
    pub fn with_colour(name: impl Into<String>, colour: Colour) -> Self {
        Self {
            name: name.into(),
            colour,
        }
    }

    /// Line name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Line colour.
    pub fn colour(&self) -> Colour {
        self.colour
    }
}

/// The station graph plus line bookkeeping.
///
/// Stations are graph nodes and every edge is labelled with the line it
/// belongs to. The graph is kept simple: at most one edge joins a pair of
/// stations. The network owns its lines outright and a [`LineId`] is the
/// line's position in creation order; lines are never removed.
#[derive(Debug, Default)]
pub struct Network {
    graph: StableUnGraph<Station, LineId>,
    station_names: HashMap<String, StationId>,
    lines: Vec<Line>,
    line_names: HashSet<String>,
    line_stations: ContainerRelation<LineId, StationId>,
}

impl Network {
    /// An empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stations.
    pub fn station_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Whether `name` is already taken by a station.
    pub fn has_station_name(&self, name: &str) -> bool {
        self.station_names.contains_key(name)
    }

    /// Whether `name` is already taken by a line.
    pub fn has_line_name(&self, name: &str) -> bool {
        self.line_names.contains(name)
    }

    /// Look up a station.
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.graph.node_weight(id.0)
    }

    /// Find a station by display name.
    pub fn station_by_name(&self, name: &str) -> Option<StationId> {
        self.station_names.get(name).copied()
    }

    /// All stations in insertion order.
    pub fn stations(&self) -> impl Iterator<Item = (StationId, &Station)> + '_ {
        self.graph
            .node_indices()
            .filter_map(move |index| Some((StationId(index), self.graph.node_weight(index)?)))
    }

    /// Look up a line.
    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(id.0)
    }

    /// Find a line by name.
    pub fn line_by_name(&self, name: &str) -> Option<LineId> {
        self.lines
            .iter()
            .position(|line| line.name == name)
            .map(LineId)
    }

    /// All lines in creation order.
    pub fn lines(&self) -> impl Iterator<Item = (LineId, &Line)> + '_ {
        self.lines
            .iter()
            .enumerate()
            .map(|(index, line)| (LineId(index), line))
    }

    /// Stations registered on `line`, in the order they joined it.
    pub fn stations_on(&self, line: LineId) -> &[StationId] {
        self.line_stations.contents(line)
    }

    /// Lines `station` has been registered on.
    pub fn lines_serving(&self, station: StationId) -> &[LineId] {
        self.line_stations.containers(station)
    }

    /// Whether `station` is registered on `line`.
    pub fn line_contains(&self, line: LineId, station: StationId) -> bool {
        self.line_stations.contains(line, station)
    }

    /// Stations directly connected to `station`.
    pub fn neighbours(&self, station: StationId) -> Vec<StationId> {
        self.graph.neighbors(station.0).map(StationId).collect()
    }

    /// Line labelling the edge between `a` and `b`, if they are adjacent.
    pub fn edge_line(&self, a: StationId, b: StationId) -> Option<LineId> {
        let edge = self.graph.find_edge(a.0, b.0)?;
        self.graph.edge_weight(edge).copied()
    }

    /// Every edge as `(a, b, line)`.
    pub fn edges(&self) -> Vec<(StationId, StationId, LineId)> {
        self.graph
            .edge_indices()
            .filter_map(|edge| {
                let (a, b) = self.graph.edge_endpoints(edge)?;
                let line = *self.graph.edge_weight(edge)?;
                Some((StationId(a), StationId(b), line))
            })
            .collect()
    }

    pub(crate) fn add_station(&mut self, name: String) -> Result<StationId> {
        if self.station_names.contains_key(&name) {
            return Err(NetworkError::invalid(format!(
                "station name '{name}' is already in use"
            )));
        }
        let id = StationId(self.graph.add_node(Station { name: name.clone() }));
        self.station_names.insert(name, id);
        Ok(id)
    }

    pub(crate) fn add_line(&mut self, line: Line) -> Result<LineId> {
        self.check_line_name(line.name())?;
        let id = LineId(self.lines.len());
        self.line_names.insert(line.name.clone());
        self.lines.push(line);
        Ok(id)
    }

    pub(crate) fn check_line_name(&self, name: &str) -> Result<()> {
        if self.line_names.contains(name) {
            return Err(NetworkError::invalid(format!(
                "line name '{name}' is already in use"
            )));
        }
        Ok(())
    }

    pub(crate) fn register(&mut self, line: LineId, station: StationId) {
        self.line_stations.add(line, station);
    }

    /// Join two stations with an edge on `line`, replacing the label of any
    /// existing edge between them.
    pub(crate) fn connect(&mut self, a: StationId, b: StationId, line: LineId) -> Result<()> {
        if a == b {
            return Err(NetworkError::invalid("a station cannot be connected to itself"));
        }
        self.require_station(a)?;
        self.require_station(b)?;
        self.require_line(line)?;
        self.graph.update_edge(a.0, b.0, line);
        Ok(())
    }

    pub(crate) fn require_station(&self, id: StationId) -> Result<&Station> {
        self.station(id)
            .ok_or_else(|| NetworkError::invalid(format!("unknown station {}", id.index())))
    }

    pub(crate) fn require_line(&self, id: LineId) -> Result<&Line> {
        self.line(id)
            .ok_or_else(|| NetworkError::invalid(format!("unknown line {}", id.index())))
    }
}
