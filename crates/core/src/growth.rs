//! Growing a network one batch of uniquely named stations at a time.
//!
//! There are three ways to add stations:
//!
//! 1. Disconnected stations: isolated nodes, meant for the initial
//!    population of a network.
//! 2. A new line: a fresh [`Line`] whose new stations are registered on it
//!    but not yet joined by edges.
//! 3. Extending a line: a chain of new stations hanging off any station,
//!    not necessarily an end of the line.

use std::{collections::HashSet, ops::RangeInclusive, sync::Arc};

use parking_lot::{Mutex, MutexGuard};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::{
    error::{NetworkError, Result},
    naming::{NameSynthesizer, NameWeights, PartSource, WeightUpdate},
    network::{Colour, Line, LineId, Network, NetworkSnapshot, StationId},
    seed,
};

/// Initial population range used when none is configured.
pub const DEFAULT_START_RANGE: RangeInclusive<usize> = 20..=40;

/// Upper bound on naming rounds before a batch is abandoned.
pub const DEFAULT_MAX_NAME_ROUNDS: usize = 10_000;

/// Owns a [`Network`] and grows it with uniquely named stations.
#[derive(Debug)]
pub struct GrowthEngine {
    network: Network,
    namer: NameSynthesizer,
    user_seed: u64,
    start_range: RangeInclusive<usize>,
    max_name_rounds: usize,
}

impl GrowthEngine {
    /// Create an engine for `user_seed` with part tables from `source`.
    pub fn new(user_seed: u64, source: &dyn PartSource) -> Result<Self> {
        let namer = NameSynthesizer::from_source(user_seed, source)?;
        Ok(Self::with_synthesizer(user_seed, namer))
    }

    /// Create an engine around an existing synthesizer.
    pub fn with_synthesizer(user_seed: u64, namer: NameSynthesizer) -> Self {
        Self {
            network: Network::new(),
            namer,
            user_seed,
            start_range: DEFAULT_START_RANGE,
            max_name_rounds: DEFAULT_MAX_NAME_ROUNDS,
        }
    }

    /// Override the number of stations [`populate`](Self::populate) creates.
    pub fn with_start_range(mut self, range: RangeInclusive<usize>) -> Result<Self> {
        if range.is_empty() {
            return Err(NetworkError::invalid(format!(
                "start range {}..={} is empty",
                range.start(),
                range.end()
            )));
        }
        self.start_range = range;
        Ok(self)
    }

    /// Override the naming round cap. Zero is rejected.
    pub fn with_max_name_rounds(mut self, rounds: usize) -> Result<Self> {
        if rounds == 0 {
            return Err(NetworkError::invalid("max name rounds must be at least 1"));
        }
        self.max_name_rounds = rounds;
        Ok(self)
    }

    /// The network grown so far.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Raw seed supplied by the user.
    pub fn user_seed(&self) -> u64 {
        self.user_seed
    }

    /// Configured initial population range.
    pub fn start_range(&self) -> &RangeInclusive<usize> {
        &self.start_range
    }

    /// Current name weights.
    pub fn weights(&self) -> &NameWeights {
        self.namer.weights()
    }

    /// Replace any supplied name weight distributions.
    pub fn update_weights(&mut self, update: WeightUpdate) {
        self.namer.update_weights(update);
    }

    /// Raw synthesizer output for `growth_index`, without uniqueness checks
    /// and without touching the network.
    pub fn names_for(&self, growth_index: u64, count: usize) -> Result<Vec<String>> {
        self.namer.generate_for(growth_index, count)
    }

    /// Serializable view of the current network.
    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot::capture(&self.network, self.user_seed)
    }

    /// First growth step: add a seeded number of isolated stations drawn
    /// from the start range.
    pub fn populate(&mut self) -> Result<Vec<StationId>> {
        if self.network.station_count() > 0 {
            return Err(NetworkError::invalid(
                "populate only runs on an empty network",
            ));
        }
        let derived = seed::derive(self.namer.seed(), 1)?;
        let mut rng = ChaCha8Rng::seed_from_u64(derived as u64);
        let count = rng.gen_range(self.start_range.clone());
        info!(count, "populating network");
        self.grow_disconnected(count)
    }

    /// Add `count` isolated stations.
    pub fn grow_disconnected(&mut self, count: usize) -> Result<Vec<StationId>> {
        let names = self.unique_names(count)?;
        let ids = self.commit_stations(names)?;
        debug!(count, "added disconnected stations");
        Ok(ids)
    }

    /// Create a line and `count` new stations registered on it. No edges are
    /// added. A bad colour or a taken line name fails before any station is
    /// created.
    pub fn grow_new_line(
        &mut self,
        count: usize,
        name: impl Into<String>,
        colour: [i64; 3],
    ) -> Result<LineId> {
        let colour = Colour::from_components(colour)?;
        self.grow_new_line_with_colour(count, name, colour)
    }

    /// [`grow_new_line`](Self::grow_new_line) with a validated colour.
    pub fn grow_new_line_with_colour(
        &mut self,
        count: usize,
        name: impl Into<String>,
        colour: Colour,
    ) -> Result<LineId> {
        let name = name.into();
        self.network.check_line_name(&name)?;

        let names = self.unique_names(count)?;
        let line = self.network.add_line(Line::with_colour(name.clone(), colour))?;
        for station in self.commit_stations(names)? {
            self.network.register(line, station);
        }
        info!(line = %name, %colour, count, "created line");
        Ok(line)
    }

    /// Add `count` new stations to `line`, chained from `from`.
    ///
    /// `from` is joined to the first new station and each new station to
    /// the next. Only the new stations are registered on `line`.
    pub fn extend_line(
        &mut self,
        line: LineId,
        from: StationId,
        count: usize,
    ) -> Result<Vec<StationId>> {
        let line_name = self.network.require_line(line)?.name().to_string();
        self.network.require_station(from)?;

        let names = self.unique_names(count)?;
        let ids = self.commit_stations(names)?;
        let mut previous = from;
        for &station in &ids {
            self.network.connect(previous, station, line)?;
            self.network.register(line, station);
            previous = station;
        }
        info!(line = %line_name, count, "extended line");
        Ok(ids)
    }

    /// Join two existing stations with an edge on `line` and register both
    /// on it.
    pub fn connect(&mut self, a: StationId, b: StationId, line: LineId) -> Result<()> {
        self.network.connect(a, b, line)?;
        self.network.register(line, a);
        self.network.register(line, b);
        Ok(())
    }

    /// Produce `count` names that clash neither with each other nor with
    /// any existing station.
    ///
    /// Each round asks the synthesizer for exactly as many names as are
    /// still missing. The growth index starts at the station count plus
    /// one and advances by every name drawn, so each round sees a new seed.
    /// Advancing the index is deliberate: no station is committed until
    /// every name is settled, so recomputing from the unchanged station
    /// count would hand each retry the first round's seed again.
    fn unique_names(&self, count: usize) -> Result<Vec<String>> {
        let mut slots: Vec<Option<String>> = vec![None; count];
        let mut taken: HashSet<String> = HashSet::with_capacity(count);
        let mut growth_index = self.network.station_count() as u64 + 1;

        for round in 0..self.max_name_rounds {
            let open: Vec<usize> = slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.is_none())
                .map(|(index, _)| index)
                .collect();
            if open.is_empty() {
                return Ok(slots.into_iter().flatten().collect());
            }

            let candidates = self.namer.generate_for(growth_index, open.len())?;
            growth_index += candidates.len() as u64;

            let mut repeats = 0usize;
            for (slot, candidate) in open.into_iter().zip(candidates) {
                if self.network.has_station_name(&candidate) || taken.contains(&candidate) {
                    repeats += 1;
                    continue;
                }
                taken.insert(candidate.clone());
                slots[slot] = Some(candidate);
            }
            if repeats > 0 {
                debug!(round, repeats, "regenerating repeated station names");
            }
        }

        let missing = slots.iter().filter(|slot| slot.is_none()).count();
        if missing == 0 {
            return Ok(slots.into_iter().flatten().collect());
        }
        Err(NetworkError::NameSpaceExhausted {
            requested: missing,
            rounds: self.max_name_rounds,
        })
    }

    fn commit_stations(&mut self, names: Vec<String>) -> Result<Vec<StationId>> {
        names
            .into_iter()
            .map(|name| self.network.add_station(name))
            .collect()
    }
}

/// A [`GrowthEngine`] behind a single lock, for callers that need to share
/// one network across threads.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<GrowthEngine>>,
}

impl SharedEngine {
    /// Wrap `engine`.
    pub fn new(engine: GrowthEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Exclusive access for the duration of the guard.
    pub fn lock(&self) -> MutexGuard<'_, GrowthEngine> {
        self.inner.lock()
    }

    /// Snapshot taken under the lock.
    pub fn snapshot(&self) -> NetworkSnapshot {
        self.inner.lock().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::StaticPartSource;

    fn sample_source() -> StaticPartSource {
        StaticPartSource::new(
            ["north", "south", "east", "west", "upper", "lower"],
            [
                "ac", "bar", "cam", "dun", "ell", "fen", "gos", "hal", "ick", "kel", "lon", "mar",
            ],
            [
                "ton", "ford", "ley", "wick", "ham", "bury", "stead", "field", "worth", "well",
            ],
            ["bridge", "park", "green", "cross", "junction", "central"],
        )
    }

    fn engine() -> Result<GrowthEngine> {
        GrowthEngine::new(1863, &sample_source())
    }

    fn assert_unique(network: &Network) {
        let mut seen = HashSet::new();
        for (_, station) in network.stations() {
            assert!(seen.insert(station.name.clone()), "duplicate {}", station.name);
        }
    }

    #[test]
    fn first_batch_uses_the_station_count_plus_one() -> Result<()> {
        // One name on an empty network cannot clash with anything.
        let mut engine = engine()?;
        let expected = engine.names_for(1, 1)?;
        let ids = engine.grow_disconnected(1)?;
        assert_eq!(ids.len(), 1);
        let station = engine.network().station(ids[0]).map(|s| s.name.clone());
        assert_eq!(station.as_deref(), Some(expected[0].as_str()));
        assert!(engine.names_for(0, 1).is_err());
        Ok(())
    }

    #[test]
    fn first_occurrences_keep_their_slot() -> Result<()> {
        let mut engine = engine()?;
        let expected = engine.names_for(1, 6)?;
        let ids = engine.grow_disconnected(6)?;
        let names: Vec<String> = ids
            .iter()
            .filter_map(|id| engine.network().station(*id))
            .map(|station| station.name.clone())
            .collect();
        assert_eq!(names.len(), 6);
        assert_eq!(names[0], expected[0]);
        for (slot, candidate) in expected.iter().enumerate() {
            if !expected[..slot].contains(candidate) {
                assert_eq!(&names[slot], candidate, "slot {slot}");
            }
        }
        Ok(())
    }

    #[test]
    fn disconnected_stations_have_no_edges() -> Result<()> {
        let mut engine = engine()?;
        let ids = engine.grow_disconnected(30)?;
        assert_eq!(ids.len(), 30);
        assert_eq!(engine.network().station_count(), 30);
        assert_eq!(engine.network().edge_count(), 0);
        assert_unique(engine.network());
        Ok(())
    }

    #[test]
    fn names_stay_unique_across_growth() -> Result<()> {
        let mut engine = engine()?;
        engine.populate()?;
        let red = engine.grow_new_line(12, "Red", [255, 0, 0])?;
        let first = engine.network().stations_on(red)[0];
        engine.extend_line(red, first, 15)?;
        engine.grow_disconnected(40)?;
        engine.grow_new_line(20, "Blue", [0, 0, 255])?;
        assert_unique(engine.network());
        Ok(())
    }

    #[test]
    fn tiny_tables_still_yield_unique_names() -> Result<()> {
        // Two formers, two latters and no prefixes or suffixes in play: only
        // four distinct names exist, so batches repeat constantly.
        let source = StaticPartSource::new(["x"], ["ab", "cd"], ["ef", "gh"], ["y"]);
        let mut engine = GrowthEngine::new(5, &source)?;
        engine.update_weights(WeightUpdate {
            prefix: Some([1.0, 0.0]),
            shape: Some([1.0, 0.0, 0.0]),
            double_letter: None,
        });

        let ids = engine.grow_disconnected(4)?;
        assert_eq!(ids.len(), 4);
        assert_unique(engine.network());

        let mut names: Vec<String> = engine
            .network()
            .stations()
            .map(|(_, station)| station.name.clone())
            .collect();
        names.sort();
        assert_eq!(names, vec!["Abef", "Abgh", "Cdef", "Cdgh"]);
        Ok(())
    }

    #[test]
    fn exhausted_name_space_is_reported() -> Result<()> {
        let source = StaticPartSource::new(["x"], ["ab"], ["ef"], ["y"]);
        let mut engine = GrowthEngine::new(5, &source)?.with_max_name_rounds(50)?;
        engine.update_weights(WeightUpdate {
            prefix: Some([1.0, 0.0]),
            shape: Some([1.0, 0.0, 0.0]),
            double_letter: None,
        });

        match engine.grow_disconnected(2) {
            Err(NetworkError::NameSpaceExhausted { requested, rounds }) => {
                assert_eq!(requested, 1);
                assert_eq!(rounds, 50);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(engine.network().station_count(), 0);
        Ok(())
    }

    #[test]
    fn new_line_registers_its_stations() -> Result<()> {
        let mut engine = engine()?;
        let line = engine.grow_new_line(8, "Jubilee", [161, 165, 167])?;
        let network = engine.network();

        assert_eq!(network.stations_on(line).len(), 8);
        assert_eq!(network.edge_count(), 0);
        let info = network.line(line).expect("line exists");
        assert_eq!(info.name(), "Jubilee");
        assert_eq!(info.colour().to_hex(), "#a1a5a7");
        for &station in network.stations_on(line) {
            assert_eq!(network.lines_serving(station), &[line]);
        }
        Ok(())
    }

    #[test]
    fn bad_colour_creates_nothing() -> Result<()> {
        let mut engine = engine()?;
        let result = engine.grow_new_line(5, "Broken", [256, 0, 0]);
        assert!(matches!(result, Err(NetworkError::InvalidArgument(_))));
        assert_eq!(engine.network().station_count(), 0);
        assert_eq!(engine.network().line_count(), 0);
        Ok(())
    }

    #[test]
    fn duplicate_line_name_creates_nothing() -> Result<()> {
        let mut engine = engine()?;
        engine.grow_new_line(3, "Circle", [255, 205, 0])?;
        let result = engine.grow_new_line(3, "Circle", [0, 0, 0]);
        assert!(matches!(result, Err(NetworkError::InvalidArgument(_))));
        assert_eq!(engine.network().station_count(), 3);
        assert_eq!(engine.network().line_count(), 1);
        Ok(())
    }

    #[test]
    fn extension_chains_from_any_station() -> Result<()> {
        let mut engine = engine()?;
        let line = engine.grow_new_line(3, "Green", [0, 120, 42])?;
        let middle = engine.network().stations_on(line)[1];

        let added = engine.extend_line(line, middle, 4)?;
        let network = engine.network();
        assert_eq!(added.len(), 4);
        assert_eq!(network.edge_count(), 4);
        assert_eq!(network.edge_line(middle, added[0]), Some(line));
        for pair in added.windows(2) {
            assert_eq!(network.edge_line(pair[0], pair[1]), Some(line));
        }
        assert_eq!(network.neighbours(added[3]), vec![added[2]]);
        assert_eq!(network.stations_on(line).len(), 7);
        for station in &added {
            assert!(network.line_contains(line, *station));
        }
        Ok(())
    }

    #[test]
    fn extension_validates_its_targets() -> Result<()> {
        let mut engine = engine()?;
        let mut other = GrowthEngine::new(77, &sample_source())?;
        let foreign_line = other.grow_new_line(1, "Elsewhere", [1, 1, 1])?;
        let stations = engine.grow_disconnected(2)?;

        assert!(matches!(
            engine.extend_line(foreign_line, stations[0], 2),
            Err(NetworkError::InvalidArgument(_))
        ));
        assert_eq!(engine.network().station_count(), 2);
        Ok(())
    }

    #[test]
    fn connect_registers_both_ends() -> Result<()> {
        let mut engine = engine()?;
        let stations = engine.grow_disconnected(2)?;
        let line = engine.grow_new_line(0, "Link", [10, 20, 30])?;

        engine.connect(stations[0], stations[1], line)?;
        let network = engine.network();
        assert_eq!(network.edge_line(stations[0], stations[1]), Some(line));
        assert_eq!(network.stations_on(line), &[stations[0], stations[1]]);
        assert!(engine.connect(stations[0], stations[0], line).is_err());
        Ok(())
    }

    #[test]
    fn populate_respects_the_start_range() -> Result<()> {
        let mut engine = engine()?.with_start_range(5..=9)?;
        let ids = engine.populate()?;
        assert!((5..=9).contains(&ids.len()));
        assert!(engine.populate().is_err());
        Ok(())
    }

    #[test]
    fn default_start_range_is_twenty_to_forty() -> Result<()> {
        let mut engine = engine()?;
        assert_eq!(engine.start_range(), &(20..=40));
        let ids = engine.populate()?;
        assert!((20..=40).contains(&ids.len()));
        Ok(())
    }

    #[test]
    fn inverted_start_range_is_rejected() -> Result<()> {
        #[allow(clippy::reversed_empty_ranges)]
        let result = engine()?.with_start_range(9..=5);
        assert!(matches!(result, Err(NetworkError::InvalidArgument(_))));
        Ok(())
    }

    #[test]
    fn growth_is_reproducible_for_a_seed() -> Result<()> {
        let grow = || -> Result<Vec<String>> {
            let mut engine = engine()?;
            engine.populate()?;
            engine.grow_new_line(6, "Red", [255, 0, 0])?;
            Ok(engine.snapshot().stations)
        };
        assert_eq!(grow()?, grow()?);
        Ok(())
    }

    #[test]
    fn shared_engine_serialises_access() -> Result<()> {
        let shared = SharedEngine::new(engine()?);
        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    shared
                        .lock()
                        .grow_new_line(5, format!("Line {worker}"), [worker * 40, 0, 0])
                        .map(|_| ())
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker panicked")?;
        }

        let snapshot = shared.snapshot();
        assert_eq!(snapshot.lines.len(), 4);
        assert_eq!(snapshot.stations.len(), 20);
        Ok(())
    }
}
