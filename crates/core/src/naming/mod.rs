//! Seeded station-name synthesis.
//!
//! Names take the shape `[Prefix ]Former[latter][ Suffix]`, e.g. "north" +
//! "ac" + "ton" + "bridge" gives "North Acton Bridge". Every name has a
//! former and at least one of latter or suffix; the prefix is optional.

mod parts;

pub use parts::{parse_parts, FilePartSource, PartKind, PartSource, StaticPartSource};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{NetworkError, Result},
    seed,
};

/// Letters that never appear doubled in these names; a repeat across the
/// former/latter boundary is always collapsed.
pub const FORCED_SUPPRESSION: [char; 10] = ['a', 'h', 'i', 'j', 'q', 'u', 'v', 'w', 'x', 'y'];

/// Validated, non-empty part tables.
#[derive(Debug, Clone)]
pub struct PartTables {
    prefix: Vec<String>,
    former: Vec<String>,
    latter: Vec<String>,
    suffix: Vec<String>,
}

impl PartTables {
    /// Resolve all four tables from `source`, rejecting empty ones.
    pub fn load(source: &dyn PartSource) -> Result<Self> {
        let load = |kind: PartKind| -> Result<Vec<String>> {
            let parts = source.load(kind)?;
            if parts.is_empty() {
                return Err(NetworkError::InvalidConfiguration {
                    kind,
                    reason: "table has no parts".to_string(),
                });
            }
            Ok(parts)
        };

        Ok(Self {
            prefix: load(PartKind::Prefix)?,
            former: load(PartKind::Former)?,
            latter: load(PartKind::Latter)?,
            suffix: load(PartKind::Suffix)?,
        })
    }

    /// Parts for `kind`, never empty.
    pub fn get(&self, kind: PartKind) -> &[String] {
        match kind {
            PartKind::Prefix => &self.prefix,
            PartKind::Former => &self.former,
            PartKind::Latter => &self.latter,
            PartKind::Suffix => &self.suffix,
        }
    }
}

/// Which of latter and suffix a name carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameShape {
    /// `Former+latter`
    LatterOnly,
    /// `Former+latter Suffix`
    LatterAndSuffix,
    /// `Former Suffix`
    SuffixOnly,
}

impl NameShape {
    /// Map a draw from the shape weights back to a shape.
    pub fn from_index(index: usize) -> Result<Self> {
        match index {
            0 => Ok(NameShape::LatterOnly),
            1 => Ok(NameShape::LatterAndSuffix),
            2 => Ok(NameShape::SuffixOnly),
            other => Err(NetworkError::InternalInvariantViolation(format!(
                "name shape index {other} is not one of the three shapes"
            ))),
        }
    }

    fn has_latter(self) -> bool {
        matches!(self, NameShape::LatterOnly | NameShape::LatterAndSuffix)
    }

    fn has_suffix(self) -> bool {
        matches!(self, NameShape::LatterAndSuffix | NameShape::SuffixOnly)
    }
}

/// Relative weights steering the shape of generated names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NameWeights {
    /// `[no prefix, prefix]`
    pub prefix: [f64; 2],
    /// `[latter only, latter and suffix, suffix only]`
    pub shape: [f64; 3],
    /// `[double letters allowed, double letters suppressed]`
    pub double_letter: [f64; 2],
}

impl Default for NameWeights {
    fn default() -> Self {
        Self {
            prefix: [0.8, 0.2],
            shape: [0.8, 0.15, 0.05],
            double_letter: [0.5, 0.5],
        }
    }
}

/// Partial replacement for [`NameWeights`]; `None` leaves a distribution
/// untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightUpdate {
    /// Replacement prefix-presence weights.
    pub prefix: Option<[f64; 2]>,
    /// Replacement latter/suffix shape weights.
    pub shape: Option<[f64; 3]>,
    /// Replacement double-letter weights.
    pub double_letter: Option<[f64; 2]>,
}

impl NameWeights {
    /// Apply `update`, scaling each supplied distribution so it sums to one.
    /// Weights are not checked for sign.
    pub fn apply(&mut self, update: WeightUpdate) {
        if let Some(prefix) = update.prefix {
            self.prefix = normalize_weights(prefix);
        }
        if let Some(shape) = update.shape {
            self.shape = normalize_weights(shape);
        }
        if let Some(double_letter) = update.double_letter {
            self.double_letter = normalize_weights(double_letter);
        }
    }
}

fn normalize_weights<const N: usize>(weights: [f64; N]) -> [f64; N] {
    let total: f64 = weights.iter().sum();
    weights.map(|weight| weight / total)
}

/// Produces batches of station names from a fixed seed and part tables.
#[derive(Debug, Clone)]
pub struct NameSynthesizer {
    seed: u128,
    parts: PartTables,
    weights: NameWeights,
}

impl NameSynthesizer {
    /// Build a synthesizer around an already normalized seed.
    pub fn new(seed: u128, parts: PartTables) -> Self {
        Self {
            seed,
            parts,
            weights: NameWeights::default(),
        }
    }

    /// Normalize `raw_seed` and load tables from `source`.
    pub fn from_source(raw_seed: u64, source: &dyn PartSource) -> Result<Self> {
        let seed = seed::normalize_seed(raw_seed)?;
        let parts = PartTables::load(source)?;
        Ok(Self::new(seed, parts))
    }

    /// The normalized seed all per-batch seeds are derived from.
    pub fn seed(&self) -> u128 {
        self.seed
    }

    /// Current weights.
    pub fn weights(&self) -> &NameWeights {
        &self.weights
    }

    /// Replace any supplied weight distributions.
    pub fn update_weights(&mut self, update: WeightUpdate) {
        self.weights.apply(update);
        debug!(weights = ?self.weights, "name weights updated");
    }

    /// Generate `count` names using the seed derived for `growth_index`.
    pub fn generate_for(&self, growth_index: u64, count: usize) -> Result<Vec<String>> {
        let derived = seed::derive(self.seed, growth_index)?;
        self.generate(derived, count)
    }

    /// Generate `count` names from `derived_seed`. Duplicates are possible.
    ///
    /// The order of random draws is fixed: all prefix flags, all shapes, all
    /// double-letter policies, all formers, then the per-name prefix, latter
    /// and suffix parts. Reordering them changes every name for a seed.
    pub fn generate(&self, derived_seed: i128, count: usize) -> Result<Vec<String>> {
        let mut rng = seeded_rng(derived_seed);

        let use_prefix = (0..count)
            .map(|_| weighted_index(&mut rng, &self.weights.prefix).map(|index| index == 1))
            .collect::<Result<Vec<_>>>()?;
        let shapes = (0..count)
            .map(|_| weighted_index(&mut rng, &self.weights.shape).and_then(NameShape::from_index))
            .collect::<Result<Vec<_>>>()?;
        let allow_double = (0..count)
            .map(|_| weighted_index(&mut rng, &self.weights.double_letter).map(|index| index == 0))
            .collect::<Result<Vec<_>>>()?;
        let formers: Vec<&str> = (0..count)
            .map(|_| pick(&mut rng, self.parts.get(PartKind::Former)))
            .collect();

        let mut names = Vec::with_capacity(count);
        for index in 0..count {
            let former = formers[index];
            let shape = shapes[index];

            let prefix = use_prefix[index].then(|| pick(&mut rng, self.parts.get(PartKind::Prefix)));
            let latter = if shape.has_latter() {
                let latter = pick(&mut rng, self.parts.get(PartKind::Latter));
                Some(resolve_latter(former, latter, allow_double[index]))
            } else {
                None
            };
            let suffix = shape
                .has_suffix()
                .then(|| pick(&mut rng, self.parts.get(PartKind::Suffix)));

            names.push(assemble_name(prefix, former, latter.as_deref(), suffix));
        }

        debug!(seed = %derived_seed, count, "synthesized station names");
        Ok(names)
    }
}

/// Collapse a letter repeated across the former/latter boundary.
///
/// When the former ends with the letter the latter starts with, and either
/// doubles are not allowed for this name or the letter is in
/// [`FORCED_SUPPRESSION`], the latter loses its first and last characters.
pub fn resolve_latter(former: &str, latter: &str, allow_double: bool) -> String {
    let (Some(last), Some(first)) = (former.chars().last(), latter.chars().next()) else {
        return latter.to_string();
    };
    if last != first || (allow_double && !FORCED_SUPPRESSION.contains(&first)) {
        return latter.to_string();
    }

    let mut chars = latter.chars();
    chars.next();
    chars.next_back();
    chars.as_str().to_string()
}

/// Join name parts into a display name with capitalised words.
pub fn assemble_name(
    prefix: Option<&str>,
    former: &str,
    latter: Option<&str>,
    suffix: Option<&str>,
) -> String {
    let mut name = String::new();
    if let Some(prefix) = prefix {
        name.push_str(&capitalize(prefix));
        name.push(' ');
    }
    name.push_str(&capitalize(former));
    if let Some(latter) = latter {
        name.push_str(latter);
    }
    if let Some(suffix) = suffix {
        name.push(' ');
        name.push_str(&capitalize(suffix));
    }
    name
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn seeded_rng(derived_seed: i128) -> ChaCha8Rng {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(&derived_seed.to_le_bytes());
    ChaCha8Rng::from_seed(key)
}

fn pick<'a, R: Rng>(rng: &mut R, parts: &'a [String]) -> &'a str {
    &parts[rng.gen_range(0..parts.len())]
}

/// Cumulative-weight draw. Weights need not be normalised but must have a
/// positive, finite total.
fn weighted_index<R: Rng>(rng: &mut R, weights: &[f64]) -> Result<usize> {
    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(NetworkError::invalid(format!(
            "weights {weights:?} do not have a positive total"
        )));
    }

    let target = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (index, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if target < cumulative {
            return Ok(index);
        }
    }
    Ok(weights.len() - 1)
}
