//! Layered application configuration.
//!
//! Values come from built-in defaults, then `config.toml` under the user's
//! config directory (or an explicit path), then `TUBEGEN_*` environment
//! variables.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    growth::{GrowthEngine, DEFAULT_MAX_NAME_ROUNDS},
    naming::{FilePartSource, WeightUpdate},
    network::Colour,
};

/// Directory under the platform config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "tubegen";

const DEFAULT_CONFIG: &str = r##"# tubegen configuration

# Seed for every random choice. Seeds shorter than twelve digits are
# repeated until they are long enough.
seed = 1863

# Directory holding prefix.txt, former.txt, latter.txt and suffix.txt.
parts_dir = "parts"

# Alternatively name each table explicitly; this wins over parts_dir.
# [parts]
# prefix = "parts/prefix.txt"
# former = "parts/former.txt"
# latter = "parts/latter.txt"
# suffix = "parts/suffix.txt"

# Number of disconnected stations created first.
start_range = [20, 40]

# Rounds of renaming allowed before a batch of unique names is abandoned.
max_name_rounds = 10000

# [weights]
# prefix = [0.8, 0.2]
# shape = [0.8, 0.15, 0.05]
# double_letter = [0.5, 0.5]

# [[lines]]
# name = "Central"
# colour = "#dc241f"
# stations = 12
# extend = { from = 3, stations = 4 }
"##;

/// Settings for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Raw user seed.
    pub seed: u64,
    /// Explicit part table paths keyed by `prefix`, `former`, `latter` and
    /// `suffix`.
    pub parts: BTreeMap<String, PathBuf>,
    /// Directory holding the four `<kind>.txt` tables.
    pub parts_dir: Option<PathBuf>,
    /// Inclusive bounds for the initial station count.
    pub start_range: [usize; 2],
    /// Cap on uniqueness rounds per batch.
    pub max_name_rounds: usize,
    /// Optional replacement name weights.
    pub weights: WeightUpdate,
    /// Lines to grow after the initial population.
    pub lines: Vec<LineConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            seed: 1863,
            parts: BTreeMap::new(),
            parts_dir: None,
            start_range: [20, 40],
            max_name_rounds: DEFAULT_MAX_NAME_ROUNDS,
            weights: WeightUpdate::default(),
            lines: Vec::new(),
        }
    }
}

/// A line to create during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    /// Unique line name.
    pub name: String,
    /// Line colour as `#rrggbb`.
    pub colour: Colour,
    /// Stations created with the line.
    pub stations: usize,
    /// Optional branch grown off one of the line's stations.
    #[serde(default)]
    pub extend: Option<LineExtension>,
}

/// Branch grown from an existing station of a configured line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineExtension {
    /// Index into the line's stations to branch from.
    pub from: usize,
    /// Stations in the branch.
    pub stations: usize,
}

impl AppConfig {
    /// Load from the default location, falling back to defaults when the file
    /// does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from `path` plus environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("TUBEGEN").try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let mut config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("failed to parse configuration {}", path.display()))?;
        config.resolve_relative_paths(path.parent().unwrap_or_else(|| Path::new(".")));
        debug!(path = %path.display(), seed = config.seed, "configuration loaded");
        Ok(config)
    }

    /// Part table source described by this configuration.
    pub fn part_source(&self) -> Result<FilePartSource> {
        if !self.parts.is_empty() {
            return FilePartSource::from_keys(&self.parts).context("invalid [parts] table");
        }
        self.parts_dir
            .as_ref()
            .map(FilePartSource::from_dir)
            .ok_or_else(|| anyhow!("configuration names neither [parts] nor parts_dir"))
    }

    /// Build an engine with this configuration's seed, tables and tuning.
    pub fn build_engine(&self) -> Result<GrowthEngine> {
        let source = self.part_source()?;
        let [low, high] = self.start_range;
        let mut engine = GrowthEngine::new(self.seed, &source)
            .context("failed to load station name parts")?
            .with_start_range(low..=high)?
            .with_max_name_rounds(self.max_name_rounds)?;
        engine.update_weights(self.weights);
        Ok(engine)
    }

    /// Populate `engine` and grow every configured line.
    pub fn grow(&self, engine: &mut GrowthEngine) -> Result<()> {
        engine.populate().context("initial population failed")?;
        for line in &self.lines {
            let id = engine
                .grow_new_line_with_colour(line.stations, line.name.clone(), line.colour)
                .with_context(|| format!("failed to create line {}", line.name))?;

            if let Some(extend) = &line.extend {
                let from = engine
                    .network()
                    .stations_on(id)
                    .get(extend.from)
                    .copied()
                    .ok_or_else(|| {
                        anyhow!(
                            "line {} has no station {} to extend from",
                            line.name,
                            extend.from
                        )
                    })?;
                engine
                    .extend_line(id, from, extend.stations)
                    .with_context(|| format!("failed to extend line {}", line.name))?;
            }
        }
        info!(
            stations = engine.network().station_count(),
            lines = engine.network().line_count(),
            "network grown"
        );
        Ok(())
    }

    fn resolve_relative_paths(&mut self, base: &Path) {
        for path in self.parts.values_mut() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if let Some(dir) = self.parts_dir.as_mut() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
}

/// `<config dir>/tubegen/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join("config.toml")
}

/// Write a commented default configuration if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = default_config_path();
    write_default_config(&path)?;
    Ok(path)
}

/// Write the default configuration to `path` unless a file is already there.
pub fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::PartKind;
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn write_parts(dir: &Path) -> Result<()> {
        let parts_dir = dir.join("parts");
        fs::create_dir_all(&parts_dir)?;
        fs::write(parts_dir.join("prefix.txt"), "north\nsouth\nwest\n")?;
        fs::write(
            parts_dir.join("former.txt"),
            "ac\nbar\ncam\ndun\nell\nfen\ngos\nhal\nick\nkel\n",
        )?;
        fs::write(
            parts_dir.join("latter.txt"),
            "ton\nford\nley\nwick\nham\nbury\nstead\n",
        )?;
        fs::write(parts_dir.join("suffix.txt"), "bridge\npark\ngreen\ncross\n")?;
        Ok(())
    }

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.toml"))?;
        assert_eq!(config.start_range, [20, 40]);
        assert_eq!(config.max_name_rounds, DEFAULT_MAX_NAME_ROUNDS);
        assert!(config.lines.is_empty());
        assert_eq!(config.weights, WeightUpdate::default());
        Ok(())
    }

    #[test]
    fn default_template_parses() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        write_default_config(&path)?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.seed, 1863);
        assert_eq!(config.parts_dir, Some(dir.path().join("parts")));
        Ok(())
    }

    #[test]
    fn existing_config_is_not_overwritten() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "seed = 5\n")?;
        write_default_config(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "seed = 5\n");
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r##"
seed = 99
start_range = [3, 6]

[parts]
prefix = "p.txt"
former = "f.txt"
latter = "l.txt"
suffix = "s.txt"

[weights]
prefix = [1.0, 1.0]

[[lines]]
name = "Central"
colour = "#dc241f"
stations = 4
extend = { from = 1, stations = 2 }
"##,
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.seed, 99);
        assert_eq!(config.start_range, [3, 6]);
        assert_eq!(config.weights.prefix, Some([1.0, 1.0]));
        assert_eq!(config.weights.shape, None);
        assert_eq!(config.lines.len(), 1);
        assert_eq!(config.lines[0].colour.to_hex(), "#dc241f");
        assert_eq!(config.lines[0].extend.as_ref().map(|e| e.stations), Some(2));

        let source = config.part_source()?;
        assert_eq!(source.path(PartKind::Former), Some(dir.path().join("f.txt").as_path()));
        Ok(())
    }

    #[test]
    fn grows_a_configured_network() -> Result<()> {
        let dir = tempdir()?;
        write_parts(dir.path())?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r##"
seed = 42
parts_dir = "parts"
start_range = [5, 8]

[[lines]]
name = "Central"
colour = "#dc241f"
stations = 4
extend = { from = 1, stations = 3 }

[[lines]]
name = "Victoria"
colour = "#0098d4"
stations = 5
"##,
        )?;

        let config = AppConfig::load_from(&path)?;
        let mut engine = config.build_engine()?;
        config.grow(&mut engine)?;

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.seed, 42);
        assert!((5 + 4 + 3 + 5..=8 + 4 + 3 + 5).contains(&snapshot.stations.len()));
        assert_eq!(snapshot.lines.len(), 2);
        assert_eq!(snapshot.lines[0].stations.len(), 7);
        assert_eq!(snapshot.edges.len(), 3);
        assert!(snapshot.edges.iter().all(|edge| edge.line == "Central"));

        let unique: HashSet<&String> = snapshot.stations.iter().collect();
        assert_eq!(unique.len(), snapshot.stations.len());
        Ok(())
    }

    #[test]
    fn extension_index_out_of_range_is_reported() -> Result<()> {
        let dir = tempdir()?;
        write_parts(dir.path())?;
        let config = AppConfig {
            parts_dir: Some(dir.path().join("parts")),
            start_range: [1, 1],
            lines: vec![LineConfig {
                name: "Stub".to_string(),
                colour: "#000000".parse()?,
                stations: 2,
                extend: Some(LineExtension {
                    from: 5,
                    stations: 1,
                }),
            }],
            ..AppConfig::default()
        };
        let mut engine = config.build_engine()?;
        let err = config.grow(&mut engine).unwrap_err();
        assert!(err.to_string().contains("no station 5"));
        Ok(())
    }

    #[test]
    fn missing_part_configuration_is_an_error() {
        let config = AppConfig::default();
        assert!(config.part_source().is_err());
    }
}
