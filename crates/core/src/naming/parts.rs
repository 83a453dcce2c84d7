use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{NetworkError, Result};

/// The four tables a station name is stitched together from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    /// Optional leading word such as "north".
    Prefix,
    /// Mandatory stem such as "ac".
    Former,
    /// Ending glued onto the former such as "ton".
    Latter,
    /// Optional trailing word such as "bridge".
    Suffix,
}

impl PartKind {
    /// Every kind, in lookup order.
    pub const ALL: [PartKind; 4] = [
        PartKind::Prefix,
        PartKind::Former,
        PartKind::Latter,
        PartKind::Suffix,
    ];

    /// Key used in configuration maps and default file names.
    pub fn key(self) -> &'static str {
        match self {
            PartKind::Prefix => "prefix",
            PartKind::Former => "former",
            PartKind::Latter => "latter",
            PartKind::Suffix => "suffix",
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PartKind {
    type Err = NetworkError;

    fn from_str(value: &str) -> Result<Self> {
        PartKind::ALL
            .into_iter()
            .find(|kind| kind.key() == value)
            .ok_or_else(|| NetworkError::invalid(format!("unknown part table key '{value}'")))
    }
}

/// Something that can resolve a part table by kind.
pub trait PartSource {
    /// Produce the ordered parts for `kind`.
    fn load(&self, kind: PartKind) -> Result<Vec<String>>;
}

/// Part tables read from plain-text files, one part per line.
#[derive(Debug, Clone)]
pub struct FilePartSource {
    paths: HashMap<PartKind, PathBuf>,
}

impl FilePartSource {
    /// Build from `(key, path)` pairs. Keys other than the four part kinds
    /// are ignored; a missing kind is an error.
    pub fn from_keys<I, K, P>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, P)>,
        K: AsRef<str>,
        P: Into<PathBuf>,
    {
        let mut paths = HashMap::new();
        for (key, path) in entries {
            match key.as_ref().parse::<PartKind>() {
                Ok(kind) => {
                    paths.insert(kind, path.into());
                }
                Err(_) => debug!(key = key.as_ref(), "ignoring unknown part table key"),
            }
        }
        require_all_kinds(&paths)?;
        Ok(Self { paths })
    }

    /// Expect `prefix.txt`, `former.txt`, `latter.txt` and `suffix.txt`
    /// inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let paths = PartKind::ALL
            .into_iter()
            .map(|kind| (kind, dir.join(format!("{}.txt", kind.key()))))
            .collect();
        Self { paths }
    }

    /// Path configured for `kind`.
    pub fn path(&self, kind: PartKind) -> Option<&Path> {
        self.paths.get(&kind).map(PathBuf::as_path)
    }
}

impl PartSource for FilePartSource {
    fn load(&self, kind: PartKind) -> Result<Vec<String>> {
        let path = self.path(kind).ok_or_else(|| NetworkError::InvalidConfiguration {
            kind,
            reason: "no file configured".to_string(),
        })?;
        let contents = fs::read_to_string(path).map_err(|err| NetworkError::InvalidConfiguration {
            kind,
            reason: format!("failed to read {}: {err}", path.display()),
        })?;
        let parts = parse_parts(&contents);
        debug!(%kind, path = %path.display(), count = parts.len(), "loaded part table");
        Ok(parts)
    }
}

/// In-memory part tables, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticPartSource {
    tables: HashMap<PartKind, Vec<String>>,
}

impl StaticPartSource {
    /// Build from the four tables directly.
    pub fn new<S: Into<String>>(
        prefix: impl IntoIterator<Item = S>,
        former: impl IntoIterator<Item = S>,
        latter: impl IntoIterator<Item = S>,
        suffix: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut tables = HashMap::new();
        tables.insert(PartKind::Prefix, to_strings(prefix));
        tables.insert(PartKind::Former, to_strings(former));
        tables.insert(PartKind::Latter, to_strings(latter));
        tables.insert(PartKind::Suffix, to_strings(suffix));
        Self { tables }
    }

    /// Build from `(key, parts)` pairs with the same key rules as
    /// [`FilePartSource::from_keys`].
    pub fn from_keys<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Vec<String>)>,
        K: AsRef<str>,
    {
        let tables: HashMap<PartKind, Vec<String>> = entries
            .into_iter()
            .filter_map(|(key, parts)| {
                let kind = key.as_ref().parse::<PartKind>().ok()?;
                Some((kind, parts))
            })
            .collect();
        require_all_kinds(&tables)?;
        Ok(Self { tables })
    }
}

impl PartSource for StaticPartSource {
    fn load(&self, kind: PartKind) -> Result<Vec<String>> {
        self.tables
            .get(&kind)
            .cloned()
            .ok_or_else(|| NetworkError::InvalidConfiguration {
                kind,
                reason: "table not provided".to_string(),
            })
    }
}

/// Split a part file into parts: one per line, whitespace trimmed, blank
/// lines dropped.
pub fn parse_parts(contents: &str) -> Vec<String> {
    let mut blank = 0usize;
    let parts: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| {
            if line.is_empty() {
                blank += 1;
                false
            } else {
                true
            }
        })
        .map(str::to_string)
        .collect();
    if blank > 0 {
        warn!(blank, "skipped blank lines in part table");
    }
    parts
}

fn to_strings<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Vec<String> {
    items.into_iter().map(Into::into).collect()
}

fn require_all_kinds<V>(map: &HashMap<PartKind, V>) -> Result<()> {
    let missing: Vec<&str> = PartKind::ALL
        .into_iter()
        .filter(|kind| !map.contains_key(kind))
        .map(PartKind::key)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(NetworkError::invalid(format!(
            "part tables must include 'prefix', 'former', 'latter' and 'suffix'; missing {}",
            missing.join(", ")
        )))
    }
}
