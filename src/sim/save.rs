//! Save and load one world per user identity.
//!
//! ## What is stored
//!
//!   - user overrides (generated cells are reproducible, so never stored)
//!   - every entity, in draw order
//!
//! ## File format
//!
//! JSON, zlib-compressed, at `<dir>/<sha256(identity)>.gz`:
//!
//! ```text
//! { "canvas":   { "<x>": { "<y>": { "glyph": "✦", "color": [r, g, b] } } },
//!   "entities": [ { "id", "art", "position": { "x", "y" }, "color": [r, g, b] } ] }
//! ```
//!
//! Writes go to `<file>.tmp` first and are renamed into place.
//! Anything that fails on the way back in means "no saved world".

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::domain::art::{AsciiArt, EntityLayer};
use crate::domain::cell::{Cell, Coord, Rgb};
use crate::error::Result;
use crate::sim::store::WorldStore;

/// Identity variables, most specific first.
pub const IDENTITY_VARS: [&str; 2] = ["CANVAS_USER_PUBLIC_KEY", "CANVAS_CLIENT_IP"];

// ══════════════════════════════════════════════════════════════
// Identity
// ══════════════════════════════════════════════════════════════

/// Fixed-length key derived from an identity token.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct WorldKey(String);

impl WorldKey {
    pub fn from_identity(token: &str) -> Self {
        let digest = Sha256::digest(token.as_bytes());
        WorldKey(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn file_name(&self) -> String {
        format!("{}.gz", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// First non-empty identity variable, else a token unique to this process.
/// Anonymous worlds therefore do not survive a restart.
pub fn identity_token() -> String {
    IDENTITY_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.trim().is_empty())
        .unwrap_or_else(anonymous_token)
}

fn anonymous_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("anon_{}_{nanos:x}", std::process::id())
}

// ══════════════════════════════════════════════════════════════
// Document schema
// ══════════════════════════════════════════════════════════════

#[derive(Serialize, Deserialize, Debug, Default)]
struct WorldDoc {
    /// x → y → cell
    #[serde(default)]
    canvas: BTreeMap<i64, BTreeMap<i64, Cell>>,
    #[serde(default)]
    entities: Vec<ArtRecord>,
}

#[derive(Serialize, Deserialize, Debug)]
struct ArtRecord {
    id: String,
    art: String,
    position: Position,
    color: Rgb,
}

#[derive(Serialize, Deserialize, Debug)]
struct Position {
    x: i64,
    y: i64,
}

/// A world as read back from disk.
#[derive(Debug, PartialEq)]
pub struct SavedWorld {
    pub overrides: Vec<(Coord, Cell)>,
    pub entities: EntityLayer,
}

fn capture(store: &WorldStore, entities: &EntityLayer) -> WorldDoc {
    let mut canvas: BTreeMap<i64, BTreeMap<i64, Cell>> = BTreeMap::new();
    for ((x, y), cell) in store.overrides() {
        canvas.entry(x).or_default().insert(y, cell);
    }
    let entities = entities
        .iter()
        .map(|a| ArtRecord {
            id: a.id.clone(),
            art: a.source().to_string(),
            position: Position { x: a.position.0, y: a.position.1 },
            color: a.color,
        })
        .collect();
    WorldDoc { canvas, entities }
}

fn restore(doc: WorldDoc) -> SavedWorld {
    let overrides = doc
        .canvas
        .into_iter()
        .flat_map(|(x, col)| col.into_iter().map(move |(y, cell)| ((x, y), cell)))
        .collect();
    let entities = doc
        .entities
        .into_iter()
        .map(|r| AsciiArt::new(r.id, r.art, (r.position.x, r.position.y), r.color))
        .collect();
    SavedWorld { overrides, entities }
}

// ══════════════════════════════════════════════════════════════
// Storage
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct WorldStorage {
    dir: PathBuf,
}

impl WorldStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        WorldStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &WorldKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    pub fn save(&self, key: &WorldKey, store: &WorldStore, entities: &EntityLayer) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let doc = capture(store, entities);
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::best());
        serde_json::to_writer(&mut enc, &doc)?;
        let bytes = enc.finish()?;

        let path = self.path_for(key);
        let tmp = path.with_extension("gz.tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;

        info!(
            key = key.as_str(),
            overrides = store.override_count(),
            entities = entities.len(),
            bytes = bytes.len(),
            "world saved"
        );
        Ok(())
    }

    /// `None` when there is no usable saved world for this key.
    pub fn load(&self, key: &WorldKey) -> Option<SavedWorld> {
        let path = self.path_for(key);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not open saved world");
                return None;
            }
        };

        let reader = ZlibDecoder::new(BufReader::new(file));
        match serde_json::from_reader::<_, WorldDoc>(reader) {
            Ok(doc) => {
                let world = restore(doc);
                info!(
                    key = key.as_str(),
                    overrides = world.overrides.len(),
                    entities = world.entities.len(),
                    "world loaded"
                );
                Some(world)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "saved world unreadable, starting fresh");
                None
            }
        }
    }
}
