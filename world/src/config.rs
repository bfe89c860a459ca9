//! Server configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{WorldError, WorldResult};

/// Deepest quad tree a config may ask for. Straddling boxes are inserted
/// into every overlapping child, so node count grows as `4^depth`.
pub const MAX_QUAD_TREE_DEPTH: u32 = 16;

/// Broad-phase strategy used by the tick scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpatialStrategy {
    /// Uniform hash grid with `1 << cell_shift` sized cells.
    Grid { cell_shift: u32 },
    /// Quad tree rebuilt every tick.
    QuadTree {
        split_threshold: usize,
        max_depth: u32,
    },
}

impl Default for SpatialStrategy {
    fn default() -> Self {
        Self::Grid { cell_shift: 7 }
    }
}

impl SpatialStrategy {
    /// The quad tree with its usual split threshold and depth.
    #[must_use]
    pub const fn quad_tree() -> Self {
        Self::QuadTree {
            split_threshold: 5,
            max_depth: 10,
        }
    }
}

/// Tunables for one arena.
///
/// Every field has a default, so a config file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Entity slot capacity.
    pub max_entities: u32,
    /// Full arena width; the arena is centered on the origin.
    pub arena_width: f32,
    /// Full arena height.
    pub arena_height: f32,
    /// Distance objects may travel past the arena edge.
    pub arena_padding: f32,
    pub spatial: SpatialStrategy,
    /// Base viewport used to size each viewer's field of view.
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Bound on queued messages per header per client between ticks.
    pub incoming_queue_cap: usize,
    /// Seed for the simulation RNG.
    pub seed: u64,
    /// Client build string accepted by init packets.
    pub build: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: 25,
            max_entities: 16_384,
            arena_width: 8_000.0,
            arena_height: 8_000.0,
            arena_padding: 200.0,
            spatial: SpatialStrategy::default(),
            viewport_width: 1_920.0,
            viewport_height: 1_080.0,
            incoming_queue_cap: 32,
            seed: 0x5EED,
            build: String::from("arena-0.3"),
        }
    }
}

impl GameConfig {
    /// Parses a JSON config and validates it.
    pub fn from_json_str(json: &str) -> WorldResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> WorldResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| WorldError::ConfigRead {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_json_str(&contents)
    }

    /// Serializes the config as pretty JSON.
    pub fn to_json_string(&self) -> WorldResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks values the simulation cannot run with.
    pub fn validate(&self) -> WorldResult<()> {
        if self.tick_rate == 0 {
            return Err(WorldError::InvalidConfig {
                reason: "tick_rate must be non-zero",
            });
        }
        if self.max_entities == 0 {
            return Err(WorldError::InvalidConfig {
                reason: "max_entities must be non-zero",
            });
        }
        if !(self.arena_width > 0.0 && self.arena_height > 0.0) {
            return Err(WorldError::InvalidConfig {
                reason: "arena dimensions must be positive",
            });
        }
        match self.spatial {
            SpatialStrategy::Grid { cell_shift } if cell_shift == 0 || cell_shift > 16 => {
                Err(WorldError::InvalidConfig {
                    reason: "grid cell_shift must be in 1..=16",
                })
            }
            SpatialStrategy::QuadTree {
                split_threshold, ..
            } if split_threshold == 0 => Err(WorldError::InvalidConfig {
                reason: "quad tree split_threshold must be non-zero",
            }),
            SpatialStrategy::QuadTree { max_depth, .. } if max_depth > MAX_QUAD_TREE_DEPTH => {
                Err(WorldError::InvalidConfig {
                    reason: "quad tree max_depth must be at most 16",
                })
            }
            _ => Ok(()),
        }
    }

    /// Wall-clock length of one tick.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }
}
