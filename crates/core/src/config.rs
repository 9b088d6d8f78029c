//! Config module - engine construction parameters
//!
//! Both configs have defaults matching the constants in `tile_arcade_types`,
//! deserialize from JSON with every field optional, and are validated once when
//! an engine is built. A config that fails validation never produces an engine.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::pieces::rank_radius;
use crate::scoring::ScoringLedger;
use crate::types::*;

/// Rejected configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("board dimensions {width}x{height} must be within 1..={max}")]
    InvalidDimensions { width: u8, height: u8, max: u8 },

    #[error("piece catalog is empty")]
    EmptyCatalog,

    #[error("unknown shape id {0:?}")]
    UnknownShape(String),

    #[error("unsupported player count {0} (expected 1 or 2)")]
    UnsupportedPlayers(u8),

    #[error("drop interval must be positive")]
    ZeroDropInterval,

    #[error("overflow band of {rows} rows does not fit a board of height {height}")]
    OverflowRows { rows: u8, height: u8 },

    #[error("merge field {width}x{height} must be positive and finite")]
    InvalidField { width: f32, height: f32 },

    #[error("{name} = {value} must lie inside the field height {height}")]
    OutsideField {
        name: &'static str,
        value: f32,
        height: f32,
    },

    #[error("each side is {side_width} wide, narrower than the largest spawnable body ({diameter})")]
    FieldTooNarrow { side_width: f32, diameter: f32 },

    #[error("{name} = {value} must be finite and non-negative")]
    NonFinite { name: &'static str, value: f32 },

    #[error("spawn rank {0} exceeds max rank {max}", max = MAX_RANK)]
    SpawnRank(u8),

    #[error("rank points table has {0} entries, expected {expected}", expected = RANK_COUNT)]
    RankPoints(usize),

    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),
}

fn check_players(players: u8) -> Result<(), ConfigError> {
    if players == 1 || players == 2 {
        Ok(())
    } else {
        Err(ConfigError::UnsupportedPlayers(players))
    }
}

/// Falling-block engine parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FallingConfig {
    pub width: u8,
    pub height: u8,
    pub drop_interval_ms: u32,
    /// 1 or 2; each player gets an independent board
    pub players: u8,
    pub seed: u32,
    /// Shape letters, case-insensitive
    pub shapes: Vec<String>,
    pub overflow_rows: u8,
    pub scoring: BTreeMap<String, u32>,
}

impl Default for FallingConfig {
    fn default() -> Self {
        Self {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            drop_interval_ms: DROP_INTERVAL_MS,
            players: 1,
            seed: 1,
            shapes: ShapeId::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            overflow_rows: OVERFLOW_ROWS,
            scoring: ScoringLedger::falling_default_rules(),
        }
    }
}

impl FallingConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Resolve shape names into ids
    pub fn shape_ids(&self) -> Result<Vec<ShapeId>, ConfigError> {
        if self.shapes.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        self.shapes
            .iter()
            .map(|s| ShapeId::from_str(s).ok_or_else(|| ConfigError::UnknownShape(s.clone())))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // The widest shape spans 4 columns from a spawn origin of width/2 - 2.
        if self.width < 4 || self.height < 2 || self.width > MAX_BOARD_DIM || self.height > MAX_BOARD_DIM {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
                max: MAX_BOARD_DIM,
            });
        }
        check_players(self.players)?;
        if self.drop_interval_ms == 0 {
            return Err(ConfigError::ZeroDropInterval);
        }
        if self.overflow_rows >= self.height {
            return Err(ConfigError::OverflowRows {
                rows: self.overflow_rows,
                height: self.height,
            });
        }
        self.shape_ids()?;
        Ok(())
    }
}

/// Merge engine parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub width: f32,
    pub height: f32,
    pub overflow_line_y: f32,
    pub spawn_y: f32,
    pub drop_cooldown_ms: u32,
    pub chain_impulse_strength: f32,
    pub pointer_step: f32,
    /// 1 or 2; in two-player mode each player owns one half of the field
    pub players: u8,
    pub seed: u32,
    /// Highest rank a fresh preview can have
    pub spawn_rank_max: u8,
    pub scoring: BTreeMap<String, u32>,
    /// Merge weight per pre-merge rank
    pub rank_points: Vec<u32>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            width: FIELD_WIDTH,
            height: FIELD_HEIGHT,
            overflow_line_y: OVERFLOW_LINE_Y,
            spawn_y: SPAWN_Y,
            drop_cooldown_ms: DROP_COOLDOWN_MS,
            chain_impulse_strength: CHAIN_IMPULSE_STRENGTH,
            pointer_step: POINTER_STEP,
            players: 1,
            seed: 1,
            spawn_rank_max: MAX_RANK,
            scoring: ScoringLedger::merge_default_rules(),
            rank_points: RANK_POINTS.to_vec(),
        }
    }
}

impl MergeConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Width of the strip each player drops into
    pub fn side_width(&self) -> f32 {
        self.width / self.players.max(1) as f32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite_positive = |v: f32| v.is_finite() && v > 0.0;
        if !finite_positive(self.width) || !finite_positive(self.height) {
            return Err(ConfigError::InvalidField {
                width: self.width,
                height: self.height,
            });
        }
        check_players(self.players)?;
        for (name, value) in [("overflow_line_y", self.overflow_line_y), ("spawn_y", self.spawn_y)] {
            if !(value.is_finite() && value >= 0.0 && value < self.height) {
                return Err(ConfigError::OutsideField {
                    name,
                    value,
                    height: self.height,
                });
            }
        }
        for (name, value) in [
            ("pointer_step", self.pointer_step),
            ("chain_impulse_strength", self.chain_impulse_strength),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::NonFinite { name, value });
            }
        }
        if self.spawn_rank_max > MAX_RANK {
            return Err(ConfigError::SpawnRank(self.spawn_rank_max));
        }
        let diameter = 2.0 * rank_radius(self.spawn_rank_max);
        if self.side_width() < diameter {
            return Err(ConfigError::FieldTooNarrow {
                side_width: self.side_width(),
                diameter,
            });
        }
        if self.rank_points.len() != RANK_COUNT {
            return Err(ConfigError::RankPoints(self.rank_points.len()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        FallingConfig::default().validate().unwrap();
        MergeConfig::default().validate().unwrap();
        let two = MergeConfig {
            players: 2,
            ..MergeConfig::default()
        };
        two.validate().unwrap();
    }

    #[test]
    fn test_falling_rejects_zero_dimensions() {
        let cfg = FallingConfig {
            width: 0,
            ..FallingConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_falling_rejects_unknown_shape() {
        let cfg = FallingConfig {
            shapes: vec!["T".into(), "X".into()],
            ..FallingConfig::default()
        };
        match cfg.validate() {
            Err(ConfigError::UnknownShape(s)) => assert_eq!(s, "X"),
            other => panic!("expected UnknownShape, got {:?}", other),
        }
    }

    #[test]
    fn test_falling_rejects_empty_catalog_and_players() {
        let cfg = FallingConfig {
            shapes: vec![],
            ..FallingConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyCatalog)));

        let cfg = FallingConfig {
            players: 3,
            ..FallingConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::UnsupportedPlayers(3))));
    }

    #[test]
    fn test_falling_from_json_partial() {
        let cfg = FallingConfig::from_json_str(r#"{"width": 8, "shapes": ["o", "I"]}"#).unwrap();
        assert_eq!(cfg.width, 8);
        assert_eq!(cfg.height, BOARD_HEIGHT);
        assert_eq!(cfg.shape_ids().unwrap(), vec![ShapeId::O, ShapeId::I]);
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(
            FallingConfig::from_json_str("{width: }"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_merge_rejects_bad_overflow_line() {
        let cfg = MergeConfig {
            overflow_line_y: 700.0,
            ..MergeConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::OutsideField { .. })));
    }

    #[test]
    fn test_merge_rejects_narrow_sides() {
        let cfg = MergeConfig {
            width: 100.0,
            players: 2,
            ..MergeConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::FieldTooNarrow { .. })));
    }

    #[test]
    fn test_merge_rejects_non_finite_tuning() {
        let cfg = MergeConfig {
            pointer_step: f32::NAN,
            ..MergeConfig::default()
        };
        match cfg.validate() {
            Err(ConfigError::NonFinite { name, .. }) => assert_eq!(name, "pointer_step"),
            other => panic!("expected NonFinite, got {:?}", other),
        }

        let cfg = MergeConfig {
            chain_impulse_strength: f32::INFINITY,
            ..MergeConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonFinite {
                name: "chain_impulse_strength",
                ..
            })
        ));

        let cfg = MergeConfig {
            pointer_step: -5.0,
            ..MergeConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::NonFinite { .. })));
    }

    #[test]
    fn test_merge_rejects_short_points_table() {
        let cfg = MergeConfig {
            rank_points: vec![1, 3, 6],
            ..MergeConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::RankPoints(3))));
    }
}
