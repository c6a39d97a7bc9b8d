use std::env;
use std::f32::consts::{FRAC_PI_2, PI};
use std::fs;
use std::path::{Path, PathBuf};

use engine::{Padding, Size, Vec2};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

pub(crate) const TUNING_ENV_VAR: &str = "LANTERNFALL_TUNING";

#[derive(Debug, Error)]
pub(crate) enum TuningError {
    #[error("failed to read tuning file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tuning file '{path}' at {location}: {source}")]
    Parse {
        path: PathBuf,
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid tuning value at {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameTuning {
    pub(crate) vitals: VitalsTuning,
    pub(crate) weapons: WeaponsTuning,
    pub(crate) lighting: LightingTuning,
    pub(crate) pack: PackTuning,
    pub(crate) world: WorldTuning,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct VitalsTuning {
    pub(crate) max_hit_points: u32,
    pub(crate) max_mana: u32,
    pub(crate) initial_mana: u32,
    pub(crate) immunity_seconds: f64,
    pub(crate) health_regen_delay_seconds: f64,
    pub(crate) health_regen_per_second: f64,
    pub(crate) base_mana_regen_per_second: f64,
    pub(crate) mana_regen_multiplier: f64,
    pub(crate) respawn_seconds: f64,
    pub(crate) move_speed: f32,
    pub(crate) spawn_point: Vec2,
    pub(crate) size: Size,
    pub(crate) padding: Padding,
}

impl Default for VitalsTuning {
    fn default() -> Self {
        Self {
            max_hit_points: 400,
            max_mana: 200,
            initial_mana: 190,
            immunity_seconds: 0.75,
            health_regen_delay_seconds: 10.0,
            health_regen_per_second: 2.0,
            base_mana_regen_per_second: 5.0,
            mana_regen_multiplier: 1.015,
            respawn_seconds: 10.0,
            move_speed: 250.0,
            spawn_point: Vec2::ZERO,
            size: Size::new(52.0, 72.0),
            padding: Padding::new(36.0, 12.0, 8.0, 12.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SwordTuning {
    pub(crate) damage: u32,
    pub(crate) angular_speed: f32,
    /// A right swing ends once its angle reaches this bound.
    pub(crate) right_end_angle: f32,
    /// A left swing ends once its angle falls to this bound.
    pub(crate) left_end_angle: f32,
    pub(crate) hitbox: Size,
    pub(crate) right_offset: Vec2,
    pub(crate) left_offset: Vec2,
}

impl Default for SwordTuning {
    fn default() -> Self {
        Self {
            damage: 29,
            angular_speed: 12.0,
            right_end_angle: PI,
            left_end_angle: -FRAC_PI_2,
            hitbox: Size::new(72.0, 76.0),
            right_offset: Vec2::new(10.0, -12.0),
            left_offset: Vec2::new(-30.0, -12.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CastTuning {
    pub(crate) duration_seconds: f64,
    pub(crate) mana_cost: u32,
    /// Vertical pose offset from the wielder while the cast is held.
    pub(crate) pose_offset_y: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ProjectileTuning {
    pub(crate) damage: u32,
    pub(crate) speed: f32,
    pub(crate) size: Size,
    pub(crate) padding: Padding,
    pub(crate) launch_offset: f32,
    pub(crate) light_color: [u8; 3],
    pub(crate) light_intensity: f32,
    pub(crate) light_radius: f32,
}

impl ProjectileTuning {
    fn arrow() -> Self {
        Self {
            damage: 14,
            speed: 600.0,
            size: Size::new(42.0, 42.0),
            padding: Padding::uniform(15.0),
            launch_offset: 20.0,
            light_color: [255, 146, 73],
            light_intensity: 0.4,
            light_radius: 50.0,
        }
    }

    fn water_sphere() -> Self {
        Self {
            damage: 45,
            speed: 250.0,
            size: Size::new(24.0, 24.0),
            padding: Padding::NONE,
            launch_offset: 20.0,
            light_color: [123, 10, 252],
            light_intensity: 1.0,
            light_radius: 50.0,
        }
    }
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self::arrow()
    }
}

impl Default for CastTuning {
    fn default() -> Self {
        Self {
            duration_seconds: 0.4,
            mana_cost: 0,
            pose_offset_y: -50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WeaponsTuning {
    pub(crate) sword: SwordTuning,
    pub(crate) bow: CastTuning,
    pub(crate) arrow: ProjectileTuning,
    pub(crate) mana_bolt: CastTuning,
    pub(crate) water_sphere: ProjectileTuning,
    /// Projectiles farther than this from the player expire, and obstacle impact
    /// sounds beyond it are not cued.
    pub(crate) cull_distance: f32,
}

impl Default for WeaponsTuning {
    fn default() -> Self {
        Self {
            sword: SwordTuning::default(),
            bow: CastTuning::default(),
            arrow: ProjectileTuning::arrow(),
            mana_bolt: CastTuning {
                duration_seconds: 0.3,
                mana_cost: 15,
                pose_offset_y: 50.0,
            },
            water_sphere: ProjectileTuning::water_sphere(),
            cull_distance: 2000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PlayerLightTuning {
    pub(crate) color: [u8; 3],
    pub(crate) intensity: f32,
    pub(crate) radius: f32,
    pub(crate) flicker_intensity: f32,
    pub(crate) flicker_radius: f32,
    pub(crate) flicker_hz: f32,
}

impl Default for PlayerLightTuning {
    fn default() -> Self {
        Self {
            color: [252, 204, 67],
            intensity: 0.6,
            radius: 160.0,
            flicker_intensity: 0.12,
            flicker_radius: 0.06,
            flicker_hz: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TorchLightTuning {
    pub(crate) color: [u8; 3],
    pub(crate) intensity: f32,
    pub(crate) radius: f32,
}

impl Default for TorchLightTuning {
    fn default() -> Self {
        Self {
            color: [255, 170, 80],
            intensity: 0.8,
            radius: 120.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LightingTuning {
    pub(crate) ambient_color: [u8; 3],
    pub(crate) ambient_alpha: f32,
    pub(crate) player_light: PlayerLightTuning,
    pub(crate) torch: TorchLightTuning,
}

impl Default for LightingTuning {
    fn default() -> Self {
        Self {
            ambient_color: [0, 0, 0],
            ambient_alpha: 1.0,
            player_light: PlayerLightTuning::default(),
            torch: TorchLightTuning::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PackTuning {
    pub(crate) den_size: Size,
    pub(crate) member_offsets: [Vec2; 4],
    pub(crate) wolf_max_hit_points: u32,
    pub(crate) wolf_contact_damage: u32,
    pub(crate) wolf_size: Size,
    pub(crate) wolf_padding: Padding,
}

impl Default for PackTuning {
    fn default() -> Self {
        Self {
            den_size: Size::new(192.0, 192.0),
            member_offsets: [
                Vec2::new(0.0, 0.0),
                Vec2::new(128.0, 0.0),
                Vec2::new(0.0, 128.0),
                Vec2::new(128.0, 128.0),
            ],
            wolf_max_hit_points: 90,
            wolf_contact_damage: 20,
            wolf_size: Size::new(64.0, 64.0),
            wolf_padding: Padding::uniform(8.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ObstacleTuning {
    pub(crate) position: Vec2,
    pub(crate) size: Size,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WorldTuning {
    pub(crate) player_start: Vec2,
    pub(crate) den_position: Option<Vec2>,
    pub(crate) obstacles: Vec<ObstacleTuning>,
    pub(crate) torches: Vec<Vec2>,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            player_start: Vec2::new(-140.0, 0.0),
            den_position: Some(Vec2::new(480.0, -520.0)),
            obstacles: vec![
                ObstacleTuning {
                    position: Vec2::new(220.0, -160.0),
                    size: Size::new(64.0, 64.0),
                },
                ObstacleTuning {
                    position: Vec2::new(-360.0, 220.0),
                    size: Size::new(64.0, 64.0),
                },
                ObstacleTuning {
                    position: Vec2::new(320.0, 260.0),
                    size: Size::new(128.0, 48.0),
                },
            ],
            torches: (0..6)
                .flat_map(|step| {
                    let y = 180.0 - step as f32 * 192.0;
                    [Vec2::new(-208.0, y), Vec2::new(-48.0, y - 96.0)]
                })
                .collect(),
        }
    }
}

impl GameTuning {
    pub(crate) fn validate(&self) -> Result<(), TuningError> {
        let vitals = &self.vitals;
        require(vitals.max_hit_points >= 1, "vitals.max_hit_points", "must be at least 1")?;
        require(vitals.max_mana >= 1, "vitals.max_mana", "must be at least 1")?;
        require(
            vitals.initial_mana <= vitals.max_mana,
            "vitals.initial_mana",
            "must not exceed max_mana",
        )?;
        require_non_negative(vitals.immunity_seconds, "vitals.immunity_seconds")?;
        require_non_negative(
            vitals.health_regen_delay_seconds,
            "vitals.health_regen_delay_seconds",
        )?;
        require_positive(vitals.health_regen_per_second, "vitals.health_regen_per_second")?;
        require_positive(
            vitals.base_mana_regen_per_second,
            "vitals.base_mana_regen_per_second",
        )?;
        require_positive(vitals.mana_regen_multiplier, "vitals.mana_regen_multiplier")?;
        require_non_negative(vitals.respawn_seconds, "vitals.respawn_seconds")?;
        require_positive(vitals.move_speed as f64, "vitals.move_speed")?;
        require(vitals.spawn_point.is_finite(), "vitals.spawn_point", "must be finite")?;

        let weapons = &self.weapons;
        require_positive(weapons.sword.angular_speed as f64, "weapons.sword.angular_speed")?;
        require(
            weapons.sword.right_end_angle > 0.0 && weapons.sword.right_end_angle.is_finite(),
            "weapons.sword.right_end_angle",
            "must be a finite angle above the right swing start of 0",
        )?;
        require(
            weapons.sword.left_end_angle < FRAC_PI_2 && weapons.sword.left_end_angle.is_finite(),
            "weapons.sword.left_end_angle",
            "must be a finite angle below the left swing start of pi/2",
        )?;
        require_positive(weapons.bow.duration_seconds, "weapons.bow.duration_seconds")?;
        require_positive(
            weapons.mana_bolt.duration_seconds,
            "weapons.mana_bolt.duration_seconds",
        )?;
        require_positive(weapons.arrow.speed as f64, "weapons.arrow.speed")?;
        require_positive(weapons.water_sphere.speed as f64, "weapons.water_sphere.speed")?;
        require_unit(weapons.arrow.light_intensity, "weapons.arrow.light_intensity")?;
        require_unit(
            weapons.water_sphere.light_intensity,
            "weapons.water_sphere.light_intensity",
        )?;
        require_positive(weapons.cull_distance as f64, "weapons.cull_distance")?;

        let lighting = &self.lighting;
        require_unit(lighting.ambient_alpha, "lighting.ambient_alpha")?;
        require_unit(lighting.player_light.intensity, "lighting.player_light.intensity")?;
        require_non_negative(lighting.player_light.radius as f64, "lighting.player_light.radius")?;
        require_unit(lighting.torch.intensity, "lighting.torch.intensity")?;

        require(
            self.pack.wolf_max_hit_points >= 1,
            "pack.wolf_max_hit_points",
            "must be at least 1",
        )?;
        Ok(())
    }
}

fn require(condition: bool, field: &'static str, reason: &str) -> Result<(), TuningError> {
    if condition {
        Ok(())
    } else {
        Err(TuningError::Invalid {
            field,
            reason: reason.to_string(),
        })
    }
}

fn require_positive(value: f64, field: &'static str) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::Invalid {
            field,
            reason: format!("expected a finite value above 0, got {value}"),
        })
    }
}

fn require_non_negative(value: f64, field: &'static str) -> Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::Invalid {
            field,
            reason: format!("expected a finite value of at least 0, got {value}"),
        })
    }
}

fn require_unit(value: f32, field: &'static str) -> Result<(), TuningError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::Invalid {
            field,
            reason: format!("expected a value in [0, 1], got {value}"),
        })
    }
}

pub(crate) fn parse_tuning_json(raw: &str, path: &Path) -> Result<GameTuning, TuningError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let tuning: GameTuning = serde_path_to_error::deserialize(&mut deserializer).map_err(
        |error| {
            let location = error.path().to_string();
            TuningError::Parse {
                path: path.to_path_buf(),
                location,
                source: error.into_inner(),
            }
        },
    )?;
    tuning.validate()?;
    Ok(tuning)
}

pub(crate) fn load_tuning_file(path: &Path) -> Result<GameTuning, TuningError> {
    let raw = fs::read_to_string(path).map_err(|source| TuningError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tuning_json(&raw, path)
}

/// Reads the tuning file named by `LANTERNFALL_TUNING`, falling back to defaults
/// when the variable is unset or the file is unusable.
pub(crate) fn load_tuning_from_env() -> GameTuning {
    match env::var(TUNING_ENV_VAR) {
        Ok(raw_path) => {
            let path = PathBuf::from(raw_path);
            match load_tuning_file(&path) {
                Ok(tuning) => {
                    info!(path = %path.display(), "tuning_loaded");
                    tuning
                }
                Err(error) => {
                    warn!(error = %error, "tuning_load_failed; using defaults");
                    GameTuning::default()
                }
            }
        }
        Err(env::VarError::NotPresent) => GameTuning::default(),
        Err(error) => {
            warn!(
                env_var = TUNING_ENV_VAR,
                error = %error,
                "unable to read tuning env var; using defaults"
            );
            GameTuning::default()
        }
    }
}
