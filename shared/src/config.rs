/// Full width of the square field
pub const FIELD_SIZE: f64 = 128_000.0;
/// Distance from the centre to each wall
pub const FIELD_HALFSIZE: f64 = FIELD_SIZE / 2.0;
/// Simulation period in milliseconds
pub const TICK_MS: u32 = 20;

/// Match configuration. Immutable once a session is created.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub n_players: u8,
    #[serde(default)]
    pub coop: bool,
    #[serde(default = "default_ball_speed")]
    pub ball_speed: f64,
    #[serde(default = "default_paddle_size")]
    pub paddle_size: f64,
    #[serde(default = "default_paddle_speed")]
    pub paddle_speed: f64,
    #[serde(default = "default_paddle_inertia")]
    pub paddle_inertia: f64,
    #[serde(default = "default_paddle_friction")]
    pub paddle_friction: f64,
    #[serde(default = "default_time_limit_ms")]
    pub time_limit_ms: u64,
    /// None means paddles never run out of health
    #[serde(default)]
    pub starting_health: Option<u32>,
    /// Absent means 7; an explicit null means no points target
    #[serde(default = "default_points_target")]
    pub points_target: Option<u32>,
    #[serde(default = "default_field_size")]
    pub field_size: f64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u32,
}

fn default_ball_speed() -> f64 {
    130.0
}
fn default_paddle_size() -> f64 {
    17_000.0
}
fn default_paddle_speed() -> f64 {
    320.0
}
fn default_paddle_inertia() -> f64 {
    16.0
}
fn default_paddle_friction() -> f64 {
    1.4
}
fn default_time_limit_ms() -> u64 {
    2 * 60_000
}
fn default_points_target() -> Option<u32> {
    Some(7)
}
fn default_field_size() -> f64 {
    FIELD_SIZE
}
fn default_tick_ms() -> u32 {
    TICK_MS
}

impl GameConfig {
    /// Default configuration for the given player count.
    pub fn with_players(n_players: u8) -> Self {
        Self {
            n_players,
            coop: false,
            ball_speed: default_ball_speed(),
            paddle_size: default_paddle_size(),
            paddle_speed: default_paddle_speed(),
            paddle_inertia: default_paddle_inertia(),
            paddle_friction: default_paddle_friction(),
            time_limit_ms: default_time_limit_ms(),
            starting_health: None,
            points_target: default_points_target(),
            field_size: FIELD_SIZE,
            tick_ms: TICK_MS,
        }
    }

    pub fn half_size(&self) -> f64 {
        self.field_size / 2.0
    }

    /// Ticks of countdown before the ball is launched (3 seconds).
    pub fn pause_countdown_ticks(&self) -> u32 {
        (1000.0 / self.tick_ms as f64).round() as u32 * 3
    }

    /// Furthest a paddle centre may travel from the middle of its wall.
    pub fn paddle_limit(&self) -> f64 {
        self.half_size() - self.paddle_size / 2.0
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(2..=4).contains(&self.n_players) {
            return Err("nPlayers must be between 2 and 4".to_string());
        }
        check_range("ballSpeed", self.ball_speed, 16.0, 160.0)?;
        check_range("paddleSize", self.paddle_size, 4000.0, 60000.0)?;
        check_range("paddleSpeed", self.paddle_speed, 40.0, 500.0)?;
        check_range("paddleInertia", self.paddle_inertia, 0.0, 64.0)?;
        check_range("paddleFriction", self.paddle_friction, -5.0, 5.0)?;
        if self.time_limit_ms % 1000 != 0 {
            return Err("timeLimitMs must be a multiple of 1000".to_string());
        }
        if !(15_000..=30 * 60_000).contains(&self.time_limit_ms) {
            return Err("timeLimitMs must be between 15000 and 1800000".to_string());
        }
        if self.starting_health == Some(0) {
            return Err("startingHealth must be positive".to_string());
        }
        if self.points_target == Some(0) {
            return Err("pointsTarget must be positive".to_string());
        }
        if self.field_size != FIELD_SIZE {
            return Err(format!("fieldSize must be {}", FIELD_SIZE));
        }
        if self.tick_ms != TICK_MS {
            return Err(format!("tickMs must be {}", TICK_MS));
        }
        Ok(())
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), String> {
    if !value.is_finite() || value < min || value > max {
        return Err(format!("{} must be between {} and {}", name, min, max));
    }
    Ok(())
}
