use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::GameConfig;
use crate::vec2::Vec2;

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../bindings/")]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "game_join")]
    GameJoin(GameJoinMsg),
    #[serde(rename = "game_wait")]
    GameWait(GameWaitMsg),
    #[serde(rename = "game_start")]
    GameStart,
    #[serde(rename = "state")]
    State(StateMsg),
    #[serde(rename = "game_end")]
    GameEnd(GameEndMsg),
}

/// Acknowledgement sent to a joining connection.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct GameJoinMsg {
    pub protocol_version: u32,
    pub params: GameConfig,
    /// Side assigned to the recipient
    pub pid: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct GameWaitMsg {
    pub joined_players: u8,
}

/// Per-tick snapshot, stamped with the recipient's own side.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../bindings/")]
pub struct StateMsg {
    pub state: StateWire,
    pub pid: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct StateWire {
    pub tick: u64,
    /// Elapsed wall-clock milliseconds
    pub time: u64,
    pub pause_cd: u32,
    pub players: Vec<PlayerWire>,
    pub ball: BallWire,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct PlayerWire {
    pub pos: f64,
    pub vel: f64,
    /// null when health is unlimited
    pub health: Option<i32>,
    pub score: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_by: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct BallWire {
    pub pos: Vec2,
    pub vel: Vec2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_refl: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../bindings/")]
pub struct GameEndMsg {
    pub result: MatchResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../bindings/")]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// At most one side still has health
    LastStanding,
    /// A side reached the points target
    PointsTarget,
    /// The time limit elapsed
    TimeLimit,
}

/// Final outcome of a match, sent to players and the result collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub reason: EndReason,
    pub winner: Option<u8>,
    pub draw: bool,
    /// Indexed by side
    pub scores: Vec<i32>,
    /// Indexed by side, null for unlimited
    pub health: Vec<Option<i32>>,
    pub ticks: u64,
    pub duration_ms: u64,
    /// Unix milliseconds
    pub started_at: i64,
    /// Unix milliseconds
    pub ended_at: i64,
}

// === Client -> Server ===

/// Paddle input frame. `t` is the client clock in unix milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../bindings/")]
pub struct InputMsg {
    #[serde(deserialize_with = "integral_seq")]
    #[ts(type = "number")]
    pub seq: u64,
    #[serde(default, rename = "t", alias = "time", skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
}

/// JSON clients may send whole numbers as floats (`3.0`); anything fractional or
/// negative is rejected.
fn integral_seq<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(seq) = number.as_u64() {
        return Ok(seq);
    }
    match number.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 => Ok(f as u64),
        _ => Err(D::Error::custom(format!("seq must be a non-negative integer, got {}", number))),
    }
}

// === Creation boundary ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct GameKey {
    pub key: String,
    pub game_id: String,
    /// RFC 3339 expiry of the credential
    pub expires: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../bindings/")]
#[serde(rename_all = "camelCase")]
pub struct CreateGameResponse {
    pub game_id: String,
    pub game_keys: Vec<GameKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> StateWire {
        StateWire {
            tick: 42,
            time: 3840,
            pause_cd: 0,
            players: vec![
                PlayerWire {
                    pos: 1200.0,
                    vel: 0.25,
                    health: None,
                    score: 2,
                    hit_by: None,
                },
                PlayerWire {
                    pos: -300.0,
                    vel: 0.0,
                    health: Some(3),
                    score: -1,
                    hit_by: Some(0),
                },
            ],
            ball: BallWire {
                pos: Vec2::new(100.0, -50.0),
                vel: Vec2::new(0.6, 0.8),
                last_refl: Some(1),
            },
        }
    }

    #[test]
    fn server_msg_join_uses_type_tag() {
        let msg = ServerMsg::GameJoin(GameJoinMsg {
            protocol_version: PROTOCOL_VERSION,
            params: GameConfig::with_players(2),
            pid: 1,
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"game_join\""));
        assert!(json.contains("\"nPlayers\":2"));
        assert!(json.contains("\"pid\":1"));
    }

    #[test]
    fn game_start_is_bare_tag() {
        let json = serde_json::to_string(&ServerMsg::GameStart).unwrap();
        assert_eq!(json, r#"{"type":"game_start"}"#);
    }

    #[test]
    fn state_msg_field_names() {
        let msg = ServerMsg::State(StateMsg {
            state: sample_state(),
            pid: 0,
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"state\""));
        assert!(json.contains("\"pauseCd\":0"));
        assert!(json.contains("\"health\":null"));
        assert!(json.contains("\"hitBy\":0"));
        assert!(json.contains("\"lastRefl\":1"));
        let parsed: ServerMsg = serde_json::from_str(&json).unwrap();
        match parsed {
            ServerMsg::State(s) => assert_eq!(s.state, sample_state()),
            _ => panic!("Expected State"),
        }
    }

    #[test]
    fn game_end_reason_is_snake_case() {
        let msg = ServerMsg::GameEnd(GameEndMsg {
            result: MatchResult {
                reason: EndReason::PointsTarget,
                winner: Some(1),
                draw: false,
                scores: vec![3, 7],
                health: vec![None, None],
                ticks: 900,
                duration_ms: 21_000,
                started_at: 1_700_000_000_000,
                ended_at: 1_700_000_021_000,
            },
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"reason\":\"points_target\""));
        assert!(json.contains("\"durationMs\":21000"));
    }

    #[test]
    fn input_msg_accepts_t_or_time() {
        let a: InputMsg = serde_json::from_str(r#"{"seq":5,"t":123,"up":true,"down":false}"#).unwrap();
        assert_eq!(a.seq, 5);
        assert_eq!(a.time, Some(123));
        assert!(a.up);

        let b: InputMsg = serde_json::from_str(r#"{"seq":6,"time":99,"down":true}"#).unwrap();
        assert_eq!(b.time, Some(99));
        assert!(!b.up);
        assert!(b.down);

        let c: InputMsg = serde_json::from_str(r#"{"seq":7}"#).unwrap();
        assert_eq!(c.time, None);
    }

    #[test]
    fn input_msg_accepts_whole_float_seq() {
        let msg: InputMsg = serde_json::from_str(r#"{"seq":3.0,"up":true}"#).unwrap();
        assert_eq!(msg.seq, 3);

        assert!(serde_json::from_str::<InputMsg>(r#"{"seq":2.5}"#).is_err());
        assert!(serde_json::from_str::<InputMsg>(r#"{"seq":-1}"#).is_err());
        assert!(serde_json::from_str::<InputMsg>(r#"{"seq":"3"}"#).is_err());
    }

    #[test]
    fn input_msg_without_seq_rejected() {
        assert!(serde_json::from_str::<InputMsg>(r#"{"up":true}"#).is_err());
        assert!(serde_json::from_str::<InputMsg>("not json").is_err());
    }
}
