//! Paddle input ingestion.
//!
//! Each side keeps the last accepted sequence number of its current connection and a
//! buffer of inputs received since the last simulated tick. Only the newest buffered
//! input is ever integrated; older ones in the same window are discarded.

use std::collections::VecDeque;

use pong_shared::protocol::InputMsg;

use crate::side::Side;

/// Inputs kept per side between ticks. Only the newest one is used, so the cap just
/// bounds memory while the session sits in its countdown.
const MAX_BUFFERED_INPUTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub seq: u64,
    /// Client timestamp (unix ms), stamped by the server when the client omitted it
    pub time: i64,
    pub up: bool,
    pub down: bool,
}

impl InputEvent {
    pub fn from_msg(msg: InputMsg, received_at: i64) -> Self {
        Self {
            seq: msg.seq,
            time: msg.time.unwrap_or(received_at),
            up: msg.up,
            down: msg.down,
        }
    }

    /// +1 for up, -1 for down, 0 for both or neither
    pub fn direction(&self) -> f64 {
        let up = if self.up { 1.0 } else { 0.0 };
        let down = if self.down { 1.0 } else { 0.0 };
        up - down
    }
}

#[derive(Debug, Default)]
struct InputLane {
    last_seq: Option<u64>,
    buffer: VecDeque<InputEvent>,
}

#[derive(Debug)]
pub struct InputPipeline {
    lanes: Vec<InputLane>,
}

impl InputPipeline {
    pub fn new(n_players: u8) -> Self {
        Self {
            lanes: (0..n_players).map(|_| InputLane::default()).collect(),
        }
    }

    /// Forget the sequence history of a side. Called when a new connection takes it over.
    pub fn reset_sequence(&mut self, side: Side) {
        if let Some(lane) = self.lanes.get_mut(side.index()) {
            lane.last_seq = None;
        }
    }

    /// Queue an input. Returns false if it was dropped as a duplicate or out of order.
    pub fn accept(&mut self, side: Side, event: InputEvent) -> bool {
        let Some(lane) = self.lanes.get_mut(side.index()) else {
            return false;
        };
        if lane.last_seq.is_some_and(|last| event.seq <= last) {
            return false;
        }
        lane.last_seq = Some(event.seq);
        if lane.buffer.len() >= MAX_BUFFERED_INPUTS {
            lane.buffer.pop_front();
        }
        lane.buffer.push_back(event);
        true
    }

    /// Newest buffered input for a side; the buffer is emptied either way.
    pub fn take_latest(&mut self, side: Side) -> Option<InputEvent> {
        let lane = self.lanes.get_mut(side.index())?;
        let latest = lane.buffer.pop_back();
        lane.buffer.clear();
        latest
    }

    /// Newest input for every side, indexed by side.
    pub fn drain_latest(&mut self) -> Vec<Option<InputEvent>> {
        (0..self.lanes.len())
            .map(|i| Side::from_index(i).and_then(|side| self.take_latest(side)))
            .collect()
    }

    /// Drop everything buffered for a side whose connection went away.
    pub fn clear(&mut self, side: Side) {
        if let Some(lane) = self.lanes.get_mut(side.index()) {
            lane.buffer.clear();
        }
    }

    #[cfg(test)]
    pub fn pending(&self, side: Side) -> usize {
        self.lanes.get(side.index()).map_or(0, |lane| lane.buffer.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(seq: u64, up: bool, down: bool) -> InputEvent {
        InputEvent {
            seq,
            time: 0,
            up,
            down,
        }
    }

    #[test]
    fn direction_from_buttons() {
        assert_eq!(input(1, true, false).direction(), 1.0);
        assert_eq!(input(1, false, true).direction(), -1.0);
        assert_eq!(input(1, true, true).direction(), 0.0);
        assert_eq!(input(1, false, false).direction(), 0.0);
    }

    #[test]
    fn clear_empties_one_side_only() {
        let mut pipeline = InputPipeline::new(2);
        assert!(pipeline.accept(Side::Zero, input(1, true, false)));
        assert!(pipeline.accept(Side::One, input(1, false, true)));
        pipeline.clear(Side::Zero);
        assert_eq!(pipeline.drain_latest(), vec![None, Some(input(1, false, true))]);
        // sequence history survives, only the buffer goes
        assert!(!pipeline.accept(Side::Zero, input(1, true, false)));
    }

    #[test]
    fn older_sequence_is_dropped() {
        let mut pipeline = InputPipeline::new(2);
        assert!(pipeline.accept(Side::Zero, input(5, true, false)));
        assert!(!pipeline.accept(Side::Zero, input(3, false, true)));
        assert_eq!(pipeline.pending(Side::Zero), 1);
        assert_eq!(pipeline.take_latest(Side::Zero), Some(input(5, true, false)));
    }

    #[test]
    fn duplicate_sequence_is_dropped() {
        let mut pipeline = InputPipeline::new(2);
        assert!(pipeline.accept(Side::One, input(9, true, false)));
        assert!(!pipeline.accept(Side::One, input(9, false, true)));
        assert_eq!(pipeline.pending(Side::One), 1);
    }

    #[test]
    fn first_input_may_have_sequence_zero() {
        let mut pipeline = InputPipeline::new(2);
        assert!(pipeline.accept(Side::Zero, input(0, true, false)));
        assert!(!pipeline.accept(Side::Zero, input(0, true, false)));
        assert!(pipeline.accept(Side::Zero, input(1, true, false)));
    }

    #[test]
    fn only_newest_input_is_consumed() {
        let mut pipeline = InputPipeline::new(2);
        pipeline.accept(Side::Zero, input(1, true, false));
        pipeline.accept(Side::Zero, input(2, false, false));
        pipeline.accept(Side::Zero, input(3, false, true));
        assert_eq!(pipeline.take_latest(Side::Zero), Some(input(3, false, true)));
        assert_eq!(pipeline.pending(Side::Zero), 0);
        assert_eq!(pipeline.take_latest(Side::Zero), None);
    }

    #[test]
    fn sequence_survives_consumption() {
        let mut pipeline = InputPipeline::new(2);
        pipeline.accept(Side::Zero, input(4, true, false));
        pipeline.take_latest(Side::Zero);
        assert!(!pipeline.accept(Side::Zero, input(4, true, false)));
    }

    #[test]
    fn reset_allows_restarting_sequence() {
        let mut pipeline = InputPipeline::new(2);
        pipeline.accept(Side::Zero, input(40, true, false));
        pipeline.reset_sequence(Side::Zero);
        assert!(pipeline.accept(Side::Zero, input(1, false, true)));
    }

    #[test]
    fn drain_latest_covers_every_side() {
        let mut pipeline = InputPipeline::new(3);
        pipeline.accept(Side::Two, input(1, true, false));
        let latest = pipeline.drain_latest();
        assert_eq!(latest.len(), 3);
        assert_eq!(latest[0], None);
        assert_eq!(latest[1], None);
        assert_eq!(latest[2], Some(input(1, true, false)));
    }

    #[test]
    fn unknown_side_is_ignored() {
        let mut pipeline = InputPipeline::new(2);
        assert!(!pipeline.accept(Side::Three, input(1, true, false)));
        assert_eq!(pipeline.take_latest(Side::Three), None);
    }

    #[test]
    fn buffer_is_bounded() {
        let mut pipeline = InputPipeline::new(2);
        for seq in 0..100 {
            pipeline.accept(Side::Zero, input(seq, seq % 2 == 0, false));
        }
        assert_eq!(pipeline.pending(Side::Zero), MAX_BUFFERED_INPUTS);
        assert_eq!(pipeline.take_latest(Side::Zero).map(|e| e.seq), Some(99));
    }

    #[test]
    fn missing_client_time_is_stamped() {
        let msg = InputMsg {
            seq: 1,
            time: None,
            up: true,
            down: false,
        };
        assert_eq!(InputEvent::from_msg(msg, 777).time, 777);
    }
}
