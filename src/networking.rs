use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::game_logic::{SyncError, VehicleState};

/// Periodic state of one vehicle, as broadcast to the rest of a room.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VehicleSnapshot {
    pub player_id: u32,
    pub sequence: u64,
    pub timestamp: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    pub distance: f32,
    pub crashed: bool,
}

impl VehicleSnapshot {
    pub fn from_state(player_id: u32, sequence: u64, timestamp: f32, state: &VehicleState) -> Self {
        Self {
            player_id,
            sequence,
            timestamp,
            x: state.position.x,
            y: state.position.y,
            z: state.position.z,
            yaw: state.render_yaw(),
            distance: state.distance,
            crashed: state.crashed,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum SyncMessage {
    Snapshot(VehicleSnapshot),
    RoomSnapshots(Vec<VehicleSnapshot>),
}

impl SyncMessage {
    pub fn to_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(line: &str) -> Result<Self, SyncError> {
        Ok(serde_json::from_str(line.trim())?)
    }
}

/// Decides when the local vehicle's state goes out on the wire.
#[derive(Component, Debug, Clone)]
pub struct SnapshotEmitter {
    pub player_id: u32,
    interval: f32,
    last_sent: Option<f32>,
    next_sequence: u64,
}

impl SnapshotEmitter {
    pub fn new(player_id: u32, interval: f32) -> Self {
        Self {
            player_id,
            interval,
            last_sent: None,
            next_sequence: 0,
        }
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Returns a snapshot once `interval` has passed since the last one.
    pub fn poll(&mut self, now: f32, state: &VehicleState) -> Option<VehicleSnapshot> {
        if let Some(last) = self.last_sent {
            if now - last < self.interval {
                return None;
            }
        }
        self.last_sent = Some(now);
        let snapshot = VehicleSnapshot::from_state(self.player_id, self.next_sequence, now, state);
        self.next_sequence += 1;
        trace!(sequence = snapshot.sequence, distance = snapshot.distance, "snapshot due");
        Some(snapshot)
    }

    pub fn reset(&mut self) {
        self.last_sent = None;
        self.next_sequence = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emitter_honours_interval() {
        let mut emitter = SnapshotEmitter::new(7, 0.1);
        let state = VehicleState::default();

        let first = emitter.poll(0.0, &state).expect("first poll always emits");
        assert_eq!(first.sequence, 0);
        assert!(emitter.poll(0.05, &state).is_none());
        assert!(emitter.poll(0.099, &state).is_none());
        let second = emitter.poll(0.1, &state).expect("interval elapsed");
        assert_eq!(second.sequence, 1);
        assert_eq!(second.player_id, 7);

        emitter.reset();
        assert_eq!(emitter.poll(0.12, &state).map(|s| s.sequence), Some(0));
    }

    #[test]
    fn test_snapshot_carries_render_yaw() {
        let state = VehicleState {
            position: Vec3::new(1.0, 2.0, 3.0),
            heading: 0.2,
            drift_angle: 0.1,
            distance: 44.0,
            crashed: true,
            ..Default::default()
        };
        let snapshot = VehicleSnapshot::from_state(1, 5, 2.5, &state);
        assert_eq!(snapshot.position(), state.position);
        assert!((snapshot.yaw - 0.3).abs() < 1e-6);
        assert!(snapshot.crashed);
    }

    #[test]
    fn test_messages_decode_from_json_lines() {
        let message = SyncMessage::RoomSnapshots(vec![VehicleSnapshot::from_state(
            2,
            9,
            1.0,
            &VehicleState::default(),
        )]);
        let line = format!("{}\n", message.to_json().expect("serialize"));
        assert_eq!(SyncMessage::from_json(&line).expect("decode"), message);
    }

    #[test]
    fn test_garbage_is_a_sync_error() {
        assert!(matches!(
            SyncMessage::from_json("{\"Snapshot\": 12}"),
            Err(SyncError::Malformed(_))
        ));
    }
}
