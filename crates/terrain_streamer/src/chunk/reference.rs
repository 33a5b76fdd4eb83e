//! Reference point tracking and the border-cross signal.
//!
//! The reference point (usually the camera or player) reports its world
//! position. Whenever its chunk coordinate drifts by at least the configured
//! threshold on either axis from the last signalled chunk, every subscriber
//! receives one [`BorderCrossed`] signal. Signals carry no payload and
//! coalesce: a subscriber that has not drained its receiver sees at most one
//! pending signal.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use glam::Vec3;

use super::coord::ChunkCoord;

/// Signal that the reference point moved far enough to warrant a new cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BorderCrossed;

/// Moving point the terrain is streamed around.
#[derive(Debug)]
pub struct ReferencePoint {
    position: Vec3,
    /// Chunk at the last signal, `None` until the first move.
    anchor: Option<ChunkCoord>,
    threshold: u32,
    subscribers: Vec<Sender<BorderCrossed>>,
}

impl ReferencePoint {
    /// `threshold` is the chunk-space distance (per axis) that triggers a signal.
    pub fn new(threshold: u32) -> Self {
        Self {
            position: Vec3::ZERO,
            anchor: None,
            threshold: threshold.max(1),
            subscribers: Vec::new(),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Chunk column containing the current position.
    pub fn chunk(&self) -> ChunkCoord {
        ChunkCoord::from_world_pos(self.position.x, self.position.z)
    }

    /// Chunk recorded at the last signal.
    pub fn anchor(&self) -> Option<ChunkCoord> {
        self.anchor
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Register a new listener.
    pub fn subscribe(&mut self) -> Receiver<BorderCrossed> {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        self.subscribers.push(sender);
        receiver
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Update the position. Returns true if a signal was emitted.
    ///
    /// The first move always signals.
    pub fn move_to(&mut self, position: Vec3) -> bool {
        self.position = position;
        let current = self.chunk();

        let crossed = match self.anchor {
            None => true,
            Some(anchor) => anchor.chebyshev_distance(current) >= self.threshold,
        };
        if crossed {
            self.anchor = Some(current);
            self.notify();
        }
        crossed
    }

    fn notify(&mut self) {
        // Full means a signal is already pending; drop listeners that went away
        self.subscribers
            .retain(|sender| !matches!(sender.try_send(BorderCrossed), Err(TrySendError::Disconnected(_))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_move_signals() {
        let mut point = ReferencePoint::new(2);
        let receiver = point.subscribe();
        assert!(point.move_to(Vec3::new(5.0, 0.0, 5.0)));
        assert_eq!(receiver.try_recv(), Ok(BorderCrossed));
        assert_eq!(point.anchor(), Some(ChunkCoord::ZERO));
    }

    #[test]
    fn signals_only_past_threshold() {
        let mut point = ReferencePoint::new(2);
        let receiver = point.subscribe();
        point.move_to(Vec3::ZERO);
        receiver.try_recv().unwrap();

        // One chunk over: below threshold
        assert!(!point.move_to(Vec3::new(20.0, 100.0, 0.0)));
        assert!(receiver.try_recv().is_err());

        // Two chunks over on z
        assert!(point.move_to(Vec3::new(0.0, 0.0, -17.0)));
        assert!(receiver.try_recv().is_ok());
        assert_eq!(point.anchor(), Some(ChunkCoord::new(0, -2)));
    }

    #[test]
    fn pending_signals_coalesce() {
        let mut point = ReferencePoint::new(1);
        let receiver = point.subscribe();
        for i in 0..10 {
            point.move_to(Vec3::new(i as f32 * 32.0, 0.0, 0.0));
        }
        assert!(receiver.try_recv().is_ok());
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut point = ReferencePoint::new(1);
        let kept = point.subscribe();
        drop(point.subscribe());
        assert_eq!(point.subscriber_count(), 2);

        point.move_to(Vec3::ZERO);
        assert_eq!(point.subscriber_count(), 1);
        assert!(kept.try_recv().is_ok());
    }
}
