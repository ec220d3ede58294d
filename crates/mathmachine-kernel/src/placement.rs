//! Placement queue for edits made off the simulation thread.
//!
//! Input handlers push [`Placement`]s through a [`PlacementSender`]; the
//! owner of the simulation drains the queue between ticks, so an edit never
//! lands in the middle of a write pass.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use mathmachine_common::GridCoord;
use tracing::{info, warn};

use crate::tile::TileProperties;

/// Maximum number of placements that can wait between two ticks.
pub const MAX_PLACEMENTS: usize = 1024;

/// One requested cell edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Target cell
    pub coord: GridCoord,
    /// Properties to write (normalized on apply)
    pub properties: TileProperties,
}

impl Placement {
    /// Creates a placement at `(x, y)`.
    #[must_use]
    pub const fn new(x: i32, y: i32, properties: TileProperties) -> Self {
        Self {
            coord: GridCoord::new(x, y),
            properties,
        }
    }
}

/// Cloneable producer handle.
#[derive(Debug, Clone)]
pub struct PlacementSender {
    sender: Sender<Placement>,
}

impl PlacementSender {
    /// Queues a placement.
    ///
    /// Returns `false` (and logs a warning) if the queue is full or closed.
    pub fn try_send(&self, placement: Placement) -> bool {
        match self.sender.try_send(placement) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                warn!(
                    "Placement queue full ({} placements), dropping placement at ({}, {})",
                    MAX_PLACEMENTS, dropped.coord.x, dropped.coord.y
                );
                false
            },
            Err(TrySendError::Disconnected(dropped)) => {
                warn!(
                    "Placement queue closed, dropping placement at ({}, {})",
                    dropped.coord.x, dropped.coord.y
                );
                false
            },
        }
    }
}

/// Bounded multi-producer queue of pending placements.
#[derive(Debug)]
pub struct PlacementQueue {
    /// Kept so handles can be created after construction
    sender: Sender<Placement>,
    /// Consumer side, drained at tick boundaries
    receiver: Receiver<Placement>,
}

impl Default for PlacementQueue {
    fn default() -> Self {
        Self::new(MAX_PLACEMENTS)
    }
}

impl PlacementQueue {
    /// Creates a queue holding at most `capacity` placements.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        info!("Creating placement queue (capacity: {})", capacity);
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a producer handle.
    #[must_use]
    pub fn sender(&self) -> PlacementSender {
        PlacementSender {
            sender: self.sender.clone(),
        }
    }

    /// Queues a placement from the owning thread.
    pub fn push(&self, placement: Placement) -> bool {
        self.sender().try_send(placement)
    }

    /// Takes every pending placement in arrival order.
    pub fn drain(&self) -> Vec<Placement> {
        self.receiver.try_iter().collect()
    }

    /// Number of pending placements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Maximum number of pending placements.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.receiver.capacity().unwrap_or(MAX_PLACEMENTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Tile;

    #[test]
    fn test_drain_preserves_order() {
        let queue = PlacementQueue::default();
        for x in 0..5 {
            assert!(queue.push(Placement::new(x, 0, TileProperties::new(Tile::Wall))));
        }
        assert_eq!(queue.len(), 5);

        let drained = queue.drain();
        let xs: Vec<i32> = drained.iter().map(|p| p.coord.x).collect();
        assert_eq!(xs, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_drops() {
        let queue = PlacementQueue::new(2);
        let sender = queue.sender();
        let props = TileProperties::new(Tile::Conveyor);
        assert!(sender.try_send(Placement::new(0, 0, props)));
        assert!(sender.try_send(Placement::new(1, 0, props)));
        assert!(!sender.try_send(Placement::new(2, 0, props)));
        assert_eq!(queue.drain().len(), 2);
        assert!(sender.try_send(Placement::new(3, 0, props)));
    }

    #[test]
    fn test_sender_across_threads() {
        let queue = PlacementQueue::default();
        let sender = queue.sender();
        let handle = std::thread::spawn(move || {
            for y in 0..10 {
                sender.try_send(Placement::new(0, y, TileProperties::new(Tile::Grabber)));
            }
        });
        handle.join().expect("producer thread");
        assert_eq!(queue.drain().len(), 10);
        assert_eq!(queue.capacity(), MAX_PLACEMENTS);
    }
}
