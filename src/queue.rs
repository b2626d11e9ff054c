use heapless::Vec;

use crate::{frame::CanFrame, registry::Priority, TX_QUEUE_DEPTH};

/// Errors raised while queueing an outbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    #[error("Transmit queue is full")]
    Full,
    #[error("Frame identifier ({0:?}) is not a registered node")]
    UnknownNode(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    priority: Priority,
    seq: u32,
    frame: CanFrame,
}

/// Software model of the bus's own arbitration: pending frames leave the
/// queue lowest priority value first, FIFO among equals, so a single node's
/// transmissions hit the wire in the same order a shared bus would grant
/// them.
#[derive(Debug, Default)]
pub struct ArbitrationQueue {
    slots: Vec<Slot, TX_QUEUE_DEPTH>,
    seq: u32,
}

impl ArbitrationQueue {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            seq: 0,
        }
    }

    /// Queues a frame without blocking. The queue is left untouched when the
    /// bound is reached.
    pub fn enqueue(&mut self, frame: CanFrame) -> Result<(), QueueError> {
        let node = frame
            .node()
            .ok_or(QueueError::UnknownNode(frame.id().as_raw()))?;

        self.slots
            .push(Slot {
                priority: node.priority(),
                seq: self.seq,
                frame,
            })
            .map_err(|_| QueueError::Full)?;

        self.seq += 1;
        Ok(())
    }

    /// Removes and returns the frame that would win arbitration next.
    pub fn dequeue_next(&mut self) -> Option<CanFrame> {
        let winner = self
            .slots
            .iter()
            .enumerate()
            .min_by_key(|(_, slot)| (slot.priority, slot.seq))
            .map(|(index, _)| index)?;

        let slot = self.slots.remove(winner);

        // The counter only orders frames relative to each other, so it can
        // restart whenever the queue drains.
        if self.slots.is_empty() {
            self.seq = 0;
        }

        Some(slot.frame)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use embedded_can::StandardId;

    use super::*;
    use crate::registry::NodeId;

    fn frame_for(node: NodeId, marker: u8) -> CanFrame {
        CanFrame::new(node.standard_id(), &[0, marker]).unwrap()
    }

    #[test]
    fn lower_priority_value_wins_with_fifo_tie_break() {
        let mut queue = ArbitrationQueue::new();

        // Priorities 4, 2, 5, 2 must drain as 2, 2, 4, 5 with the two
        // equal-priority frames kept in enqueue order.
        queue.enqueue(frame_for(NodeId::Tsc, 0)).unwrap();
        queue.enqueue(frame_for(NodeId::EscA, 1)).unwrap();
        queue.enqueue(frame_for(NodeId::Vdc, 2)).unwrap();
        queue.enqueue(frame_for(NodeId::EscA, 3)).unwrap();

        assert_eq!(queue.dequeue_next(), Some(frame_for(NodeId::EscA, 1)));
        assert_eq!(queue.dequeue_next(), Some(frame_for(NodeId::EscA, 3)));
        assert_eq!(queue.dequeue_next(), Some(frame_for(NodeId::Tsc, 0)));
        assert_eq!(queue.dequeue_next(), Some(frame_for(NodeId::Vdc, 2)));
        assert_eq!(queue.dequeue_next(), None);
    }

    #[test]
    fn a_full_queue_rejects_without_losing_frames() {
        let mut queue = ArbitrationQueue::new();

        for marker in 0..TX_QUEUE_DEPTH as u8 {
            queue.enqueue(frame_for(NodeId::Obd, marker)).unwrap();
        }

        assert_eq!(
            queue.enqueue(frame_for(NodeId::Obd, 0xFF)),
            Err(QueueError::Full)
        );
        assert_eq!(queue.len(), TX_QUEUE_DEPTH);
        assert_eq!(queue.dequeue_next(), Some(frame_for(NodeId::Obd, 0)));
    }

    #[test]
    fn foreign_identifiers_cannot_be_queued() {
        let mut queue = ArbitrationQueue::new();
        let foreign = CanFrame::new(StandardId::new(0x100).unwrap(), &[]).unwrap();

        assert_eq!(queue.enqueue(foreign), Err(QueueError::UnknownNode(0x100)));
        assert!(queue.is_empty());
    }
}
