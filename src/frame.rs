use embedded_can::StandardId;

use crate::{registry::NodeId, FRAME_DATA_CAPACITY};

/// A classic CAN 2.0 data frame with an 11-bit identifier.
///
/// Unused payload bytes are always zero, and [`CanFrame::data`] only ever
/// exposes the first `dlc` bytes, so stale bytes past the declared length
/// cannot leak into a decode.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanFrame {
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    id: StandardId,
    dlc: usize,
    data: [u8; FRAME_DATA_CAPACITY],
}

impl CanFrame {
    /// Creates a data frame. `data` must have a length in the range 0..=8 or
    /// else `None` will be returned instead.
    pub fn new(id: StandardId, data: &[u8]) -> Option<Self> {
        if data.len() > FRAME_DATA_CAPACITY {
            return None;
        }

        let mut copy = [0u8; FRAME_DATA_CAPACITY];
        copy[..data.len()].copy_from_slice(data);

        Some(Self {
            id,
            dlc: data.len(),
            data: copy,
        })
    }

    /// Gets the message ID of the frame
    pub fn id(&self) -> StandardId {
        self.id
    }

    /// Gets the DLC (Data Length Code) of the frame
    pub fn dlc(&self) -> usize {
        self.dlc
    }

    /// Payload bytes covered by the DLC.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.dlc]
    }

    /// Full zero-padded payload, as a bus controller expects it.
    pub fn payload(&self) -> &[u8; FRAME_DATA_CAPACITY] {
        &self.data
    }

    /// Registry lookup on the raw identifier. `None` for foreign traffic.
    pub fn node(&self) -> Option<NodeId> {
        u8::try_from(self.id.as_raw())
            .ok()
            .and_then(|raw| NodeId::try_from(raw).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_is_bounded_by_the_dlc() {
        let frame = CanFrame::new(StandardId::new(9).unwrap(), &[1, 2]).unwrap();

        assert_eq!(frame.dlc(), 2);
        assert_eq!(frame.data(), &[1, 2]);
        assert_eq!(frame.payload(), &[1, 2, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn oversized_payloads_are_rejected() {
        assert_eq!(CanFrame::new(StandardId::ZERO, &[0; 9]), None);
        assert!(CanFrame::new(StandardId::ZERO, &[0; 8]).is_some());
    }

    #[test]
    fn node_lookup_covers_the_registry_only() {
        let known = CanFrame::new(StandardId::new(11).unwrap(), &[]).unwrap();
        assert_eq!(known.node(), Some(NodeId::Tsc));

        let foreign = CanFrame::new(StandardId::new(0x123).unwrap(), &[]).unwrap();
        assert_eq!(foreign.node(), None);
    }
}
