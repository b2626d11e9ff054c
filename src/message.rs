use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    frame::CanFrame,
    registry::{NodeId, Priority},
    FRAME_DATA_CAPACITY,
};

/// Cart operating mode, carried as byte 0 of every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = DecodeError, constructor = DecodeError::FieldOutOfRange))]
#[repr(u8)]
pub enum CartMode {
    #[default]
    Manual = 0,
    Auto = 1,
}

/// Drive direction commanded by the vehicle-dynamics controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = DecodeError, constructor = DecodeError::FieldOutOfRange))]
#[repr(u8)]
pub enum CartDirection {
    #[default]
    Off = 0,
    Forward = 1,
    Backward = 2,
}

/// Engine telemetry published by the OBD gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ObdReport {
    pub mode: CartMode,
    pub rpm: u16,
}

/// Speed controller state, shared by both ESC nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EscReport {
    pub mode: CartMode,
    pub throttle: u8,
}

/// Throttle/steering controller state. `steering` is centered at 127.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TscReport {
    pub mode: CartMode,
    pub throttle: u8,
    pub steering: u8,
}

/// Vehicle-dynamics command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VdcCommand {
    pub mode: CartMode,
    pub direction: CartDirection,
}

/// A decoded, node-specific record. Constructed either from a received
/// [`CanFrame`] or by application logic ahead of transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    Obd(ObdReport),
    EscA(EscReport),
    EscB(EscReport),
    Tsc(TscReport),
    Vdc(VdcCommand),
}

/// Errors raised while decoding a frame payload into a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    #[error("Received a frame with an identifier ({0:?}) that is not a registered node")]
    UnknownId(u16),
    #[error("Received a frame for ({0:?}) with fewer payload bytes ({1:?}) than its schema needs")]
    Truncated(NodeId, usize),
    #[error("Received a payload byte ({0:?}) outside its field's enumerated domain")]
    FieldOutOfRange(u8),
}

impl Message {
    /// Origin node of the message.
    pub fn node(&self) -> NodeId {
        match self {
            Self::Obd(_) => NodeId::Obd,
            Self::EscA(_) => NodeId::EscA,
            Self::EscB(_) => NodeId::EscB,
            Self::Tsc(_) => NodeId::Tsc,
            Self::Vdc(_) => NodeId::Vdc,
        }
    }

    /// Arbitration priority of the message.
    pub fn priority(&self) -> Priority {
        self.node().priority()
    }

    /// Minimum payload bytes the role's schema occupies.
    pub(crate) const fn required_len(node: NodeId) -> usize {
        match node {
            NodeId::Obd => 3,
            NodeId::EscA | NodeId::EscB => 2,
            NodeId::Tsc => 3,
            NodeId::Vdc => 2,
        }
    }

    /// Packs the message into a frame. The DLC is set to the schema's
    /// required length, never padded out to the full 8 bytes.
    pub fn encode(&self) -> CanFrame {
        let mut payload = [0u8; FRAME_DATA_CAPACITY];

        match self {
            Self::Obd(report) => {
                payload[0] = report.mode.into();
                payload[1..3].copy_from_slice(&report.rpm.to_le_bytes());
            }
            Self::EscA(report) | Self::EscB(report) => {
                payload[0] = report.mode.into();
                payload[1] = report.throttle;
            }
            Self::Tsc(report) => {
                payload[0] = report.mode.into();
                payload[1] = report.throttle;
                payload[2] = report.steering;
            }
            Self::Vdc(command) => {
                payload[0] = command.mode.into();
                payload[1] = command.direction.into();
            }
        }

        let node = self.node();
        let len = Self::required_len(node);

        CanFrame::new(node.standard_id(), &payload[..len]).unwrap()
    }

    /// Inverse of [`Message::encode`]. Never reads past the frame's DLC;
    /// declared bytes beyond the schema's required length are ignored.
    pub fn decode(frame: &CanFrame) -> Result<Self, DecodeError> {
        let node = frame
            .node()
            .ok_or(DecodeError::UnknownId(frame.id().as_raw()))?;

        if frame.dlc() < Self::required_len(node) {
            return Err(DecodeError::Truncated(node, frame.dlc()));
        }

        let data = frame.data();

        Ok(match node {
            NodeId::Obd => Self::Obd(ObdReport {
                mode: data[0].try_into()?,
                rpm: u16::from_le_bytes([data[1], data[2]]),
            }),
            NodeId::EscA => Self::EscA(EscReport {
                mode: data[0].try_into()?,
                throttle: data[1],
            }),
            NodeId::EscB => Self::EscB(EscReport {
                mode: data[0].try_into()?,
                throttle: data[1],
            }),
            NodeId::Tsc => Self::Tsc(TscReport {
                mode: data[0].try_into()?,
                throttle: data[1],
                steering: data[2],
            }),
            NodeId::Vdc => Self::Vdc(VdcCommand {
                mode: data[0].try_into()?,
                direction: data[1].try_into()?,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use embedded_can::StandardId;

    use super::*;

    fn sample_messages() -> [Message; 5] {
        [
            Message::Obd(ObdReport {
                mode: CartMode::Manual,
                rpm: 1800,
            }),
            Message::EscA(EscReport {
                mode: CartMode::Auto,
                throttle: 128,
            }),
            Message::EscB(EscReport {
                mode: CartMode::Manual,
                throttle: 0,
            }),
            Message::Tsc(TscReport {
                mode: CartMode::Auto,
                throttle: 40,
                steering: 127,
            }),
            Message::Vdc(VdcCommand {
                mode: CartMode::Auto,
                direction: CartDirection::Forward,
            }),
        ]
    }

    #[test]
    fn vdc_auto_forward_encodes_to_the_known_frame() {
        let message = Message::Vdc(VdcCommand {
            mode: CartMode::Auto,
            direction: CartDirection::Forward,
        });

        let frame = message.encode();

        assert_eq!(frame.id().as_raw(), 12);
        assert_eq!(frame.dlc(), 2);
        assert_eq!(frame.payload(), &[1, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(Message::decode(&frame), Ok(message));
    }

    #[test]
    fn every_role_round_trips_through_a_frame() {
        for message in sample_messages() {
            assert_eq!(Message::decode(&message.encode()), Ok(message));
        }
    }

    #[test]
    fn dlc_is_the_schema_minimum() {
        for message in sample_messages() {
            let frame = message.encode();
            assert_eq!(frame.dlc(), Message::required_len(message.node()));
        }
    }

    #[test]
    fn foreign_identifiers_are_rejected() {
        let frame = CanFrame::new(StandardId::new(0x42).unwrap(), &[0, 0, 0]).unwrap();

        assert_eq!(Message::decode(&frame), Err(DecodeError::UnknownId(0x42)));
    }

    #[test]
    fn short_frames_are_rejected_as_truncated() {
        let frame = CanFrame::new(NodeId::Vdc.standard_id(), &[1]).unwrap();
        assert_eq!(
            Message::decode(&frame),
            Err(DecodeError::Truncated(NodeId::Vdc, 1))
        );

        let frame = CanFrame::new(NodeId::Obd.standard_id(), &[0, 8]).unwrap();
        assert_eq!(
            Message::decode(&frame),
            Err(DecodeError::Truncated(NodeId::Obd, 2))
        );
    }

    #[test]
    fn out_of_domain_payload_bytes_are_rejected() {
        let frame = CanFrame::new(NodeId::Vdc.standard_id(), &[0, 7]).unwrap();
        assert_eq!(
            Message::decode(&frame),
            Err(DecodeError::FieldOutOfRange(7))
        );

        let frame = CanFrame::new(NodeId::EscA.standard_id(), &[9, 0]).unwrap();
        assert_eq!(
            Message::decode(&frame),
            Err(DecodeError::FieldOutOfRange(9))
        );
    }

    #[test]
    fn bytes_past_the_required_length_are_ignored() {
        let frame = CanFrame::new(NodeId::EscA.standard_id(), &[1, 55, 0xEE, 0xEE]).unwrap();

        assert_eq!(
            Message::decode(&frame),
            Ok(Message::EscA(EscReport {
                mode: CartMode::Auto,
                throttle: 55,
            }))
        );
    }
}
