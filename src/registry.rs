use embedded_can::StandardId;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Logical vehicle subsystems sharing the bus. The integer value of each
/// variant is the 11-bit CAN identifier the node transmits with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = UnknownNodeError, constructor = UnknownNodeError))]
#[repr(u8)]
pub enum NodeId {
    /// OBD gateway forwarding bus traffic to the host
    Obd = 8,
    /// Left electronic speed controller
    EscA = 9,
    /// Right electronic speed controller
    EscB = 10,
    /// Throttle/steering controller
    Tsc = 11,
    /// Vehicle-dynamics controller
    Vdc = 12,
}

/// Arbitration rank of a node. Lower values win the bus, matching the
/// identifier ordering of [`NodeId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = UnknownNodeError, constructor = UnknownNodeError))]
#[repr(u8)]
pub enum Priority {
    Obd = 1,
    EscA = 2,
    EscB = 3,
    Tsc = 4,
    Vdc = 5,
}

/// A numeric value outside the registered node set. Hitting this means the
/// firmware is wired to an identifier the registry does not know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("Value ({0:?}) does not belong to any registered node")]
pub struct UnknownNodeError(pub u8);

impl NodeId {
    /// Arbitration priority of the node.
    pub const fn priority(self) -> Priority {
        match self {
            Self::Obd => Priority::Obd,
            Self::EscA => Priority::EscA,
            Self::EscB => Priority::EscB,
            Self::Tsc => Priority::Tsc,
            Self::Vdc => Priority::Vdc,
        }
    }

    /// Role name carried on the JSON wire.
    pub const fn role(self) -> &'static str {
        match self {
            Self::Obd => "obd",
            Self::EscA => "esc_a",
            Self::EscB => "esc_b",
            Self::Tsc => "tsc",
            Self::Vdc => "vdc",
        }
    }

    /// Inverse of [`NodeId::role`] over raw line bytes.
    pub fn from_role(role: &[u8]) -> Option<Self> {
        Some(match role {
            b"obd" => Self::Obd,
            b"esc_a" => Self::EscA,
            b"esc_b" => Self::EscB,
            b"tsc" => Self::Tsc,
            b"vdc" => Self::Vdc,
            _ => return None,
        })
    }

    /// The node's bus identifier as a standard 11-bit CAN ID.
    pub fn standard_id(self) -> StandardId {
        StandardId::new(self as u16).unwrap()
    }
}

impl Priority {
    /// The node that transmits at this priority.
    pub const fn node(self) -> NodeId {
        match self {
            Self::Obd => NodeId::Obd,
            Self::EscA => NodeId::EscA,
            Self::EscB => NodeId::EscB,
            Self::Tsc => NodeId::Tsc,
            Self::Vdc => NodeId::Vdc,
        }
    }
}
