/// AVR I/O port letter of a pin assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    B,
    D,
    E,
}

/// One pin: port letter plus bit index within the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin {
    pub port: Port,
    pub bit: u8,
}

impl Pin {
    pub const fn new(port: Port, bit: u8) -> Self {
        Self { port, bit }
    }
}

/// Static wiring and link speed for one board variant. Plain data handed to
/// the driver layer at startup; nothing in the core reads it conditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardProfile {
    /// Host serial link speed.
    pub baud: u32,
    pub spi_mosi: Pin,
    pub spi_miso: Pin,
    pub spi_sck: Pin,
    /// MCP2515 chip select.
    pub mcp2515_cs: Pin,
    /// MCP2515 interrupt line.
    pub mcp2515_int: Pin,
}

/// Mega2560 gateway build (OBD sketch): 38400 baud host link.
pub const MEGA2560: BoardProfile = BoardProfile {
    baud: 38400,
    spi_mosi: Pin::new(Port::B, 2),
    spi_miso: Pin::new(Port::B, 3),
    spi_sck: Pin::new(Port::B, 1),
    mcp2515_cs: Pin::new(Port::B, 0),
    mcp2515_int: Pin::new(Port::D, 2),
};

/// ATmega328 controller build (ESC/TSC/VDC sketches): 9600 baud host link.
pub const ATMEGA328: BoardProfile = BoardProfile {
    baud: 9600,
    spi_mosi: Pin::new(Port::B, 3),
    spi_miso: Pin::new(Port::B, 4),
    spi_sck: Pin::new(Port::B, 5),
    mcp2515_cs: Pin::new(Port::B, 2),
    mcp2515_int: Pin::new(Port::E, 4),
};
