use crate::{
    bridge::{to_json, LineAccumulator, OutputBuffer},
    frame::CanFrame,
    message::Message,
    queue::{ArbitrationQueue, QueueError},
};

/// Access to the CAN controller (an MCP2515 behind SPI on this board family,
/// but any transceiver with a polled mailbox fits).
pub trait BusDriver {
    type Error: core::fmt::Debug;

    /// Puts one frame on the wire.
    fn send_frame(&mut self, frame: &CanFrame) -> Result<(), Self::Error>;

    /// Pops the next received frame, if the controller has one pending.
    fn try_receive_frame(&mut self) -> Result<Option<CanFrame>, Self::Error>;
}

/// Byte-oriented host serial link (UART).
pub trait SerialDriver {
    type Error: core::fmt::Debug;

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Pops the next received byte, if one is buffered.
    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error>;
}

/// Driver-level faults, the only errors that escape [`Gateway::poll`].
/// Everything per-message is absorbed into [`GatewayStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GatewayError<B: core::fmt::Debug, S: core::fmt::Debug> {
    #[error("CAN bus driver fault: {0:?}")]
    Bus(#[cfg_attr(feature = "defmt", defmt(Debug2Format))] B),
    #[error("Serial driver fault: {0:?}")]
    Serial(#[cfg_attr(feature = "defmt", defmt(Debug2Format))] S),
}

/// Diagnostic counters. Every isolated per-message failure lands in one of
/// these so dropped traffic stays visible in the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GatewayStats {
    pub frames_in: u32,
    pub frames_out: u32,
    pub lines_in: u32,
    pub lines_out: u32,
    pub decode_errors: u32,
    pub parse_errors: u32,
    pub dropped_messages: u32,
}

/// Ties the codec, the arbitration queue, and the serial bridge to a pair of
/// drivers. Single execution context, no internal locking: the firmware's
/// main loop is expected to be the sole caller.
pub struct Gateway<B: BusDriver, S: SerialDriver> {
    bus: B,
    serial: S,
    tx_queue: ArbitrationQueue,
    input: LineAccumulator,
    output: OutputBuffer,
    stats: GatewayStats,
}

impl<B: BusDriver, S: SerialDriver> Gateway<B, S> {
    pub fn new(bus: B, serial: S) -> Self {
        Self {
            bus,
            serial,
            tx_queue: ArbitrationQueue::new(),
            input: LineAccumulator::new(),
            output: OutputBuffer::new(),
            stats: GatewayStats::default(),
        }
    }

    /// Queues an application message for transmission. Non-blocking; a full
    /// queue pushes back on the caller instead of stalling the loop.
    pub fn send(&mut self, message: &Message) -> Result<(), QueueError> {
        self.tx_queue.enqueue(message.encode())
    }

    pub fn stats(&self) -> &GatewayStats {
        &self.stats
    }

    /// Frames waiting for the bus.
    pub fn pending_frames(&self) -> usize {
        self.tx_queue.len()
    }

    pub fn bus(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn serial(&mut self) -> &mut S {
        &mut self.serial
    }

    /// Services all four directions once: bus receive, serial receive, then
    /// one transmit slot. Call from the main loop whenever either driver
    /// signals activity, or at the loop's natural cadence.
    pub fn poll(&mut self) -> Result<(), GatewayError<B::Error, S::Error>> {
        self.service_bus_rx()?;
        self.service_serial_rx()?;
        self.service_bus_tx()?;

        Ok(())
    }

    /// Bus frames become JSON lines on the host link. Undecodable traffic is
    /// dropped per frame, never per session.
    fn service_bus_rx(&mut self) -> Result<(), GatewayError<B::Error, S::Error>> {
        while let Some(frame) = self.bus.try_receive_frame().map_err(GatewayError::Bus)? {
            self.stats.frames_in += 1;

            match Message::decode(&frame) {
                Ok(message) => {
                    let line = to_json(&message);
                    self.output
                        .write_line(&mut self.serial, line.as_bytes())
                        .map_err(GatewayError::Serial)?;
                    self.stats.lines_out += 1;
                }
                Err(_error) => {
                    self.stats.decode_errors += 1;
                    #[cfg(feature = "defmt")]
                    defmt::warn!("dropping undecodable frame: {}", _error);
                }
            }
        }

        Ok(())
    }

    /// Host lines become queued frames. Bad lines and backpressure drops are
    /// counted and skipped.
    fn service_serial_rx(&mut self) -> Result<(), GatewayError<B::Error, S::Error>> {
        while let Some(byte) = self.serial.read_byte().map_err(GatewayError::Serial)? {
            match self.input.push(byte) {
                Ok(Some(message)) => {
                    self.stats.lines_in += 1;

                    if let Err(_error) = self.tx_queue.enqueue(message.encode()) {
                        self.stats.dropped_messages += 1;
                        #[cfg(feature = "defmt")]
                        defmt::warn!("dropping host message: {}", _error);
                    }
                }
                Ok(None) => {}
                Err(_error) => {
                    self.stats.parse_errors += 1;
                    #[cfg(feature = "defmt")]
                    defmt::warn!("dropping host line: {}", _error);
                }
            }
        }

        Ok(())
    }

    /// At most one frame per poll, pacing transmissions to the cadence the
    /// caller drives the loop at.
    fn service_bus_tx(&mut self) -> Result<(), GatewayError<B::Error, S::Error>> {
        if let Some(frame) = self.tx_queue.dequeue_next() {
            self.bus.send_frame(&frame).map_err(GatewayError::Bus)?;
            self.stats.frames_out += 1;
        }

        Ok(())
    }
}
