//! Enttec OpenDMX USB output.
//!
//! The OpenDMX is a bare FTDI USB-serial adapter wired to an RS-485
//! transceiver; unlike "pro" interfaces it has no firmware of its own, so the
//! host produces the DMX timing:
//!
//! 1. Hold the line in the break condition for at least 100 µs.
//! 2. Release it and write the null start code followed by all 512 channels
//!    at 250 000 baud, 8N2.
//! 3. Wait until the bytes have actually left the UART.  `flush()` only
//!    guarantees they reached the driver, so the wait is a fixed estimate of
//!    the packet's time on the wire.
//!
//! RTS is driven low at open time: that enables the adapter's RS-485 driver
//! so the interface transmits.

use std::io::Write;
use std::thread;
use std::time::Duration;

use dmx_core::protocol::timing::{DMX_BAUD, LINE_PACKET_LEN, NULL_START_CODE};
use dmx_core::DmxFrame;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::info;

use crate::application::relay::{DmxOutput, OutputError};
use crate::domain::config::SerialConfig;

impl From<serialport::Error> for OutputError {
    fn from(e: serialport::Error) -> Self {
        OutputError::Device(e.to_string())
    }
}

/// A DMX output driving an OpenDMX-style interface through a serial port.
pub struct OpenDmxOutput {
    port: Box<dyn SerialPort>,
    device: String,
    break_time: Duration,
    drain_time: Duration,
    packet: [u8; LINE_PACKET_LEN],
}

impl OpenDmxOutput {
    /// Opens and configures the serial device named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Device`] if the port cannot be opened or RTS
    /// cannot be set.
    pub fn open(config: &SerialConfig) -> Result<Self, OutputError> {
        let mut port = serialport::new(config.device.as_str(), DMX_BAUD)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::Two)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_secs(1))
            .open()?;
        port.write_request_to_send(false)?;

        info!(
            "opened DMX interface {} (break {:?}, drain {:?})",
            config.device,
            config.break_time(),
            config.drain_time()
        );

        let mut packet = [0u8; LINE_PACKET_LEN];
        packet[0] = NULL_START_CODE;
        Ok(Self {
            port,
            device: config.device.clone(),
            break_time: config.break_time(),
            drain_time: config.drain_time(),
            packet,
        })
    }
}

impl DmxOutput for OpenDmxOutput {
    fn transmit(&mut self, frame: &DmxFrame) -> Result<(), OutputError> {
        self.packet[1..].copy_from_slice(frame.as_bytes());

        self.port.set_break()?;
        thread::sleep(self.break_time);
        self.port.clear_break()?;

        self.port.write_all(&self.packet)?;
        self.port.flush()?;
        thread::sleep(self.drain_time);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("OpenDMX on {}", self.device)
    }
}
