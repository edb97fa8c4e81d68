// Serial bridge to the motor controller board
//
// The board fronts the vendor's CAN device behind a simple register
// protocol: [0xFF, 0xFF, ID, Length, Instruction, Params..., Checksum].
// Configuration and telemetry registers carry little-endian f32 payloads.

use serialport::{self, SerialPort};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;

use super::driver::{MotorError, Result};

/// Default serial configuration for the bridge
pub const DEFAULT_BAUDRATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Packet header bytes
const HEADER: [u8; 2] = [0xFF, 0xFF];

/// Instruction set
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Instruction {
    Ping = 0x01,
    Read = 0x02,
    Write = 0x03,
}

/// Register map exposed by the bridge firmware
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Register {
    // Configuration (write)
    FactoryReset = 1, // any write wipes stored config
    CurrentLimit = 2, // f32, amps
    RampRate = 3,     // f32, seconds to full output
    GainP = 4,        // f32
    GainI = 5,        // f32
    GainD = 6,        // f32
    ControlMode = 7,  // 1 byte: 0=duty cycle, 1=velocity, 2=position

    // Actuation (write)
    Output = 16,    // f32, open-loop fraction
    Reference = 17, // f32, closed-loop setpoint

    // Telemetry (read-only)
    AppliedOutput = 32, // f32
    Position = 33,      // f32, rotations
    Velocity = 34,      // f32, rpm
}

/// Motor bridge bus - handles serial communication with the board
pub struct MotorBus {
    port: Box<dyn SerialPort>,
}

impl MotorBus {
    /// Open a new connection to the bridge
    pub fn open(port_name: &str) -> Result<Self> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    /// Open with custom baudrate
    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self { port })
    }

    /// Calculate checksum for a packet (excluding header)
    fn checksum(data: &[u8]) -> u8 {
        let sum: u16 = data.iter().map(|&b| b as u16).sum();
        (!sum & 0xFF) as u8
    }

    /// Build a packet with header and checksum
    fn build_packet(id: u8, instruction: Instruction, params: &[u8]) -> Vec<u8> {
        let length = (params.len() + 2) as u8; // params + instruction + checksum
        let mut packet = Vec::with_capacity(6 + params.len());

        packet.extend_from_slice(&HEADER);
        packet.push(id);
        packet.push(length);
        packet.push(instruction as u8);
        packet.extend_from_slice(params);

        // Checksum over id, length, instruction, params
        let checksum_data = &packet[2..]; // skip header
        packet.push(Self::checksum(checksum_data));

        packet
    }

    fn send_packet(&mut self, packet: &[u8]) -> Result<()> {
        self.port.write_all(packet)?;
        self.port.flush()?;
        Ok(())
    }

    /// Read a status packet, returning its parameter bytes
    fn read_response(&mut self, expected_id: u8) -> Result<Vec<u8>> {
        let mut header = [0u8; 2];
        self.port.read_exact(&mut header).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                MotorError::Timeout { id: expected_id }
            } else {
                MotorError::Io(e)
            }
        })?;

        if header != HEADER {
            return Err(MotorError::InvalidResponse {
                id: expected_id,
                reason: format!("Invalid header: {:02X?}", header),
            });
        }

        let mut id_length = [0u8; 2];
        self.port.read_exact(&mut id_length)?;
        let id = id_length[0];
        let length = id_length[1] as usize;

        if id != expected_id {
            return Err(MotorError::InvalidResponse {
                id: expected_id,
                reason: format!("ID mismatch: expected {}, got {}", expected_id, id),
            });
        }

        // Remaining bytes: status + params + checksum
        let mut remaining = vec![0u8; length];
        self.port.read_exact(&mut remaining)?;

        let mut checksum_data = vec![id, length as u8];
        checksum_data.extend_from_slice(&remaining[..remaining.len() - 1]);
        if Self::checksum(&checksum_data) != remaining[remaining.len() - 1] {
            return Err(MotorError::ChecksumMismatch { id });
        }

        let status = remaining[0];
        if status != 0 {
            return Err(MotorError::DeviceError { id, status });
        }

        Ok(remaining[1..remaining.len() - 1].to_vec())
    }

    /// Ping a device to check if it's connected
    pub fn ping(&mut self, id: u8) -> Result<bool> {
        let packet = Self::build_packet(id, Instruction::Ping, &[]);
        self.send_packet(&packet)?;

        match self.read_response(id) {
            Ok(_) => Ok(true),
            Err(MotorError::Timeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Write a single byte to a register
    pub fn write_u8(&mut self, id: u8, register: Register, value: u8) -> Result<()> {
        let params = [register as u8, value];
        let packet = Self::build_packet(id, Instruction::Write, &params);
        debug!("Write u8 to device {}: reg={:?}, value={}", id, register, value);
        self.send_packet(&packet)?;

        let _ = self.read_response(id)?;
        Ok(())
    }

    /// Write a little-endian f32 to a register
    pub fn write_f32(&mut self, id: u8, register: Register, value: f32) -> Result<()> {
        let bytes = value.to_le_bytes();
        let params = [register as u8, bytes[0], bytes[1], bytes[2], bytes[3]];
        let packet = Self::build_packet(id, Instruction::Write, &params);
        debug!("Write f32 to device {}: reg={:?}, value={}", id, register, value);
        self.send_packet(&packet)?;

        let _ = self.read_response(id)?;
        Ok(())
    }

    /// Read a little-endian f32 from a register
    pub fn read_f32(&mut self, id: u8, register: Register) -> Result<f32> {
        let params = [register as u8, 4]; // address, length
        let packet = Self::build_packet(id, Instruction::Read, &params);
        self.send_packet(&packet)?;

        let response = self.read_response(id)?;
        if response.len() < 4 {
            return Err(MotorError::InvalidResponse {
                id,
                reason: format!("Expected 4 bytes, got {}", response.len()),
            });
        }
        Ok(f32::from_le_bytes([
            response[0],
            response[1],
            response[2],
            response[3],
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum() {
        // ID=1, Length=4, Instruction=WRITE, Addr=30, Data=0, 2
        let data = [1u8, 4, 0x03, 30, 0, 2];
        let checksum = MotorBus::checksum(&data);
        // ~(1+4+3+30+0+2) = ~40 = 215
        assert_eq!(checksum, 215);
    }

    #[test]
    fn test_build_ping_packet() {
        let packet = MotorBus::build_packet(10, Instruction::Ping, &[]);
        // Header (2) + ID (1) + Length (1) + Instruction (1) + Checksum (1)
        assert_eq!(packet.len(), 6);
        assert_eq!(packet[0], 0xFF);
        assert_eq!(packet[1], 0xFF);
        assert_eq!(packet[2], 10); // ID
        assert_eq!(packet[3], 2); // Length (instruction + checksum)
        assert_eq!(packet[4], 0x01); // PING instruction
    }

    #[test]
    fn test_build_f32_write_packet() {
        let bytes = 0.1f32.to_le_bytes();
        let params = [Register::RampRate as u8, bytes[0], bytes[1], bytes[2], bytes[3]];
        let packet = MotorBus::build_packet(10, Instruction::Write, &params);

        assert_eq!(packet.len(), 11);
        assert_eq!(packet[3], 7); // 5 params + instruction + checksum
        assert_eq!(packet[4], 0x03); // WRITE instruction
        assert_eq!(packet[5], Register::RampRate as u8);
        assert_eq!(&packet[6..10], &bytes);

        // Checksum covers everything after the header
        let expected = MotorBus::checksum(&packet[2..10]);
        assert_eq!(packet[10], expected);
    }
}
