use bgapi_frame::category::HARDWARE;
use bytes::Bytes;

use super::Payload;
use crate::driver::Driver;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpiConfig {
    pub polarity: u8,
    pub phase: u8,
    pub bit_order: u8,
    pub baud_e: u8,
    pub baud_m: u8,
}

impl Driver {
    pub fn hardware_io_port_config_irq(&self, port: u8, enable_bits: u8, falling_edge: bool) -> Result<Bytes> {
        let payload = Payload::new()
            .u8(port)
            .u8(enable_bits)
            .flag(falling_edge)
            .build();
        self.call(HARDWARE, 0, payload)
    }

    /// Arm soft timer `handle`; expiry is reported by `hardware_soft_timer`.
    /// `time` is in 32.768 kHz ticks, zero stops the timer.
    pub fn hardware_set_soft_timer(&self, time: u32, handle: u8, single_shot: bool) -> Result<Bytes> {
        let payload = Payload::new().u32(time).u8(handle).flag(single_shot).build();
        self.call(HARDWARE, 1, payload)
    }

    pub fn hardware_adc_read(&self, input: u8, decimation: u8, reference: u8) -> Result<Bytes> {
        let payload = Payload::new().u8(input).u8(decimation).u8(reference).build();
        self.call(HARDWARE, 2, payload)
    }

    pub fn hardware_io_port_config_direction(&self, port: u8, direction: u8) -> Result<Bytes> {
        self.call(HARDWARE, 3, Payload::new().u8(port).u8(direction).build())
    }

    pub fn hardware_io_port_config_function(&self, port: u8, function: u8) -> Result<Bytes> {
        self.call(HARDWARE, 4, Payload::new().u8(port).u8(function).build())
    }

    pub fn hardware_io_port_config_pull(&self, port: u8, tristate_mask: u8, pull_up: bool) -> Result<Bytes> {
        let payload = Payload::new().u8(port).u8(tristate_mask).flag(pull_up).build();
        self.call(HARDWARE, 5, payload)
    }

    pub fn hardware_io_port_write(&self, port: u8, mask: u8, data: u8) -> Result<Bytes> {
        self.call(HARDWARE, 6, Payload::new().u8(port).u8(mask).u8(data).build())
    }

    pub fn hardware_io_port_read(&self, port: u8, mask: u8) -> Result<Bytes> {
        self.call(HARDWARE, 7, Payload::new().u8(port).u8(mask).build())
    }

    pub fn hardware_spi_config(&self, channel: u8, config: &SpiConfig) -> Result<Bytes> {
        let payload = Payload::new()
            .u8(channel)
            .u8(config.polarity)
            .u8(config.phase)
            .u8(config.bit_order)
            .u8(config.baud_e)
            .u8(config.baud_m)
            .build();
        self.call(HARDWARE, 8, payload)
    }

    pub fn hardware_spi_transfer(&self, channel: u8, data: &[u8]) -> Result<Bytes> {
        let payload = Payload::new().u8(channel).prefixed("data", data)?.build();
        self.call(HARDWARE, 9, payload)
    }

    pub fn hardware_i2c_read(&self, address: u8, stop: bool, length: u8) -> Result<Bytes> {
        self.call(HARDWARE, 10, Payload::new().u8(address).flag(stop).u8(length).build())
    }

    pub fn hardware_i2c_write(&self, address: u8, stop: bool, data: &[u8]) -> Result<Bytes> {
        let payload = Payload::new()
            .u8(address)
            .flag(stop)
            .prefixed("data", data)?
            .build();
        self.call(HARDWARE, 11, payload)
    }

    pub fn hardware_set_txpower(&self, power: u8) -> Result<Bytes> {
        self.call(HARDWARE, 12, Payload::new().u8(power).build())
    }

    pub fn hardware_timer_comparator(&self, timer: u8, channel: u8, mode: u8, value: u16) -> Result<Bytes> {
        let payload = Payload::new()
            .u8(timer)
            .u8(channel)
            .u8(mode)
            .u16(value)
            .build();
        self.call(HARDWARE, 13, payload)
    }
}
