//! INA219 current/power monitor over I2C.
//!
//! Both supplies share one bus; each sensor is addressed by the address it
//! was configured with. Readings are returned in register units and scaled
//! by the sampling engine.

use embedded_hal::i2c::I2c;
use supply_core::hal::{BusRange, CurrentSensor, SUPPLY_COUNT, SensorConfig, SupplyId};

const REG_CONFIG: u8 = 0x00;
const REG_SHUNT_VOLTAGE: u8 = 0x01;
const REG_BUS_VOLTAGE: u8 = 0x02;

/// Power-on default: PGA /8, 12-bit shunt and bus conversions, continuous.
const CONFIG_BASE: u16 = 0x199F;
/// Bus voltage range select (set = 32 V).
const CONFIG_BRNG: u16 = 1 << 13;

/// Bus voltage LSB in millivolts.
const BUS_LSB_MV: i16 = 4;

pub struct Ina219<I2C> {
    i2c: I2C,
    addresses: [u8; SUPPLY_COUNT],
}

impl<I2C: I2c> Ina219<I2C> {
    /// Wraps the bus. Addresses are replaced as each sensor is configured.
    pub fn new(i2c: I2C, addresses: [u8; SUPPLY_COUNT]) -> Self {
        Self { i2c, addresses }
    }

    pub fn address(&self, supply: SupplyId) -> u8 {
        self.addresses[supply.as_index()]
    }

    fn read_register(&mut self, supply: SupplyId, register: u8) -> Result<u16, I2C::Error> {
        let mut buffer = [0u8; 2];
        self.i2c
            .write_read(self.address(supply), &[register], &mut buffer)?;
        Ok(u16::from_be_bytes(buffer))
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

/// Configuration register value for a bus range.
pub const fn config_word(range: BusRange) -> u16 {
    match range {
        BusRange::Range16V => CONFIG_BASE,
        BusRange::Range32V => CONFIG_BASE | CONFIG_BRNG,
    }
}

impl<I2C: I2c> CurrentSensor for Ina219<I2C> {
    type Error = I2C::Error;

    fn configure(&mut self, supply: SupplyId, config: SensorConfig) -> Result<(), Self::Error> {
        self.addresses[supply.as_index()] = config.address;
        let [high, low] = config_word(config.range).to_be_bytes();
        self.i2c.write(config.address, &[REG_CONFIG, high, low])
    }

    fn bus_millivolts(&mut self, supply: SupplyId) -> Result<i16, Self::Error> {
        let raw = self.read_register(supply, REG_BUS_VOLTAGE)?;
        // Bits 15..3 hold the reading; 13 bits always fit an i16.
        let counts = i16::try_from(raw >> 3).unwrap_or(i16::MAX);
        Ok(counts.saturating_mul(BUS_LSB_MV))
    }

    fn shunt_millivolts(&mut self, supply: SupplyId) -> Result<i32, Self::Error> {
        let raw = self.read_register(supply, REG_SHUNT_VOLTAGE)?;
        Ok(i32::from(i16::from_be_bytes(raw.to_be_bytes())))
    }
}
