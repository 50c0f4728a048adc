use std::fmt;

use log::info;

pub const TCA9555_ADDR: u8 = 0x20;
pub const ES8311_ADDR: u8 = 0x18;
pub const ES7210_ADDR: u8 = 0x40;

/// Chips the Waveshare ESP32-S3-AUDIO board is expected to carry on its I2C bus.
pub const EXPECTED_PERIPHERALS: [(u8, &str); 3] = [
    (TCA9555_ADDR, "TCA9555 IO expander"),
    (ES8311_ADDR, "ES8311 speaker codec"),
    (ES7210_ADDR, "ES7210 mic ADC"),
];

/// Something that can tell whether a 7-bit address acknowledges.
pub trait BusProbe {
    fn responds(&mut self, addr: u8) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub addr: u8,
    pub name: &'static str,
    pub present: bool,
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  0x{:02X} ({}): {}",
            self.addr,
            self.name,
            if self.present { "ok" } else { "missing" }
        )
    }
}

/// Probe every expected chip once and log the outcome. Never fails.
pub fn probe_peripherals<P: BusProbe>(bus: &mut P) -> Vec<ProbeResult> {
    info!("I2C probe (expected on Waveshare ESP32-S3-AUDIO):");
    EXPECTED_PERIPHERALS
        .iter()
        .map(|&(addr, name)| {
            let result = ProbeResult {
                addr,
                name,
                present: bus.responds(addr),
            };
            info!("{}", result);
            result
        })
        .collect()
}
