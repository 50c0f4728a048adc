use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow;
use esp_idf_svc::hal::{
    gpio::{Gpio0, Input, InputPin, OutputPin, PinDriver, Pull},
    i2c::{I2c, I2cConfig, I2cDriver},
    peripheral::Peripheral,
    units::Hertz,
};
use esp_idf_svc::sys::{self, esp};

use openclaw_esp32s3::input::{ButtonPin, SerialPort, MAX_LINE_LEN};
use openclaw_esp32s3::probe::BusProbe;

const I2C_FREQ_HZ: u32 = 100_000;
/// Bus timeout for one probe transaction, in RTOS ticks.
const I2C_PROBE_TIMEOUT_TICKS: u32 = 50;

/// Factory MAC burnt into eFuse, as six bytes.
pub fn read_efuse_mac() -> anyhow::Result<[u8; 6]> {
    let mut mac = [0u8; 6];
    esp!(unsafe { sys::esp_efuse_mac_get_default(mac.as_mut_ptr()) })?;
    Ok(mac)
}

/// BOOT button on GPIO0, idle high through the internal pull-up.
pub struct BootButton {
    pin: PinDriver<'static, Gpio0, Input>,
}

impl BootButton {
    pub fn new(gpio: Gpio0) -> anyhow::Result<Self> {
        let mut pin = PinDriver::input(gpio)?;
        pin.set_pull(Pull::Up)?;
        Ok(BootButton { pin })
    }
}

impl ButtonPin for BootButton {
    fn is_pressed(&mut self) -> bool {
        self.pin.is_low()
    }
}

/// Serial console input. A reader thread blocks on stdin and forwards bytes,
/// so the main loop can drain them without blocking.
pub struct ConsoleSerial {
    rx: Receiver<u8>,
}

pub fn spawn_console_reader() -> anyhow::Result<ConsoleSerial> {
    // Bounded: while an exchange is running the reader blocks instead of buffering.
    let (tx, rx) = mpsc::sync_channel(MAX_LINE_LEN);

    thread::Builder::new()
        .name("console".into())
        .stack_size(4096)
        .spawn(move || {
            let stdin = io::stdin();
            let mut reader = stdin.lock();
            let mut buf = [0u8; 1];
            loop {
                match reader.read(&mut buf) {
                    Ok(1) => {
                        if tx.send(buf[0]).is_err() {
                            log::warn!("Console reader stopped: receiver gone");
                            return;
                        }
                    }
                    Ok(_) => thread::sleep(Duration::from_millis(10)),
                    Err(_) => thread::sleep(Duration::from_millis(50)),
                }
            }
        })?;

    log::info!("Console reader thread started");
    Ok(ConsoleSerial { rx })
}

impl SerialPort for ConsoleSerial {
    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        while n < buf.len() {
            match self.rx.try_recv() {
                Ok(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        n
    }
}

/// Board I2C bus, used read-only for the startup probe.
pub struct I2cBus {
    driver: I2cDriver<'static>,
}

impl I2cBus {
    pub fn new<I: I2c>(
        i2c: impl Peripheral<P = I> + 'static,
        sda: impl Peripheral<P = impl InputPin + OutputPin> + 'static,
        scl: impl Peripheral<P = impl InputPin + OutputPin> + 'static,
    ) -> anyhow::Result<Self> {
        let config = I2cConfig::new().baudrate(Hertz(I2C_FREQ_HZ));
        let driver = I2cDriver::new(i2c, sda, scl, &config)?;
        Ok(I2cBus { driver })
    }
}

impl BusProbe for I2cBus {
    fn responds(&mut self, addr: u8) -> bool {
        // address-only transaction, no payload
        self.driver.write(addr, &[], I2C_PROBE_TIMEOUT_TICKS).is_ok()
    }
}
