#[cfg(target_os = "espidf")]
mod board;
#[cfg(target_os = "espidf")]
mod http_client;
#[cfg(target_os = "espidf")]
mod wifi;

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use esp_idf_svc::hal::peripherals::Peripherals;
    use openclaw_esp32s3::{
        config::Config,
        connectivity::{ConnectivityManager, SystemClock},
        identity::DeviceIdentity,
        probe::probe_peripherals,
        session::Session,
    };

    // It is necessary to call this function once. Otherwise some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("Starting OpenClaw gateway client");

    let config = Config::from_build_env()?;

    let peripherals = match Peripherals::take() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Failed to take peripherals: {}", e);
            return Err(anyhow::anyhow!("Failed to take peripherals: {}", e));
        }
    };

    let identity = DeviceIdentity::from_mac_bytes(board::read_efuse_mac()?);
    let button = board::BootButton::new(peripherals.pins.gpio0)?;
    let serial = board::spawn_console_reader()?;
    let mut i2c = board::I2cBus::new(
        peripherals.i2c0,
        peripherals.pins.gpio11,
        peripherals.pins.gpio10,
    )?;

    let station = wifi::initialize_wifi(peripherals.modem, &config.wifi)?;
    let clock = SystemClock::new();
    let network = ConnectivityManager::new(station, clock, &config.wifi.ssid);
    let transport = http_client::EspGatewayTransport::new(config.gateway.use_tls);

    let mut session = Session::new(&config, identity, transport, network, serial, button, clock);

    session.announce();
    probe_peripherals(&mut i2c);
    session.connect();
    session.announce_ready();

    session.run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("openclaw-esp32s3 runs on ESP-IDF only; build it with --target xtensa-esp32s3-espidf");
}
