use std::net::Ipv4Addr;

use anyhow;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi},
};
use heapless;

use openclaw_esp32s3::config::WifiConfig;
use openclaw_esp32s3::connectivity::StationLink;

/// Station-mode radio driven by the connectivity manager.
pub struct EspStationLink {
    wifi: Box<EspWifi<'static>>,
}

/// Bring up the Wi-Fi driver in station mode. Association is left to the caller.
pub fn initialize_wifi(modem: Modem, config: &WifiConfig) -> anyhow::Result<EspStationLink> {
    log::info!("Initializing WiFi station for network: {}", config.ssid);

    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let mut wifi = EspWifi::new(modem, sys_loop, Some(nvs))?;

    let mut auth_method = AuthMethod::WPA2Personal;
    if config.password.is_empty() {
        auth_method = AuthMethod::None;
        log::info!("Using open WiFi network (no password)");
    }

    let mut client_config = ClientConfiguration {
        ssid: heapless::String::new(),
        password: heapless::String::new(),
        auth_method,
        ..Default::default()
    };

    client_config
        .ssid
        .push_str(&config.ssid)
        .map_err(|_| anyhow::anyhow!("SSID too long"))?;
    client_config
        .password
        .push_str(&config.password)
        .map_err(|_| anyhow::anyhow!("Password too long"))?;

    wifi.set_configuration(&Configuration::Client(client_config))?;

    wifi.start()?;
    log::info!("WiFi started");

    Ok(EspStationLink {
        wifi: Box::new(wifi),
    })
}

impl StationLink for EspStationLink {
    fn is_connected(&mut self) -> bool {
        // Associated is not enough, DHCP has to have handed out an address too.
        matches!(self.wifi.is_connected(), Ok(true)) && self.ip_address().is_some()
    }

    fn begin(&mut self) -> anyhow::Result<()> {
        if !self.wifi.is_started()? {
            self.wifi.start()?;
        }
        self.wifi.connect()?;
        Ok(())
    }

    fn disconnect(&mut self) -> anyhow::Result<()> {
        if let Err(e) = self.wifi.disconnect() {
            log::debug!("WiFi disconnect: {}", e);
        }
        // Restarting the driver drops whatever association state it still holds.
        self.wifi.stop()?;
        Ok(())
    }

    fn ip_address(&mut self) -> Option<Ipv4Addr> {
        match self.wifi.sta_netif().get_ip_info() {
            Ok(ip_info) if !ip_info.ip.is_unspecified() => Some(ip_info.ip),
            Ok(ip_info) => {
                log::debug!("Connected but waiting for DHCP (IP: {})...", ip_info.ip);
                None
            }
            Err(e) => {
                log::warn!("Failed to get IP info: {}", e);
                None
            }
        }
    }
}
