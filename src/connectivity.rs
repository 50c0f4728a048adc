use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use log::{info, warn};

/// Delay between two association status checks.
pub const POLL_INTERVAL_MS: u32 = 500;
/// Unsuccessful polls (about 40 s) before the association is torn down and restarted.
pub const POLLS_BEFORE_RETRY: u32 = 80;
/// Pause between the forced disconnect and the next association attempt.
pub const RETRY_SETTLE_MS: u32 = 500;

const PROGRESS_EVERY_POLLS: u32 = 10;

/// Monotonic millisecond clock with a blocking sleep.
pub trait Clock {
    fn now_ms(&self) -> u32;
    fn sleep_ms(&self, ms: u32);
}

/// Clock backed by `std::time`, which ESP-IDF maps onto the high resolution timer.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    boot: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock { boot: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        // Wraps after ~49 days; every consumer compares with wrapping_sub.
        self.boot.elapsed().as_millis() as u32
    }

    fn sleep_ms(&self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Station-mode radio as seen by the connectivity manager.
pub trait StationLink {
    fn is_connected(&mut self) -> bool;
    /// Start associating with the configured access point. Must not block until connected.
    fn begin(&mut self) -> anyhow::Result<()>;
    /// Drop the association and any transient state kept for it.
    fn disconnect(&mut self) -> anyhow::Result<()>;
    fn ip_address(&mut self) -> Option<Ipv4Addr>;
}

/// Anything that can guarantee a usable network before a request goes out.
pub trait NetworkLink {
    /// Blocks until the link is up. Never gives up.
    fn ensure_connected(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Associating { polls: u32 },
    WaitingRetry,
    Connected,
}

/// What the caller has to do after one [`ConnectivityManager::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Wait(u32),
    Done,
}

/// Owns the station link and the process-wide connected/disconnected state.
pub struct ConnectivityManager<L, C> {
    link: L,
    clock: C,
    ssid: String,
    state: LinkState,
}

impl<L: StationLink, C: Clock> ConnectivityManager<L, C> {
    pub fn new(link: L, clock: C, ssid: &str) -> Self {
        ConnectivityManager {
            link,
            clock,
            ssid: ssid.to_string(),
            state: LinkState::Idle,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn link(&self) -> &L {
        &self.link
    }

    #[cfg(test)]
    pub(crate) fn clock(&self) -> &C {
        &self.clock
    }

    /// Advance the association state machine by one transition.
    pub fn step(&mut self) -> Step {
        match self.state {
            LinkState::Connected => {
                if self.link.is_connected() {
                    return Step::Done;
                }
                warn!("Wi-Fi link lost");
                self.state = LinkState::Idle;
                Step::Wait(0)
            }
            LinkState::Idle => {
                if self.link.is_connected() {
                    self.on_connected();
                    return Step::Done;
                }
                info!("Connecting Wi-Fi SSID \"{}\"", self.ssid);
                self.start_association()
            }
            LinkState::Associating { polls } => {
                if self.link.is_connected() {
                    self.on_connected();
                    return Step::Done;
                }
                let polls = polls + 1;
                if polls >= POLLS_BEFORE_RETRY {
                    warn!("Wi-Fi connection failed; retrying...");
                    if let Err(e) = self.link.disconnect() {
                        warn!("Wi-Fi disconnect failed: {}", e);
                    }
                    self.state = LinkState::WaitingRetry;
                    return Step::Wait(RETRY_SETTLE_MS);
                }
                if polls % PROGRESS_EVERY_POLLS == 0 {
                    info!(
                        "Still waiting for Wi-Fi ({} ms)",
                        polls * POLL_INTERVAL_MS
                    );
                }
                self.state = LinkState::Associating { polls };
                Step::Wait(POLL_INTERVAL_MS)
            }
            LinkState::WaitingRetry => self.start_association(),
        }
    }

    fn start_association(&mut self) -> Step {
        if let Err(e) = self.link.begin() {
            warn!("Wi-Fi connect request failed: {}", e);
        }
        self.state = LinkState::Associating { polls: 0 };
        Step::Wait(POLL_INTERVAL_MS)
    }

    fn on_connected(&mut self) {
        self.state = LinkState::Connected;
        match self.link.ip_address() {
            Some(ip) => info!("Wi-Fi connected, IP={}", ip),
            None => info!("Wi-Fi connected, IP=unknown"),
        }
    }
}

impl<L: StationLink, C: Clock> NetworkLink for ConnectivityManager<L, C> {
    fn ensure_connected(&mut self) {
        if self.state == LinkState::Connected && self.link.is_connected() {
            return;
        }
        if self.state == LinkState::Connected {
            self.state = LinkState::Idle;
        }
        loop {
            match self.step() {
                Step::Done => return,
                Step::Wait(0) => {}
                Step::Wait(ms) => self.clock.sleep_ms(ms),
            }
        }
    }
}
