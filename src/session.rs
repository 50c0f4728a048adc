use log::info;

use crate::chat::{ChatClient, ChatResult, HttpTransport};
use crate::config::Config;
use crate::connectivity::{Clock, NetworkLink};
use crate::identity::{DeviceIdentity, SessionKey};
use crate::input::{ButtonPin, InputMultiplexer, PromptEvent, SerialPort};

/// Idle delay between two polls of the inputs.
pub const TICK_IDLE_MS: u32 = 10;

/// A prompt and what the gateway made of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub event: PromptEvent,
    pub result: ChatResult,
}

/// Orchestrator context for the whole firmware.
///
/// Ownership of the process-wide state:
/// - `identity` and the session key inside `chat` are written once in [`Session::new`].
/// - `network` is the only writer of the connectivity state.
/// - `input` owns the pending serial line and the button latch.
///
/// Everything runs on the caller's thread; a tick does not return until every
/// exchange it started has completed, so at most one request is ever in flight.
pub struct Session<T, N, S, B, C> {
    identity: DeviceIdentity,
    chat: ChatClient<T>,
    network: N,
    input: InputMultiplexer<S, B>,
    clock: C,
}

impl<T, N, S, B, C> Session<T, N, S, B, C>
where
    T: HttpTransport,
    N: NetworkLink,
    S: SerialPort,
    B: ButtonPin,
    C: Clock,
{
    pub fn new(
        config: &Config,
        identity: DeviceIdentity,
        transport: T,
        network: N,
        serial: S,
        button: B,
        clock: C,
    ) -> Self {
        let session_key = SessionKey::compose(&config.gateway.agent_id, &identity);
        Session {
            identity,
            chat: ChatClient::new(transport, config.gateway.clone(), session_key),
            network,
            input: InputMultiplexer::new(serial, button, &config.button_prompt),
            clock,
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn session_key(&self) -> &SessionKey {
        self.chat.session_key()
    }

    pub fn announce(&self) {
        info!("OpenClaw ESP32 interface starting...");
        info!("Device ID: {}", self.identity);
        info!("Session key: {}", self.session_key());
        info!("Gateway: {}", self.chat.url());
    }

    /// Block until the network is up.
    pub fn connect(&mut self) {
        self.network.ensure_connected();
    }

    pub fn announce_ready(&self) {
        info!("Ready.");
        info!("Type a prompt and press Enter.");
        info!("Press the BOOT button to send the configured button prompt.");
    }

    /// Poll the inputs once and run every prompt they produced, in arrival order.
    pub fn tick(&mut self) -> Vec<Exchange> {
        let Session {
            chat,
            network,
            input,
            clock,
            ..
        } = self;

        let mut exchanges = Vec::new();
        input.poll(&*clock, |event| {
            if let Some(result) = run_prompt(chat, network, &event.prompt) {
                exchanges.push(Exchange { event, result });
            }
        });
        exchanges
    }

    /// Run a single prompt outside of the input sources.
    #[cfg(test)]
    pub(crate) fn submit(&mut self, prompt: &str) -> Option<ChatResult> {
        run_prompt(&mut self.chat, &mut self.network, prompt)
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.tick();
            self.clock.sleep_ms(TICK_IDLE_MS);
        }
    }
}

fn run_prompt<T: HttpTransport, N: NetworkLink>(
    chat: &mut ChatClient<T>,
    network: &mut N,
    prompt: &str,
) -> Option<ChatResult> {
    if prompt.is_empty() {
        return None;
    }

    info!("You: {}", prompt);
    info!("OpenClaw: thinking...");
    let result = chat.ask(network, prompt);
    info!("OpenClaw: {}", result);
    Some(result)
}
