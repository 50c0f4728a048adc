use crate::connectivity::Clock;

/// Longest serial line kept; anything past it is dropped until the next newline.
pub const MAX_LINE_LEN: usize = 512;
/// Minimum spacing between two recognized button transitions.
pub const DEBOUNCE_MS: u32 = 60;

const SERIAL_CHUNK: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSource {
    Serial,
    Button,
}

/// One prompt submitted by the operator, consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptEvent {
    pub prompt: String,
    pub source: PromptSource,
}

/// Non-blocking byte source for the serial console.
pub trait SerialPort {
    /// Copy whatever is pending into `buf` and return the count; 0 when idle.
    fn read_available(&mut self, buf: &mut [u8]) -> usize;
}

/// Digital input for the prompt button.
pub trait ButtonPin {
    fn is_pressed(&mut self) -> bool;
}

/// Accumulates serial bytes into lines.
#[derive(Debug, Default)]
pub struct LineAssembler {
    pending: heapless::Vec<u8, MAX_LINE_LEN>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, byte: u8) -> Option<String> {
        match byte {
            b'\r' => None,
            b'\n' => {
                let line = String::from_utf8_lossy(&self.pending).into_owned();
                self.pending.clear();
                Some(line)
            }
            other => {
                if self.pending.push(other).is_err() {
                    // full: dropped until the terminator
                }
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Latch plus last-edge timestamp for an active-low button.
#[derive(Debug, Default)]
pub struct ButtonDebouncer {
    latched: bool,
    last_edge_ms: Option<u32>,
}

impl ButtonDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current level; returns `true` on a recognized press.
    pub fn update(&mut self, pressed: bool, now_ms: u32) -> bool {
        let settled = self
            .last_edge_ms
            .map_or(true, |last| now_ms.wrapping_sub(last) >= DEBOUNCE_MS);
        if !settled || pressed == self.latched {
            return false;
        }
        self.latched = pressed;
        self.last_edge_ms = Some(now_ms);
        pressed
    }

    #[cfg(test)]
    pub(crate) fn is_latched(&self) -> bool {
        self.latched
    }
}

/// Merges the serial console and the button into one stream of prompts.
pub struct InputMultiplexer<S, B> {
    serial: S,
    button: B,
    lines: LineAssembler,
    debouncer: ButtonDebouncer,
    button_prompt: String,
}

impl<S: SerialPort, B: ButtonPin> InputMultiplexer<S, B> {
    pub fn new(serial: S, button: B, button_prompt: &str) -> Self {
        InputMultiplexer {
            serial,
            button,
            lines: LineAssembler::new(),
            debouncer: ButtonDebouncer::new(),
            button_prompt: button_prompt.to_string(),
        }
    }

    pub fn pending_len(&self) -> usize {
        self.lines.len()
    }

    /// Poll both sources once. Each event is handed to `on_event` as soon as it is
    /// seen, and the next byte or pin level is only read after it returns.
    pub fn poll<C, F>(&mut self, clock: &C, mut on_event: F)
    where
        C: Clock,
        F: FnMut(PromptEvent),
    {
        self.poll_serial(&mut on_event);
        self.poll_button(clock.now_ms(), &mut on_event);
    }

    fn poll_serial<F: FnMut(PromptEvent)>(&mut self, on_event: &mut F) {
        let mut chunk = [0u8; SERIAL_CHUNK];
        loop {
            let n = self.serial.read_available(&mut chunk);
            if n == 0 {
                return;
            }
            for &byte in &chunk[..n] {
                if let Some(prompt) = self.lines.push(byte) {
                    on_event(PromptEvent {
                        prompt,
                        source: PromptSource::Serial,
                    });
                }
            }
        }
    }

    fn poll_button<F: FnMut(PromptEvent)>(&mut self, now_ms: u32, on_event: &mut F) {
        let pressed = self.button.is_pressed();
        if self.debouncer.update(pressed, now_ms) {
            on_event(PromptEvent {
                prompt: self.button_prompt.clone(),
                source: PromptSource::Button,
            });
        }
    }
}
