use crate::utils::error::Result;
use std::time::{Duration, Instant};

/// Line-oriented sample source (the scale's serial link).
///
/// `request_line` asks the hardware for one sample and returns the response
/// line, or `None` when the request timed out with no reply (scale powered
/// off). Hard transport failures are errors.
pub trait SampleTransport {
    fn request_line(&mut self) -> Result<Option<String>>;
}

/// Sink the rendered text frames go to.
///
/// A frame is a block of text terminated by a form feed. Implementations
/// must flush on every frame; the consumer may be a slow external renderer
/// polling for input.
pub trait DisplaySink {
    fn write_frame(&mut self, frame: &str) -> Result<()>;
}

/// Opaque line-width formatter used to reflow quotation text.
pub trait TextFormatter {
    fn reflow(&self, text: &str, width: usize) -> String;
}

/// Time source and sleeper, injectable so tests can simulate time.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}
