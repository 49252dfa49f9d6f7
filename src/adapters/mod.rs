pub mod clock;
pub mod display;
pub mod screen;
pub mod serial;

pub use clock::SystemClock;
pub use display::{GreedyFormatter, PipeSink, DEFAULT_RENDERER};
pub use screen::screen_on;
pub use serial::{SerialTransport, DEFAULT_PORT};
