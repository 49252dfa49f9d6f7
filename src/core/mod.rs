pub mod catalog;
pub mod display;
pub mod scale;
pub mod session;

pub use crate::domain::model::{QuoteRecord, SessionState, StabilityState};
pub use crate::domain::ports::{Clock, DisplaySink, SampleTransport, TextFormatter};
pub use crate::utils::error::Result;
