use std::time::Instant;

/// Debounce state owned by the scale reader.
///
/// `repeat_count` climbs while consecutive samples stay within `max_dis` of
/// `previous_weight` and drops to zero when a sample breaks out of that band.
/// `last_reported_weight` is the weight a quotation was last shown for, so an
/// unchanged reading does not re-trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StabilityState {
    pub previous_weight: i64,
    pub repeat_count: u32,
    pub last_reported_weight: i64,
}

/// One quotation as it appears in the catalog file.
///
/// `range` is `None` when the header line did not parse as an ascending
/// integer range; the record still occupies its position in the file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRecord {
    pub range: Option<(i64, i64)>,
    pub raw_range: String,
    pub body: String,
    pub line: usize,
}

impl QuoteRecord {
    pub fn contains(&self, weight: i64) -> bool {
        match self.range {
            Some((low, high)) => weight >= low && weight <= high,
            None => false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.range.is_some() && !self.body.is_empty()
    }
}

/// Where the session loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ShowingQuotation { since: Instant },
}
