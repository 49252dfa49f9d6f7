use crate::config::SharedConfig;
use crate::domain::model::StabilityState;
use crate::domain::ports::SampleTransport;
use crate::utils::error::Result;

/// Number of comma-separated fields a sample line must have.
/// A reading looks like `US,GS,  -18384,kg`; only the weight field is used.
const MIN_SAMPLE_FIELDS: usize = 4;
const WEIGHT_FIELD: usize = 2;

/// Polls the scale and debounces the readings into stable-weight events.
///
/// Three-way debounce: a reading near zero means the platform is empty and
/// resets everything; a reading near the previous one bumps the repeat
/// count; anything else starts a new candidate weight. Thresholds come from
/// the shared configuration so they track the hardware's noise.
pub struct ScaleReader<T: SampleTransport> {
    transport: T,
    config: SharedConfig,
    state: StabilityState,
}

impl<T: SampleTransport> ScaleReader<T> {
    pub fn new(transport: T, config: SharedConfig) -> Self {
        Self {
            transport,
            config,
            state: StabilityState::default(),
        }
    }

    /// Request one sample and run it through the debounce.
    ///
    /// Returns the scaled weight, or `None` for a transient failure (no
    /// reply, malformed line). Transient failures are logged at debug level
    /// and the loop just polls again; hard transport errors propagate.
    pub fn read(&mut self) -> Result<Option<i64>> {
        let Some(line) = self.transport.request_line()? else {
            tracing::debug!("no reply, scale off?");
            return Ok(None);
        };
        let line = line.trim();
        if line.is_empty() {
            tracing::debug!("no reply, scale off?");
            return Ok(None);
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < MIN_SAMPLE_FIELDS {
            tracing::debug!("ignoring: {}", line);
            return Ok(None);
        }
        let raw: i64 = match fields[WEIGHT_FIELD].trim().parse() {
            Ok(weight) => weight,
            Err(_) => {
                tracing::debug!("weight field not a number: {}", line);
                return Ok(None);
            }
        };

        let weight = (raw as f64 * self.config.get("weight_scale") as f64 / 100.0) as i64;

        if self.is_same_weight(weight, 0) {
            // empty platform: back to the zero baseline
            self.reset();
            return Ok(Some(0));
        }
        if self.is_same_weight(weight, self.state.previous_weight) {
            self.state.repeat_count += 1;
            tracing::debug!("weight {}, count {}", weight, self.state.repeat_count);
        } else {
            tracing::debug!("new weight {}", weight);
            self.state.previous_weight = weight;
            self.state.repeat_count = 0;
        }
        Ok(Some(weight))
    }

    fn is_same_weight(&self, weight: i64, reference: i64) -> bool {
        (weight - reference).abs() <= self.config.get("max_dis")
    }

    /// Whether the current weight has been seen often enough in a row.
    pub fn is_stable(&self) -> bool {
        i64::from(self.state.repeat_count) >= self.config.get("min_rpt")
    }

    /// Whether `weight` is indistinguishable from the one last reported.
    pub fn is_last_reported(&self, weight: i64) -> bool {
        self.is_same_weight(weight, self.state.last_reported_weight)
    }

    /// Record that a quotation was shown for `weight`.
    pub fn mark_reported(&mut self, weight: i64) {
        self.state.last_reported_weight = weight;
    }

    pub fn reset(&mut self) {
        self.state = StabilityState::default();
    }

    pub fn state(&self) -> &StabilityState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::collections::VecDeque;

    struct ScriptedTransport {
        lines: VecDeque<Option<String>>,
    }

    impl ScriptedTransport {
        fn new<I: IntoIterator<Item = Option<&'static str>>>(lines: I) -> Self {
            Self {
                lines: lines
                    .into_iter()
                    .map(|line| line.map(str::to_string))
                    .collect(),
            }
        }
    }

    impl SampleTransport for ScriptedTransport {
        fn request_line(&mut self) -> Result<Option<String>> {
            Ok(self.lines.pop_front().flatten())
        }
    }

    fn reader_with_lines(lines: Vec<Option<&'static str>>) -> ScaleReader<ScriptedTransport> {
        let config = SharedConfig::new(Config::with_defaults());
        ScaleReader::new(ScriptedTransport::new(lines), config)
    }

    #[test]
    fn test_repeat_count_climbs_until_min_rpt() {
        // defaults: min_rpt = 3, max_dis = 30
        let mut scale = reader_with_lines(vec![
            Some("US,GS,82,kg"),
            Some("US,GS,85,kg"),
            Some("US,GS,80,kg"),
            Some("US,GS,84,kg"),
        ]);

        assert_eq!(scale.read().unwrap(), Some(82));
        assert_eq!(scale.state().repeat_count, 0);
        assert!(!scale.is_stable());

        assert_eq!(scale.read().unwrap(), Some(85));
        assert_eq!(scale.state().repeat_count, 1);

        assert_eq!(scale.read().unwrap(), Some(80));
        assert_eq!(scale.state().repeat_count, 2);
        assert!(!scale.is_stable());

        // third consecutive qualifying sample makes it stable
        assert_eq!(scale.read().unwrap(), Some(84));
        assert_eq!(scale.state().repeat_count, 3);
        assert!(scale.is_stable());
    }

    #[test]
    fn test_zero_sample_resets_state() {
        let mut scale = reader_with_lines(vec![
            Some("US,GS,82,kg"),
            Some("US,GS,85,kg"),
            Some("US,GS,80,kg"),
            Some("US,GS,0,kg"),
        ]);
        scale.mark_reported(82);

        for _ in 0..3 {
            scale.read().unwrap();
        }
        assert_eq!(scale.state().repeat_count, 2);

        assert_eq!(scale.read().unwrap(), Some(0));
        assert_eq!(*scale.state(), StabilityState::default());
        assert!(!scale.is_stable());
    }

    #[test]
    fn test_near_zero_counts_as_empty_platform() {
        // 25 is within max_dis of zero, regardless of prior history
        let mut scale = reader_with_lines(vec![Some("US,GS,120,kg"), Some("US,GS,25,kg")]);
        assert_eq!(scale.read().unwrap(), Some(120));
        assert_eq!(scale.read().unwrap(), Some(0));
        assert_eq!(scale.state().previous_weight, 0);
    }

    #[test]
    fn test_new_weight_resets_repeat_count() {
        let mut scale = reader_with_lines(vec![
            Some("US,GS,120,kg"),
            Some("US,GS,125,kg"),
            Some("US,GS,200,kg"),
        ]);
        scale.read().unwrap();
        scale.read().unwrap();
        assert_eq!(scale.state().repeat_count, 1);

        scale.read().unwrap();
        assert_eq!(scale.state().previous_weight, 200);
        assert_eq!(scale.state().repeat_count, 0);
    }

    #[test]
    fn test_transient_failures_yield_no_sample() {
        let mut scale = reader_with_lines(vec![
            None,                     // timeout
            Some(""),                 // empty line
            Some("US,GS"),            // too few fields
            Some("US,GS,heavy,kg"),   // weight not a number
        ]);
        for _ in 0..4 {
            assert_eq!(scale.read().unwrap(), None);
        }
        assert_eq!(*scale.state(), StabilityState::default());
    }

    #[test]
    fn test_weight_scale_is_applied() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[zitat]\nweight_scale = 50").unwrap();

        let config = SharedConfig::new(Config::from_path(file.path()));
        let mut scale =
            ScaleReader::new(ScriptedTransport::new(vec![Some("US,GS,200,kg")]), config);
        assert_eq!(scale.read().unwrap(), Some(100));
    }

    #[test]
    fn test_last_reported_uses_max_dis_band() {
        let mut scale = reader_with_lines(vec![]);
        scale.mark_reported(120);
        assert!(scale.is_last_reported(120));
        assert!(scale.is_last_reported(150));
        assert!(!scale.is_last_reported(151));
    }
}
