use crate::config::SharedConfig;
use crate::domain::model::QuoteRecord;
use crate::utils::error::{Result, ZitatError};
use rand::Rng;
use std::path::PathBuf;
use std::time::SystemTime;

/// Quotation records parsed from the catalog file.
///
/// The file is a sequence of records: a `"<low>-<high>"` line, one or more
/// body lines, then a line holding exactly `.`. Blank lines between records
/// are skipped. The catalog reloads itself when the file's modification
/// time advances.
pub struct QuoteCatalog {
    path: PathBuf,
    config: SharedConfig,
    loaded_at: Option<SystemTime>,
    healthy: bool,
    records: Vec<QuoteRecord>,
    good_count: usize,
}

impl QuoteCatalog {
    pub fn new<P: Into<PathBuf>>(path: P, config: SharedConfig) -> Self {
        Self {
            path: path.into(),
            config,
            loaded_at: None,
            healthy: true,
            records: Vec::new(),
            good_count: 0,
        }
    }

    /// Re-parse the file if its modification time has advanced.
    ///
    /// Returns whether the load was clean (no bad ranges, no empty bodies).
    /// A record failing validation is logged with its line number and does
    /// not abort the pass; the freshly parsed sequence replaces the old one
    /// either way.
    pub fn reload(&mut self) -> Result<bool> {
        let mtime = std::fs::metadata(&self.path)?.modified()?;
        if let Some(loaded_at) = self.loaded_at {
            if mtime <= loaded_at {
                return Ok(self.healthy);
            }
        }
        tracing::info!("loading {}", self.path.display());
        self.loaded_at = Some(mtime);

        let content = std::fs::read_to_string(&self.path)?;
        let file_label = self.path.display().to_string();
        let (records, good_count, clean) = parse_catalog(&content, &file_label);
        tracing::info!("{}: total num: {}", file_label, good_count);

        self.records = records;
        self.good_count = good_count;
        self.healthy = clean;
        Ok(self.healthy)
    }

    /// Pick a quotation for `weight`.
    ///
    /// In range mode this is the first record (file order) whose inclusive
    /// range contains the weight. In random mode the weight is ignored and
    /// an index drawn over `[1, count-1]` is resolved by file position; the
    /// last record is never picked. That draw is kept as-is from the
    /// installation's first season.
    pub fn find(&mut self, weight: i64) -> Option<String> {
        if let Err(e) = self.reload() {
            // serve what is in memory; check mode reports this loudly
            tracing::error!("catalog refresh failed: {}", e);
        }
        if self.config.get("random") != 0 {
            return self.pick_random();
        }
        self.records
            .iter()
            .find(|record| record.contains(weight))
            .map(|record| record.body.clone())
    }

    fn pick_random(&self) -> Option<String> {
        if self.good_count < 2 {
            return self.records.first().map(|record| record.body.clone());
        }
        let stop = rand::thread_rng().gen_range(1..self.good_count);
        self.records.get(stop - 1).map(|record| record.body.clone())
    }

    pub fn records(&self) -> &[QuoteRecord] {
        &self.records
    }

    pub fn good_count(&self) -> usize {
        self.good_count
    }
}

fn parse_catalog(content: &str, file_label: &str) -> (Vec<QuoteRecord>, usize, bool) {
    let mut records = Vec::new();
    let mut good_count = 0;
    let mut clean = true;
    let mut lines = content.lines().enumerate();

    'records: loop {
        // skip blank lines up to the next range header
        let (line_no, raw_range) = loop {
            match lines.next() {
                None => break 'records,
                Some((_, line)) if line.trim().is_empty() => continue,
                Some((idx, line)) => break (idx + 1, line.trim().to_string()),
            }
        };

        let mut body_lines: Vec<&str> = Vec::new();
        let mut terminated = false;
        for (_, line) in lines.by_ref() {
            if line == "." {
                terminated = true;
                break;
            }
            body_lines.push(line);
        }

        let record = QuoteRecord {
            range: parse_range(&raw_range),
            raw_range,
            body: body_lines.join("\n"),
            line: line_no,
        };

        if record.range.is_none() {
            log_record_error(
                file_label,
                line_no,
                format!("bad range: {}", record.raw_range),
            );
            clean = false;
        } else if record.body.is_empty() {
            log_record_error(file_label, line_no, "empty zitat".to_string());
            clean = false;
        } else if !terminated {
            log_record_error(file_label, line_no, "unterminated zitat".to_string());
            clean = false;
        } else {
            tracing::info!(
                "{}:{}: good zitat for range {}",
                file_label,
                line_no,
                record.raw_range
            );
            good_count += 1;
        }
        records.push(record);

        if !terminated {
            break;
        }
    }
    (records, good_count, clean)
}

/// A header must be exactly two integers joined by `-`, ascending.
fn parse_range(raw: &str) -> Option<(i64, i64)> {
    let parts: Vec<&str> = raw.split('-').collect();
    if parts.len() != 2 {
        return None;
    }
    let low: i64 = parts[0].trim().parse().ok()?;
    let high: i64 = parts[1].trim().parse().ok()?;
    (low < high).then_some((low, high))
}

fn log_record_error(file_label: &str, line: usize, message: String) {
    let err = ZitatError::CatalogError {
        file: file_label.to_string(),
        line,
        message,
    };
    tracing::error!("{}", err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn catalog_fixture(content: &str, random: i64) -> (TempDir, QuoteCatalog) {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("zitat.toml");
        std::fs::write(&config_path, format!("[zitat]\nrandom = {}\n", random)).unwrap();
        let catalog_path = dir.path().join("masse_der_klasse.txt");
        std::fs::write(&catalog_path, content).unwrap();
        let config = SharedConfig::new(Config::from_path(config_path));
        (dir, QuoteCatalog::new(catalog_path, config))
    }

    #[test]
    fn test_round_trip_find() {
        let (_dir, mut catalog) = catalog_fixture("100-150\nA\n.\n150-200\nB\n.\n", 0);
        assert!(catalog.reload().unwrap());
        assert_eq!(catalog.find(120), Some("A".to_string()));
        assert_eq!(catalog.find(180), Some("B".to_string()));
        assert_eq!(catalog.find(300), None);
    }

    #[test]
    fn test_first_match_wins_and_bounds_are_inclusive() {
        let (_dir, mut catalog) = catalog_fixture("100-200\nfirst\n.\n150-250\nsecond\n.\n", 0);
        assert_eq!(catalog.find(180), Some("first".to_string()));
        assert_eq!(catalog.find(100), Some("first".to_string()));
        assert_eq!(catalog.find(200), Some("first".to_string()));
        assert_eq!(catalog.find(201), Some("second".to_string()));
    }

    #[test]
    fn test_multi_line_bodies_and_blank_lines_between_records() {
        let (_dir, mut catalog) =
            catalog_fixture("100-150\nline one\nline two\n.\n\n\n150-200\nB\n.\n", 0);
        assert!(catalog.reload().unwrap());
        assert_eq!(catalog.good_count(), 2);
        assert_eq!(catalog.find(120), Some("line one\nline two".to_string()));
    }

    #[test]
    fn test_bad_range_is_flagged_but_parse_continues() {
        let (_dir, mut catalog) = catalog_fixture("abc\nX\n.\n100-150\nA\n.\n", 0);
        assert!(!catalog.reload().unwrap());
        assert_eq!(catalog.good_count(), 1);
        // the bad record still occupies its position but never matches
        assert_eq!(catalog.records().len(), 2);
        assert_eq!(catalog.find(120), Some("A".to_string()));
    }

    #[test]
    fn test_descending_range_is_invalid() {
        let (_dir, mut catalog) = catalog_fixture("200-100\nA\n.\n", 0);
        assert!(!catalog.reload().unwrap());
        assert_eq!(catalog.find(150), None);
    }

    #[test]
    fn test_empty_body_is_flagged() {
        let (_dir, mut catalog) = catalog_fixture("100-150\n.\n", 0);
        assert!(!catalog.reload().unwrap());
        assert_eq!(catalog.good_count(), 0);
    }

    #[test]
    fn test_unterminated_record_ends_the_pass() {
        let (_dir, mut catalog) = catalog_fixture("100-150\nA\n.\n150-200\nB\n", 0);
        assert!(!catalog.reload().unwrap());
        assert_eq!(catalog.good_count(), 1);
        assert_eq!(catalog.find(120), Some("A".to_string()));
    }

    #[test]
    fn test_reload_is_idempotent_when_unchanged() {
        let (_dir, mut catalog) = catalog_fixture("100-150\nA\n.\n", 0);
        assert!(catalog.reload().unwrap());
        let first = catalog.records().to_vec();
        assert!(catalog.reload().unwrap());
        assert_eq!(catalog.records(), first.as_slice());
    }

    #[test]
    fn test_random_mode_never_picks_the_last_record() {
        // with two records the draw over [1, count-1] is always 1
        let (_dir, mut catalog) = catalog_fixture("100-150\nA\n.\n150-200\nB\n.\n", 1);
        for _ in 0..10 {
            assert_eq!(catalog.find(999), Some("A".to_string()));
        }
    }

    #[test]
    fn test_random_mode_with_single_record_returns_it() {
        let (_dir, mut catalog) = catalog_fixture("100-150\nonly\n.\n", 1);
        assert_eq!(catalog.find(0), Some("only".to_string()));
    }

    #[test]
    fn test_empty_catalog_finds_nothing() {
        let (_dir, mut catalog) = catalog_fixture("", 0);
        assert!(catalog.reload().unwrap());
        assert_eq!(catalog.find(120), None);
    }
}
