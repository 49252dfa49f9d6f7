use crate::domain::ports::{DisplaySink, TextFormatter};
use crate::utils::error::Result;

pub const DEFAULT_WIDTH: usize = 30;

/// Margin put around every line when padding is on.
const MARGIN: &str = "    ";

/// A leading `*` means the text is pre-formatted and must not be reflowed.
const VERBATIM_MARKER: char = '*';

/// Fixed introductory text block.
const BANNER: &str = "Masse der Klasse\n\nElvedin Klačar\n(c) 2016";

/// Formats text and hands finished frames to the display sink.
///
/// A frame is the text plus a form feed; the sink flushes immediately since
/// the renderer on the other end polls for input. Every frame is also
/// logged at debug level so test harnesses can watch what was shown.
pub struct DisplayController<S: DisplaySink, F: TextFormatter> {
    sink: S,
    formatter: F,
}

impl<S: DisplaySink, F: TextFormatter> DisplayController<S, F> {
    pub fn new(sink: S, formatter: F) -> Self {
        Self { sink, formatter }
    }

    pub fn show(&mut self, text: &str, reformat: bool, pad: bool, width: usize) -> Result<()> {
        let text = if reformat {
            match text.strip_prefix(VERBATIM_MARKER) {
                Some(rest) => rest.to_string(),
                None => self.formatter.reflow(text, width),
            }
        } else {
            text.to_string()
        };
        let text = if pad { pad_lines(&text) } else { text };

        self.sink.write_frame(&format!("{}\u{000C}", text))?;
        tracing::debug!("showing: >>>{}<<<", text);
        Ok(())
    }

    pub fn show_quotation(&mut self, text: &str) -> Result<()> {
        self.show(text, true, true, DEFAULT_WIDTH)
    }

    pub fn show_weight(&mut self, weight: i64) -> Result<()> {
        self.show(&weight.to_string(), true, true, DEFAULT_WIDTH)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.show(" ", false, true, DEFAULT_WIDTH)
    }

    pub fn show_banner(&mut self) -> Result<()> {
        self.show(BANNER, true, true, DEFAULT_WIDTH)
    }
}

fn pad_lines(text: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}{}", MARGIN, line, MARGIN))
        .collect::<Vec<_>>()
        .join("\n")
}
