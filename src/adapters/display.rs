use crate::domain::ports::{DisplaySink, TextFormatter};
use crate::utils::error::{Result, ZitatError};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command};

/// Renderer invocation; `-` makes it read text from stdin.
pub const DEFAULT_RENDERER: &str = "/usr/games/sm -b Black -f LightGray -a 1 -";

/// Display sink backed by a named pipe, usually with the external renderer
/// reading the other end.
pub struct PipeSink {
    writer: File,
    renderer: Option<Child>,
}

impl PipeSink {
    /// Create the FIFO when missing, start the renderer on its read side,
    /// then open the write side. Order matters: opening a FIFO for writing
    /// blocks until a reader exists.
    pub fn launch(fifo: &Path, renderer_cmd: &str) -> Result<Self> {
        if !fifo.exists() {
            let status = Command::new("mkfifo").arg(fifo).status()?;
            if !status.success() {
                return Err(ZitatError::DisplayError {
                    message: format!("cannot create fifo {}", fifo.display()),
                });
            }
        }
        let shell_cmd = format!("{} < {}", renderer_cmd, fifo.display());
        tracing::info!("running: {}", shell_cmd);
        let renderer = Command::new("sh").arg("-c").arg(&shell_cmd).spawn()?;
        let writer = OpenOptions::new().write(true).open(fifo)?;
        Ok(Self {
            writer,
            renderer: Some(renderer),
        })
    }

    /// Plain stream sink without a renderer, for bench tests and `disp`
    /// runs against a regular file.
    pub fn open(path: &Path) -> Result<Self> {
        let writer = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer,
            renderer: None,
        })
    }
}

impl DisplaySink for PipeSink {
    fn write_frame(&mut self, frame: &str) -> Result<()> {
        self.writer.write_all(frame.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for PipeSink {
    fn drop(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            let _ = renderer.kill();
            let _ = renderer.wait();
        }
    }
}

/// In-process greedy word wrap; paragraphs separated by blank lines are
/// wrapped independently.
pub struct GreedyFormatter;

impl TextFormatter for GreedyFormatter {
    fn reflow(&self, text: &str, width: usize) -> String {
        let wrapped: Vec<String> = text
            .split("\n\n")
            .map(|paragraph| wrap_paragraph(paragraph, width))
            .collect();
        wrapped.join("\n\n").trim().to_string()
    }
}

fn wrap_paragraph(paragraph: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    for word in paragraph.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
        } else if line.chars().count() + 1 + word.chars().count() <= width {
            line.push(' ');
            line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines.join("\n")
}
