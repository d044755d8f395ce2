//! Plain-text transcript of the visible thread.
//!
//! The transcript records what the user saw, speaker labels included, so
//! inline diagnostics land in it just like replies do. It is append-only
//! and can be paused and resumed mid-session with `/log`.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct TranscriptLog {
    file_path: Option<String>,
    is_active: bool,
}

impl TranscriptLog {
    /// A transcript that starts recording immediately when a path was given
    /// on the command line, and stays dormant otherwise.
    pub fn new(log_file: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut transcript = TranscriptLog {
            file_path: None,
            is_active: false,
        };
        if let Some(path) = log_file {
            transcript.enable(path)?;
        }
        Ok(transcript)
    }

    /// Point the transcript at `path` and start recording.
    pub fn enable(&mut self, path: String) -> Result<String, Box<dyn std::error::Error>> {
        // Fail now if the file is not writable, not on the first message.
        self.test_file_access(&path)?;

        self.file_path = Some(path.clone());
        self.is_active = true;

        Ok(format!("Transcript enabled: {path}"))
    }

    /// Pause recording if active, resume it if paused.
    pub fn toggle(&mut self) -> Result<String, Box<dyn std::error::Error>> {
        match &self.file_path {
            Some(path) => {
                if self.is_active {
                    self.is_active = false;
                    Ok(format!("Transcript paused (file: {path})"))
                } else {
                    self.is_active = true;
                    Ok(format!("Transcript resumed: {path}"))
                }
            }
            None => Err("No transcript file set. Use /log <filename> first.".into()),
        }
    }

    /// Append one labelled message. Does nothing while paused or unset.
    pub fn record(&self, speaker: &str, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let Some(file_path) = self.file_path.as_ref().filter(|_| self.is_active) else {
            return Ok(());
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        let mut writer = BufWriter::new(file);

        for (i, line) in content.lines().enumerate() {
            if i == 0 {
                writeln!(writer, "{speaker}: {line}")?;
            } else {
                writeln!(writer, "{line}")?;
            }
        }
        // Blank line between messages, matching the on-screen spacing.
        writeln!(writer)?;

        writer.flush()?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn status(&self) -> String {
        match (&self.file_path, self.is_active) {
            (None, _) => "disabled".to_string(),
            (Some(path), true) => format!("active ({})", file_name(path)),
            (Some(path), false) => format!("paused ({})", file_name(path)),
        }
    }

    fn test_file_access(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.flush()?;
        Ok(())
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}
