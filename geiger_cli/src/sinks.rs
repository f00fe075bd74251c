//! Concrete collaborators behind the core's sink traits.
//!
//! Telemetry and alerts are JSON lines (a file or stdout), the sample log
//! is headerless CSV appended to disk, and the display is one status line
//! per period on stdout. Each returns its error to the core, which logs and
//! drops it.
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use geiger_traits::{
    AlertPayload, AlertSink, BoxError, DisplaySink, SampleLog, Telemetry, TelemetrySink,
};
use serde_json::json;

type Out = Box<dyn Write + Send>;

/// Append to `path`, or write to stdout when no path is configured.
pub fn open_output(path: Option<&str>) -> io::Result<Out> {
    match path {
        Some(p) => {
            let file = OpenOptions::new().create(true).append(true).open(p)?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

pub struct JsonTelemetry {
    out: Out,
}

impl JsonTelemetry {
    pub fn new(out: Out) -> Self {
        Self { out }
    }
}

pub fn telemetry_json(t: &Telemetry) -> serde_json::Value {
    let mut v = json!({
        "timestamp_ms": t.timestamp_ms,
        "cpm": t.cpm,
        "dose_rate": t.dose_rate,
        "average": t.average,
    });
    if let Some((lat, lon)) = t.location {
        v["lat"] = json!(lat);
        v["lon"] = json!(lon);
    }
    v
}

impl TelemetrySink for JsonTelemetry {
    fn publish(&mut self, telemetry: &Telemetry) -> Result<(), BoxError> {
        writeln!(self.out, "{}", telemetry_json(telemetry))?;
        self.out.flush()?;
        Ok(())
    }
}

pub struct JsonAlerts {
    out: Out,
}

impl JsonAlerts {
    pub fn new(out: Out) -> Self {
        Self { out }
    }
}

impl AlertSink for JsonAlerts {
    fn notify(&mut self, alert: &AlertPayload) -> Result<(), BoxError> {
        let line = json!({
            "event": "alert",
            "value1": alert.value1,
            "value2": alert.value2,
        });
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }
}

/// `timestamp,cpm,dose_rate` lines, no header. The file is opened on the
/// first append so a disabled log never touches the disk.
pub struct CsvSampleLog {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
}

impl CsvSampleLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            writer: None,
        }
    }

    fn writer(&mut self) -> Result<&mut csv::Writer<File>, BoxError> {
        if self.writer.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            let w = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            tracing::debug!(path = %self.path.display(), "sample log opened");
            self.writer = Some(w);
        }
        self.writer
            .as_mut()
            .ok_or_else(|| "sample log unavailable".into())
    }
}

impl SampleLog for CsvSampleLog {
    fn append(&mut self, timestamp_ms: u64, cpm: u32, dose_rate: f64) -> Result<(), BoxError> {
        let w = self.writer()?;
        w.write_record([
            timestamp_ms.to_string(),
            cpm.to_string(),
            format!("{dose_rate:.6}"),
        ])?;
        w.flush()?;
        Ok(())
    }
}

pub struct TerminalDisplay {
    out: Out,
}

impl TerminalDisplay {
    pub fn stdout() -> Self {
        Self {
            out: Box::new(io::stdout()),
        }
    }
}

impl DisplaySink for TerminalDisplay {
    fn render(&mut self, t: &Telemetry) -> Result<(), BoxError> {
        writeln!(
            self.out,
            "cpm {:>6}  dose {:.4} uSv/h  avg {:.1}",
            t.cpm, t.dose_rate, t.average
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Telemetry {
        Telemetry {
            timestamp_ms: 1_700_000_000_000,
            cpm: 123,
            dose_rate: 0.998_805_555,
            average: 110.0,
            location: Some((52.52, 13.40)),
        }
    }

    #[test]
    fn telemetry_json_carries_location_only_when_set() {
        let mut t = sample();
        let v = telemetry_json(&t);
        assert_eq!(v["cpm"], 123);
        assert_eq!(v["lat"], 52.52);
        t.location = None;
        let v = telemetry_json(&t);
        assert!(v.get("lat").is_none());
    }

    #[test]
    fn csv_log_appends_plain_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let mut log = CsvSampleLog::new(&path);
        assert!(!path.exists());
        log.append(1, 123, 0.998_805_555).unwrap();
        log.append(2, 0, 0.0).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "1,123,0.998806\n2,0,0.000000\n");
    }

    #[test]
    fn alerts_are_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts.jsonl");
        let out = open_output(Some(path.to_str().unwrap())).unwrap();
        let mut sink = JsonAlerts::new(out);
        sink.notify(&AlertPayload {
            value1: "123".into(),
            value2: "0.9988".into(),
        })
        .unwrap();
        let line = std::fs::read_to_string(&path).unwrap();
        let v: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(v["event"], "alert");
        assert_eq!(v["value2"], "0.9988");
    }
}
