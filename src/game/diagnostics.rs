use crate::game::timing::{Micros, micros_to_ms};
use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const CSV_HEADER: &str = "time_ms,beat,error_ms,direction";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BeatLogRow {
    /// Song time of the press.
    pub time_ms: i64,
    pub beat: usize,
    /// (beat position − nearest beat) × ms per beat, rounded.
    pub error_ms: i64,
    pub direction: u8,
}

impl BeatLogRow {
    pub fn new(song_time: Micros, beat: usize, time_error: Micros, direction: u8) -> Self {
        Self {
            time_ms: micros_to_ms(song_time),
            beat,
            error_ms: micros_to_ms(time_error),
            direction,
        }
    }

    fn to_csv(self) -> String {
        format!("{},{},{},{}", self.time_ms, self.beat, self.error_ms, self.direction)
    }
}

/// Per-session beat accuracy log. Rows are buffered during the frame and
/// appended on `flush`; the file is only created once logging is on.
#[derive(Debug)]
pub struct DiagnosticsSession {
    path: PathBuf,
    enabled: bool,
    file_ready: bool,
    pending: Vec<BeatLogRow>,
}

impl DiagnosticsSession {
    pub fn new(path: PathBuf, enabled: bool) -> Self {
        let mut session = Self {
            path,
            enabled: false,
            file_ready: false,
            pending: Vec::new(),
        };
        if enabled {
            session.set_enabled(true);
        }
        session
    }

    /// `<dir>/beats-YYYY-MM-DD.csv` for today's local date.
    pub fn daily_path(dir: &Path) -> PathBuf {
        let date = chrono::Local::now().format("%Y-%m-%d");
        dir.join(format!("beats-{}.csv", date))
    }

    #[inline(always)]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.enabled);
        self.enabled
    }

    /// Turning logging on re-checks the file and writes the header if it is new.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled {
            self.file_ready = false;
            self.ensure_file();
        } else {
            self.pending.clear();
        }
        info!(
            "Beat logging {} ({})",
            if enabled { "ON" } else { "OFF" },
            self.path.display()
        );
    }

    pub fn record(&mut self, row: BeatLogRow) {
        if self.enabled {
            self.pending.push(row);
        }
    }

    /// Appends buffered rows. Write failures drop the rows and keep going.
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        if !self.ensure_file() {
            self.pending.clear();
            return;
        }
        let rows = std::mem::take(&mut self.pending);
        if let Err(e) = append_rows(&self.path, &rows) {
            warn!(
                "Dropping {} beat log rows; append to '{}' failed: {}",
                rows.len(),
                self.path.display(),
                e
            );
            self.file_ready = false;
        }
    }

    fn ensure_file(&mut self) -> bool {
        if self.file_ready {
            return true;
        }
        match create_with_header(&self.path) {
            Ok(()) => self.file_ready = true,
            Err(e) => warn!("Beat log '{}' unavailable: {}", self.path.display(), e),
        }
        self.file_ready
    }
}

fn create_with_header(path: &Path) -> io::Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().append(true).create_new(true).open(path)?;
    writeln!(file, "{}", CSV_HEADER)
}

fn append_rows(path: &Path, rows: &[BeatLogRow]) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    let mut out = String::with_capacity(rows.len() * 24);
    for row in rows {
        out.push_str(&row.to_csv());
        out.push('\n');
    }
    file.write_all(out.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::{BeatLogRow, CSV_HEADER, DiagnosticsSession};
    use std::fs;

    #[test]
    fn row_rounds_to_whole_milliseconds() {
        let row = BeatLogRow::new(850_400, 1, -7_400, 2);
        assert_eq!(row.time_ms, 850);
        assert_eq!(row.error_ms, -7);
        assert_eq!(row.to_csv(), "850,1,-7,2");
    }

    #[test]
    fn file_is_created_lazily_with_one_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("beats.csv");

        let mut diag = DiagnosticsSession::new(path.clone(), false);
        diag.record(BeatLogRow::new(0, 0, 0, 1));
        diag.flush();
        assert!(!path.exists(), "disabled logging must not touch the disk");

        diag.toggle();
        assert!(path.exists());
        diag.record(BeatLogRow::new(850_000, 1, -7_000, 2));
        diag.flush();

        // Toggling off and on again must not repeat the header.
        diag.toggle();
        diag.toggle();
        diag.record(BeatLogRow::new(1_720_000, 2, 6_000, 5));
        diag.flush();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![CSV_HEADER, "850,1,-7,2", "1720,2,6,5"]);
    }

    #[test]
    fn existing_file_is_appended_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beats.csv");
        fs::write(&path, format!("{}\n10,0,1,1\n", CSV_HEADER)).unwrap();

        let mut diag = DiagnosticsSession::new(path.clone(), true);
        diag.record(BeatLogRow::new(20_000, 0, 2_000, 3));
        diag.flush();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches(CSV_HEADER).count(), 1);
        assert!(text.ends_with("20,0,2,3\n"));
    }

    #[test]
    fn unwritable_location_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A plain file where the log directory should be.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let mut diag = DiagnosticsSession::new(blocker.join("beats.csv"), true);
        diag.record(BeatLogRow::new(0, 0, 0, 1));
        diag.flush();
        assert!(diag.pending.is_empty());
    }

    #[test]
    fn daily_path_lives_in_the_directory() {
        let p = DiagnosticsSession::daily_path(std::path::Path::new("logs"));
        let name = p.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("beats-") && name.ends_with(".csv"), "{}", name);
        assert_eq!(p.parent(), Some(std::path::Path::new("logs")));
    }
}
