//! Obstacle schedule parsing
//!
//! The schedule is UTF-8 CSV: a header line (discarded), then rows of
//! `gap_y (0..1), gap_height (0..1), time_seconds`. Each valid row becomes a
//! pipe whose spawn `x` puts its right edge at the viewport's right edge
//! exactly at the scheduled time under constant leftward scroll. Rows that do
//! not parse to exactly three finite numbers are dropped silently; a failure
//! to read the schedule at all is terminal.

use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::consts::*;
use crate::sim::state::Pipe;

/// Terminal failure fetching the schedule; no game session begins.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("failed to read schedule {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Parse raw schedule text into pipes, preserving row order.
pub fn parse_schedule(text: &str) -> Vec<Pipe> {
    let pipes: Vec<Pipe> = text.lines().skip(1).filter_map(parse_row).collect();
    debug!("parsed schedule: {} pipes", pipes.len());
    pipes
}

/// Read and parse a schedule file.
pub fn load_schedule(path: &Path) -> Result<Vec<Pipe>, ScheduleError> {
    let text = std::fs::read_to_string(path).map_err(|source| ScheduleError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_schedule(&text))
}

fn parse_row(line: &str) -> Option<Pipe> {
    let mut fields = line.split(',').map(str::trim);
    let frac_gap_y: f64 = fields.next()?.parse().ok()?;
    let frac_gap_height: f64 = fields.next()?.parse().ok()?;
    let appear_secs: f64 = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    if !frac_gap_y.is_finite() || !frac_gap_height.is_finite() || !appear_secs.is_finite() {
        return None;
    }
    Some(Pipe {
        // Right edge reaches the viewport's right edge at appear_secs
        x: VIEW_WIDTH + appear_secs * TICKS_PER_SECOND * PIPE_SPEED,
        gap_y: frac_gap_y * VIEW_HEIGHT,
        gap_height: frac_gap_height * VIEW_HEIGHT,
        passed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_round_trip() {
        let pipes = parse_schedule("gap_y,gap_height,time\n0.5,0.25,2\n0.25,0.5,1");
        assert_eq!(pipes.len(), 2);
        assert_eq!(pipes[0].gap_y, 200.0);
        assert_eq!(pipes[0].gap_height, 100.0);
        assert_eq!(pipes[0].x, 1100.0);
        assert_eq!(pipes[1].x, 850.0);
        assert!(!pipes[0].passed);
    }

    #[test]
    fn test_header_only_yields_empty_set() {
        assert!(parse_schedule("gap_y,gap_height,time").is_empty());
        assert!(parse_schedule("").is_empty());
    }

    #[test]
    fn test_malformed_rows_are_skipped_silently() {
        let text = "gap_y,gap_height,time\n\
                    0.5,0.25,2\n\
                    not,a,row\n\
                    0.5,0.25\n\
                    0.5,0.25,2,extra\n\
                    0.5,NaN,2\n\
                    ,,\n\
                    0.25,0.5,1";
        let pipes = parse_schedule(text);
        assert_eq!(pipes.len(), 2);
        assert_eq!(pipes[1].x, 850.0);
    }

    #[test]
    fn test_whitespace_around_fields_is_tolerated() {
        let pipes = parse_schedule("h\n 0.5 , 0.25 , 2 ");
        assert_eq!(pipes.len(), 1);
        assert_eq!(pipes[0].x, 1100.0);
    }

    #[test]
    fn test_missing_file_is_terminal() {
        let err = load_schedule(Path::new("/nonexistent/schedule.csv")).unwrap_err();
        assert!(matches!(err, ScheduleError::Io { .. }));
    }
}
