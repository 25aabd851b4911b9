//! The grammar edit list: which ranges to cut out of which video.
//!
//! The CSV needs `video_url`, `start` and `stop` columns; times are written as
//! `hh:mm:ss`. Ranges are grouped per URL, keeping the order in which URLs
//! first appear and the row order inside each group.

use crate::clips::ClipRange;
use anyhow::{Context, Result, anyhow, bail};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const URL_COLUMN: &str = "video_url";
const START_COLUMN: &str = "start";
const STOP_COLUMN: &str = "stop";

/// Converts `hh:mm:ss` into seconds. Shorter values are weighted from the
/// left, so `"01:02"` is one hour and two minutes.
pub fn time_to_secs(value: &str) -> Result<u32> {
    let fields: Vec<&str> = value.trim().split(':').collect();
    if fields.len() > 3 {
        bail!("{value:?} is not an hh:mm:ss time");
    }
    let mut secs = 0u32;
    for (field, weight) in fields.iter().zip([3600u32, 60, 1]) {
        let amount: u32 = field
            .trim()
            .parse()
            .with_context(|| format!("{value:?} is not an hh:mm:ss time"))?;
        secs = amount
            .checked_mul(weight)
            .and_then(|part| secs.checked_add(part))
            .ok_or_else(|| anyhow!("{value:?} is out of range"))?;
    }
    Ok(secs)
}

/// Clip ranges grouped by source URL, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipSchedule {
    groups: Vec<(String, Vec<ClipRange>)>,
    index: HashMap<String, usize>,
}

impl ClipSchedule {
    pub fn push(&mut self, url: &str, range: ClipRange) {
        match self.index.get(url) {
            Some(&position) => self.groups[position].1.push(range),
            None => {
                self.index.insert(url.to_string(), self.groups.len());
                self.groups.push((url.to_string(), vec![range]));
            }
        }
    }

    pub fn get(&self, url: &str) -> Option<&[ClipRange]> {
        self.index
            .get(url)
            .map(|&position| self.groups[position].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ClipRange])> {
        self.groups
            .iter()
            .map(|(url, ranges)| (url.as_str(), ranges.as_slice()))
    }

    /// Number of distinct videos.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clip_count(&self) -> usize {
        self.groups.iter().map(|(_, ranges)| ranges.len()).sum()
    }
}

pub fn read_video_editing_file(path: &Path) -> Result<ClipSchedule> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_video_editing_csv(file).with_context(|| format!("reading {}", path.display()))
}

pub fn parse_video_editing_csv<R: Read>(reader: R) -> Result<ClipSchedule> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers().context("reading header row")?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| anyhow!("missing `{name}` column"))
    };
    let url_idx = column(URL_COLUMN)?;
    let start_idx = column(START_COLUMN)?;
    let stop_idx = column(STOP_COLUMN)?;

    let mut schedule = ClipSchedule::default();
    for (row, record) in csv_reader.records().enumerate() {
        // Header is line 1.
        let line = row + 2;
        let record = record.with_context(|| format!("line {line}"))?;
        let field = |idx: usize, name: &str| {
            record
                .get(idx)
                .ok_or_else(|| anyhow!("line {line}: missing `{name}`"))
        };
        let url = field(url_idx, URL_COLUMN)?;
        let start = time_to_secs(field(start_idx, START_COLUMN)?)
            .with_context(|| format!("line {line}: `start`"))?;
        let stop = time_to_secs(field(stop_idx, STOP_COLUMN)?)
            .with_context(|| format!("line {line}: `stop`"))?;
        schedule.push(url, ClipRange::new(start, stop));
    }
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn time_to_secs_matches_manual_arithmetic() {
        assert_eq!(time_to_secs("01:02:03").unwrap(), 3723);
        assert_eq!(time_to_secs("00:00:00").unwrap(), 0);
        assert_eq!(time_to_secs("10:00:59").unwrap(), 36059);
        assert_eq!(time_to_secs(" 00:01:05 ").unwrap(), 65);
    }

    #[test]
    fn time_to_secs_weights_short_values_from_the_left() {
        assert_eq!(time_to_secs("01:02").unwrap(), 3720);
        assert_eq!(time_to_secs("2").unwrap(), 7200);
    }

    #[test]
    fn time_to_secs_rejects_garbage() {
        assert!(time_to_secs("").is_err());
        assert!(time_to_secs("aa:bb:cc").is_err());
        assert!(time_to_secs("00:-1:00").is_err());
        assert!(time_to_secs("1:2:3:4").is_err());
    }

    #[test]
    fn rows_for_the_same_url_are_grouped_in_order() {
        let csv = "video_url,start,stop\n\
                   A,00:00:10,00:00:20\n\
                   B,00:00:01,00:00:02\n\
                   A,00:01:00,00:01:05\n";
        let schedule = parse_video_editing_csv(csv.as_bytes()).unwrap();

        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.clip_count(), 3);
        assert_eq!(
            schedule.get("A").unwrap(),
            &[ClipRange::new(10, 20), ClipRange::new(60, 65)]
        );
        let urls: Vec<&str> = schedule.iter().map(|(url, _)| url).collect();
        assert_eq!(urls, vec!["A", "B"]);
    }

    #[test]
    fn column_order_and_extra_columns_do_not_matter() {
        let csv = "notes,stop,video_url,start\n\
                   intro, 00:00:20 ,https://youtu.be/x,00:00:10\n";
        let schedule = parse_video_editing_csv(csv.as_bytes()).unwrap();
        assert_eq!(
            schedule.get("https://youtu.be/x").unwrap(),
            &[ClipRange::new(10, 20)]
        );
    }

    #[test]
    fn missing_column_is_reported() {
        let err = parse_video_editing_csv("video_url,start\nA,00:00:01\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("`stop`"));
    }

    #[test]
    fn bad_time_names_the_line() {
        let csv = "video_url,start,stop\nA,00:00:01,00:00:02\nA,later,00:00:05\n";
        let err = parse_video_editing_csv(csv.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 3"));
    }

    #[test]
    fn header_only_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("video_editing_data.csv");
        fs::write(&path, "video_url,start,stop\n").unwrap();
        let schedule = read_video_editing_file(&path).unwrap();
        assert!(schedule.is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = read_video_editing_file(&dir.path().join("nope.csv")).unwrap_err();
        assert!(err.to_string().contains("nope.csv"));
    }
}
