use chrono::{Datelike, NaiveDate};
use std::fs;
use std::path::Path;

/// Every emitted date is rewritten to this year before formatting. The
/// external binary crashes on years after 2010, so the whole scenario is
/// expressed in one fixed reference year.
pub const REFERENCE_YEAR: i32 = 2009;

/// Rewrites a date into [`REFERENCE_YEAR`], keeping month and day.
/// Feb 29 has no counterpart in the reference year and clamps to Feb 28.
pub fn to_reference_year(date: NaiveDate) -> NaiveDate {
    date.with_year(REFERENCE_YEAR).unwrap_or_else(|| {
        NaiveDate::from_ymd_opt(REFERENCE_YEAR, 2, 28)
            .expect("reference year has a Feb 28")
    })
}

/// Formats a date as the seven-character `YYYYDDD` day-of-year field the
/// control-file grammar uses.
pub fn day_of_year_field(date: NaiveDate) -> String {
    format!("{:04}{:03}", date.year(), date.ordinal())
}

/// Accumulates fixed-column records. The grammar requires CRLF line
/// endings, so records are terminated explicitly here rather than going
/// through any newline normalization.
#[derive(Debug, Default)]
pub struct RecordBuffer {
    content: String,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, line: &str) {
        self.content.push_str(line);
        self.content.push_str("\r\n");
    }

    pub fn blank(&mut self) {
        self.content.push_str("\r\n");
    }

    /// Appends text without a terminator. The final genotype record of a
    /// control file is unterminated in the legacy grammar.
    pub fn push_raw(&mut self, text: &str) {
        self.content.push_str(text);
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

/// Writes control-file bytes exactly as rendered.
pub fn write_control_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::{
        RecordBuffer, day_of_year_field, to_reference_year, write_control_artifact,
    };
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn day_of_year_field_is_four_year_digits_plus_three_day_digits() {
        assert_eq!(day_of_year_field(date(2009, 1, 5)), "2009005");
        assert_eq!(day_of_year_field(date(2009, 12, 31)), "2009365");
    }

    #[test]
    fn reference_year_rewrite_keeps_month_and_day() {
        assert_eq!(to_reference_year(date(2021, 5, 17)), date(2009, 5, 17));
        assert_eq!(to_reference_year(date(1986, 1, 9)), date(2009, 1, 9));
    }

    #[test]
    fn leap_day_clamps_to_end_of_february() {
        assert_eq!(to_reference_year(date(2020, 2, 29)), date(2009, 2, 28));
    }

    #[test]
    fn records_are_crlf_terminated() {
        let mut buffer = RecordBuffer::new();
        buffer.record("*FIELDS");
        buffer.blank();
        buffer.push_raw("tail");
        assert_eq!(buffer.as_str(), "*FIELDS\r\n\r\ntail");
    }

    #[test]
    fn artifact_bytes_are_written_verbatim() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("DSSAT3_001.INP");
        write_control_artifact(&path, "*SOIL\r\nline").expect("write should succeed");
        assert_eq!(
            fs::read(&path).expect("artifact should be readable"),
            b"*SOIL\r\nline"
        );
    }
}
