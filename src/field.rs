//! Fixed-width SEED field formats.
//!
//! Every blockette body is a run of fields in a handful of textual formats:
//! zero-padded decimal integers, left-justified space-padded ASCII,
//! `~`-terminated variable text, fixed decimals, scientific notation of a
//! fixed total width, and ordinal-day timestamps. Parsing and formatting
//! here are exact inverses for canonical field values, which is what makes
//! `encode(decode(bytes)) == bytes` hold at the record level.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{FormatError, FormatErrorKind};

/// Sequential reader over one blockette body.
///
/// Tracks the absolute stream offset of the cursor so every error can name
/// the exact byte it choked on.
pub struct FieldReader<'a> {
    body: &'a str,
    pos: usize,
    base: usize,
    blockette_type: u16,
}

impl<'a> FieldReader<'a> {
    pub fn new(body: &'a str, base: usize, blockette_type: u16) -> Self {
        FieldReader {
            body,
            pos: 0,
            base,
            blockette_type,
        }
    }

    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn err(&self, kind: FormatErrorKind) -> FormatError {
        FormatError::new(kind, self.offset(), self.blockette_type)
    }

    /// Raw fixed-width slice.
    pub fn fixed(&mut self, width: usize) -> Result<&'a str, FormatError> {
        let rest = &self.body[self.pos..];
        if rest.len() < width {
            return Err(self.err(FormatErrorKind::Truncated {
                needed: width,
                available: rest.len(),
            }));
        }
        let s = &rest[..width];
        self.pos += width;
        Ok(s)
    }

    /// Fixed-width zero-padded decimal integer (`Dn`).
    pub fn int(&mut self, width: usize) -> Result<u32, FormatError> {
        let s = self.fixed(width)?;
        s.trim()
            .parse::<u32>()
            .map_err(|_| self.err_at_field(s, width))
    }

    /// Fixed-width decimal number, possibly signed (latitudes, dips, ...).
    pub fn decimal(&mut self, width: usize) -> Result<f64, FormatError> {
        let s = self.fixed(width)?;
        s.trim()
            .parse::<f64>()
            .map_err(|_| self.err_at_field(s, width))
    }

    /// Fixed-width scientific-notation number (`En.m`).
    pub fn exponential(&mut self, width: usize) -> Result<f64, FormatError> {
        self.decimal(width)
    }

    /// Left-justified space-padded ASCII (`An`); trailing spaces dropped.
    pub fn alpha(&mut self, width: usize) -> Result<String, FormatError> {
        let s = self.fixed(width)?;
        Ok(s.trim_end().to_string())
    }

    /// Single-character flag field (`A1`).
    pub fn flag(&mut self) -> Result<char, FormatError> {
        let s = self.fixed(1)?;
        Ok(s.chars().next().unwrap_or(' '))
    }

    /// Variable-length `~`-terminated text (`V`), bounded by `max`.
    pub fn variable(&mut self, max: usize) -> Result<String, FormatError> {
        let rest = &self.body[self.pos..];
        let end = rest
            .find('~')
            .ok_or_else(|| self.err(FormatErrorKind::UnterminatedField))?;
        if end > max {
            return Err(self.err(FormatErrorKind::FieldTooLong {
                max,
                actual: end,
            }));
        }
        let s = rest[..end].to_string();
        self.pos += end + 1;
        Ok(s)
    }

    /// Variable-length timestamp; an empty field is an open/unknown time.
    pub fn time(&mut self) -> Result<Option<SeedTime>, FormatError> {
        let start = self.offset();
        let s = self.variable(SEED_TIME_WIDTH)?;
        if s.is_empty() {
            return Ok(None);
        }
        match SeedTime::parse(&s) {
            Some(t) => Ok(Some(t)),
            None => Err(FormatError::new(
                FormatErrorKind::BadTime { text: s },
                start,
                self.blockette_type,
            )),
        }
    }

    /// Errors unless the whole body has been consumed.
    pub fn finish(&self) -> Result<(), FormatError> {
        if self.pos != self.body.len() {
            return Err(FormatError::new(
                FormatErrorKind::LengthMismatch {
                    declared: self.body.len() + RECORD_HEADER_WIDTH,
                    consumed: self.pos + RECORD_HEADER_WIDTH,
                },
                self.base + self.pos,
                self.blockette_type,
            ));
        }
        Ok(())
    }

    fn err_at_field(&self, text: &str, width: usize) -> FormatError {
        FormatError::new(
            FormatErrorKind::BadNumber {
                text: text.to_string(),
            },
            self.offset() - width,
            self.blockette_type,
        )
    }
}

/// Width of the `TTTLLLL` record header (type tag plus declared length).
pub const RECORD_HEADER_WIDTH: usize = 7;

const SEED_TIME_WIDTH: usize = 22;

pub fn fmt_int(value: u32, width: usize) -> String {
    format!("{:0w$}", value, w = width)
}

pub fn fmt_alpha(value: &str, width: usize) -> String {
    format!("{:<w$.w$}", value, w = width)
}

/// Fixed decimal with a zero-padded integer part; `signed` prepends an
/// explicit `+`/`-`. Width is `signed + int_digits + 1 + frac_digits`.
pub fn fmt_decimal(value: f64, int_digits: usize, frac_digits: usize, signed: bool) -> String {
    let body = format!(
        "{:0w$.p$}",
        value.abs(),
        w = int_digits + 1 + frac_digits,
        p = frac_digits
    );
    if signed {
        let sign = if value.is_sign_negative() { '-' } else { '+' };
        format!("{}{}", sign, body)
    } else {
        body
    }
}

/// Scientific notation `d.dddddE±ee`; `signed` prepends an explicit sign.
/// Width is `signed + 1 + 1 + frac_digits + 1 + 1 + 2`.
pub fn fmt_exponential(value: f64, frac_digits: usize, signed: bool) -> String {
    let s = format!("{:.*e}", frac_digits, value.abs());
    let (mantissa, exp) = s.split_once('e').unwrap_or((s.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let exp_sign = if exp < 0 { '-' } else { '+' };
    if signed {
        let sign = if value.is_sign_negative() { '-' } else { '+' };
        format!("{}{}E{}{:02}", sign, mantissa, exp_sign, exp.abs())
    } else {
        format!("{}E{}{:02}", mantissa, exp_sign, exp.abs())
    }
}

/// One SEED timestamp: year, ordinal day, time of day with a four-digit
/// fractional-second field. Renders as `YYYY,DDD,HH:MM:SS.FFFF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SeedTime {
    pub year: u16,
    pub day: u16,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub fraction: u16,
}

impl SeedTime {
    pub fn to_seed_string(&self) -> String {
        format!(
            "{:04},{:03},{:02}:{:02}:{:02}.{:04}",
            self.year, self.day, self.hour, self.minute, self.second, self.fraction
        )
    }

    /// Parses `YYYY,DDD[,HH:MM:SS[.FFFF]]`; omitted components are zero.
    pub fn parse(s: &str) -> Option<SeedTime> {
        let mut parts = s.split(',');
        let year = parts.next()?.trim().parse().ok()?;
        let day = parts.next()?.trim().parse().ok()?;
        let mut time = SeedTime {
            year,
            day,
            hour: 0,
            minute: 0,
            second: 0,
            fraction: 0,
        };
        if let Some(tod) = parts.next() {
            let (hms, frac) = match tod.split_once('.') {
                Some((h, f)) => (h, Some(f)),
                None => (tod, None),
            };
            let mut fields = hms.split(':');
            time.hour = fields.next()?.parse().ok()?;
            time.minute = fields.next().unwrap_or("0").parse().ok()?;
            time.second = fields.next().unwrap_or("0").parse().ok()?;
            if let Some(frac) = frac {
                // four-digit field, shorter fractions scale up
                let scale = 10u16.pow(4u32.saturating_sub(frac.len() as u32).min(4));
                time.fraction = frac.parse::<u16>().ok()?.checked_mul(scale)?;
            }
        }
        if parts.next().is_some() {
            return None;
        }
        Some(time)
    }

    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_yo_opt(i32::from(self.year), u32::from(self.day))?.and_hms_nano_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
            u32::from(self.fraction) * 100_000,
        )
    }

    pub fn from_datetime(dt: &NaiveDateTime) -> SeedTime {
        SeedTime {
            year: dt.year() as u16,
            day: dt.ordinal() as u16,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
            fraction: (dt.nanosecond() / 100_000) as u16,
        }
    }

    /// ISO-8601 rendering for the StationXML surface.
    pub fn to_iso(&self) -> String {
        match self.to_datetime() {
            Some(dt) => {
                let base = dt.format("%Y-%m-%dT%H:%M:%S").to_string();
                if self.fraction != 0 {
                    format!("{}.{:04}", base, self.fraction)
                } else {
                    base
                }
            }
            // out-of-calendar values still need some rendering
            None => self.to_seed_string(),
        }
    }

    pub fn from_iso(s: &str) -> Option<SeedTime> {
        let s = s.trim().trim_end_matches('Z');
        let dt = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })?;
        Some(SeedTime::from_datetime(&dt))
    }
}

/// Encodes an optional time followed by its `~` terminator.
pub fn push_time(out: &mut String, time: &Option<SeedTime>) {
    if let Some(t) = time {
        out.push_str(&t.to_seed_string());
    }
    out.push('~');
}

/// Encodes a variable text field followed by its `~` terminator.
pub fn push_variable(out: &mut String, text: &str) {
    out.push_str(text);
    out.push('~');
}
