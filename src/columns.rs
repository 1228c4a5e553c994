//! Column resolution for trip exports.
//!
//! Vendor exports label the same quantity differently (and sometimes repeat a
//! header), so every canonical field carries an ordered alias list. The header
//! row is resolved once into a fixed `ColumnMap` of cell indices.

use std::fmt;

use crate::error::{Error, Result};

/// Canonical fields of a trip record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Driver,
    Date,
    Distance,
    DriveTime,
    IdleTime,
    ActiveTime,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Driver,
        Field::Date,
        Field::Distance,
        Field::DriveTime,
        Field::IdleTime,
        Field::ActiveTime,
    ];

    /// Header labels tried in order; the first one present wins.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Driver => &["乗務員", "乗務員名", "ドライバー", "運転者"],
            Field::Date => &["運行日", "日付"],
            Field::Distance => &["一般・実車走行距離", "走行距離", "走行距離－ｋｍ－"],
            Field::DriveTime => &["ハンドル時間－時分－", "ハンドル時間", "運転時間"],
            Field::IdleTime => &["アイドリング－時分－", "アイドリング時間", "アイドリング"],
            Field::ActiveTime => &["稼働時間－時分－", "稼働時間", "実働時間"],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Driver => "driver",
            Field::Date => "date",
            Field::Distance => "distance",
            Field::DriveTime => "drive time",
            Field::IdleTime => "idle time",
            Field::ActiveTime => "active time",
        };
        write!(f, "{}", name)
    }
}

/// Cell index of each canonical field in the source rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub driver: usize,
    pub distance: usize,
    pub date: Option<usize>,
    pub drive_time: Option<usize>,
    pub idle_time: Option<usize>,
    pub active_time: Option<usize>,
}

impl ColumnMap {
    /// Resolve a header row. Fails on the first required field with no alias
    /// present.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Result<Self> {
        let optional = |field: Field| find_first(headers, field.aliases());
        let required = |field: Field| -> Result<usize> {
            optional(field).ok_or_else(|| Error::MissingRequiredColumn {
                field,
                found: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            })
        };

        Ok(Self {
            driver: required(Field::Driver)?,
            distance: required(Field::Distance)?,
            date: optional(Field::Date),
            drive_time: optional(Field::DriveTime),
            idle_time: optional(Field::IdleTime),
            active_time: optional(Field::ActiveTime),
        })
    }

    pub fn index_of(&self, field: Field) -> Option<usize> {
        match field {
            Field::Driver => Some(self.driver),
            Field::Distance => Some(self.distance),
            Field::Date => self.date,
            Field::DriveTime => self.drive_time,
            Field::IdleTime => self.idle_time,
            Field::ActiveTime => self.active_time,
        }
    }
}

/// Index of the first header matching the earliest alias. Repeated headers
/// collapse to their first occurrence.
fn find_first<S: AsRef<str>>(headers: &[S], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| headers.iter().position(|h| h.as_ref().trim() == *alias))
}
