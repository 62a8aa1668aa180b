use std::cmp::Ordering;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use tracing::instrument;

use super::Storage;
use crate::error::{QuizError, Result};
use crate::results::{ResultEntry, ResultLog};

const RECORD_EXTENSION: &str = ".sav";

/// How many later seconds `save` tries before giving up on a free name.
const NAME_ATTEMPTS: usize = 5;

/// Identifies a saved record by the moment it was written, to the second.
///
/// The file stem is `D_M_Y-H_M_S` without zero padding, e.g. `3_7_2023-14_5_9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl RecordId {
    pub fn now() -> Self {
        Self::from_datetime(Local::now().naive_local())
    }

    pub fn from_datetime(at: NaiveDateTime) -> Self {
        Self {
            day: at.day(),
            month: at.month(),
            year: at.year(),
            hour: at.hour(),
            minute: at.minute(),
            second: at.second(),
        }
    }

    /// Chronological key, independent of how the file names sort as text.
    pub fn sort_key(&self) -> i64 {
        self.year as i64 * 10_000_000_000
            + self.month as i64 * 100_000_000
            + self.day as i64 * 1_000_000
            + self.hour as i64 * 10_000
            + self.minute as i64 * 100
            + self.second as i64
    }

    pub fn file_name(&self) -> String {
        format!("{self}{RECORD_EXTENSION}")
    }

    pub fn from_file_name(name: &str) -> Result<Self> {
        name.strip_suffix(RECORD_EXTENSION)
            .ok_or_else(|| QuizError::InvalidRecordName(name.to_owned()))?
            .parse()
    }

    fn to_datetime(self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?.and_hms_opt(
            self.hour,
            self.minute,
            self.second,
        )
    }

    /// The id one second later, used when a name is already taken.
    pub fn following(&self) -> Option<Self> {
        let at = self.to_datetime()?.checked_add_signed(TimeDelta::seconds(1))?;
        Some(Self::from_datetime(at))
    }

    /// `DD/MM/YYYY - hh:mm:ss AM`
    pub fn label(&self) -> String {
        match self.to_datetime() {
            Some(at) => at.format("%d/%m/%Y - %I:%M:%S %p").to_string(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}-{}_{}_{}",
            self.day, self.month, self.year, self.hour, self.minute, self.second
        )
    }
}

impl FromStr for RecordId {
    type Err = QuizError;

    fn from_str(stem: &str) -> Result<Self> {
        let invalid = || QuizError::InvalidRecordName(stem.to_owned());

        let (date, time) = stem.split_once('-').ok_or_else(invalid)?;
        let [day, month, year] = split_numbers(date).ok_or_else(invalid)?;
        let [hour, minute, second] = split_numbers(time).ok_or_else(invalid)?;

        let id = Self {
            day,
            month,
            year: i32::try_from(year).map_err(|_| invalid())?,
            hour,
            minute,
            second,
        };
        id.to_datetime().map(|_| id).ok_or_else(invalid)
    }
}

fn split_numbers(part: &str) -> Option<[u32; 3]> {
    let mut numbers = part.split('_').map(|number| number.parse::<u32>().ok());
    let parsed = [numbers.next()??, numbers.next()??, numbers.next()??];
    numbers.next().is_none().then_some(parsed)
}

impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A record as listed for a user, before it is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    pub id: RecordId,
    pub label: String,
}

/// A completed session read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub username: String,
    pub id: RecordId,
    pub entries: Vec<ResultEntry>,
}

impl ResultRecord {
    pub fn score(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_correct).count()
    }
}

/// Rejects names that are empty or would escape the user's results folder.
pub fn validate_username(username: &str) -> Result<&str> {
    let trimmed = username.trim();
    let unsafe_name = trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed
            .chars()
            .any(|c| c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'));
    if unsafe_name {
        return Err(QuizError::InvalidUsername(username.to_owned()));
    }
    Ok(trimmed)
}

/// Per-user saved results under an application data root: `<root>/<username>/<id>.sav`.
#[derive(Debug, Clone)]
pub struct ResultStore<S> {
    storage: S,
    root: PathBuf,
}

impl<S: Storage> ResultStore<S> {
    pub fn new(storage: S, root: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn user_dir(&self, username: &str) -> PathBuf {
        self.root.join(username)
    }

    /// Creates the application data root. Failing here is fatal for the program.
    pub async fn init(&self) -> Result<()> {
        self.storage
            .ensure_directory(&self.root)
            .await
            .map_err(|source| QuizError::AppDataRoot {
                path: self.root.clone(),
                source,
            })
    }

    pub async fn has_records(&self, username: &str) -> bool {
        match validate_username(username) {
            Ok(username) => self.storage.exists(&self.user_dir(username)).await,
            Err(_) => false,
        }
    }

    #[instrument(level = "info", skip(self, log), fields(entries = log.len()))]
    pub async fn save(&self, username: &str, log: &ResultLog, id: RecordId) -> Result<RecordId> {
        let username = validate_username(username)?;
        let dir = self.user_dir(username);
        self.storage.ensure_directory(&dir).await?;

        let content = log.serialize()?;
        let mut id = id;
        for _ in 0..NAME_ATTEMPTS {
            let path = dir.join(id.file_name());
            match self.storage.write_text(&path, &content).await {
                Ok(()) => {
                    tracing::info!(path = %path.display(), score = log.score(), "Saved quiz results");
                    return Ok(id);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::warn!(path = %path.display(), "Record name already taken, trying the next second");
                    id = id
                        .following()
                        .ok_or_else(|| QuizError::InvalidRecordName(id.to_string()))?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free record name after {NAME_ATTEMPTS} attempts"),
        )
        .into())
    }

    /// Most recent first. A user without a results folder simply has no records.
    #[instrument(level = "debug", skip(self))]
    pub async fn list(&self, username: &str) -> Result<Vec<RecordSummary>> {
        let username = validate_username(username)?;
        let names = match self.storage.list_files(&self.user_dir(username)).await {
            Ok(names) => names,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records: Vec<RecordSummary> = names
            .iter()
            .filter_map(|name| match RecordId::from_file_name(name) {
                Ok(id) => Some(RecordSummary {
                    id,
                    label: id.label(),
                }),
                Err(e) => {
                    tracing::warn!(%name, error = %e, "Skipping unrecognised file in results folder");
                    None
                }
            })
            .collect();
        records.sort_by(|a, b| b.id.cmp(&a.id));

        tracing::debug!(count = records.len(), "Listed saved results");
        Ok(records)
    }

    #[instrument(level = "info", skip(self))]
    pub async fn load(&self, username: &str, id: &RecordId) -> Result<ResultRecord> {
        let username = validate_username(username)?;
        let path = self.user_dir(username).join(id.file_name());
        let record_name = format!("{username}/{}", id.file_name());

        let content = self.storage.read_text(&path).await?;
        let line = content
            .lines()
            .next()
            .ok_or_else(|| QuizError::corrupted(&record_name, "record is empty"))?;
        let entries: Vec<ResultEntry> = serde_json::from_str(line).map_err(|e| {
            tracing::warn!(record = %record_name, error = %e, "Corrupted record");
            QuizError::corrupted(&record_name, e)
        })?;
        if entries.is_empty() {
            return Err(QuizError::corrupted(&record_name, "record holds no entries"));
        }

        Ok(ResultRecord {
            username: username.to_owned(),
            id: *id,
            entries,
        })
    }
}
