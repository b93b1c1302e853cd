//! Roster queries
//!
//! `RosterService` is the only surface the outer layers call. It resolves a
//! division to its files, pulls sheets through the shared cache and runs the
//! duty, head and group scans over them. "Nothing here for this lookup"
//! conditions come back as empty results; only I/O failures and unknown
//! divisions surface as errors.

mod duty;
mod group;
mod head;

pub use duty::{duty_entries, duty_entries_at, duty_month, parse_duty_cell};
pub use group::group_members;
pub use head::{head_entries, head_names};

use crate::analyzer::{analyze_schedule, ScheduleAnalysis};
use crate::cache::SpreadsheetCache;
use crate::config::{DivisionConfig, RosterConfig};
use crate::error::{RosterError, RosterResult};
use crate::header::Month;
use crate::reader::ScheduleReader;
use crate::types::{RosterEntry, UserSchedule};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Entries active at `minute`: today's shifts covering it plus yesterday's
/// overnight shifts still running after midnight.
pub fn select_active(
    today: &[RosterEntry],
    yesterday: &[RosterEntry],
    minute: u16,
) -> Vec<RosterEntry> {
    let carried = yesterday
        .iter()
        .filter(|e| e.time.map(|t| t.covers_spillover(minute)).unwrap_or(false));
    let current = today
        .iter()
        .filter(|e| e.time.map(|t| t.covers(minute)).unwrap_or(false));
    carried.chain(current).cloned().collect()
}

fn month_of(date: NaiveDate) -> RosterResult<Month> {
    Month::from_number(date.month()).ok_or_else(|| RosterError::DateNotFound(date.to_string()))
}

fn minute_of_day(now: NaiveDateTime) -> u16 {
    (now.hour() * 60 + now.minute()) as u16
}

pub struct RosterService {
    config: RosterConfig,
    cache: Arc<SpreadsheetCache>,
}

impl RosterService {
    pub fn new(config: RosterConfig, cache: Arc<SpreadsheetCache>) -> Self {
        Self { config, cache }
    }

    /// Service with its own cache sized from the config.
    pub fn from_config(config: RosterConfig) -> Self {
        let cache = Arc::new(SpreadsheetCache::new(config.cache.to_options()));
        Self::new(config, cache)
    }

    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<SpreadsheetCache> {
        &self.cache
    }

    /// Drop cached sheets of a replaced file.
    pub fn invalidate(&self, path: &Path) -> usize {
        self.cache.invalidate(path)
    }

    //--------------------------------------------------------------------------
    // Schedules
    //--------------------------------------------------------------------------

    pub async fn get_user_schedule(
        &self,
        name: &str,
        month: Month,
        division: &str,
    ) -> RosterResult<UserSchedule> {
        let division_config = self.config.division(division)?;
        let Some(reader) = self.schedule_reader(division_config).await? else {
            return Ok(UserSchedule::empty(month));
        };
        match reader.extract_user_schedule(name, month) {
            Ok(schedule) => Ok(schedule),
            Err(e) if e.is_lookup_miss() => {
                debug!(name, %month, division, "schedule lookup miss: {}", e);
                Ok(UserSchedule::empty(month))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn analyze_user_month(
        &self,
        name: &str,
        month: Month,
        division: &str,
    ) -> RosterResult<(UserSchedule, ScheduleAnalysis)> {
        let schedule = self.get_user_schedule(name, month, division).await?;
        let analysis = analyze_schedule(&schedule);
        Ok((schedule, analysis))
    }

    //--------------------------------------------------------------------------
    // Duty roster
    //--------------------------------------------------------------------------

    pub async fn get_duties_for_date(
        &self,
        date: NaiveDate,
        division: &str,
    ) -> RosterResult<Vec<RosterEntry>> {
        let month = month_of(date)?;
        let division_config = self.config.division(division)?;
        let sheet = division_config.duty_sheet(month);
        let Some(reader) = self
            .roster_reader(division_config.duty_file.as_deref(), &sheet)
            .await?
        else {
            return Ok(Vec::new());
        };
        Ok(duty_entries(&reader, month, date.day() as u8))
    }

    pub async fn get_duties_for_month(
        &self,
        date: NaiveDate,
        division: &str,
    ) -> RosterResult<BTreeMap<u8, Vec<RosterEntry>>> {
        let month = month_of(date)?;
        let division_config = self.config.division(division)?;
        let sheet = division_config.duty_sheet(month);
        let Some(reader) = self
            .roster_reader(division_config.duty_file.as_deref(), &sheet)
            .await?
        else {
            return Ok(BTreeMap::new());
        };
        Ok(duty_month(&reader, month))
    }

    pub async fn active_duties(
        &self,
        now: NaiveDateTime,
        division: &str,
    ) -> RosterResult<Vec<RosterEntry>> {
        let today = self.get_duties_for_date(now.date(), division).await?;
        let yesterday = match now.date().pred_opt() {
            Some(date) => self.get_duties_for_date(date, division).await?,
            None => Vec::new(),
        };
        Ok(select_active(&today, &yesterday, minute_of_day(now)))
    }

    //--------------------------------------------------------------------------
    // Head roster
    //--------------------------------------------------------------------------

    pub async fn get_heads_for_date(
        &self,
        date: NaiveDate,
        division: &str,
    ) -> RosterResult<Vec<RosterEntry>> {
        let month = month_of(date)?;
        let division_config = self.config.division(division)?;
        let sheet = division_config.head_sheet(month);
        let Some(reader) = self.roster_reader(division_config.head_path(), &sheet).await? else {
            return Ok(Vec::new());
        };
        Ok(head_entries(&reader, month, date.day() as u8))
    }

    pub async fn active_heads(
        &self,
        now: NaiveDateTime,
        division: &str,
    ) -> RosterResult<Vec<RosterEntry>> {
        let today = self.get_heads_for_date(now.date(), division).await?;
        let yesterday = match now.date().pred_opt() {
            Some(date) => self.get_heads_for_date(date, division).await?,
            None => Vec::new(),
        };
        Ok(select_active(&today, &yesterday, minute_of_day(now)))
    }

    //--------------------------------------------------------------------------
    // Groups
    //--------------------------------------------------------------------------

    pub async fn get_group_members(
        &self,
        head_name: &str,
        date: NaiveDate,
        division: &str,
    ) -> RosterResult<Vec<RosterEntry>> {
        let month = month_of(date)?;
        let division_config = self.config.division(division)?;
        let Some(schedule) = self.schedule_reader(division_config).await? else {
            return Ok(Vec::new());
        };
        let sheet = division_config.head_sheet(month);
        let known_heads = match self.roster_reader(division_config.head_path(), &sheet).await? {
            Some(heads) => head_names(&heads),
            None => HashSet::new(),
        };
        Ok(group_members(
            &schedule,
            head_name,
            &known_heads,
            month,
            date.day() as u8,
        ))
    }

    /// Load every schedule sheet of a division so later queries hit the cache.
    pub async fn warm(&self, division: &str) -> RosterResult<usize> {
        let division_config = self.config.division(division)?;
        Ok(match self.schedule_reader(division_config).await? {
            Some(reader) => reader.named_rows().len(),
            None => 0,
        })
    }

    //--------------------------------------------------------------------------
    // Sheet access
    //--------------------------------------------------------------------------

    /// The division's schedule sheet. Its absence is unexpected: warn and
    /// degrade to an empty result.
    async fn schedule_reader(
        &self,
        division: &DivisionConfig,
    ) -> RosterResult<Option<ScheduleReader>> {
        match self
            .cache
            .get_entry(&division.schedule_file, &division.schedule_sheet)
            .await
        {
            Ok(entry) => Ok(Some(ScheduleReader::from_entry(entry))),
            Err(RosterError::SheetNotFound { path, sheet }) => {
                warn!(path = %path.display(), sheet = %sheet, "schedule sheet missing");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// A per-month roster sheet. Months nobody worked have no sheet, which
    /// is expected.
    async fn roster_reader(
        &self,
        path: Option<&Path>,
        sheet: &str,
    ) -> RosterResult<Option<ScheduleReader>> {
        let Some(path) = path else {
            debug!(sheet, "no roster file configured");
            return Ok(None);
        };
        match self.cache.get_entry(path, sheet).await {
            Ok(entry) => Ok(Some(ScheduleReader::from_entry(entry))),
            Err(RosterError::SheetNotFound { path, sheet }) => {
                debug!(path = %path.display(), sheet = %sheet, "roster sheet absent");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
