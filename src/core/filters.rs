use crate::core::periods::window_start;
use crate::domain::model::BreachReport;
use chrono::NaiveDate;

impl BreachReport {
    /// Keeps records of one covered-entity type; `None` keeps everything.
    pub fn by_entity_type(self, entity_type: Option<&str>) -> Self {
        match entity_type {
            Some(entity) => self.retain(|r| r.entity_type == entity),
            None => self,
        }
    }

    /// Inclusive date bounds. Undated records are always dropped.
    pub fn by_date_range(self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.retain(|r| match r.submission_date {
            Some(date) => start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e),
            None => false,
        })
    }

    pub fn dated_only(self) -> Self {
        self.by_date_range(None, None)
    }

    pub fn hacking_only(self) -> Self {
        self.retain(|r| r.breach_type.contains("Hacking"))
    }

    /// Keeps the `months` most recent months relative to the latest dated record.
    pub fn recent_months(self, months: u32) -> Self {
        match self.date_span() {
            Some((_, latest)) => {
                let start = window_start(latest, months);
                self.by_date_range(Some(start), None)
            }
            None => self,
        }
    }

    fn retain(mut self, keep: impl Fn(&crate::domain::model::BreachRecord) -> bool) -> Self {
        self.records.retain(|r| keep(r));
        self
    }
}
