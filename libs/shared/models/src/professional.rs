use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::time_of_day;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    #[default]
    Free,
    Trial,
    Premium,
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionPlan::Free => write!(f, "free"),
            SubscriptionPlan::Trial => write!(f, "trial"),
            SubscriptionPlan::Premium => write!(f, "premium"),
        }
    }
}

/// Working hours for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRule {
    #[serde(with = "time_of_day")]
    pub start: NaiveTime,
    #[serde(with = "time_of_day")]
    pub end: NaiveTime,
    #[serde(default)]
    pub active: bool,
}

impl DayRule {
    pub fn new(start: NaiveTime, end: NaiveTime, active: bool) -> Self {
        Self { start, end, active }
    }
}

impl Default for DayRule {
    fn default() -> Self {
        Self {
            start: NaiveTime::MIN,
            end: NaiveTime::MIN,
            active: false,
        }
    }
}

/// Per-weekday working hours as stored in the professional's `availability` column.
/// Missing weekdays deserialize as inactive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyAvailability {
    pub monday: DayRule,
    pub tuesday: DayRule,
    pub wednesday: DayRule,
    pub thursday: DayRule,
    pub friday: DayRule,
    pub saturday: DayRule,
    pub sunday: DayRule,
}

impl WeeklyAvailability {
    pub fn rule_for(&self, weekday: Weekday) -> &DayRule {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn with_rule(mut self, weekday: Weekday, rule: DayRule) -> Self {
        let slot = match weekday {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        };
        *slot = rule;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub whatsapp: Option<String>,
    pub availability: Option<WeeklyAvailability>,
    #[serde(default)]
    pub plan: SubscriptionPlan,
    pub subscription_status: Option<String>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub monthly_appointment_count: i32,
}

impl Professional {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("")
    }

    pub fn weekly_availability(&self) -> WeeklyAvailability {
        self.availability.clone().unwrap_or_default()
    }

    /// The plan that governs limits right now; an expired trial counts as free.
    pub fn effective_plan(&self, now: DateTime<Utc>) -> SubscriptionPlan {
        match self.plan {
            SubscriptionPlan::Trial => match self.trial_ends_at {
                Some(ends_at) if ends_at <= now => SubscriptionPlan::Free,
                _ => SubscriptionPlan::Trial,
            },
            plan => plan,
        }
    }
}
