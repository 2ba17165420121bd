//! Clock and calendar skills (local wall-clock time).

use chrono::{Local, NaiveDate, NaiveTime};
use parlor_core::{Reply, UtilityIntent, UtilitySkill};
use regex::Regex;

const CLOCK_SKILL: &str = "Clock";
const CALENDAR_SKILL: &str = "Calendar";

/// `The time is HH:MM:SS.`
pub fn time_reply(now: NaiveTime) -> Reply {
    now.format("The time is %H:%M:%S.").to_string()
}

/// `Today's date is Month DD, YYYY.`
pub fn date_reply(today: NaiveDate) -> Reply {
    today.format("Today's date is %B %d, %Y.").to_string()
}

pub struct ClockSkill {
    pattern: Regex,
}

impl ClockSkill {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"\b(time|current time|what time)\b").expect("Invalid clock regex"),
        }
    }
}

impl Default for ClockSkill {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UtilitySkill for ClockSkill {
    fn name(&self) -> &str {
        CLOCK_SKILL
    }

    fn recognize(&self, normalized: &str) -> Option<UtilityIntent> {
        self.pattern.is_match(normalized).then_some(UtilityIntent::Clock)
    }

    async fn answer(&self, _intent: UtilityIntent) -> Reply {
        time_reply(Local::now().time())
    }
}

pub struct CalendarSkill {
    pattern: Regex,
}

impl CalendarSkill {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"\b(date|today'?s date)\b").expect("Invalid calendar regex"),
        }
    }
}

impl Default for CalendarSkill {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UtilitySkill for CalendarSkill {
    fn name(&self) -> &str {
        CALENDAR_SKILL
    }

    fn recognize(&self, normalized: &str) -> Option<UtilityIntent> {
        self.pattern
            .is_match(normalized)
            .then_some(UtilityIntent::Calendar)
    }

    async fn answer(&self, _intent: UtilityIntent) -> Reply {
        date_reply(Local::now().date_naive())
    }
}
