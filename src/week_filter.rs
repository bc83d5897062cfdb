use lazy_static::*;
use regex::Regex;

// Leading integer of a token, the way a lenient integer parse reads "15abc" as 15
const LEADING_INT_REGEX: &str = r"^\s*([+-]?[0-9]+)";

lazy_static! {
    static ref LEADING_INT_RE: Regex = Regex::new(LEADING_INT_REGEX).unwrap();
}

/// Outcome of checking a week against week-range notation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WeekMembership {
    Inside,
    Outside,
    /// No week info to check against
    Unknown,
}

impl WeekMembership {
    /// Only an explicit miss removes a course; unknown keeps it.
    pub fn excludes(&self) -> bool {
        *self == WeekMembership::Outside
    }
}

fn leading_int(token: &str) -> Option<i64> {
    LEADING_INT_RE.captures(token)?.get(1)?.as_str().parse().ok()
}

/// Checks `week` against notation like `1-15;17-17` or `3;5;9-12`.
pub fn check_week(week_info: &str, week: i32) -> WeekMembership {
    if week_info.trim().is_empty() {
        return WeekMembership::Unknown;
    }

    let week = week as i64;

    for range in week_info.split(';').map(|part| part.trim()) {
        let hit = if range.contains('-') {
            let mut bounds = range.split('-').map(|s| s.trim());
            let start = bounds.next().and_then(leading_int);
            let end = bounds.next().and_then(leading_int);

            matches!((start, end), (Some(start), Some(end)) if start <= week && week <= end)
        } else {
            leading_int(range) == Some(week)
        };

        if hit {
            return WeekMembership::Inside;
        }
    }

    WeekMembership::Outside
}

/// Week check for an optional week field; a missing field is unknown.
pub fn check_course_week(week_info: Option<&str>, week: i32) -> WeekMembership {
    match week_info {
        Some(info) => check_week(info, week),
        None => WeekMembership::Unknown,
    }
}
