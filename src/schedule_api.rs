use crate::error::*;
use ::serde::*;
use lazy_static::*;
use log::debug;
use regex::Regex;
use serde_json::{Map, Value};

// "Thứ 2" .. "Thứ 8", matched anywhere in the day token
const DAY_REGEX: &str = r"(?i)Thứ ([0-9]+)";
const PERIOD_RANGE_REGEX: &str = r"([0-9]+)-([0-9]+)";
const FIRST_INT_REGEX: &str = r"([0-9]+)";

const SESSION_SEPARATOR: char = ';';
const FIELD_SEPARATORS: [char; 2] = [',', ':'];

/// Key holding the row sequence number in every dialect
pub const ROW_SEQUENCE_KEY: &str = "TT";

lazy_static! {
    static ref DAY_RE: Regex = Regex::new(DAY_REGEX).unwrap();
    static ref PERIOD_RANGE_RE: Regex = Regex::new(PERIOD_RANGE_REGEX).unwrap();
    static ref FIRST_INT_RE: Regex = Regex::new(FIRST_INT_REGEX).unwrap();
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub day: i32,
    pub start_period: i32,
    pub end_period: i32,
    pub room: String,
}

impl Session {
    pub fn new(day: i32, start_period: i32, end_period: i32, room: &str) -> Self {
        Session {
            day,
            start_period,
            end_period,
            room: room.to_string(),
        }
    }

    /// Inclusive period overlap with another session on the same day.
    pub fn overlap(&self, other: &Session) -> Option<(i32, i32)> {
        if self.day != other.day {
            return None;
        }

        let start = self.start_period.max(other.start_period);
        let end = self.end_period.min(other.end_period);

        if start <= end {
            Some((start, end))
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    course_code: String,
    course_name: String,
    teacher: String,
    room: String,
    schedule: Session,
    session_index: usize,
    week_info: Option<String>,
}

impl Course {
    pub fn new(
        course_code: &str,
        course_name: &str,
        teacher: &str,
        schedule: Session,
        session_index: usize,
        week_info: Option<String>,
    ) -> Self {
        Course {
            course_code: course_code.to_string(),
            course_name: course_name.to_string(),
            teacher: teacher.to_string(),
            room: schedule.room.clone(),
            schedule,
            session_index,
            week_info,
        }
    }

    /// Identity key of the `session_index`th session of a row.
    pub fn create_identifier(row_sequence: &str, session_index: usize) -> String {
        if session_index > 0 {
            format!("{}_{}", row_sequence, session_index)
        } else {
            row_sequence.to_string()
        }
    }

    pub fn get_course_code(&self) -> &String {
        &self.course_code
    }

    pub fn get_course_name(&self) -> &String {
        &self.course_name
    }

    pub fn get_teacher(&self) -> &String {
        &self.teacher
    }

    pub fn get_room(&self) -> &String {
        &self.room
    }

    pub fn get_schedule(&self) -> &Session {
        &self.schedule
    }

    pub fn get_session_index(&self) -> usize {
        self.session_index
    }

    pub fn get_week_info(&self) -> Option<&str> {
        self.week_info.as_deref()
    }
}

/// The two header dialects a timetable export can arrive in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchemaKind {
    /// Registration page with named business columns
    Canonical,
    /// Survey/registration export where the schedule columns carry no header
    /// and fall back to positional `Column_N` names
    SurveyExport,
}

/// Field names to read, per schema.
pub struct FieldKeys {
    pub code: &'static str,
    pub name: &'static str,
    pub teacher: &'static str,
    pub schedule: &'static str,
    pub weeks: &'static str,
}

const CANONICAL_KEYS: FieldKeys = FieldKeys {
    code: "Mã lớp học phần",
    name: "Tên lớp học phần",
    teacher: "Giảng viên",
    schedule: "Thời khóa biểu",
    weeks: "Tuần học",
};

const SURVEY_EXPORT_KEYS: FieldKeys = FieldKeys {
    code: "Thông tin lớp học phần",
    name: "Khảo sát ý kiến cuối học kỳ",
    teacher: "Column_7",
    schedule: "Column_8",
    weeks: "Column_9",
};

impl SchemaKind {
    /// Looks at the first row only. Presence of both the 7th and 8th
    /// positional fallback columns selects the survey export dialect.
    pub fn detect(rows: &[Value]) -> SchemaKind {
        let first = rows.first().and_then(|row| row.as_object());

        match first {
            Some(row) if row.contains_key("Column_7") && row.contains_key("Column_8") => {
                SchemaKind::SurveyExport
            }
            _ => SchemaKind::Canonical,
        }
    }

    pub fn keys(&self) -> &'static FieldKeys {
        match self {
            SchemaKind::Canonical => &CANONICAL_KEYS,
            SchemaKind::SurveyExport => &SURVEY_EXPORT_KEYS,
        }
    }
}

/// Row data as handed over by the table extraction step: either the row
/// array itself or its JSON text.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RowInput {
    Text(String),
    Rows(Vec<Value>),
}

impl RowInput {
    pub fn into_rows(self) -> TkbResult<Vec<Value>> {
        match self {
            RowInput::Rows(rows) => Ok(rows),
            RowInput::Text(text) => match serde_json::from_str::<Value>(&text)? {
                Value::Array(rows) => Ok(rows),
                _ => Err(TkbError::RowsNotArray),
            },
        }
    }
}

impl From<Vec<Value>> for RowInput {
    fn from(rows: Vec<Value>) -> Self {
        RowInput::Rows(rows)
    }
}

impl From<&str> for RowInput {
    fn from(text: &str) -> Self {
        RowInput::Text(text.to_string())
    }
}

/// Courses keyed by synthetic id, kept in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CourseMap {
    entries: Vec<(String, Course)>,
}

impl CourseMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-inserting an existing id replaces the course but keeps its position.
    pub fn insert(&mut self, id: String, course: Course) {
        match self.entries.iter_mut().find(|(key, _)| *key == id) {
            Some(entry) => entry.1 = course,
            None => self.entries.push((id, course)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Course> {
        self.entries
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, course)| course)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Course)> {
        self.entries.iter().map(|(key, course)| (key, course))
    }

    pub fn into_entries(self) -> Vec<(String, Course)> {
        self.entries
    }
}

fn first_int(token: &str) -> Option<i32> {
    FIRST_INT_RE.captures(token)?.get(1)?.as_str().parse().ok()
}

/// Parses one `;`-separated segment, e.g. `Thứ 3, 1-3, B1-203`.
/// Returns `None` for anything that does not yield a full session.
pub fn parse_session(segment: &str) -> Option<Session> {
    let segment = segment.trim();
    if segment.is_empty() {
        return None;
    }

    let parts: Vec<&str> = segment.splitn(3, FIELD_SEPARATORS).collect();
    if parts.len() < 2 {
        return None;
    }

    let day: i32 = DAY_RE.captures(parts[0].trim())?.get(1)?.as_str().parse().ok()?;

    let period_part = parts[1].trim();
    let (start_period, end_period): (i32, i32) = match PERIOD_RANGE_RE.captures(period_part) {
        Some(range) => (range[1].parse().ok()?, range[2].parse().ok()?),
        None => {
            let period = first_int(period_part)?;
            (period, period)
        }
    };

    let room = parts.get(2).map(|r| r.trim()).unwrap_or("");

    Some(Session::new(day, start_period, end_period, room))
}

/// Parses a full schedule field into its sessions, in input order.
/// Malformed segments are dropped without affecting their siblings.
pub fn parse_schedule(schedule: &str) -> Vec<Session> {
    if schedule.trim().is_empty() {
        return Vec::new();
    }

    schedule
        .split(SESSION_SEPARATOR)
        .filter_map(|segment| {
            let session = parse_session(segment);
            if session.is_none() && !segment.trim().is_empty() {
                debug!("Skipping unparseable schedule segment {:?}", segment);
            }
            session
        })
        .collect()
}

/// Text form of a JSON number: integers without a fraction part.
pub fn number_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }

    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Reads a field as text. Missing, null, false and zero read as empty.
fn field_text(row: &Map<String, Value>, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => number_text(n),
        Some(Value::Bool(true)) => "true".to_string(),
        Some(other @ (Value::Array(_) | Value::Object(_))) => other.to_string(),
        _ => String::new(),
    }
}

/// Maps one row object into its courses, one per session. `None` skips the row.
fn row_to_courses(row: &Map<String, Value>, keys: &FieldKeys) -> Option<Vec<(String, Course)>> {
    let sequence = match row.get(ROW_SEQUENCE_KEY) {
        Some(Value::Number(n)) => number_text(n),
        _ => return None,
    };

    let course_code = field_text(row, keys.code);
    let course_name = field_text(row, keys.name);
    let teacher = field_text(row, keys.teacher);
    let schedule = field_text(row, keys.schedule);
    let weeks = field_text(row, keys.weeks);

    let sessions = parse_schedule(&schedule);
    if sessions.is_empty() {
        debug!("Row {} has no parseable schedule, skipping", sequence);
        return None;
    }

    let week_info = if weeks.is_empty() { None } else { Some(weeks) };

    let courses = sessions
        .into_iter()
        .enumerate()
        .map(|(i, session)| {
            let id = Course::create_identifier(&sequence, i);
            let course = Course::new(
                &course_code,
                &course_name,
                &teacher,
                session,
                i,
                week_info.clone(),
            );
            (id, course)
        })
        .collect();

    Some(courses)
}

/// Builds the course collection from already-parsed rows.
pub fn map_rows(rows: &[Value]) -> CourseMap {
    let schema = SchemaKind::detect(rows);
    let keys = schema.keys();

    debug!("Mapping {} rows as {:?}", rows.len(), schema);

    let mut courses = CourseMap::new();

    for row in rows {
        let row = match row.as_object() {
            Some(row) => row,
            None => continue,
        };

        if let Some(row_courses) = row_to_courses(row, keys) {
            for (id, course) in row_courses {
                courses.insert(id, course);
            }
        }
    }

    courses
}

/// Builds the course collection from row data in either input form.
pub fn parse_rows(input: RowInput) -> TkbResult<CourseMap> {
    let rows = input.into_rows()?;
    Ok(map_rows(&rows))
}
