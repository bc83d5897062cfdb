use crate::schedule_api::*;
use ::serde::*;

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub subjects: (String, String),
    pub codes: (String, String),
    pub day: i32,
    pub conflict_start: i32,
    pub conflict_end: i32,
}

/// Pairwise check of every course against every later one. Each overlapping
/// pair gives its own conflict; nothing is merged.
pub fn compute_conflicts(courses: &[Course]) -> Vec<Conflict> {
    let mut conflicts: Vec<Conflict> = Vec::new();

    for (i, first) in courses.iter().enumerate() {
        for second in &courses[i + 1..] {
            let overlap = first.get_schedule().overlap(second.get_schedule());

            if let Some((conflict_start, conflict_end)) = overlap {
                conflicts.push(Conflict {
                    subjects: (first.get_course_name().clone(), second.get_course_name().clone()),
                    codes: (first.get_course_code().clone(), second.get_course_code().clone()),
                    day: first.get_schedule().day,
                    conflict_start,
                    conflict_end,
                });
            }
        }
    }

    conflicts
}
