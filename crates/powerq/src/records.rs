//! Domain records decoded from power-query responses.
//!
//! Each record mirrors the flat JSON shape the server exports. Fields the
//! server may omit are optional; unknown fields in the payload are ignored
//! so schema additions on the server side do not break decoding. Records
//! are only ever constructed by the response decoder.

use serde::{Deserialize, Serialize};

/// One section of a course, as returned by the section queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSection {
    /// Business-facing course number (e.g. "101")
    pub course_number: String,
    /// Course display name
    pub course_name: String,
    /// Period expression the section meets in
    pub period: String,
    /// Room assignment, if any
    pub room: Option<String>,
    /// Current enrollment count
    pub num_students: u32,
    /// Section id
    pub id: u64,
    /// Identifier of the teacher of record
    pub teacher_id: String,
    /// Internal database id of the section
    pub dcid: u64,
    /// Section number within the course
    pub section_number: String,
}

/// One student in a teacher's homeroom roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeroomRosterEntry {
    /// Internal database id of the student
    pub student_dcid: u64,
    /// Business-facing student number
    pub student_number: String,
    /// "Last, First" display name
    pub last_first: String,
    /// First name, when exported separately
    pub first_name: Option<String>,
    /// Grade level
    pub grade_level: i32,
    /// Gender code as stored by the server
    pub gender: String,
}

/// Student summary record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Student id
    pub id: u64,
    /// Internal database id
    pub dcid: u64,
    /// Business-facing student number
    pub student_number: Option<String>,
    /// "Last, First" display name
    pub last_first: Option<String>,
    /// First name
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// Grade level
    pub grade_level: Option<i32>,
    /// Gender code
    pub gender: Option<String>,
    /// School the student is enrolled in
    pub school_id: Option<u64>,
}

/// Teacher summary record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    /// Teacher id
    pub id: u64,
    /// Internal database id
    pub dcid: u64,
    /// First name
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// Email address on file
    pub email: Option<String>,
    /// School the teacher belongs to
    pub school_id: Option<u64>,
}
