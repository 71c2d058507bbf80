use super::schema::*;
use chrono::{DateTime, offset::Utc};
use serde::{Serialize, Deserialize};

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_SOLVED: &str = "SOLVED";
pub const STATUS_SKIPPED: &str = "SKIPPED";
pub const STATUS_REVIEWED: &str = "REVIEWED";

/// The sole criterion of mastery.
pub fn is_mastered(status: &str) -> bool {
    status == STATUS_SOLVED
}

#[derive(Insertable)]
#[table_name="users"]
pub struct NewUser<'a> {
    pub email: &'a str,
}

#[derive(Identifiable, Clone, Queryable, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[table_name="users"]
pub struct User {
    pub id: i32,
    pub email: String,
    pub joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Insertable, Debug)]
#[table_name="subjects"]
pub struct NewSubject<'a> {
    pub user_id: i32,
    pub name: &'a str,
    pub color: &'a str,
    pub icon: &'a str,
}

#[derive(Identifiable, Clone, Queryable, Associations, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[belongs_to(User, foreign_key = "user_id")]
#[table_name="subjects"]
pub struct Subject {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[table_name="questions"]
pub struct NewQuestion<'a> {
    pub user_id: i32,
    pub subject_id: i32,
    pub title: &'a str,
    pub text: &'a str,
    pub answer: &'a str,
    pub notes: &'a str,
    pub difficulty: &'a str,
    pub status: &'a str,
}

#[derive(Identifiable, Clone, Queryable, Associations, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[belongs_to(User, foreign_key = "user_id")]
#[belongs_to(Subject, foreign_key = "subject_id")]
#[table_name="questions"]
pub struct Question {
    pub id: i32,
    pub user_id: i32,
    pub subject_id: i32,
    pub title: String,
    pub text: String,
    pub answer: String,
    pub notes: String,
    pub difficulty: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub repetitions: i32,
    pub interval_days: i32,
    pub ease: f32,
    pub next_review: DateTime<Utc>,
    pub last_reviewed: Option<DateTime<Utc>>,
}

impl Question {
    pub fn is_mastered(&self) -> bool {
        is_mastered(&self.status)
    }
}

/// The scheduling columns that a review rewrites.
#[derive(AsChangeset, Debug, Clone, PartialEq)]
#[table_name="questions"]
pub struct ReviewUpdate<'a> {
    pub status: &'a str,
    pub repetitions: i32,
    pub interval_days: i32,
    pub ease: f32,
    pub next_review: DateTime<Utc>,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[table_name="question_images"]
pub struct NewQuestionImage<'a> {
    pub user_id: i32,
    pub url: &'a str,
}

#[derive(Identifiable, Clone, Queryable, Associations, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[belongs_to(Question, foreign_key = "question_id")]
#[table_name="question_images"]
pub struct QuestionImage {
    pub id: i32,
    pub user_id: i32,
    pub question_id: Option<i32>,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[table_name="review_logs"]
pub struct NewReviewLog<'a> {
    pub user_id: i32,
    pub question_id: i32,
    pub rating: &'a str,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Identifiable, Queryable, Associations, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[belongs_to(Question, foreign_key = "question_id")]
#[table_name="review_logs"]
pub struct ReviewLog {
    pub id: i32,
    pub user_id: i32,
    pub question_id: i32,
    pub rating: String,
    pub reviewed_at: DateTime<Utc>,
}

/// A question together with its subject and attached images, as the API returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionWithRelations {
    #[serde(flatten)]
    pub question: Question,
    pub subject: Option<Subject>,
    pub images: Vec<QuestionImage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Pagination {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Pagination { total, page, limit, total_pages }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).max(0).saturating_mul(self.limit)
    }
}

#[test]
fn test_pagination() {
    let p = Pagination::new(21, 3, 10);
    assert_eq!(p.total_pages, 3);
    assert_eq!(p.offset(), 20);

    let p = Pagination::new(0, 1, 10);
    assert_eq!(p.total_pages, 0);
    assert_eq!(p.offset(), 0);

    let p = Pagination::new(20, 1, 10);
    assert_eq!(p.total_pages, 2);

    let p = Pagination::new(0, i64::MAX, 100);
    assert_eq!(p.offset(), i64::MAX);
}

#[test]
fn test_mastered_status() {
    assert!(is_mastered(STATUS_SOLVED));
    assert!(!is_mastered(STATUS_PENDING));
    assert!(!is_mastered(STATUS_REVIEWED));
    assert!(!is_mastered(STATUS_SKIPPED));
    assert!(!is_mastered("solved"));
}
