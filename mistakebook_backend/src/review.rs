//! Spaced-repetition review: which questions are due, and how a rating
//! moves a question's schedule (SM-2).

use super::*;
use crate::period::{self, DateRange};
use chrono::{DateTime, Duration, Local, Utc};
use diesel::Connection as _;
use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_DUE_LIMIT: i64 = 20;
pub const MIN_EASE: f32 = 1.3;
pub const INITIAL_EASE: f32 = 2.5;
pub const MASTERED_INTERVAL_DAYS: i32 = 21;
/// About a hundred years; keeps `next_review` inside the representable date range.
pub const MAX_INTERVAL_DAYS: i32 = 36_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }

    /// The SM-2 response quality, 0 to 5.
    pub fn quality(&self) -> u8 {
        match *self {
            Rating::Again => 1,
            Rating::Hard => 3,
            Rating::Good => 4,
            Rating::Easy => 5,
        }
    }
}

impl FromStr for Rating {
    type Err = Error;

    fn from_str(s: &str) -> Result<Rating> {
        match s {
            "again" => Ok(Rating::Again),
            "hard" => Ok(Rating::Hard),
            "good" => Ok(Rating::Good),
            "easy" => Ok(Rating::Easy),
            other => Err(ErrorKind::InvalidInput(format!("unknown rating {:?}", other)).into()),
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    pub repetitions: i32,
    pub interval_days: i32,
    pub ease: f32,
}

impl Default for Schedule {
    fn default() -> Schedule {
        Schedule { repetitions: 0, interval_days: 0, ease: INITIAL_EASE }
    }
}

impl<'a> From<&'a Question> for Schedule {
    fn from(q: &Question) -> Schedule {
        Schedule { repetitions: q.repetitions, interval_days: q.interval_days, ease: q.ease }
    }
}

pub fn reschedule(prev: Schedule, rating: Rating) -> Schedule {
    let q = f32::from(rating.quality());
    let ease = (prev.ease + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02))).max(MIN_EASE);

    if rating == Rating::Again {
        return Schedule { repetitions: 0, interval_days: 0, ease };
    }

    let repetitions = prev.repetitions + 1;
    let interval_days = match repetitions {
        1 => 1,
        2 => 6,
        _ => ((prev.interval_days as f32 * ease).round() as i32).min(MAX_INTERVAL_DAYS),
    };
    Schedule { repetitions, interval_days, ease }
}

pub fn status_after(rating: Rating, schedule: &Schedule) -> &'static str {
    match rating {
        Rating::Again => STATUS_PENDING,
        Rating::Easy => STATUS_SOLVED,
        _ if schedule.interval_days >= MASTERED_INTERVAL_DAYS => STATUS_SOLVED,
        _ => STATUS_REVIEWED,
    }
}

pub fn next_review_at(now: DateTime<Utc>, schedule: &Schedule) -> Option<DateTime<Utc>> {
    now.checked_add_signed(Duration::days(i64::from(schedule.interval_days)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewForm {
    pub question_id: i32,
    pub difficulty: Rating,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub question: Question,
    pub rating: Rating,
    pub mastered: bool,
}

/// Questions that are not mastered and fall due by the end of `today`, the longest overdue first.
pub fn due_questions(conn: &PgConnection,
                     user_id: i32,
                     subject_id: Option<i32>,
                     page: i64,
                     limit: i64,
                     now: DateTime<Local>)
                     -> Result<(Vec<QuestionWithRelations>, Pagination)> {

    use crate::schema::questions;

    let due_by = period::local_to_utc(period::end_of_day(now.naive_local().date()));

    let filtered = || {
        let mut query = questions::table
            .filter(questions::user_id.eq(user_id))
            .filter(questions::status.ne(STATUS_SOLVED))
            .filter(questions::next_review.le(due_by))
            .into_boxed();
        if let Some(subject_id) = subject_id {
            query = query.filter(questions::subject_id.eq(subject_id));
        }
        query
    };

    let total: i64 = filtered().count().get_result(conn)?;
    let pagination = Pagination::new(total, page, limit);

    let due: Vec<Question> = filtered()
        .order((questions::next_review.asc(), questions::id.asc()))
        .limit(pagination.limit)
        .offset(pagination.offset())
        .load(conn)?;

    Ok((question::with_relations(conn, user_id, due)?, pagination))
}

pub fn submit(conn: &PgConnection, user_id: i32, form: ReviewForm, now: DateTime<Utc>) -> Result<ReviewOutcome> {
    use crate::schema::{questions, review_logs};

    let rating = form.difficulty;

    let question = conn.transaction::<_, Error, _>(|| {
        let question: Option<Question> = questions::table
            .filter(questions::id.eq(form.question_id))
            .filter(questions::user_id.eq(user_id))
            .for_update()
            .get_result(conn)
            .optional()?;

        let question = try_or!(question, else bail!(ErrorKind::NoSuchQuestion(form.question_id)));

        let schedule = reschedule(Schedule::from(&question), rating);
        let next_review = try_or!(next_review_at(now, &schedule),
            else bail!(ErrorKind::DatabaseOdd("The next review date is out of range.")));
        let update = ReviewUpdate {
            status: status_after(rating, &schedule),
            repetitions: schedule.repetitions,
            interval_days: schedule.interval_days,
            ease: schedule.ease,
            next_review,
            last_reviewed: Some(now),
            updated_at: now,
        };

        let question: Question = diesel::update(questions::table.filter(questions::id.eq(question.id)))
            .set(&update)
            .get_result(conn)
            .chain_err(|| "Couldn't update the question schedule!")?;

        diesel::insert_into(review_logs::table)
            .values(&NewReviewLog {
                user_id,
                question_id: question.id,
                rating: rating.as_str(),
                reviewed_at: now,
            })
            .execute(conn)
            .chain_err(|| "Couldn't write the review log!")?;

        Ok(question)
    })?;

    debug!("User {} rated question {} {}; next review in {} days, status {}.",
        user_id, question.id, rating, question.interval_days, question.status);

    Ok(ReviewOutcome { mastered: question.is_mastered(), question, rating })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStats {
    pub due_today: i64,
    pub reviewed_today: i64,
    pub mastered_total: i64,
    pub total_questions: i64,
}

pub fn learning_stats(conn: &PgConnection, user_id: i32, now: DateTime<Local>) -> Result<LearningStats> {
    use crate::schema::{questions, review_logs};

    let today = now.naive_local().date();
    let today_range = DateRange::days(today, today);

    let due_today: i64 = questions::table
        .filter(questions::user_id.eq(user_id))
        .filter(questions::status.ne(STATUS_SOLVED))
        .filter(questions::next_review.le(today_range.end))
        .count()
        .get_result(conn)?;

    let reviewed_today: i64 = review_logs::table
        .filter(review_logs::user_id.eq(user_id))
        .filter(review_logs::reviewed_at.ge(today_range.start))
        .filter(review_logs::reviewed_at.le(today_range.end))
        .count()
        .get_result(conn)?;

    let mastered_total: i64 = questions::table
        .filter(questions::user_id.eq(user_id))
        .filter(questions::status.eq(STATUS_SOLVED))
        .count()
        .get_result(conn)?;

    let total_questions: i64 = questions::table
        .filter(questions::user_id.eq(user_id))
        .count()
        .get_result(conn)?;

    Ok(LearningStats { due_today, reviewed_today, mastered_total, total_questions })
}

#[cfg(test)]
fn assert_close(a: f32, b: f32) {
    assert!((a - b).abs() < 1e-4, "{} != {}", a, b);
}

#[test]
fn test_rating_parsing() {
    assert_eq!("again".parse::<Rating>().unwrap(), Rating::Again);
    assert_eq!("easy".parse::<Rating>().unwrap(), Rating::Easy);
    assert!("Easy".parse::<Rating>().is_err());
    assert!("".parse::<Rating>().is_err());
    let form: ReviewForm = serde_json::from_str(r#"{"questionId": 7, "difficulty": "hard"}"#).unwrap();
    assert_eq!(form, ReviewForm { question_id: 7, difficulty: Rating::Hard });
    assert!(serde_json::from_str::<ReviewForm>(r#"{"questionId": 7, "difficulty": "meh"}"#).is_err());
}

#[test]
fn test_first_and_second_success() {
    let first = reschedule(Schedule::default(), Rating::Good);
    assert_eq!(first.repetitions, 1);
    assert_eq!(first.interval_days, 1);
    assert_close(first.ease, 2.5);

    let second = reschedule(first, Rating::Good);
    assert_eq!(second.repetitions, 2);
    assert_eq!(second.interval_days, 6);

    let third = reschedule(second, Rating::Good);
    assert_eq!(third.repetitions, 3);
    assert_eq!(third.interval_days, 15);
}

#[test]
fn test_ease_adjustments() {
    assert_close(reschedule(Schedule::default(), Rating::Easy).ease, 2.6);
    assert_close(reschedule(Schedule::default(), Rating::Hard).ease, 2.36);
    assert_close(reschedule(Schedule::default(), Rating::Again).ease, 1.96);
    let floor = Schedule { repetitions: 4, interval_days: 10, ease: 1.3 };
    assert_close(reschedule(floor, Rating::Again).ease, MIN_EASE);
    assert_close(reschedule(floor, Rating::Hard).ease, MIN_EASE);
}

#[test]
fn test_again_resets() {
    let prev = Schedule { repetitions: 5, interval_days: 40, ease: 2.2 };
    let next = reschedule(prev, Rating::Again);
    assert_eq!(next.repetitions, 0);
    assert_eq!(next.interval_days, 0);
    assert_eq!(status_after(Rating::Again, &next), STATUS_PENDING);
}

#[test]
fn test_status_after_review() {
    let short = Schedule { repetitions: 1, interval_days: 1, ease: 2.5 };
    let long = Schedule { repetitions: 4, interval_days: 21, ease: 2.5 };
    assert_eq!(status_after(Rating::Good, &short), STATUS_REVIEWED);
    assert_eq!(status_after(Rating::Hard, &short), STATUS_REVIEWED);
    assert_eq!(status_after(Rating::Easy, &short), STATUS_SOLVED);
    assert_eq!(status_after(Rating::Good, &long), STATUS_SOLVED);
}

#[test]
fn test_repeated_ratings_stay_bounded() {
    let now = Utc::now();
    for &rating in &[Rating::Easy, Rating::Good, Rating::Hard] {
        let mut schedule = Schedule::default();
        for _ in 0..40 {
            schedule = reschedule(schedule, rating);
            assert!(schedule.interval_days >= 0);
            assert!(schedule.interval_days <= MAX_INTERVAL_DAYS);
            assert!(next_review_at(now, &schedule).is_some());
        }
    }
    let mut schedule = Schedule::default();
    for _ in 0..40 {
        schedule = reschedule(schedule, Rating::Easy);
    }
    assert_eq!(schedule.interval_days, MAX_INTERVAL_DAYS);

    let stored = Schedule { repetitions: 9, interval_days: i32::MAX, ease: 2.5 };
    assert_eq!(reschedule(stored, Rating::Good).interval_days, MAX_INTERVAL_DAYS);
}
