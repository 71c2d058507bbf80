use super::*;
use diesel::Connection as _;
use serde::Deserialize;
use std::collections::HashMap;

pub const DEFAULT_DIFFICULTY: &str = "3";
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clients send the difficulty either as a number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Difficulty {
    Number(serde_json::Number),
    Text(String),
}

impl Difficulty {
    pub fn into_string(self) -> String {
        match self {
            Difficulty::Number(n) => n.to_string(),
            Difficulty::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuestionForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub wrong_answer: Option<String>,
    pub right_answer: Option<String>,
    pub subject_id: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub image_ids: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidQuestion {
    pub subject_id: i32,
    pub title: String,
    pub text: String,
    pub answer: String,
    pub notes: String,
    pub difficulty: String,
    pub image_ids: Vec<i32>,
}

impl ValidQuestion {
    /// `content` becomes the text, `rightAnswer` the answer and `wrongAnswer` the notes.
    pub fn new_question(&self, user_id: i32, subject_id: i32) -> NewQuestion {
        NewQuestion {
            user_id,
            subject_id,
            title: &self.title,
            text: &self.text,
            answer: &self.answer,
            notes: &self.notes,
            difficulty: &self.difficulty,
            status: STATUS_PENDING,
        }
    }
}

impl QuestionForm {
    pub fn validate(self) -> Result<ValidQuestion> {
        let text = self.content.unwrap_or_default();
        if text.trim().is_empty() {
            bail!(ErrorKind::InvalidInput("content is required".into()));
        }
        let subject_id = match self.subject_id {
            Some(id) => id,
            None => bail!(ErrorKind::InvalidInput("subjectId is required".into())),
        };
        let difficulty = self.difficulty
            .map(Difficulty::into_string)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string());

        let mut image_ids = self.image_ids;
        image_ids.sort();
        image_ids.dedup();

        Ok(ValidQuestion {
            subject_id,
            title: self.title.map(|t| t.trim().to_string()).unwrap_or_default(),
            text,
            answer: self.right_answer.unwrap_or_default(),
            notes: self.wrong_answer.unwrap_or_default(),
            difficulty,
            image_ids,
        })
    }
}

pub const MAX_PAGE: i64 = 1_000_000;

/// `page` is between 1 and `MAX_PAGE`; `limit` is between 1 and `MAX_PAGE_SIZE`.
pub fn page_params(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1).min(MAX_PAGE);
    let limit = limit.unwrap_or(default_limit).max(1).min(MAX_PAGE_SIZE);
    (page, limit)
}

/// Creates the question and attaches its images in one transaction.
pub fn create(conn: &PgConnection, user_id: i32, q: &ValidQuestion) -> Result<QuestionWithRelations> {
    use crate::schema::questions;

    let subject = try_or!(subject::get(conn, user_id, q.subject_id)?, else bail!(ErrorKind::InvalidSubject));

    let new_question = q.new_question(user_id, subject.id);

    let (question, images) = conn.transaction::<_, Error, _>(|| {
        let question: Question = diesel::insert_into(questions::table)
            .values(&new_question)
            .get_result(conn)
            .chain_err(|| "Couldn't create a new question!")?;

        image::attach(conn, user_id, question.id, &q.image_ids)?;
        let images = image::for_question(conn, question.id)?;

        Ok((question, images))
    })?;

    info!("User {} created question {} with {} images.", user_id, question.id, images.len());

    Ok(QuestionWithRelations { question, subject: Some(subject), images })
}

/// Attaches subjects and images to loaded questions, keeping their order.
pub fn with_relations(conn: &PgConnection, user_id: i32, questions: Vec<Question>) -> Result<Vec<QuestionWithRelations>> {
    let subjects: HashMap<i32, Subject> = subject::all(conn, user_id)?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let images = image::load_for(conn, &questions)?;

    Ok(questions.into_iter()
        .zip(images)
        .map(|(question, images)| {
            let subject = subjects.get(&question.subject_id).cloned();
            QuestionWithRelations { question, subject, images }
        })
        .collect())
}

/// The user's questions, newest first, optionally of one subject only.
pub fn list(conn: &PgConnection,
            user_id: i32,
            subject_id: Option<i32>,
            page: i64,
            limit: i64)
            -> Result<(Vec<QuestionWithRelations>, Pagination)> {

    use crate::schema::questions;

    let filtered = || {
        let mut query = questions::table
            .filter(questions::user_id.eq(user_id))
            .into_boxed();
        if let Some(subject_id) = subject_id {
            query = query.filter(questions::subject_id.eq(subject_id));
        }
        query
    };

    let total: i64 = filtered().count().get_result(conn)?;
    let pagination = Pagination::new(total, page, limit);

    let questions: Vec<Question> = filtered()
        .order((questions::created_at.desc(), questions::id.desc()))
        .limit(pagination.limit)
        .offset(pagination.offset())
        .load(conn)?;

    let questions = time_it!("question::with_relations", with_relations(conn, user_id, questions))?;

    Ok((questions, pagination))
}

pub fn get(conn: &PgConnection, user_id: i32, question_id: i32) -> Result<Option<QuestionWithRelations>> {
    use crate::schema::questions;

    let question: Option<Question> = questions::table
        .filter(questions::id.eq(question_id))
        .filter(questions::user_id.eq(user_id))
        .get_result(conn)
        .optional()?;

    let question = try_or!(question, else return Ok(None));
    let subject = subject::get(conn, user_id, question.subject_id)?;
    let images = image::for_question(conn, question.id)?;

    Ok(Some(QuestionWithRelations { question, subject, images }))
}

#[cfg(test)]
fn form(json: &str) -> QuestionForm {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_question_form_mapping() {
    let q = form(r#"{"title": " Limits ", "content": "lim x->0 sin x / x", "wrongAnswer": "0",
                    "rightAnswer": "1", "subjectId": 4, "difficulty": 5, "imageIds": [3, 1, 3]}"#)
        .validate()
        .unwrap();
    assert_eq!(q, ValidQuestion {
        subject_id: 4,
        title: "Limits".into(),
        text: "lim x->0 sin x / x".into(),
        answer: "1".into(),
        notes: "0".into(),
        difficulty: "5".into(),
        image_ids: vec![1, 3],
    });
}

#[test]
fn test_created_question_body() {
    use chrono::Utc;

    let q = form(r#"{"content": "2 + 2", "wrongAnswer": "5", "rightAnswer": "4", "subjectId": 4, "imageIds": [9]}"#)
        .validate()
        .unwrap();
    let new = q.new_question(1, 4);
    assert_eq!(new.status, STATUS_PENDING);

    let now = Utc::now();
    let question = Question {
        id: 10,
        user_id: new.user_id,
        subject_id: new.subject_id,
        title: new.title.into(),
        text: new.text.into(),
        answer: new.answer.into(),
        notes: new.notes.into(),
        difficulty: new.difficulty.into(),
        status: new.status.into(),
        created_at: now,
        updated_at: now,
        repetitions: 0,
        interval_days: 0,
        ease: 2.5,
        next_review: now,
        last_reviewed: None,
    };
    let subject = Subject {
        id: 4, user_id: 1, name: "数学".into(), color: "#3b82f6".into(), icon: "calculator".into(), created_at: now,
    };
    let image = QuestionImage { id: 9, user_id: 1, question_id: Some(10), url: "https://img/9.png".into(), created_at: now };

    let body = serde_json::to_value(&QuestionWithRelations {
        question,
        subject: Some(subject),
        images: vec![image],
    }).unwrap();

    assert_eq!(body["text"], "2 + 2");
    assert_eq!(body["answer"], "4");
    assert_eq!(body["notes"], "5");
    assert_eq!(body["subjectId"], 4);
    assert_eq!(body["status"], STATUS_PENDING);
    assert_eq!(body["subject"]["id"], 4);
    assert_eq!(body["subject"]["name"], "数学");
    assert_eq!(body["images"][0]["id"], 9);
    assert_eq!(body["images"][0]["questionId"], 10);
}

#[test]
fn test_question_form_defaults() {
    let q = form(r#"{"content": "2 + 2", "subjectId": 1}"#).validate().unwrap();
    assert_eq!(q.difficulty, DEFAULT_DIFFICULTY);
    assert_eq!(q.title, "");
    assert_eq!(q.answer, "");
    assert_eq!(q.notes, "");
    assert!(q.image_ids.is_empty());

    let q = form(r#"{"content": "2 + 2", "subjectId": 1, "difficulty": "4"}"#).validate().unwrap();
    assert_eq!(q.difficulty, "4");
}

#[test]
fn test_question_form_rejects() {
    let is_invalid_input = |r: Result<ValidQuestion>| match r {
        Err(Error(ErrorKind::InvalidInput(_), _)) => true,
        _ => false,
    };
    assert!(is_invalid_input(form(r#"{"subjectId": 1}"#).validate()));
    assert!(is_invalid_input(form(r#"{"content": "  ", "subjectId": 1}"#).validate()));
    assert!(is_invalid_input(form(r#"{"content": "2 + 2"}"#).validate()));
}

#[test]
fn test_page_params() {
    assert_eq!(page_params(None, None, DEFAULT_PAGE_SIZE), (1, 10));
    assert_eq!(page_params(Some(0), Some(0), DEFAULT_PAGE_SIZE), (1, 1));
    assert_eq!(page_params(Some(-3), Some(1000), DEFAULT_PAGE_SIZE), (1, 100));
    assert_eq!(page_params(Some(4), Some(25), DEFAULT_PAGE_SIZE), (4, 25));
    assert_eq!(page_params(None, None, 20), (1, 20));
    assert_eq!(page_params(Some(i64::MAX), Some(100), DEFAULT_PAGE_SIZE), (MAX_PAGE, 100));

    let (page, limit) = page_params(Some(i64::MAX), Some(100), DEFAULT_PAGE_SIZE);
    assert_eq!(Pagination::new(0, page, limit).offset(), (MAX_PAGE - 1) * 100);
}
