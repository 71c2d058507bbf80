use super::*;
use chrono::{Local, Utc};
use pencil::abort;
use serde::{Serialize, Deserialize};
use serde::de::DeserializeOwned;
use std::io::Read;

use mistakebook_backend::errors::ErrorKind;
use mistakebook_backend::period::Period;
use mistakebook_backend::question::{self, QuestionForm};
use mistakebook_backend::review::{self, ReviewForm};
use mistakebook_backend::stats::{self, StatsType};
use mistakebook_backend::subject::{self, SubjectForm};
use mistakebook_backend::image;
use mistakebook_backend::models::Pagination;

#[derive(Serialize)]
struct Data<T> {
    success: bool,
    data: T,
}

#[derive(Serialize)]
struct Paginated<T> {
    success: bool,
    data: T,
    pagination: Pagination,
}

#[derive(Serialize)]
struct PeriodData<T> {
    success: bool,
    period: Period,
    data: T,
}

fn ok_json<T: Serialize>(data: T) -> PencilResult {
    json_response(200, &Data { success: true, data })
}

fn created_json<T: Serialize>(data: T) -> PencilResult {
    json_response(201, &Data { success: true, data })
}

fn read_body<T: DeserializeOwned>(req: &mut Request) -> StdResult<StdResult<T, serde_json::Error>, PencilError> {
    let mut text = String::new();
    req.read_to_string(&mut text).err_500()?;
    Ok(serde_json::from_str(&text))
}

fn page_args(req: &mut Request, default_limit: i64) -> Result<(Option<i32>, i64, i64)> {
    let args = req.args();
    let subject_id = parse_arg(args.get("subjectId"))?;
    let page = parse_arg(args.get("page"))?;
    let limit = parse_arg(args.get("limit"))?;
    let (page, limit) = question::page_params(page, limit, default_limit);
    Ok((subject_id, page, limit))
}

pub fn get_stats(req: &mut Request) -> PencilResult {
    let (conn, sess) = auth_user(req)?;

    let period: Option<Period> = err_400!(parse_arg(req.args().get("period")), "Invalid period");
    let stats_type: Option<StatsType> = err_400!(parse_arg(req.args().get("type")), "Invalid type");
    let period = period.unwrap_or_default();

    let data = time_it!("get_stats",
        stats::compute(&conn, sess.user_id, period, stats_type.unwrap_or_default(), Local::now())).err_500()?;

    json_response(200, &PeriodData { success: true, period, data })
}

pub fn get_questions(req: &mut Request) -> PencilResult {
    let (conn, sess) = auth_user(req)?;

    let (subject_id, page, limit) = err_400!(page_args(req, question::DEFAULT_PAGE_SIZE), "Invalid query");

    let (data, pagination) = question::list(&conn, sess.user_id, subject_id, page, limit).err_500()?;

    json_response(200, &Paginated { success: true, data, pagination })
}

pub fn get_question(req: &mut Request) -> PencilResult {
    let (conn, sess) = auth_user(req)?;

    let id = try_or!(parse_id(req.view_args.get("id")), else return abort(404));

    let q = try_or!(question::get(&conn, sess.user_id, id).err_500()?, else return abort(404));

    ok_json(q)
}

pub fn post_question(req: &mut Request) -> PencilResult {
    let (conn, sess) = auth_user(req)?;

    let form: QuestionForm = err_400!(read_body(req)?, "Error decoding JSON");

    let q = match form.validate() {
        Ok(q) => q,
        Err(e) => return backend_error(e),
    };

    match time_it!("post_question", question::create(&conn, sess.user_id, &q)) {
        Ok(created) => created_json(created),
        Err(e) => backend_error(e),
    }
}

#[derive(Deserialize)]
struct ImageForm {
    url: String,
}

pub fn post_image(req: &mut Request) -> PencilResult {
    let (conn, sess) = auth_user(req)?;

    let form: ImageForm = err_400!(read_body(req)?, "Error decoding JSON");

    match image::add(&conn, sess.user_id, &form.url) {
        Ok(image) => created_json(image),
        Err(e) => backend_error(e),
    }
}

pub fn get_reviews(req: &mut Request) -> PencilResult {
    let (conn, sess) = auth_user(req)?;

    let (subject_id, page, limit) = err_400!(page_args(req, review::DEFAULT_DUE_LIMIT), "Invalid query");

    let (data, pagination) = time_it!("get_reviews",
        review::due_questions(&conn, sess.user_id, subject_id, page, limit, Local::now())).err_500()?;

    json_response(200, &Paginated { success: true, data, pagination })
}

pub fn post_review(req: &mut Request) -> PencilResult {
    let (conn, sess) = auth_user(req)?;

    let form: ReviewForm = err_400!(read_body(req)?, "Error decoding JSON");

    match review::submit(&conn, sess.user_id, form, Utc::now()) {
        Ok(outcome) => ok_json(outcome),
        Err(Error(ErrorKind::NoSuchQuestion(id), _)) => {
            info!("User {} tried to review a question {} that isn't theirs.", sess.user_id, id);
            abort(404)
        }
        Err(e) => backend_error(e),
    }
}

pub fn get_learning_stats(req: &mut Request) -> PencilResult {
    let (conn, sess) = auth_user(req)?;

    let stats = review::learning_stats(&conn, sess.user_id, Local::now()).err_500()?;

    ok_json(stats)
}

pub fn get_subjects(req: &mut Request) -> PencilResult {
    let (conn, sess) = auth_user(req)?;

    let subjects = subject::list(&conn, sess.user_id).err_500()?;

    ok_json(subjects)
}

pub fn post_subject(req: &mut Request) -> PencilResult {
    let (conn, sess) = auth_user(req)?;

    let form: SubjectForm = err_400!(read_body(req)?, "Error decoding JSON");

    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(e) => return backend_error(e),
    };

    match subject::create(&conn, sess.user_id, &valid) {
        Ok(created) => created_json(created),
        Err(e) => backend_error(e),
    }
}

#[test]
fn test_envelopes() {
    let body = serde_json::to_value(&Data { success: true, data: vec![1, 2] }).unwrap();
    assert_eq!(body, serde_json::json!({"success": true, "data": [1, 2]}));

    let body = serde_json::to_value(&Paginated {
        success: true,
        data: Vec::<i32>::new(),
        pagination: Pagination::new(21, 2, 10),
    }).unwrap();
    assert_eq!(body["pagination"], serde_json::json!({"total": 21, "page": 2, "limit": 10, "totalPages": 3}));

    let body = serde_json::to_value(&PeriodData { success: true, period: Period::Month, data: () }).unwrap();
    assert_eq!(body["period"], "month");
}
