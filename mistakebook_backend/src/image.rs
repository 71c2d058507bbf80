//! Question images are stored in two phases: an upload creates an
//! unattached row, and creating a question attaches the rows it names.
//! Rows that never get attached are swept by the `clean` binary.

use super::*;
use chrono::{DateTime, Utc};

pub const MAX_URL_LEN: usize = 2048;

pub fn validate_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.is_empty() {
        bail!(ErrorKind::InvalidInput("url is required".into()));
    }
    if url.len() > MAX_URL_LEN {
        bail!(ErrorKind::InvalidInput(format!("url is longer than {} bytes", MAX_URL_LEN)));
    }
    Ok(url)
}

pub fn add(conn: &PgConnection, user_id: i32, url: &str) -> Result<QuestionImage> {
    use crate::schema::question_images;

    let url = validate_url(url)?;

    let image: QuestionImage = diesel::insert_into(question_images::table)
        .values(&NewQuestionImage { user_id, url })
        .get_result(conn)
        .chain_err(|| "Couldn't store the image!")?;

    debug!("User {} uploaded image {}", user_id, image.id);
    Ok(image)
}

/// Points the given images of the user at the question. Ids of images that
/// belong to somebody else, or don't exist, are ignored.
pub fn attach(conn: &PgConnection, user_id: i32, question_id: i32, image_ids: &[i32]) -> Result<usize> {
    use crate::schema::question_images;

    if image_ids.is_empty() {
        return Ok(0);
    }

    let attached = diesel::update(
            question_images::table
                .filter(question_images::user_id.eq(user_id))
                .filter(question_images::id.eq_any(image_ids))
        )
        .set(question_images::question_id.eq(Some(question_id)))
        .execute(conn)
        .chain_err(|| "Couldn't attach the images!")?;

    if attached != image_ids.len() {
        warn!("User {} tried to attach {} images to question {}, but only {} were theirs.",
            user_id, image_ids.len(), question_id, attached);
    }
    Ok(attached)
}

pub fn for_question(conn: &PgConnection, question_id: i32) -> Result<Vec<QuestionImage>> {
    use crate::schema::question_images;

    Ok(question_images::table
        .filter(question_images::question_id.eq(question_id))
        .order(question_images::id.asc())
        .load(conn)?)
}

/// The images of each question, in the same order as `questions`.
pub fn load_for(conn: &PgConnection, questions: &[Question]) -> Result<Vec<Vec<QuestionImage>>> {
    use crate::schema::question_images;

    let images = QuestionImage::belonging_to(questions)
        .order(question_images::id.asc())
        .load::<QuestionImage>(conn)
        .chain_err(|| "Can't load the images of the questions!")?
        .grouped_by(questions);

    Ok(images)
}

/// Deletes unattached images created before `older_than`. Returns the deleted rows.
pub fn clean_orphans(conn: &PgConnection, older_than: DateTime<Utc>) -> Result<Vec<QuestionImage>> {
    use crate::schema::question_images;

    let deleted = diesel::delete(
            question_images::table
                .filter(question_images::question_id.is_null())
                .filter(question_images::created_at.lt(older_than))
        )
        .get_results(conn)
        .chain_err(|| "Couldn't delete orphaned images!")?;

    Ok(deleted)
}

#[test]
fn test_validate_url() {
    assert_eq!(validate_url("  https://img.example.com/a.png ").unwrap(), "https://img.example.com/a.png");
    assert!(validate_url("").is_err());
    assert!(validate_url("   ").is_err());
    let long = format!("https://{}", "a".repeat(MAX_URL_LEN));
    assert!(validate_url(&long).is_err());
}
