use super::*;
use chrono::{DateTime, Utc};

pub const MAX_EMAIL_LEN: usize = 254;

pub fn validate_email(email: &str) -> Result<&str> {
    let email = email.trim();
    if email.len() > MAX_EMAIL_LEN { bail!(ErrorKind::EmailAddressTooLong) };
    if !email.contains('@') { bail!(ErrorKind::EmailAddressNotValid) };
    Ok(email)
}

/// The name shown for a user in the leaderboard: the local part of the e-mail address.
pub fn display_name(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

pub fn get_user(conn: &PgConnection, user_id: i32) -> Result<Option<User>> {
    use crate::schema::users;

    Ok(users::table
        .filter(users::id.eq(user_id))
        .get_result(conn)
        .optional()?)
}

pub fn get_user_by_email(conn: &PgConnection, user_email: &str) -> Result<User> {
    use crate::schema::users;
    use diesel::result::Error::NotFound;

    users::table
        .filter(users::email.eq(user_email))
        .first(conn)
        .map_err(|e| match e {
            NotFound => ErrorKind::NoSuchUser(user_email.into()).into(),
            e => Error::with_chain(e, "Error when trying to retrieve user!"),
        })
}

pub fn add_user(conn: &PgConnection, email: &str) -> Result<User> {
    use crate::schema::users;

    let email = validate_email(email)?;

    let user: User = diesel::insert_into(users::table)
        .values(&NewUser { email })
        .get_result(conn)
        .chain_err(|| "Couldn't create a new user!")?;

    info!("Created user {:?}", user);
    Ok(user)
}

pub fn list_users(conn: &PgConnection) -> Result<Vec<User>> {
    use crate::schema::users;

    Ok(users::table
        .order(users::id.asc())
        .load(conn)?)
}

pub fn remove_user_by_email(conn: &PgConnection, rm_email: &str) -> Result<User> {
    use crate::schema::users;

    let user = get_user_by_email(conn, rm_email)?;

    diesel::delete(users::table.filter(users::id.eq(user.id)))
        .execute(conn)
        .chain_err(|| "Couldn't remove the user!")?;

    info!("Removed user {:?} and everything they owned.", user.email);
    Ok(user)
}

pub fn touch_last_login(conn: &PgConnection, user_id: i32, now: DateTime<Utc>) -> Result<User> {
    use crate::schema::users;

    let user = diesel::update(users::table.filter(users::id.eq(user_id)))
        .set(users::last_login.eq(Some(now)))
        .get_result(conn)
        .optional()?;

    match user {
        Some(user) => Ok(user),
        None => bail!(ErrorKind::DatabaseOdd("The user to log in doesn't exist.")),
    }
}

#[test]
fn test_validate_email() {
    assert_eq!(validate_email(" ada@example.com ").unwrap(), "ada@example.com");
    match validate_email("ada.example.com") {
        Err(Error(ErrorKind::EmailAddressNotValid, _)) => (),
        other => panic!("Expected EmailAddressNotValid, got {:?}", other),
    }
    let long = format!("{}@example.com", "a".repeat(MAX_EMAIL_LEN));
    match validate_email(&long) {
        Err(Error(ErrorKind::EmailAddressTooLong, _)) => (),
        other => panic!("Expected EmailAddressTooLong, got {:?}", other),
    }
}

#[test]
fn test_display_name() {
    assert_eq!(display_name("ada@example.com"), "ada");
    assert_eq!(display_name("nobody"), "nobody");
    assert_eq!(display_name("@example.com"), "");
}
