error_chain! {
    foreign_links {
        Diesel(::diesel::result::Error);
        DieselMigration(::diesel_migrations::RunMigrationsError);
        Pool(::diesel::r2d2::PoolError);
        Json(::serde_json::Error);
        Decode(::data_encoding::DecodeError);
    }
    errors {
        InvalidInput(reason: String) {
            description("Provided input is invalid.")
            display("Provided input is invalid: {}", reason)
        }
        InvalidSubject {
            description("Invalid subject")
            display("Invalid subject")
        }
        NoSuchUser(email: String) {
            description("No such user exists")
            display("No user with e-mail address {} exists.", email)
        }
        NoSuchQuestion(id: i32) {
            description("No such question exists")
            display("No question with id {} exists.", id)
        }
        EmailAddressTooLong {
            description("E-mail address too long")
            display("A valid e-mail address can be 254 characters at maximum.")
        }
        EmailAddressNotValid {
            description("E-mail address not valid")
            display("An e-mail address must contain the character '@'.")
        }
        AuthError {
            description("Can't authenticate user")
            display("The auth token doesn't check out.")
        }
        BadToken {
            description("Malformed auth token!")
            display("Malformed auth token!")
        }
        TokenExpired {
            description("Auth token expired")
            display("Auth token expired")
        }
        ReviewState(reason: &'static str) {
            description("Not possible in the current review state")
            display("Not possible in the current review state: {}", reason)
        }
        DatabaseOdd(reason: &'static str) {
            description("There's something wrong with the contents of the DB vs. how it should be!")
            display("There's something wrong with the contents of the DB vs. how it should be! {}", reason)
        }
    }
}

impl ErrorKind {
    /// Errors caused by the request contents rather than by the server.
    pub fn is_client_error(&self) -> bool {
        match *self {
            ErrorKind::InvalidInput(_)
            | ErrorKind::InvalidSubject
            | ErrorKind::EmailAddressTooLong
            | ErrorKind::EmailAddressNotValid => true,
            _ => false,
        }
    }
}

#[test]
fn test_client_error_kinds() {
    assert!(ErrorKind::InvalidSubject.is_client_error());
    assert!(ErrorKind::InvalidInput("content is required".into()).is_client_error());
    assert!(!ErrorKind::AuthError.is_client_error());
    assert!(!ErrorKind::DatabaseOdd("no rows").is_client_error());
    assert_eq!(format!("{}", Error::from_kind(ErrorKind::InvalidSubject)), "Invalid subject");
}
