#[macro_use] extern crate lazy_static;
#[macro_use] extern crate log;
#[macro_use] extern crate mistakebook_backend;

#[macro_use]
mod helpers;
mod http_api;

pub use mistakebook_backend as backend;
pub use crate::helpers::*;

pub use std::result::Result as StdResult;
pub use pencil::{Request, PencilResult, PencilError};

pub use backend::errors::Result as Result;
pub use backend::errors::{Error, ErrorKind};

use pencil::Pencil;

pub fn main() {
    pretty_env_logger::init();
    info!("Starting.");
    check_env_vars();
    let conn = backend::db::connect(&*DATABASE_URL).expect("Can't connect to database!");
    if !backend::db::check(&conn).expect("Something funny with the DB!") {
        warn!("There are no users yet. Add one with the `user` tool.");
    }
    info!("Database OK.");

    let mut app = Pencil::new(".");

    app.httperrorhandler(400, bad_request_handler);
    app.httperrorhandler(401, unauthorized_handler);
    app.httperrorhandler(404, not_found_handler);
    app.httperrorhandler(500, internal_error_handler);

    // HTTP API
    app.get("/api/stats", "get_stats", http_api::get_stats);
    app.get("/api/questions", "get_questions", http_api::get_questions);
    app.post("/api/questions", "post_question", http_api::post_question);
    app.get("/api/questions/<id:int>", "get_question", http_api::get_question);
    app.post("/api/images", "post_image", http_api::post_image);
    app.get("/api/reviews", "get_reviews", http_api::get_reviews);
    app.post("/api/reviews", "post_review", http_api::post_review);
    app.get("/api/learning-stats", "get_learning_stats", http_api::get_learning_stats);
    app.get("/api/subjects", "get_subjects", http_api::get_subjects);
    app.post("/api/subjects", "post_subject", http_api::post_subject);

    info!("Ready. Running on {}", *SERVER_BINDING);
    app.run(*SERVER_BINDING);
}
