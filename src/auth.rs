//! Session and password plumbing. The signed-in user is always carried as an
//! explicit [`CurrentUser`] value resolved from the private session cookie,
//! never as ambient state.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};

use crate::error::Error;
use crate::{database, models, DbConn};

pub const SESSION_COOKIE: &str = "user_id";

pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| Error::PasswordHash)
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// The authenticated user for this request, loaded from the session cookie.
pub struct CurrentUser(pub models::User);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, ()> {
        let session_id = request
            .cookies()
            .get_private(SESSION_COOKIE)
            .and_then(|cookie| cookie.value().parse::<i32>().ok());
        let id = match session_id {
            Some(id) => id,
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        let db = match request.guard::<DbConn>().await {
            Outcome::Success(db) => db,
            _ => return Outcome::Error((Status::ServiceUnavailable, ())),
        };

        match db.run(move |conn| database::get_user_by_id(conn, id)).await {
            Ok(user) => Outcome::Success(CurrentUser(user)),
            // A stale cookie for a deleted account is just "not signed in".
            Err(_) => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}
