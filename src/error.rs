use log::error;
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::{json, Json};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("external character source request failed: {0}")]
    ExternalSource(#[from] reqwest::Error),

    #[error("external character source response missing {0}")]
    MissingField(&'static str),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("permission denied")]
    PermissionDenied,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("username is already taken")]
    UsernameTaken,

    #[error("already following that user")]
    AlreadyFollowing,

    #[error("password hashing failed")]
    PasswordHash,

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status(&self) -> Status {
        match self {
            Error::ExternalSource(_) | Error::MissingField(_) => Status::BadGateway,
            Error::Database(diesel::result::Error::NotFound) | Error::NotFound(_) => {
                Status::NotFound
            }
            Error::Database(_) | Error::PasswordHash | Error::Internal(_) => {
                Status::InternalServerError
            }
            Error::PermissionDenied => Status::Forbidden,
            Error::InvalidCredentials => Status::Unauthorized,
            Error::UsernameTaken | Error::AlreadyFollowing => Status::Conflict,
        }
    }
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code >= 500 {
            error!("request to {} failed: {}", request.uri(), self);
        }

        let body = Json(json!({ "code": status.code, "message": self.to_string() }));
        let mut res = body.respond_to(request)?;
        res.set_status(status);
        Ok(res)
    }
}
