use rocket::Request;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::response::Redirect;
use rocket_dyn_templates::{Template, context};
use sqlx::{Pool, Sqlite};
use tracing::warn;

use crate::db::get_user;

use super::{SESSION_COOKIE, User};

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_span = tracing::info_span!("user_auth_guard");
        let _guard = auth_span.enter();

        let user_id = request
            .cookies()
            .get_private(SESSION_COOKIE)
            .and_then(|c| c.value().parse::<i64>().ok());

        let Some(user_id) = user_id else {
            return Outcome::Error((Status::Unauthorized, ()));
        };

        let db = match request.rocket().state::<Pool<Sqlite>>() {
            Some(pool) => pool,
            _ => {
                tracing::error!("Database pool not found in managed state");
                return Outcome::Error((Status::InternalServerError, ()));
            }
        };

        match get_user(db, user_id).await {
            Ok(user) => {
                tracing::debug!(username = %user.username, "User authenticated via session cookie");
                Outcome::Success(user)
            }
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = ?err, "Session refers to an unknown user");
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}

#[catch(401)]
pub fn unauthorized(_req: &Request) -> Redirect {
    warn!("Unauthorized access attempt");
    Redirect::to(uri!("/login"))
}

#[catch(404)]
pub fn not_found(req: &Request) -> Template {
    Template::render(
        "404",
        context! {
            title: "Not Found",
            path: req.uri().path().to_string(),
        },
    )
}
