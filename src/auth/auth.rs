use rocket::State;
use rocket::form::Form;
use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::request::FlashMessage;
use rocket::response::Redirect;
use rocket_dyn_templates::{Template, context};
use sqlx::{Pool, Sqlite};
use tracing::{error, info, warn};
use validator::Validate;

use crate::db;
use crate::error::AppError;
use crate::validation::{FormErrors, Notice, ValidateFormExt};

use super::{SESSION_COOKIE, User};

#[derive(FromForm, Validate)]
pub struct LoginForm {
    #[validate(length(min = 4, max = 20, message = "Username must be 4-20 characters"))]
    username: String,
    #[validate(length(min = 4, max = 20, message = "Password must be 4-20 characters"))]
    password: String,
}

#[derive(FromForm, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 4, max = 20, message = "Username must be 4-20 characters"))]
    username: String,
    #[validate(length(min = 4, max = 20, message = "Password must be 4-20 characters"))]
    password: String,
}

fn login_page(username: &str, notice: Option<Notice>, errors: FormErrors) -> Template {
    Template::render(
        "login",
        context! {
            title: "Login",
            username: username,
            notice: notice,
            errors: errors.errors,
        },
    )
}

fn register_page(username: &str, errors: FormErrors) -> Template {
    Template::render(
        "register",
        context! {
            title: "Register",
            username: username,
            errors: errors.errors,
        },
    )
}

#[get("/")]
pub fn home() -> Redirect {
    Redirect::to(uri!("/login"))
}

#[get("/login")]
pub fn login(flash: Option<FlashMessage<'_>>) -> Template {
    login_page("", Notice::from_flash(flash), FormErrors::default())
}

#[post("/login", data = "<form>")]
pub async fn process_login(
    form: Form<LoginForm>,
    cookies: &CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, Template> {
    info!("Login attempt: {}", &form.username);

    if let Err(errors) = form.validate_form() {
        return Err(login_page(&form.username, None, errors));
    }

    match db::authenticate_user(db, &form.username, &form.password).await {
        Ok(Some(user)) => {
            info!("Authentication successful for {}", &user.username);
            cookies.add_private(
                Cookie::build((SESSION_COOKIE, user.id.to_string()))
                    .same_site(SameSite::Lax)
                    .http_only(true),
            );
            Ok(Redirect::to(uri!("/dashboard")))
        }
        Ok(None) => {
            warn!("Authentication failed for {}", &form.username);
            Err(login_page(
                &form.username,
                Some(Notice::new("login", "Invalid username or password")),
                FormErrors::default(),
            ))
        }
        Err(e) => {
            e.log_and_record("Login");
            Err(login_page(
                &form.username,
                Some(Notice::danger(e.user_message())),
                FormErrors::default(),
            ))
        }
    }
}

#[get("/register")]
pub fn register() -> Template {
    register_page("", FormErrors::default())
}

#[post("/register", data = "<form>")]
pub async fn process_register(
    form: Form<RegisterForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, Template> {
    if let Err(errors) = form.validate_form() {
        return Err(register_page(&form.username, errors));
    }

    match db::create_user(db, &form.username, &form.password).await {
        Ok(_) => {
            info!("Registered user {}", &form.username);
            Ok(Redirect::to(uri!("/login")))
        }
        Err(AppError::Conflict(msg)) => Err(register_page(
            &form.username,
            FormErrors::with_error("username", &msg),
        )),
        Err(e) => {
            error!("Registration failed for {}: {:?}", &form.username, e);
            Err(register_page(
                &form.username,
                FormErrors::with_error("username", &e.user_message()),
            ))
        }
    }
}

#[get("/logout")]
pub fn logout(_user: User, cookies: &CookieJar<'_>) -> Redirect {
    cookies.remove_private(Cookie::build(SESSION_COOKIE));
    Redirect::to(uri!("/login"))
}

#[post("/logout")]
pub fn process_logout(user: User, cookies: &CookieJar<'_>) -> Redirect {
    logout(user, cookies)
}
