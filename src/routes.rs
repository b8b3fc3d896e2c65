//! Route handlers and the rocket builder. Handlers stay thin: decode the
//! request, check ownership, then hand off to `database` inside a blocking
//! `DbConn::run` closure (external-source calls block too, so they run in the
//! same closure).

use std::env;

use dotenv::dotenv;
use rocket::http::{Cookie, CookieJar};
use rocket::serde::json::{json, Json, Value};
use rocket::{delete, get, post, put, routes, Build, Rocket, State};
use serde::Deserialize;

use crate::auth::{self, CurrentUser};
use crate::database;
use crate::error::Error;
use crate::giantbomb_query::{self, CharacterSource, GiantBombClient};
use crate::DbConn;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ListRequest {
    pub title: String,
    pub is_ranked: bool,
    pub is_private: bool,
    /// `", "`-separated guid string, in rank order for ranked lists.
    pub characters: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[post("/register", data = "<body>")]
async fn register(
    db: DbConn,
    cookies: &CookieJar<'_>,
    body: Json<RegisterRequest>,
) -> Result<Json<Value>, Error> {
    let body = body.into_inner();
    let user = db
        .run(move |conn| {
            database::create_user(
                conn,
                &body.username,
                &body.password,
                body.image_url.as_deref(),
            )
        })
        .await?;

    cookies.add_private(Cookie::new(auth::SESSION_COOKIE, user.id.to_string()));
    Ok(Json(json!({ "user": user })))
}

#[post("/login", data = "<body>")]
async fn login(
    db: DbConn,
    cookies: &CookieJar<'_>,
    body: Json<LoginRequest>,
) -> Result<Json<Value>, Error> {
    let body = body.into_inner();
    let user = db
        .run(move |conn| database::authenticate(conn, &body.username, &body.password))
        .await?;

    cookies.add_private(Cookie::new(auth::SESSION_COOKIE, user.id.to_string()));
    Ok(Json(json!({ "user": user })))
}

#[post("/logout")]
fn logout(cookies: &CookieJar<'_>) -> Json<Value> {
    cookies.remove_private(Cookie::from(auth::SESSION_COOKIE));
    Json(json!({ "success": true }))
}

// Home: every public list, ready to render.
#[get("/")]
async fn index(db: DbConn, current_user: CurrentUser) -> Result<Json<Value>, Error> {
    let views = db
        .run(|conn| {
            let public = database::public_lists(conn)?;
            database::present_many(conn, &public)
        })
        .await?;
    Ok(Json(json!({ "user": current_user.0, "lists": views })))
}

// Public lists are visible without an account; private lists only to their
// owner.
#[get("/lists/<list_id>")]
async fn show_list(
    db: DbConn,
    current_user: Option<CurrentUser>,
    list_id: i32,
) -> Result<Json<Value>, Error> {
    let viewer_id = current_user.map(|user| user.0.id);
    let view = db
        .run(move |conn| {
            let list = database::get_list(conn, list_id)?;
            if list.is_private && viewer_id != Some(list.user_id) {
                return Err(Error::PermissionDenied);
            }
            database::present_one(conn, &list)
        })
        .await?;
    Ok(Json(json!({ "list": view })))
}

#[post("/lists", data = "<body>")]
async fn create_list(
    db: DbConn,
    current_user: CurrentUser,
    giantbomb: &State<GiantBombClient>,
    body: Json<ListRequest>,
) -> Result<Json<Value>, Error> {
    let source = giantbomb.inner().clone();
    let user_id = current_user.0.id;
    let body = body.into_inner();
    let view = db
        .run(move |conn| {
            let list =
                database::create_list(conn, user_id, &body.title, body.is_ranked, body.is_private)?;
            let guids = database::parse_guid_list(&body.characters);
            database::compose_membership(conn, &source, &list, &guids)?;
            database::present_one(conn, &list)
        })
        .await?;
    Ok(Json(json!({ "list": view })))
}

#[put("/lists/<list_id>", data = "<body>")]
async fn update_list(
    db: DbConn,
    current_user: CurrentUser,
    giantbomb: &State<GiantBombClient>,
    list_id: i32,
    body: Json<ListRequest>,
) -> Result<Json<Value>, Error> {
    let source = giantbomb.inner().clone();
    let user_id = current_user.0.id;
    let body = body.into_inner();
    let view = db
        .run(move |conn| {
            let list = database::get_list(conn, list_id)?;
            if list.user_id != user_id {
                return Err(Error::PermissionDenied);
            }
            let list =
                database::update_list(conn, &list, &body.title, body.is_ranked, body.is_private)?;
            let guids = database::parse_guid_list(&body.characters);
            database::compose_membership(conn, &source, &list, &guids)?;
            database::present_one(conn, &list)
        })
        .await?;
    Ok(Json(json!({ "list": view })))
}

#[delete("/lists/<list_id>")]
async fn delete_list(
    db: DbConn,
    current_user: CurrentUser,
    list_id: i32,
) -> Result<Json<Value>, Error> {
    let user_id = current_user.0.id;
    db.run(move |conn| {
        let list = database::get_list(conn, list_id)?;
        if list.user_id != user_id {
            return Err(Error::PermissionDenied);
        }
        database::delete_list(conn, &list)
    })
    .await?;
    Ok(Json(json!({ "success": true })))
}

#[get("/users/<username>")]
async fn show_user(
    db: DbConn,
    current_user: CurrentUser,
    username: String,
) -> Result<Json<Value>, Error> {
    let viewer_id = current_user.0.id;
    let profile = db
        .run(move |conn| {
            let user = database::get_user_by_username(conn, &username)?;
            let lists = database::lists_for_user(conn, user.id, user.id == viewer_id)?;
            let views = database::present_many(conn, &lists)?;
            let followers = database::followers_of(conn, user.id)?;
            let following = database::following_of(conn, user.id)?;
            Ok::<_, Error>(json!({
                "user": user,
                "lists": views,
                "followers": followers.iter().map(|u| u.username.clone()).collect::<Vec<_>>(),
                "following": following.iter().map(|u| u.username.clone()).collect::<Vec<_>>(),
            }))
        })
        .await?;
    Ok(Json(profile))
}

#[get("/users/<username>/private-lists")]
async fn private_lists(
    db: DbConn,
    current_user: CurrentUser,
    username: String,
) -> Result<Json<Value>, Error> {
    let viewer_id = current_user.0.id;
    let views = db
        .run(move |conn| {
            let user = database::get_user_by_username(conn, &username)?;
            if user.id != viewer_id {
                return Err(Error::PermissionDenied);
            }
            let private = database::private_lists_for_user(conn, user.id)?;
            database::present_many(conn, &private)
        })
        .await?;
    Ok(Json(json!({ "lists": views })))
}

#[post("/users/<user_id>/follow")]
async fn follow_user(
    db: DbConn,
    current_user: CurrentUser,
    user_id: i32,
) -> Result<Json<Value>, Error> {
    let follower_id = current_user.0.id;
    db.run(move |conn| database::follow(conn, follower_id, user_id))
        .await?;
    Ok(Json(json!({ "success": true })))
}

#[post("/users/<user_id>/unfollow")]
async fn unfollow_user(
    db: DbConn,
    current_user: CurrentUser,
    user_id: i32,
) -> Result<Json<Value>, Error> {
    let follower_id = current_user.0.id;
    db.run(move |conn| database::unfollow(conn, follower_id, user_id))
        .await?;
    Ok(Json(json!({ "success": true })))
}

// Proxies a character search to the external source and reshapes the results
// for the list-builder frontend.
#[post("/search-characters", data = "<body>")]
async fn search_characters(
    _current_user: CurrentUser,
    giantbomb: &State<GiantBombClient>,
    body: Json<SearchRequest>,
) -> Result<Json<Value>, Error> {
    let source = giantbomb.inner().clone();
    let query = body.into_inner().query;
    let hits = rocket::tokio::task::spawn_blocking(move || source.search(&query))
        .await
        .map_err(|err| Error::Internal(err.to_string()))??;
    Ok(Json(
        json!({ "character_results": giantbomb_query::character_results(hits) }),
    ))
}

pub fn build() -> Rocket<Build> {
    dotenv().ok();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let api_key = env::var("GIANTBOMB_API_KEY").expect("GIANTBOMB_API_KEY must be set");

    let mut figment = rocket::Config::figment().merge(("databases.epiclist_db.url", database_url));
    if let Ok(secret_key) = env::var("SECRET_KEY") {
        figment = figment.merge(("secret_key", secret_key));
    }

    let cors = rocket_cors::CorsOptions::default()
        .to_cors()
        .expect("invalid CORS configuration");

    rocket::custom(figment)
        .attach(DbConn::fairing())
        .attach(cors)
        .manage(GiantBombClient::new(api_key))
        .mount(
            "/",
            routes![
                register,
                login,
                logout,
                index,
                show_list,
                create_list,
                update_list,
                delete_list,
                show_user,
                private_lists,
                follow_user,
                unfollow_user,
                search_characters,
            ],
        )
}
