use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{characters, follows, lists, lists_characters, users};

/// Placeholder avatar assigned to accounts registered without one.
pub const DEFAULT_IMAGE_URL: &str = "http://image";

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub image_url: Option<String>,
    pub bio: Option<String>,
    pub favorite_character: Option<i32>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password: String,
    pub image_url: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = characters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Character {
    pub id: i32,
    pub guid: Option<String>,
    pub name: String,
    pub game: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = characters)]
pub struct NewCharacter {
    pub guid: String,
    pub name: String,
    pub game: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = lists)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct List {
    pub id: i32,
    pub title: String,
    pub user_id: i32,
    pub is_ranked: bool,
    pub is_private: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = lists)]
pub struct NewList<'a> {
    pub title: &'a str,
    pub user_id: i32,
    pub is_ranked: bool,
    pub is_private: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = lists_characters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ListCharacter {
    pub id: i32,
    pub list_id: i32,
    pub character_id: i32,
    pub rank: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = lists_characters)]
pub struct NewListCharacter {
    pub list_id: i32,
    pub character_id: i32,
    pub rank: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Insertable, Serialize)]
#[diesel(table_name = follows)]
pub struct Follow {
    pub user_being_followed: i32,
    pub user_following: i32,
}

/// One list member paired with its current rank. `rank` is `None` for every
/// member of an unranked list.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCharacter {
    pub character: Character,
    pub rank: Option<i32>,
}

/// View-ready shape of one list: the list row plus its members in persisted
/// order.
#[derive(Debug, Clone, Serialize)]
pub struct ListView {
    pub list: List,
    pub characters: Vec<RankedCharacter>,
}
