//! Store-facing operations: character resolution, list composition, and the
//! read-only list presenters, plus the user/follow queries the web surface
//! needs. Everything takes an explicit `&mut PgConnection`; the caller owns
//! pooling and blocking-thread placement.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use log::{error, info};

use crate::auth;
use crate::error::Error;
use crate::giantbomb_query::CharacterSource;
use crate::models::{
    Character, Follow, List, ListCharacter, ListView, NewCharacter, NewList, NewListCharacter,
    NewUser, RankedCharacter, User,
};
use crate::schema::{characters, follows, lists, lists_characters, users};

/// Upper bound on the stored game-appearance string.
pub const GAME_STRING_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Character resolver
// ---------------------------------------------------------------------------

/// Returns the locally cached character for `guid`, fetching it from the
/// external source and persisting it on a cache miss. At most one row ever
/// exists per guid: the UNIQUE constraint plus `ON CONFLICT DO NOTHING` turns
/// a lost insert race into a plain re-read.
pub fn resolve_character(
    conn: &mut PgConnection,
    source: &dyn CharacterSource,
    guid: &str,
) -> Result<Character, Error> {
    let cached = characters::table
        .filter(characters::guid.eq(guid))
        .first::<Character>(conn)
        .optional()?;
    if let Some(character) = cached {
        return Ok(character);
    }

    let remote = source.fetch_character(guid)?;
    let new_character = NewCharacter {
        guid: guid.to_owned(),
        name: remote.name,
        game: game_list_to_string(&remote.games),
        image_url: remote.image_url,
    };

    diesel::insert_into(characters::table)
        .values(&new_character)
        .on_conflict(characters::guid)
        .do_nothing()
        .execute(conn)?;

    let character = characters::table
        .filter(characters::guid.eq(guid))
        .first::<Character>(conn)?;
    info!("cached character guid={} name={}", guid, character.name);
    Ok(character)
}

/// Concatenates game names with ", " separators, dropping every name from
/// the first one that would push the result past [`GAME_STRING_LIMIT`].
/// Names are never cut mid-word.
pub fn game_list_to_string(games: &[String]) -> String {
    let mut out = String::new();
    for name in games {
        let appended = if out.is_empty() { name.len() } else { name.len() + 2 };
        if out.len() + appended > GAME_STRING_LIMIT {
            break;
        }
        if !out.is_empty() {
            out.push_str(", ");
        }
        out.push_str(name);
    }
    out
}

// ---------------------------------------------------------------------------
// List composer
// ---------------------------------------------------------------------------

/// Splits the frontend's `", "`-separated guid field into an ordered guid
/// sequence.
pub fn parse_guid_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|guid| !guid.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Replaces the membership of `list` with the characters resolved from
/// `guids`, in order. For a ranked list each member gets rank 1..N matching
/// input order; for an unranked list every rank is NULL. Runs in one
/// transaction: a resolver failure leaves the previous membership untouched.
pub fn compose_membership(
    conn: &mut PgConnection,
    source: &dyn CharacterSource,
    list: &List,
    guids: &[String],
) -> Result<(), Error> {
    conn.transaction(|conn| {
        // Full replace: stale rank rows must not survive a re-edit.
        diesel::delete(lists_characters::table.filter(lists_characters::list_id.eq(list.id)))
            .execute(conn)?;

        let mut resolved = Vec::with_capacity(guids.len());
        for guid in guids {
            let character = resolve_character(conn, source, guid)?;
            resolved.push(character.id);
        }

        let rows = membership_rows(list.id, &resolved, list.is_ranked);
        diesel::insert_into(lists_characters::table)
            .values(&rows)
            .execute(conn)?;

        info!(
            "composed list_id={} with {} member(s), ranked={}",
            list.id,
            rows.len(),
            list.is_ranked
        );
        Ok(())
    })
}

/// Builds the join rows for one list from resolved character ids. Duplicate
/// ids collapse to their first occurrence, so ranks stay a contiguous
/// permutation of 1..N over distinct members.
pub fn membership_rows(
    list_id: i32,
    character_ids: &[i32],
    is_ranked: bool,
) -> Vec<NewListCharacter> {
    let mut distinct: Vec<i32> = Vec::with_capacity(character_ids.len());
    for &id in character_ids {
        if !distinct.contains(&id) {
            distinct.push(id);
        }
    }

    distinct
        .into_iter()
        .enumerate()
        .map(|(position, character_id)| NewListCharacter {
            list_id,
            character_id,
            rank: is_ranked.then(|| position as i32 + 1),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// List presenter
// ---------------------------------------------------------------------------

/// Pairs each member of `list` with its rank, in persisted order. Read-only.
pub fn present_one(conn: &mut PgConnection, list: &List) -> Result<ListView, Error> {
    let rows = lists_characters::table
        .inner_join(characters::table)
        .filter(lists_characters::list_id.eq(list.id))
        .order(lists_characters::id.asc())
        .load::<(ListCharacter, Character)>(conn)?;
    Ok(build_list_view(list.clone(), rows))
}

/// [`present_one`] over a sequence of lists, preserving input order.
pub fn present_many(conn: &mut PgConnection, lists: &[List]) -> Result<Vec<ListView>, Error> {
    lists.iter().map(|list| present_one(conn, list)).collect()
}

pub fn build_list_view(list: List, rows: Vec<(ListCharacter, Character)>) -> ListView {
    let characters = rows
        .into_iter()
        .map(|(membership, character)| RankedCharacter {
            character,
            rank: membership.rank,
        })
        .collect();
    ListView { list, characters }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub fn create_user(
    conn: &mut PgConnection,
    username: &str,
    password: &str,
    image_url: Option<&str>,
) -> Result<User, Error> {
    let new_user = NewUser {
        username,
        password: auth::hash_password(password)?,
        image_url,
    };

    diesel::insert_into(users::table)
        .values(&new_user)
        .get_result::<User>(conn)
        .map_err(|err| match err {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                Error::UsernameTaken
            }
            other => other.into(),
        })
}

pub fn authenticate(
    conn: &mut PgConnection,
    username: &str,
    password: &str,
) -> Result<User, Error> {
    let user = users::table
        .filter(users::username.eq(username))
        .first::<User>(conn)
        .optional()?;

    match user {
        Some(user) if auth::verify_password(password, &user.password) => Ok(user),
        _ => Err(Error::InvalidCredentials),
    }
}

pub fn get_user_by_id(conn: &mut PgConnection, id: i32) -> Result<User, Error> {
    users::table
        .find(id)
        .first(conn)
        .optional()?
        .ok_or(Error::NotFound("user"))
}

pub fn get_user_by_username(conn: &mut PgConnection, username: &str) -> Result<User, Error> {
    users::table
        .filter(users::username.eq(username))
        .first(conn)
        .optional()?
        .ok_or_else(|| {
            error!("user_name={} was not found in internal database", username);
            Error::NotFound("user")
        })
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

pub fn get_list(conn: &mut PgConnection, id: i32) -> Result<List, Error> {
    lists::table
        .find(id)
        .first(conn)
        .optional()?
        .ok_or(Error::NotFound("list"))
}

pub fn create_list(
    conn: &mut PgConnection,
    user_id: i32,
    title: &str,
    is_ranked: bool,
    is_private: bool,
) -> Result<List, Error> {
    let new_list = NewList {
        title,
        user_id,
        is_ranked,
        is_private,
    };
    Ok(diesel::insert_into(lists::table)
        .values(&new_list)
        .get_result::<List>(conn)?)
}

pub fn update_list(
    conn: &mut PgConnection,
    list: &List,
    title: &str,
    is_ranked: bool,
    is_private: bool,
) -> Result<List, Error> {
    Ok(diesel::update(list)
        .set((
            lists::title.eq(title),
            lists::is_ranked.eq(is_ranked),
            lists::is_private.eq(is_private),
        ))
        .get_result::<List>(conn)?)
}

/// Join rows go with the list via ON DELETE CASCADE.
pub fn delete_list(conn: &mut PgConnection, list: &List) -> Result<(), Error> {
    diesel::delete(list).execute(conn)?;
    Ok(())
}

pub fn public_lists(conn: &mut PgConnection) -> Result<Vec<List>, Error> {
    Ok(lists::table
        .filter(lists::is_private.eq(false))
        .order(lists::id.asc())
        .load(conn)?)
}

pub fn lists_for_user(
    conn: &mut PgConnection,
    user_id: i32,
    include_private: bool,
) -> Result<Vec<List>, Error> {
    let query = lists::table
        .filter(lists::user_id.eq(user_id))
        .order(lists::id.asc());
    let found = if include_private {
        query.load(conn)?
    } else {
        query.filter(lists::is_private.eq(false)).load(conn)?
    };
    Ok(found)
}

pub fn private_lists_for_user(conn: &mut PgConnection, user_id: i32) -> Result<Vec<List>, Error> {
    Ok(lists::table
        .filter(lists::user_id.eq(user_id))
        .filter(lists::is_private.eq(true))
        .order(lists::id.asc())
        .load(conn)?)
}

// ---------------------------------------------------------------------------
// Follows
// ---------------------------------------------------------------------------

pub fn follow(conn: &mut PgConnection, follower_id: i32, followee_id: i32) -> Result<(), Error> {
    // Look the followee up first so a bad id surfaces as 404, not an FK error.
    get_user_by_id(conn, followee_id)?;

    diesel::insert_into(follows::table)
        .values(&Follow {
            user_being_followed: followee_id,
            user_following: follower_id,
        })
        .execute(conn)
        .map_err(|err| match err {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                Error::AlreadyFollowing
            }
            other => other.into(),
        })?;
    Ok(())
}

pub fn unfollow(conn: &mut PgConnection, follower_id: i32, followee_id: i32) -> Result<(), Error> {
    diesel::delete(
        follows::table
            .filter(follows::user_being_followed.eq(followee_id))
            .filter(follows::user_following.eq(follower_id)),
    )
    .execute(conn)?;
    Ok(())
}

/// Users who follow `user_id`.
pub fn followers_of(conn: &mut PgConnection, user_id: i32) -> Result<Vec<User>, Error> {
    Ok(follows::table
        .inner_join(users::table.on(users::id.eq(follows::user_following)))
        .filter(follows::user_being_followed.eq(user_id))
        .select(User::as_select())
        .load(conn)?)
}

/// Users whom `user_id` follows.
pub fn following_of(conn: &mut PgConnection, user_id: i32) -> Result<Vec<User>, Error> {
    Ok(follows::table
        .inner_join(users::table.on(users::id.eq(follows::user_being_followed)))
        .filter(follows::user_following.eq(user_id))
        .select(User::as_select())
        .load(conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn games(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn game_string_keeps_whole_names_up_to_the_limit() {
        let list = games(&[
            "Carmen Sandiego Adventures in Math: The Lady Liberty Larceny",
            "Where in the World is Carmen Sandiego?",
        ]);
        let out = game_list_to_string(&list);

        // 60 + 2 + 38 characters: exactly at the cap.
        assert_eq!(
            out,
            "Carmen Sandiego Adventures in Math: The Lady Liberty Larceny, \
             Where in the World is Carmen Sandiego?"
        );
        assert_eq!(out.len(), GAME_STRING_LIMIT);
    }

    #[test]
    fn game_string_drops_the_name_that_would_overflow() {
        let long = "g".repeat(90);
        let list = games(&[&long, "a somewhat long game title", "cd"]);
        let out = game_list_to_string(&list);

        assert_eq!(out, long);
        assert!(out.len() <= GAME_STRING_LIMIT);
    }

    #[test]
    fn game_string_of_single_oversized_name_is_empty() {
        let out = game_list_to_string(&games(&[&"g".repeat(150)]));
        assert_eq!(out, "");
    }

    #[test]
    fn game_string_of_no_games_is_empty() {
        assert_eq!(game_list_to_string(&[]), "");
    }

    #[test]
    fn guid_list_parses_in_order() {
        assert_eq!(
            parse_guid_list("3005-177, 3005-191, 3005-73"),
            vec!["3005-177", "3005-191", "3005-73"]
        );
    }

    #[test]
    fn guid_list_ignores_blanks() {
        assert_eq!(parse_guid_list(""), Vec::<String>::new());
        assert_eq!(parse_guid_list("3005-177, , "), vec!["3005-177"]);
    }

    #[test]
    fn ranked_membership_rows_are_a_permutation_of_one_to_n() {
        let rows = membership_rows(7, &[30, 10, 20], true);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].character_id, 30);
        assert_eq!(rows[0].rank, Some(1));
        assert_eq!(rows[1].character_id, 10);
        assert_eq!(rows[1].rank, Some(2));
        assert_eq!(rows[2].character_id, 20);
        assert_eq!(rows[2].rank, Some(3));
    }

    #[test]
    fn unranked_membership_rows_carry_no_rank() {
        let rows = membership_rows(7, &[10, 20], false);
        assert!(rows.iter().all(|row| row.rank.is_none()));
    }

    #[test]
    fn duplicate_character_ids_collapse_to_first_occurrence() {
        let rows = membership_rows(7, &[10, 20, 10, 30, 20], true);

        let ids: Vec<i32> = rows.iter().map(|row| row.character_id).collect();
        let ranks: Vec<Option<i32>> = rows.iter().map(|row| row.rank).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(ranks, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn empty_input_yields_no_membership_rows() {
        assert!(membership_rows(7, &[], true).is_empty());
    }

    #[test]
    fn list_view_pairs_members_with_their_ranks() {
        let list = List {
            id: 1,
            title: "title1".into(),
            user_id: 2,
            is_ranked: true,
            is_private: false,
        };
        let character = Character {
            id: 10,
            guid: Some("3005-177".into()),
            name: "Mario".into(),
            game: "Super Mario 64".into(),
            image_url: Some("fake-image-of-mario".into()),
        };
        let membership = ListCharacter {
            id: 100,
            list_id: 1,
            character_id: 10,
            rank: Some(1),
        };

        let view = build_list_view(list, vec![(membership, character)]);

        assert_eq!(view.list.id, 1);
        assert_eq!(view.characters.len(), 1);
        assert_eq!(view.characters[0].rank, Some(1));
        assert_eq!(view.characters[0].character.name, "Mario");
    }
}
