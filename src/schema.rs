diesel::table! {
    characters (id) {
        id -> Int4,
        guid -> Nullable<Text>,
        name -> Text,
        game -> Text,
        image_url -> Nullable<Text>,
    }
}

diesel::table! {
    follows (user_being_followed, user_following) {
        user_being_followed -> Int4,
        user_following -> Int4,
    }
}

diesel::table! {
    lists (id) {
        id -> Int4,
        title -> Varchar,
        user_id -> Int4,
        is_ranked -> Bool,
        is_private -> Bool,
    }
}

diesel::table! {
    lists_characters (id) {
        id -> Int4,
        list_id -> Int4,
        character_id -> Int4,
        rank -> Nullable<Int4>,
    }
}

diesel::table! {
    users (id) {
        id -> Int4,
        username -> Varchar,
        password -> Text,
        image_url -> Nullable<Text>,
        bio -> Nullable<Text>,
        favorite_character -> Nullable<Int4>,
    }
}

diesel::joinable!(lists -> users (user_id));
diesel::joinable!(lists_characters -> lists (list_id));
diesel::joinable!(lists_characters -> characters (character_id));

diesel::allow_tables_to_appear_in_same_query!(characters, follows, lists, lists_characters, users,);
