//! Wire shapes for the Giant Bomb API responses we consume. Every field the
//! API might omit is an `Option`; required-field validation happens when the
//! envelope is turned into a [`RemoteCharacter`](crate::giantbomb_query::RemoteCharacter).

use serde::{Deserialize, Serialize};

// Character detail structs
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterEnvelope {
    pub results: Option<CharacterPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharacterPayload {
    pub name: Option<String>,
    pub guid: Option<String>,
    #[serde(default)]
    pub games: Vec<Game>,
    pub image: Option<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Game {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub thumb_url: Option<String>,
}

// Search structs
#[derive(Debug, Clone, Deserialize)]
pub struct SearchEnvelope {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub name: Option<String>,
    pub guid: Option<String>,
    pub image: Option<Image>,
}

/// Reshaped search hit handed to the frontend.
#[derive(Debug, Clone, Serialize)]
pub struct CharacterResult {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub external_id: Option<String>,
}
