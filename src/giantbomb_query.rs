use log::error;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;

use crate::error::Error;
use crate::giantbomb_models::{CharacterEnvelope, CharacterResult, SearchEnvelope, SearchHit};

static GIANTBOMB_URL: &str = "https://www.giantbomb.com/api";

// Giant Bomb rejects requests carrying a library default User-Agent.
static EPICLIST_USER_AGENT: &str = "epiclist-server";

/// A character record as the external source reports it, after required-field
/// validation.
#[derive(Debug, Clone)]
pub struct RemoteCharacter {
    pub guid: String,
    pub name: String,
    pub games: Vec<String>,
    pub image_url: Option<String>,
}

impl RemoteCharacter {
    pub fn from_envelope(envelope: CharacterEnvelope) -> Result<Self, Error> {
        let payload = envelope.results.ok_or(Error::MissingField("results"))?;
        Ok(RemoteCharacter {
            guid: payload.guid.ok_or(Error::MissingField("results.guid"))?,
            name: payload.name.ok_or(Error::MissingField("results.name"))?,
            games: payload.games.into_iter().filter_map(|g| g.name).collect(),
            image_url: payload.image.and_then(|i| i.thumb_url),
        })
    }
}

/// Read-only query interface against the external character database.
/// All calls block; callers must already be on a blocking thread.
pub trait CharacterSource: Send + Sync {
    fn fetch_character(&self, guid: &str) -> Result<RemoteCharacter, Error>;
    fn search(&self, query: &str) -> Result<Vec<SearchHit>, Error>;
}

#[derive(Debug, Clone)]
pub struct GiantBombClient {
    api_key: String,
}

impl GiantBombClient {
    pub fn new(api_key: String) -> GiantBombClient {
        GiantBombClient { api_key }
    }
}

impl CharacterSource for GiantBombClient {
    fn fetch_character(&self, guid: &str) -> Result<RemoteCharacter, Error> {
        let client = Client::new();
        let envelope: CharacterEnvelope = client
            .get(format!("{}/character/{}/", GIANTBOMB_URL, guid))
            .query(&[("api_key", self.api_key.as_str()), ("format", "json")])
            .header(USER_AGENT, EPICLIST_USER_AGENT)
            .send()?
            .error_for_status()?
            .json()?;

        let remote = RemoteCharacter::from_envelope(envelope);
        if remote.is_err() {
            error!("guid={} was not found in the giantbomb database", guid);
        }
        remote
    }

    fn search(&self, query: &str) -> Result<Vec<SearchHit>, Error> {
        let client = Client::new();
        let envelope: SearchEnvelope = client
            .get(format!("{}/search/", GIANTBOMB_URL))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("query", query),
                ("resources", "character"),
            ])
            .header(USER_AGENT, EPICLIST_USER_AGENT)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(envelope.results)
    }
}

/// Reshape raw search hits into the `{name, image_url, external_id}` objects
/// the frontend consumes.
pub fn character_results(hits: Vec<SearchHit>) -> Vec<CharacterResult> {
    hits.into_iter()
        .map(|hit| CharacterResult {
            name: hit.name,
            image_url: hit.image.and_then(|i| i.thumb_url),
            external_id: hit.guid,
        })
        .collect()
}
