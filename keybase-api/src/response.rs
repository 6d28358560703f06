//! JSON shape of `GET /user/lookup.json`.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LookupResponse {
    pub status: Status,
    pub them: Vec<Option<UserEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct Status {
    pub code: i32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UserEntry {
    pub basics: Basics,
    #[serde(default)]
    pub public_keys: PublicKeys,
}

#[derive(Debug, Deserialize)]
pub struct Basics {
    pub username: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct PublicKeys {
    pub primary: Option<PrimaryKey>,
}

#[derive(Debug, Deserialize)]
pub struct PrimaryKey {
    pub kid: String,
    #[serde(default)]
    pub bundle: String,
}
