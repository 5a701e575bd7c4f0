use serde::Deserialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Movie,
    TvShow,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Movie => "Movie",
            ContentType::TvShow => "TV Show",
        }
    }
}

// One element of the JSON array embedded in the movies dataset's genres
// field. Objects without a name are skipped, not an error.
#[derive(Clone, Debug, Deserialize)]
pub struct GenreRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct MovieRecord {
    pub source_id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub release_year: Option<i32>,
    pub genres: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ShowRecord {
    pub source_id: Option<String>,
    pub title: String,
    pub release_year: Option<i32>,
    pub directors: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct AwardRecord {
    pub source_id: i64,
    pub year: i32,
    pub category: String,
}
