use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use sea_orm::{
    DatabaseConnection, DatabaseTransaction, EntityTrait, Set, TransactionTrait,
};
use tracing::{debug, info, warn};

use crate::{
    datasets,
    entities::{award, content, content_director, content_genre, director, genre},
    error::AppResult,
    models::{AwardRecord, ContentType, MovieRecord, ShowRecord},
    names::{self, NameSet},
};

// SQLite caps bind parameters per statement; large imports go in slices.
const INSERT_BATCH: usize = 500;

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub genres: usize,
    pub directors: usize,
    pub movies: usize,
    pub shows: usize,
    pub genre_links: usize,
    pub director_links: usize,
    pub awards: usize,
    pub dropped_genre_links: usize,
    pub dropped_director_links: usize,
    pub dropped_awards: usize,
}

// Lookup state threaded through the stages: normalized name -> generated id
// for the lookup tables, dataset source id -> generated content id for
// everything that references content.
#[derive(Debug, Default)]
struct ImportContext {
    genre_ids: HashMap<String, i32>,
    director_ids: HashMap<String, i32>,
    content_ids: HashMap<String, i32>,
}

pub async fn run(db: &DatabaseConnection, data_dir: &Path) -> AppResult<ImportSummary> {
    let movies = datasets::read_movies(&data_dir.join(datasets::MOVIES_FILE))?;
    let shows = datasets::read_shows(&data_dir.join(datasets::SHOWS_FILE))?;
    let awards = datasets::read_awards(&data_dir.join(datasets::AWARDS_FILE))?;

    info!(
        movies = movies.len(),
        shows = shows.len(),
        awards = awards.len(),
        "parsed source datasets"
    );

    let txn = db.begin().await?;
    match load(&txn, &movies, &shows, &awards).await {
        Ok(summary) => {
            txn.commit().await?;
            Ok(summary)
        },
        Err(err) => {
            txn.rollback().await?;
            Err(err)
        },
    }
}

// Stage order is load-bearing: lookups before content, content before
// anything holding a content reference.
async fn load(
    txn: &DatabaseTransaction,
    movies: &[MovieRecord],
    shows: &[ShowRecord],
    awards: &[AwardRecord],
) -> AppResult<ImportSummary> {
    let mut cx = ImportContext::default();
    let mut summary = ImportSummary::default();

    let genre_names = collect_genres(movies);
    let director_names = collect_directors(shows);

    summary.genres = insert_genres(txn, &genre_names, &mut cx).await?;
    summary.directors = insert_directors(txn, &director_names, &mut cx).await?;
    summary.movies = insert_movies(txn, movies, &mut cx).await?;
    summary.shows = insert_shows(txn, shows, &mut cx).await?;
    link_genres(txn, movies, &cx, &mut summary).await?;
    link_directors(txn, shows, &cx, &mut summary).await?;
    insert_awards(txn, awards, &cx, &mut summary).await?;

    Ok(summary)
}

fn collect_genres(movies: &[MovieRecord]) -> NameSet {
    let mut set = NameSet::default();
    for movie in movies {
        for name in &movie.genres {
            set.insert(name);
        }
    }
    set
}

fn collect_directors(shows: &[ShowRecord]) -> NameSet {
    let mut set = NameSet::default();
    for show in shows {
        for name in &show.directors {
            set.insert(name);
        }
    }
    set
}

async fn insert_genres(
    txn: &DatabaseTransaction,
    set: &NameSet,
    cx: &mut ImportContext,
) -> AppResult<usize> {
    if set.is_empty() {
        debug!("no genres found, skipping lookup insert");
        return Ok(0);
    }
    for (key, display) in set.iter() {
        let model = genre::ActiveModel {
            genre_id: Default::default(),
            genre_name: Set(display.to_owned()),
        };
        let id = genre::Entity::insert(model).exec(txn).await?.last_insert_id;
        cx.genre_ids.insert(key.to_owned(), id);
    }
    debug!(count = set.len(), "populated genre lookup");
    Ok(set.len())
}

async fn insert_directors(
    txn: &DatabaseTransaction,
    set: &NameSet,
    cx: &mut ImportContext,
) -> AppResult<usize> {
    if set.is_empty() {
        debug!("no directors found, skipping lookup insert");
        return Ok(0);
    }
    for (key, display) in set.iter() {
        let model = director::ActiveModel {
            director_id: Default::default(),
            director_name: Set(display.to_owned()),
        };
        let id = director::Entity::insert(model).exec(txn).await?.last_insert_id;
        cx.director_ids.insert(key.to_owned(), id);
    }
    debug!(count = set.len(), "populated director lookup");
    Ok(set.len())
}

// Content goes in one row at a time: the generated id has to be captured
// against the dataset's source id before any dependent row can reference it.
async fn insert_movies(
    txn: &DatabaseTransaction,
    movies: &[MovieRecord],
    cx: &mut ImportContext,
) -> AppResult<usize> {
    for movie in movies {
        let model = content::ActiveModel {
            content_id: Default::default(),
            content_type: Set(ContentType::Movie.as_str().to_owned()),
            title: Set(movie.title.clone()),
            overview: Set(movie.overview.clone()),
            release_year: Set(movie.release_year),
            source_id: Set(Some(movie.source_id.to_string())),
        };
        let id = content::Entity::insert(model).exec(txn).await?.last_insert_id;
        cx.content_ids.insert(movie.source_id.to_string(), id);
    }
    debug!(count = movies.len(), "inserted movie content rows");
    Ok(movies.len())
}

async fn insert_shows(
    txn: &DatabaseTransaction,
    shows: &[ShowRecord],
    cx: &mut ImportContext,
) -> AppResult<usize> {
    for show in shows {
        let model = content::ActiveModel {
            content_id: Default::default(),
            content_type: Set(ContentType::TvShow.as_str().to_owned()),
            title: Set(show.title.clone()),
            overview: Set(None),
            release_year: Set(show.release_year),
            source_id: Set(show.source_id.clone()),
        };
        let id = content::Entity::insert(model).exec(txn).await?.last_insert_id;
        if let Some(source_id) = &show.source_id {
            cx.content_ids.insert(source_id.clone(), id);
        }
    }
    debug!(count = shows.len(), "inserted show content rows");
    Ok(shows.len())
}

async fn link_genres(
    txn: &DatabaseTransaction,
    movies: &[MovieRecord],
    cx: &ImportContext,
    summary: &mut ImportSummary,
) -> AppResult<()> {
    let mut rows = Vec::new();
    let mut seen: HashSet<(i32, i32)> = HashSet::new();

    for movie in movies {
        let Some(&content_id) = cx.content_ids.get(&movie.source_id.to_string()) else {
            continue;
        };
        for name in &movie.genres {
            let Some(&genre_id) = cx.genre_ids.get(&names::fold(name)) else {
                summary.dropped_genre_links += 1;
                continue;
            };
            // The bridge key is the pair; repeated genre entries collapse.
            if seen.insert((content_id, genre_id)) {
                rows.push(content_genre::ActiveModel {
                    content_id: Set(content_id),
                    genre_id: Set(genre_id),
                });
            }
        }
    }

    summary.genre_links = rows.len();
    for chunk in rows.chunks(INSERT_BATCH) {
        content_genre::Entity::insert_many(chunk.to_vec()).exec_without_returning(txn).await?;
    }
    if summary.dropped_genre_links > 0 {
        warn!(dropped = summary.dropped_genre_links, "genre references missed the lookup table");
    }
    debug!(count = summary.genre_links, "linked content to genres");
    Ok(())
}

async fn link_directors(
    txn: &DatabaseTransaction,
    shows: &[ShowRecord],
    cx: &ImportContext,
    summary: &mut ImportSummary,
) -> AppResult<()> {
    let mut rows = Vec::new();
    let mut seen: HashSet<(i32, i32)> = HashSet::new();

    for show in shows {
        let Some(&content_id) =
            show.source_id.as_ref().and_then(|source_id| cx.content_ids.get(source_id))
        else {
            continue;
        };
        for name in &show.directors {
            let Some(&director_id) = cx.director_ids.get(&names::fold(name)) else {
                summary.dropped_director_links += 1;
                continue;
            };
            if seen.insert((content_id, director_id)) {
                rows.push(content_director::ActiveModel {
                    content_id: Set(content_id),
                    director_id: Set(director_id),
                });
            }
        }
    }

    summary.director_links = rows.len();
    for chunk in rows.chunks(INSERT_BATCH) {
        content_director::Entity::insert_many(chunk.to_vec()).exec_without_returning(txn).await?;
    }
    if summary.dropped_director_links > 0 {
        warn!(
            dropped = summary.dropped_director_links,
            "director references missed the lookup table"
        );
    }
    debug!(count = summary.director_links, "linked content to directors");
    Ok(())
}

async fn insert_awards(
    txn: &DatabaseTransaction,
    awards: &[AwardRecord],
    cx: &ImportContext,
    summary: &mut ImportSummary,
) -> AppResult<()> {
    let mut rows = Vec::new();

    for record in awards {
        let Some(&content_id) = cx.content_ids.get(&record.source_id.to_string()) else {
            summary.dropped_awards += 1;
            continue;
        };
        rows.push(award::ActiveModel {
            award_id: Default::default(),
            content_id: Set(content_id),
            year: Set(record.year),
            category: Set(record.category.clone()),
        });
    }

    summary.awards = rows.len();
    for chunk in rows.chunks(INSERT_BATCH) {
        award::Entity::insert_many(chunk.to_vec()).exec_without_returning(txn).await?;
    }
    if summary.dropped_awards > 0 {
        warn!(dropped = summary.dropped_awards, "award rows referenced unknown content");
    }
    debug!(count = summary.awards, "inserted award rows");
    Ok(())
}
