use std::{
    collections::{HashMap, hash_map::Entry},
    fs::File,
    path::Path,
};

use anyhow::Context;
use csv::StringRecord;
use tracing::{debug, warn};

use crate::{
    error::{AppError, AppResult},
    models::{AwardRecord, GenreRef, MovieRecord, ShowRecord},
};

pub const MOVIES_FILE: &str = "movies.csv";
pub const SHOWS_FILE: &str = "netflix_shows.csv";
pub const AWARDS_FILE: &str = "oscars.csv";

fn open(path: &Path) -> AppResult<csv::Reader<File>> {
    Ok(csv::ReaderBuilder::new()
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?)
}

// Missing header columns are a caller bug or the wrong file entirely, so
// they abort the run instead of degrading into skipped rows.
fn column(headers: &StringRecord, name: &str, path: &Path) -> AppResult<usize> {
    headers.iter().position(|h| h == name).ok_or_else(|| {
        AppError::from(anyhow::anyhow!("column '{name}' missing from {}", path.display()))
    })
}

fn line_of(row: &StringRecord) -> u64 {
    row.position().map(|p| p.line()).unwrap_or(0)
}

fn year_prefix(date: &str) -> Option<i32> {
    date.trim().get(..4)?.parse().ok()
}

fn split_names(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|name| !name.is_empty()).map(str::to_owned).collect()
}

fn parse_genre_names(raw: &str) -> serde_json::Result<Vec<String>> {
    let refs: Vec<GenreRef> = serde_json::from_str(raw)?;
    Ok(refs.into_iter().filter_map(|genre| genre.name).collect())
}

pub fn read_movies(path: &Path) -> AppResult<Vec<MovieRecord>> {
    let mut reader = open(path)?;
    let headers = reader.headers()?.clone();
    let id_col = column(&headers, "id", path)?;
    let title_col = column(&headers, "title", path)?;
    let overview_col = column(&headers, "overview", path)?;
    let date_col = column(&headers, "release_date", path)?;
    let genres_col = column(&headers, "genres", path)?;

    let mut records: Vec<MovieRecord> = Vec::new();
    let mut by_source: HashMap<i64, usize> = HashMap::new();
    let mut skipped = 0usize;

    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                warn!(file = %path.display(), error = %err, "skipping unreadable row");
                skipped += 1;
                continue;
            },
        };
        let line = line_of(&row);

        let Some(source_id) = row.get(id_col).and_then(|v| v.trim().parse::<i64>().ok()) else {
            warn!(file = %path.display(), line = line, "skipping row with non-numeric id");
            skipped += 1;
            continue;
        };
        let title = row.get(title_col).map(str::trim).unwrap_or("");
        if title.is_empty() {
            warn!(file = %path.display(), line = line, "skipping row with empty title");
            skipped += 1;
            continue;
        }
        let overview = row
            .get(overview_col)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
        let release_year = row.get(date_col).and_then(year_prefix);

        let genres = match row.get(genres_col).map(str::trim) {
            None | Some("") => Vec::new(),
            Some(raw) => match parse_genre_names(raw) {
                Ok(names) => names,
                Err(err) => {
                    warn!(
                        file = %path.display(),
                        line = line,
                        error = %err,
                        "skipping row with malformed genres payload"
                    );
                    skipped += 1;
                    continue;
                },
            },
        };

        let record =
            MovieRecord { source_id, title: title.to_owned(), overview, release_year, genres };

        // The dataset repeats ids; the last occurrence wins but keeps the
        // first occurrence's position so insertion order stays stable.
        match by_source.entry(source_id) {
            Entry::Occupied(slot) => records[*slot.get()] = record,
            Entry::Vacant(slot) => {
                slot.insert(records.len());
                records.push(record);
            },
        }
    }

    debug!(file = %path.display(), records = records.len(), skipped = skipped, "parsed movie dataset");
    Ok(records)
}

pub fn read_shows(path: &Path) -> AppResult<Vec<ShowRecord>> {
    let mut reader = open(path)?;
    let headers = reader.headers()?.clone();
    let id_col = column(&headers, "show_id", path)?;
    let title_col = column(&headers, "title", path)?;
    let director_col = column(&headers, "director", path)?;
    let year_col = column(&headers, "release_year", path)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                warn!(file = %path.display(), error = %err, "skipping unreadable row");
                skipped += 1;
                continue;
            },
        };
        let line = line_of(&row);

        let title = row.get(title_col).map(str::trim).unwrap_or("");
        if title.is_empty() {
            warn!(file = %path.display(), line = line, "skipping row with empty title");
            skipped += 1;
            continue;
        }
        let source_id = row
            .get(id_col)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
        let release_year = row.get(year_col).and_then(|v| v.trim().parse().ok());
        let directors = row.get(director_col).map(split_names).unwrap_or_default();

        records.push(ShowRecord { source_id, title: title.to_owned(), release_year, directors });
    }

    debug!(file = %path.display(), records = records.len(), skipped = skipped, "parsed show dataset");
    Ok(records)
}

pub fn read_awards(path: &Path) -> AppResult<Vec<AwardRecord>> {
    let mut reader = open(path)?;
    let headers = reader.headers()?.clone();
    let id_col = column(&headers, "tmdb_id", path)?;
    let year_col = column(&headers, "Year", path)?;
    let category_col = column(&headers, "Category", path)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                warn!(file = %path.display(), error = %err, "skipping unreadable row");
                skipped += 1;
                continue;
            },
        };
        let line = line_of(&row);

        // Rows without an external id never matched any content; they are
        // expected in the dataset and not worth a warning each.
        let Some(raw_id) = row.get(id_col).map(str::trim).filter(|v| !v.is_empty()) else {
            skipped += 1;
            continue;
        };
        let Ok(source_id) = raw_id.parse::<i64>() else {
            warn!(file = %path.display(), line = line, "skipping award row with non-numeric id");
            skipped += 1;
            continue;
        };
        let Some(year) = row.get(year_col).and_then(|v| v.trim().parse::<i32>().ok()) else {
            warn!(file = %path.display(), line = line, "skipping award row with non-numeric year");
            skipped += 1;
            continue;
        };
        let category = row.get(category_col).map(str::trim).unwrap_or("");
        if category.is_empty() {
            warn!(file = %path.display(), line = line, "skipping award row with empty category");
            skipped += 1;
            continue;
        }

        records.push(AwardRecord { source_id, year, category: category.to_owned() });
    }

    debug!(file = %path.display(), records = records.len(), skipped = skipped, "parsed award dataset");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use tempfile::TempDir;

    use super::*;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parses_embedded_genre_json() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            MOVIES_FILE,
            concat!(
                "id,title,overview,release_date,genres\n",
                "27205,Inception,\"Dreams, within dreams.\",2010-07-15,",
                "\"[{\"\"id\"\": 28, \"\"name\"\": \"\"Action\"\"}, ",
                "{\"\"id\"\": 878, \"\"name\"\": \"\"Science Fiction\"\"}]\"\n",
            ),
        );

        let records = read_movies(&path).unwrap();
        assert_eq!(records.len(), 1);
        let movie = &records[0];
        assert_eq!(movie.source_id, 27205);
        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.overview.as_deref(), Some("Dreams, within dreams."));
        assert_eq!(movie.release_year, Some(2010));
        assert_eq!(movie.genres, vec!["Action", "Science Fiction"]);
    }

    #[test]
    fn genre_payload_survives_csv_quoting() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            MOVIES_FILE,
            concat!(
                "id,title,overview,release_date,genres\n",
                "1,Example,,2001-01-01,",
                "\"[{\"\"id\"\": 1, \"\"name\"\": \"\"Drama\"\"}, ",
                "{\"\"id\"\": 2, \"\"name\"\": \"\"Comedy\"\"}]\"\n",
            ),
        );

        let records = read_movies(&path).unwrap();
        assert_eq!(records[0].genres, vec!["Drama", "Comedy"]);
    }

    #[test]
    fn malformed_genre_json_skips_only_that_row() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            MOVIES_FILE,
            concat!(
                "id,title,overview,release_date,genres\n",
                "1,Good,,2001-01-01,\"[{\"\"id\"\": 1, \"\"name\"\": \"\"Drama\"\"}]\"\n",
                "2,Broken,,2002-01-01,\"[{\"\"id\"\": 3,\"\n",
                "3,Also Good,,2003-01-01,\"[{\"\"id\"\": 2, \"\"name\"\": \"\"Comedy\"\"}]\"\n",
            ),
        );

        let records = read_movies(&path).unwrap();
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Good", "Also Good"]);
    }

    #[test]
    fn non_numeric_id_and_empty_title_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            MOVIES_FILE,
            concat!(
                "id,title,overview,release_date,genres\n",
                "abc,No Id,,2001-01-01,\n",
                "7,,,2002-01-01,\n",
                "8,Kept,,unknown,\n",
            ),
        );

        let records = read_movies(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Kept");
        assert_eq!(records[0].release_year, None);
        assert!(records[0].genres.is_empty());
    }

    #[test]
    fn repeated_movie_id_keeps_last_record_in_first_position() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            MOVIES_FILE,
            concat!(
                "id,title,overview,release_date,genres\n",
                "5,First,,2001-01-01,\n",
                "6,Other,,2002-01-01,\n",
                "5,Second,,2003-01-01,\n",
            ),
        );

        let records = read_movies(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Second");
        assert_eq!(records[1].title, "Other");
    }

    #[test]
    fn missing_column_is_a_hard_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            MOVIES_FILE,
            "id,title,overview,release_date\n1,No Genres,,2001-01-01\n",
        );

        let err = read_movies(&path).unwrap_err();
        assert!(err.to_string().contains("genres"));
    }

    #[test]
    fn splits_and_trims_show_directors() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            SHOWS_FILE,
            concat!(
                "show_id,title,director,release_year\n",
                "s1,Dark Mirror,\"Joe Wright, Jane Doe\",2019\n",
                "s2,No Director,,not-a-year\n",
                ",Untracked,Solo Name,2020\n",
            ),
        );

        let records = read_shows(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].directors, vec!["Joe Wright", "Jane Doe"]);
        assert_eq!(records[0].release_year, Some(2019));
        assert!(records[1].directors.is_empty());
        assert_eq!(records[1].release_year, None);
        assert_eq!(records[2].source_id, None);
    }

    #[test]
    fn filters_award_rows_without_usable_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            AWARDS_FILE,
            concat!(
                "tmdb_id,Year,Category\n",
                "100,2005,Best Picture\n",
                ",2006,Best Director\n",
                "xyz,2007,Best Actor\n",
                "101,20xx,Best Actress\n",
                "102,2008,\n",
            ),
        );

        let records = read_awards(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_id, 100);
        assert_eq!(records[0].year, 2005);
        assert_eq!(records[0].category, "Best Picture");
    }

    #[test]
    fn missing_file_is_a_hard_error() {
        let dir = TempDir::new().unwrap();
        assert!(read_awards(&dir.path().join("nope.csv")).is_err());
    }
}
