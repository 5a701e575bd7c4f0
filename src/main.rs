mod config;
mod datasets;
mod db;
mod entities;
mod error;
mod importer;
mod models;
mod names;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,reelbase=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let db = db::connect(&config.database_url).await?;
    db::bootstrap(&db).await?;

    let summary = importer::run(&db, &config.data_dir).await?;

    tracing::info!(
        genres = summary.genres,
        directors = summary.directors,
        movies = summary.movies,
        shows = summary.shows,
        genre_links = summary.genre_links,
        director_links = summary.director_links,
        awards = summary.awards,
        "import committed"
    );
    if summary.dropped_awards + summary.dropped_genre_links + summary.dropped_director_links > 0 {
        tracing::warn!(
            awards = summary.dropped_awards,
            genre_links = summary.dropped_genre_links,
            director_links = summary.dropped_director_links,
            "records dropped during import"
        );
    }

    Ok(())
}
