//! The ingestion use case: run the pipeline, persist what is new.

use core_catalog::{
    AlbumRepository, ArtistRepository, NewTrack, Track, TrackRepository,
};
use core_extract::CandidateSource;
use core_ingest::{AudioTrack, MusicService, ProcessOptions};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::Result;

/// What one ingestion run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    /// Tracks the pipeline produced.
    pub produced: usize,
    /// Tracks newly persisted to the catalog.
    pub persisted: usize,
    /// Tracks skipped because their source identity already existed.
    pub duplicates: usize,
}

/// Pipeline-to-catalog glue.
///
/// The pipeline never looks at the catalog; this use case owns the dedup
/// protocol instead: look each produced track up by `(source_type,
/// source_id)` and persist only the absent ones. The schema's unique
/// constraint backstops the race between lookup and insert.
pub struct IngestUseCase {
    music: Arc<MusicService>,
    tracks: Arc<dyn TrackRepository>,
    artists: Arc<dyn ArtistRepository>,
    albums: Arc<dyn AlbumRepository>,
}

impl IngestUseCase {
    pub fn new(
        music: Arc<MusicService>,
        tracks: Arc<dyn TrackRepository>,
        artists: Arc<dyn ArtistRepository>,
        albums: Arc<dyn AlbumRepository>,
    ) -> Self {
        Self {
            music,
            tracks,
            artists,
            albums,
        }
    }

    /// Search, process, and persist tracks for `query`.
    pub async fn ingest(&self, query: &str, options: &ProcessOptions) -> Result<IngestReport> {
        let produced = self.music.search_and_process_audio(query, options).await;
        self.persist_batch(produced).await
    }

    /// Same, but seeded from a random query.
    pub async fn ingest_random(&self, options: &ProcessOptions) -> Result<IngestReport> {
        let produced = self.music.get_random_music(options).await;
        self.persist_batch(produced).await
    }

    async fn persist_batch(&self, produced: Vec<AudioTrack>) -> Result<IngestReport> {
        let mut report = IngestReport {
            produced: produced.len(),
            ..IngestReport::default()
        };

        for track in produced {
            if self.persist_if_absent(&track).await?.is_some() {
                report.persisted += 1;
            } else {
                report.duplicates += 1;
            }
        }

        info!(
            produced = report.produced,
            persisted = report.persisted,
            duplicates = report.duplicates,
            "ingestion run persisted"
        );
        Ok(report)
    }

    /// Persist one track unless its source identity is already catalogued.
    async fn persist_if_absent(&self, track: &AudioTrack) -> Result<Option<Track>> {
        if let Some(existing) = self
            .tracks
            .find_by_source(track.source_type, &track.source_id)
            .await?
        {
            debug!(
                source_id = %track.source_id,
                track_id = %existing.id,
                "source already catalogued, skipping"
            );
            return Ok(None);
        }

        let artist = self
            .artists
            .get_or_create(&track.artist_name, channel_id_of(track))
            .await?;

        let album_id = match &track.album_title {
            Some(title) => Some(
                self.albums
                    .get_or_create(title, Some(artist.id), release_year_of(track))
                    .await?
                    .id,
            ),
            None => None,
        };

        let insert = self
            .tracks
            .insert(NewTrack {
                title: track.title.clone(),
                artist_id: Some(artist.id),
                album_id,
                duration_seconds: track.duration_seconds as i64,
                genre: track.genre.clone(),
                thumbnail_url: some_if_nonempty(&track.thumbnail_url),
                audio_url: track.audio_public_url.clone(),
                audio_object_key: track.audio_file_name.clone(),
                audio_sha256: track.audio_sha256.clone(),
                source_type: track.source_type.to_string(),
                source_id: track.source_id.clone(),
            })
            .await;

        match insert {
            Ok(saved) => Ok(Some(saved)),
            // Lost the lookup/insert race to a concurrent ingester.
            Err(core_catalog::CatalogError::DuplicateSource { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Channel id of the artist candidate the track's name came from, if the
/// winning candidate was channel-sourced.
fn channel_id_of(track: &AudioTrack) -> Option<&str> {
    track
        .extracted_artists
        .iter()
        .find(|artist| {
            artist.extracted_from == CandidateSource::Channel && artist.name == track.artist_name
        })
        .and_then(|artist| artist.channel_id.as_deref())
}

fn release_year_of(track: &AudioTrack) -> Option<i64> {
    track
        .extracted_albums
        .first()
        .and_then(|album| album.release_year)
        .map(i64::from)
}

fn some_if_nonempty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
