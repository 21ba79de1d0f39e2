//! Integration tests for the heuristic metadata extractor.

use core_extract::{CandidateSource, MetadataExtractor, VideoInfo};

fn video(title: &str, channel: &str, description: &str, tags: &[&str]) -> VideoInfo {
    VideoInfo {
        video_id: "dQw4w9WgXcQ".to_string(),
        title: title.to_string(),
        channel_title: channel.to_string(),
        channel_id: "UC-abc".to_string(),
        thumbnail_url: "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg".to_string(),
        description: description.to_string(),
        duration_seconds: 213,
        published_at: None,
        view_count: 1_000,
        like_count: 100,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        category_id: Some("10".to_string()),
        genre: Some("Music".to_string()),
        url: VideoInfo::watch_url("dQw4w9WgXcQ"),
    }
}

#[test]
fn extraction_is_idempotent() {
    let extractor = MetadataExtractor::new();
    let input = video(
        "Daft Punk - One More Time (Official Video)",
        "Daft PunkVEVO",
        "From the album \"Discovery\"\nArtist: Daft Punk",
        &["daft punk", "house", "discovery"],
    );

    let first = extractor.extract(&input);
    let second = extractor.extract(&input);

    assert_eq!(first, second);
}

#[test]
fn at_most_one_entry_per_case_insensitive_name_with_max_confidence() {
    let extractor = MetadataExtractor::new();
    // The same artist arrives via channel (0.8), title (0.7), description
    // (0.5), and tags (0.3) under varied casing.
    let metadata = extractor.extract(&video(
        "DAFT PUNK - One More Time",
        "Daft PunkVEVO",
        "Artist: daft punk",
        &["Daft Punk"],
    ));

    let daft: Vec<_> = metadata
        .artists
        .iter()
        .filter(|a| a.name.eq_ignore_ascii_case("daft punk"))
        .collect();
    assert_eq!(daft.len(), 1, "dedup failed: {:?}", metadata.artists);
    assert_eq!(daft[0].confidence_score, 0.8);
}

#[test]
fn artists_are_sorted_non_increasing_by_confidence() {
    let extractor = MetadataExtractor::new();
    let metadata = extractor.extract(&video(
        "Aurora - Runaway",
        "Some Promo ChannelVEVO",
        "Performed by: Different Artist",
        &["third artist"],
    ));

    assert!(metadata.artists.len() >= 2);
    for pair in metadata.artists.windows(2) {
        assert!(
            pair[0].confidence_score >= pair[1].confidence_score,
            "ordering violated: {:?}",
            metadata.artists
        );
    }
}

#[test]
fn daft_punk_end_to_end_artist_scenario() {
    let extractor = MetadataExtractor::new();
    let metadata = extractor.extract(&video(
        "Daft Punk - One More Time (Official Video)",
        "Daft PunkVEVO",
        "",
        &[],
    ));

    // Both the title pattern and the VEVO-stripped channel produce
    // "Daft Punk"; dedup keeps one entry at the channel's 0.8.
    let matches: Vec<_> = metadata
        .artists
        .iter()
        .filter(|a| a.name == "Daft Punk")
        .collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].confidence_score, 0.8);

    // And the title cleans down to the track name.
    assert_eq!(
        core_extract::clean::clean_track_title("Daft Punk - One More Time (Official Video)"),
        "One More Time"
    );
}

#[test]
fn discovery_end_to_end_album_scenario() {
    let extractor = MetadataExtractor::new();
    let metadata = extractor.extract(&video(
        "Daft Punk - Harder Better Faster Stronger",
        "Daft PunkVEVO",
        "Official audio.\nFrom the album \"Discovery\"",
        &[],
    ));

    let album = metadata
        .albums
        .iter()
        .find(|a| a.title == "Discovery")
        .expect("album candidate missing");
    assert_eq!(album.artist_name.as_deref(), Some("Daft Punk"));
    assert_eq!(album.extracted_from, CandidateSource::Description);
}

#[test]
fn empty_input_extracts_nothing_and_does_not_panic() {
    let extractor = MetadataExtractor::new();
    let metadata = extractor.extract(&video("", "", "", &[]));
    assert!(metadata.artists.is_empty());
    assert!(metadata.albums.is_empty());
}

#[test]
fn albums_dedup_by_title_and_artist_pair() {
    let extractor = MetadataExtractor::new();
    // "Discovery" arrives via the high-confidence phrase and again via the
    // weaker bracketed form; one entry survives at the max confidence.
    let metadata = extractor.extract(&video(
        "Daft Punk - Aerodynamic [Discovery]",
        "Daft PunkVEVO",
        "From the album \"Discovery\"",
        &[],
    ));

    let discovery: Vec<_> = metadata
        .albums
        .iter()
        .filter(|a| a.title.eq_ignore_ascii_case("discovery"))
        .collect();
    assert_eq!(discovery.len(), 1, "dedup failed: {:?}", metadata.albums);
    assert_eq!(discovery[0].confidence_score, 0.7);
}
