//! Converts the per-source track shapes returned by the data-fetching layer
//! into canonical [`Track`] values. Each source has its own optional and
//! nested fields; everything past this boundary sees one record shape.

use serde::Deserialize;
use spindle_core::Track;

pub const UNKNOWN_TRACK: &str = "Unknown Track";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Search results carry contributing artists as nested objects.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchTrack {
    pub id: String,
    pub title: Option<String>,
    #[serde(default)]
    pub artists: Vec<SearchArtist>,
    pub cover: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchArtist {
    pub name: Option<String>,
}

/// Album listings are flat; the album cover applies to every row.
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumTrack {
    pub track_id: String,
    pub title: Option<String>,
    pub artist_name: Option<String>,
    pub album_cover: Option<String>,
}

/// Chart rows wrap the track record alongside ranking data.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartEntry {
    pub rank: u32,
    pub track: Option<ChartTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartTrack {
    pub id: String,
    pub name: Option<String>,
    pub artist: Option<String>,
    pub cover_image: Option<String>,
}

/// Artist pages pre-join the contributing artist names server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistTrack {
    pub id: String,
    pub name: Option<String>,
    pub artist_names: Option<String>,
    pub cover: Option<String>,
}

fn display_name(name: Option<String>) -> String {
    match name {
        Some(n) if !n.trim().is_empty() => n,
        _ => UNKNOWN_TRACK.to_string(),
    }
}

fn display_artist(artist: Option<String>) -> String {
    match artist {
        Some(a) if !a.trim().is_empty() => a,
        _ => UNKNOWN_ARTIST.to_string(),
    }
}

pub fn normalize_search(raw: SearchTrack) -> Track {
    let artist = {
        let names: Vec<String> = raw
            .artists
            .into_iter()
            .filter_map(|a| a.name)
            .filter(|n| !n.trim().is_empty())
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        }
    };

    Track {
        id: raw.id.into(),
        name: display_name(raw.title),
        artist: display_artist(artist),
        cover_image: raw.cover,
    }
}

pub fn normalize_album(raw: AlbumTrack) -> Track {
    Track {
        id: raw.track_id.into(),
        name: display_name(raw.title),
        artist: display_artist(raw.artist_name),
        cover_image: raw.album_cover,
    }
}

pub fn normalize_chart(raw: ChartEntry) -> Option<Track> {
    let track = raw.track?;
    Some(Track {
        id: track.id.into(),
        name: display_name(track.name),
        artist: display_artist(track.artist),
        cover_image: track.cover_image,
    })
}

pub fn normalize_artist(raw: ArtistTrack) -> Track {
    Track {
        id: raw.id.into(),
        name: display_name(raw.name),
        artist: display_artist(raw.artist_names),
        cover_image: raw.cover,
    }
}

pub fn normalize_search_all(raw: impl IntoIterator<Item = Option<SearchTrack>>) -> Vec<Track> {
    raw.into_iter().flatten().map(normalize_search).collect()
}

pub fn normalize_album_all(raw: impl IntoIterator<Item = Option<AlbumTrack>>) -> Vec<Track> {
    raw.into_iter().flatten().map(normalize_album).collect()
}

pub fn normalize_chart_all(raw: impl IntoIterator<Item = Option<ChartEntry>>) -> Vec<Track> {
    raw.into_iter()
        .flatten()
        .filter_map(normalize_chart)
        .collect()
}

pub fn normalize_artist_all(raw: impl IntoIterator<Item = Option<ArtistTrack>>) -> Vec<Track> {
    raw.into_iter().flatten().map(normalize_artist).collect()
}
