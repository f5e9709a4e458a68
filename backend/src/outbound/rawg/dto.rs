//! DTOs for decoding RAWG `/games` responses.
//!
//! Optional upstream fields default here so one sparse entry cannot fail a
//! whole page.

use serde::Deserialize;

use crate::domain::ports::{FeedGame, FeedPage};

#[derive(Debug, Deserialize)]
pub(super) struct RawgGamesResponseDto {
    #[serde(default)]
    pub(super) next: Option<String>,
    #[serde(default)]
    pub(super) results: Vec<RawgGameDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawgGameDto {
    pub(super) id: i64,
    pub(super) name: String,
    #[serde(default)]
    pub(super) background_image: Option<String>,
    #[serde(default)]
    pub(super) rating: Option<f64>,
    #[serde(default)]
    pub(super) genres: Option<Vec<RawgNamedDto>>,
    #[serde(default)]
    pub(super) platforms: Option<Vec<RawgPlatformEntryDto>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawgNamedDto {
    pub(super) name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawgPlatformEntryDto {
    pub(super) platform: RawgNamedDto,
}

impl RawgGamesResponseDto {
    pub(super) fn into_feed_page(self) -> FeedPage {
        FeedPage {
            has_more: self.next.is_some(),
            games: self.results.into_iter().map(RawgGameDto::into_feed_game).collect(),
        }
    }
}

impl RawgGameDto {
    fn into_feed_game(self) -> FeedGame {
        FeedGame {
            rawg_id: self.id,
            name: self.name,
            image_url: self.background_image.filter(|url| !url.is_empty()),
            rating: self.rating.filter(|rating| rating.is_finite()).unwrap_or(0.0),
            genres: self
                .genres
                .unwrap_or_default()
                .into_iter()
                .map(|genre| genre.name)
                .collect(),
            platforms: self
                .platforms
                .unwrap_or_default()
                .into_iter()
                .map(|entry| entry.platform.name)
                .collect(),
        }
    }
}
