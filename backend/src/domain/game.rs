//! Catalog games and paging.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Coins;

/// Validation errors for catalog values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameValidationError {
    #[error("game id must be a valid UUID")]
    InvalidId,
    #[error("game name must not be empty")]
    EmptyName,
    #[error("rating must be between {min} and {max}, got {actual}")]
    RatingOutOfRange { min: f64, max: f64, actual: f64 },
    #[error("page must be at least 1")]
    InvalidPage,
    #[error("limit must be between 1 and {max}")]
    InvalidLimit { max: u32 },
}

/// Stable catalog identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(Uuid);

impl GameId {
    /// Parse a game id from its textual form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, GameValidationError> {
        Uuid::parse_str(id.as_ref().trim())
            .map(Self)
            .map_err(|_| GameValidationError::InvalidId)
    }

    /// Wrap an already-validated UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lowest rating a game may carry.
pub const RATING_MIN: f64 = 0.0;
/// Highest rating a game may carry.
pub const RATING_MAX: f64 = 5.0;

/// Game listed in the storefront catalog.
///
/// `rawg_id` is present for games imported from the RAWG feed and absent for
/// games created by an administrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub rawg_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
    pub rating: f64,
    pub price: Coins,
}

/// Fields supplied when creating a catalog entry by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct GameDraft {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
    pub rating: f64,
    pub price: Coins,
}

impl GameDraft {
    /// Validate the draft and assign a fresh identifier.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::{Coins, GameDraft};
    ///
    /// let draft = GameDraft {
    ///     name: "Portal".into(),
    ///     description: String::new(),
    ///     image_url: String::new(),
    ///     genres: vec!["Puzzle".into()],
    ///     platforms: vec!["PC".into()],
    ///     rating: 4.5,
    ///     price: Coins::new(300),
    /// };
    /// let game = draft.into_game().expect("valid draft");
    /// assert!(game.rawg_id.is_none());
    /// ```
    pub fn into_game(self) -> Result<Game, GameValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(GameValidationError::EmptyName);
        }
        if !self.rating.is_finite() || !(RATING_MIN..=RATING_MAX).contains(&self.rating) {
            return Err(GameValidationError::RatingOutOfRange {
                min: RATING_MIN,
                max: RATING_MAX,
                actual: self.rating,
            });
        }
        Ok(Game {
            id: GameId::random(),
            rawg_id: None,
            name: name.to_owned(),
            description: self.description,
            image_url: self.image_url,
            genres: self.genres,
            platforms: self.platforms,
            rating: self.rating,
            price: self.price,
        })
    }
}

/// Default page size for catalog listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Validated one-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Validate paging parameters, applying defaults for missing values.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, GameValidationError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if page == 0 {
            return Err(GameValidationError::InvalidPage);
        }
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(GameValidationError::InvalidLimit {
                max: MAX_PAGE_LIMIT,
            });
        }
        Ok(Self { page, limit })
    }

    /// One-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Page size.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// One page of catalog results with totals.
#[derive(Debug, Clone, PartialEq)]
pub struct GamePage {
    pub games: Vec<Game>,
    pub page: u32,
    pub total_pages: u64,
    pub total_games: u64,
}

impl GamePage {
    /// Assemble a page, deriving the page count from the total.
    pub fn new(games: Vec<Game>, request: PageRequest, total_games: u64) -> Self {
        Self {
            games,
            page: request.page(),
            total_pages: total_games.div_ceil(u64::from(request.limit())),
            total_games,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn draft() -> GameDraft {
        GameDraft {
            name: "  Hades ".into(),
            description: "Roguelike".into(),
            image_url: "https://img.example/hades.png".into(),
            genres: vec!["Action".into()],
            platforms: vec!["PC".into()],
            rating: 4.6,
            price: Coins::new(450),
        }
    }

    #[rstest]
    fn draft_trims_name(draft: GameDraft) {
        let game = draft.into_game().expect("valid draft");
        assert_eq!(game.name, "Hades");
        assert_eq!(game.price, Coins::new(450));
    }

    #[rstest]
    fn draft_rejects_blank_name(mut draft: GameDraft) {
        draft.name = "   ".into();
        assert_eq!(draft.into_game(), Err(GameValidationError::EmptyName));
    }

    #[rstest]
    #[case(-0.1)]
    #[case(5.1)]
    #[case(f64::NAN)]
    fn draft_rejects_rating_outside_bounds(mut draft: GameDraft, #[case] rating: f64) {
        draft.rating = rating;
        assert!(matches!(
            draft.into_game(),
            Err(GameValidationError::RatingOutOfRange { .. })
        ));
    }

    #[rstest]
    fn page_request_defaults() {
        let request = PageRequest::new(None, None).expect("defaults are valid");
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(request.offset(), 0);
    }

    #[rstest]
    #[case(Some(0), None)]
    #[case(None, Some(0))]
    #[case(None, Some(MAX_PAGE_LIMIT + 1))]
    fn page_request_rejects_out_of_range(#[case] page: Option<u32>, #[case] limit: Option<u32>) {
        assert!(PageRequest::new(page, limit).is_err());
    }

    #[rstest]
    #[case(0, 0)]
    #[case(20, 1)]
    #[case(21, 2)]
    fn game_page_rounds_total_pages_up(#[case] total: u64, #[case] pages: u64) {
        let page = GamePage::new(Vec::new(), PageRequest::default(), total);
        assert_eq!(page.total_pages, pages);
    }

    #[rstest]
    fn game_id_parses_uuid_text() {
        let id = GameId::random();
        assert_eq!(GameId::new(id.to_string()), Ok(id));
        assert_eq!(GameId::new("nope"), Err(GameValidationError::InvalidId));
    }
}
