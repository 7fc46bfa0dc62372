use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub text: String,
    pub rating: f64,
    pub time_posted: String,
    pub positive_points: Option<Vec<String>>,
    pub negative_points: Option<Vec<String>>,
    pub services_used: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub name: String,
    pub street_address: String,
    pub postal_code: String,
    pub city: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub avg_rating: f64,
    pub num_ratings: u64,
    pub reviews: Vec<Review>,
}

impl Business {
    /// Attaches the reviews collected from the listing's detail view.
    pub fn with_reviews(mut self, reviews: Vec<Review>) -> Self {
        self.reviews = reviews;
        self
    }
}

/// Result of one successful scrape run.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOutcome {
    pub businesses: Vec<Business>,
    pub skipped_cards: usize,
    pub attempts: u32,
}

impl ScrapeOutcome {
    pub fn review_count(&self) -> usize {
        self.businesses.iter().map(|b| b.reviews.len()).sum()
    }
}
