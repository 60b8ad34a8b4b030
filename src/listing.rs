use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::decimal::Money;
use crate::errors::{BookingError, Result};
use crate::pricing::RateCard;
use crate::types::{ListingId, UserId};

/// listing as served by the listing store; read-only here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub category: String,
    pub location: String,
    pub images: Vec<String>,
    pub owner_id: UserId,
    pub rate_card: RateCard,
    /// average review score out of 5, absent until the first review
    #[serde(default)]
    pub rating: Option<Decimal>,
}

impl Listing {
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// browse filters; unset or blank criteria match everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilter {
    pub category: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    /// case-insensitive substring of the listing's location
    pub location: Option<String>,
    pub min_rating: Option<Decimal>,
    /// case-insensitive substring of the title, category or location
    pub query: Option<String>,
}

impl ListingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_price_range(mut self, min: Option<Money>, max: Option<Money>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_min_rating(mut self, rating: Decimal) -> Self {
        self.min_rating = Some(rating);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        let price = listing.rate_card.price_per_day();

        if let Some(category) = non_blank(&self.category) {
            if listing.category != category {
                return false;
            }
        }
        if self.min_price.map_or(false, |min| price < min) {
            return false;
        }
        if self.max_price.map_or(false, |max| price > max) {
            return false;
        }
        if let Some(location) = non_blank(&self.location) {
            if !contains_ignore_case(&listing.location, location) {
                return false;
            }
        }
        if let Some(min_rating) = self.min_rating {
            // unrated listings never pass a rating floor
            if listing.rating.map_or(true, |rating| rating < min_rating) {
                return false;
            }
        }
        if let Some(query) = non_blank(&self.query) {
            let hit = contains_ignore_case(&listing.title, query)
                || contains_ignore_case(&listing.category, query)
                || contains_ignore_case(&listing.location, query);
            if !hit {
                return false;
            }
        }
        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// source of listings and their rate cards
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn fetch_listing(&self, id: &str) -> Result<Listing>;

    /// listings matching the filter, ordered by id
    async fn search(&self, filter: &ListingFilter) -> Result<Vec<Listing>>;
}

/// listing store backed by a map, for tests and demos
#[derive(Debug, Default)]
pub struct InMemoryListingStore {
    listings: RwLock<HashMap<ListingId, Listing>>,
}

impl InMemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, listing: Listing) -> Result<()> {
        let mut listings = self.listings.write().map_err(|e| BookingError::Store {
            message: format!("listing store lock poisoned: {}", e),
        })?;
        listings.insert(listing.id.clone(), listing);
        Ok(())
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn fetch_listing(&self, id: &str) -> Result<Listing> {
        let listings = self.listings.read().map_err(|e| BookingError::Store {
            message: format!("listing store lock poisoned: {}", e),
        })?;
        listings
            .get(id)
            .cloned()
            .ok_or_else(|| BookingError::ListingNotFound { id: id.to_string() })
    }

    async fn search(&self, filter: &ListingFilter) -> Result<Vec<Listing>> {
        let listings = self.listings.read().map_err(|e| BookingError::Store {
            message: format!("listing store lock poisoned: {}", e),
        })?;
        let mut found: Vec<Listing> = listings
            .values()
            .filter(|listing| filter.matches(listing))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn listing(id: &str, title: &str, category: &str, location: &str, price: i64, rating: Option<Decimal>) -> Listing {
        Listing {
            id: id.to_string(),
            title: title.to_string(),
            category: category.to_string(),
            location: location.to_string(),
            images: vec![format!("https://img.example/{}.jpg", id)],
            owner_id: "owner-1".to_string(),
            rate_card: RateCard::per_day(price).unwrap(),
            rating,
        }
    }

    fn store() -> InMemoryListingStore {
        let store = InMemoryListingStore::new();
        store.insert(listing("cam-1", "Mirrorless camera", "Electronics", "Pune", 450, Some(dec!(4.8)))).unwrap();
        store.insert(listing("drone-2", "Camera drone", "Electronics", "Mumbai", 900, Some(dec!(4.2)))).unwrap();
        store.insert(listing("bike-3", "Mountain bike", "Sports", "Pune Camp", 300, None)).unwrap();
        store.insert(listing("tent-4", "Four-person tent", "Outdoor", "Manali", 250, Some(dec!(4.5)))).unwrap();
        store
    }

    async fn ids(store: &InMemoryListingStore, filter: ListingFilter) -> Vec<String> {
        store
            .search(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect()
    }

    #[tokio::test]
    async fn test_fetch_listing() {
        let store = store();
        let listing = store.fetch_listing("cam-1").await.unwrap();
        assert_eq!(listing.title, "Mirrorless camera");
        assert_eq!(listing.primary_image(), Some("https://img.example/cam-1.jpg"));
    }

    #[tokio::test]
    async fn test_missing_listing() {
        let store = InMemoryListingStore::new();
        assert!(matches!(
            store.fetch_listing("nope").await,
            Err(BookingError::ListingNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_filter_returns_everything_sorted() {
        assert_eq!(
            ids(&store(), ListingFilter::new()).await,
            vec!["bike-3", "cam-1", "drone-2", "tent-4"]
        );
    }

    #[tokio::test]
    async fn test_filter_by_category() {
        let filter = ListingFilter::new().with_category("Electronics");
        assert_eq!(ids(&store(), filter).await, vec!["cam-1", "drone-2"]);

        // blank criteria are ignored
        let filter = ListingFilter::new().with_category("  ");
        assert_eq!(ids(&store(), filter).await.len(), 4);
    }

    #[tokio::test]
    async fn test_filter_by_price_range_is_inclusive() {
        let filter = ListingFilter::new().with_price_range(Some(Money::from_major(300)), Some(Money::from_major(450)));
        assert_eq!(ids(&store(), filter).await, vec!["bike-3", "cam-1"]);

        let filter = ListingFilter::new().with_price_range(None, Some(Money::from_major(299)));
        assert_eq!(ids(&store(), filter).await, vec!["tent-4"]);
    }

    #[tokio::test]
    async fn test_filter_by_location_ignores_case() {
        let filter = ListingFilter::new().with_location("pUNE");
        assert_eq!(ids(&store(), filter).await, vec!["bike-3", "cam-1"]);
    }

    #[tokio::test]
    async fn test_filter_by_min_rating_skips_unrated() {
        let filter = ListingFilter::new().with_min_rating(dec!(4.5));
        assert_eq!(ids(&store(), filter).await, vec!["cam-1", "tent-4"]);

        let filter = ListingFilter::new().with_min_rating(Decimal::ZERO);
        assert!(!ids(&store(), filter).await.contains(&"bike-3".to_string()));
    }

    #[tokio::test]
    async fn test_query_matches_title_category_or_location() {
        assert_eq!(ids(&store(), ListingFilter::new().with_query("camera")).await, vec!["cam-1", "drone-2"]);
        assert_eq!(ids(&store(), ListingFilter::new().with_query("sports")).await, vec!["bike-3"]);
        assert_eq!(ids(&store(), ListingFilter::new().with_query("MANALI")).await, vec!["tent-4"]);
    }

    #[tokio::test]
    async fn test_criteria_combine() {
        let filter = ListingFilter::new()
            .with_category("Electronics")
            .with_location("pune")
            .with_query("camera");
        assert_eq!(ids(&store(), filter).await, vec!["cam-1"]);
    }

    #[test]
    fn test_negative_rate_card_in_payload_is_refused() {
        let json = r#"{
            "id": "x-1",
            "title": "Broken",
            "category": "Misc",
            "location": "Delhi",
            "images": [],
            "owner_id": "owner-9",
            "rate_card": {"price_per_day": "-100"}
        }"#;
        assert!(serde_json::from_str::<Listing>(json).is_err());

        let ok = json.replace("-100", "100");
        let listing: Listing = serde_json::from_str(&ok).unwrap();
        assert_eq!(listing.rating, None);
    }

    #[test]
    fn test_poisoned_store_reports_error() {
        let store = Arc::new(store());
        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.listings.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(
            store.insert(listing("late-5", "Late", "Misc", "Goa", 10, None)),
            Err(BookingError::Store { .. })
        ));
    }
}
