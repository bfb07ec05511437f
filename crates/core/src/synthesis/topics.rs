//! Static topic catalog
//!
//! Keyword/entity pools and sentence templates per topic. Content is fixed;
//! only the `enabled` flag changes at runtime. Templates use `{keyword}` and
//! `{entity}` placeholders, each at most once.

use chaff_domain::TopicId;

/// One topic's generation material.
#[derive(Debug, Clone)]
pub struct TopicModel {
    pub id: TopicId,
    pub enabled: bool,
    pub keywords: &'static [&'static str],
    pub entities: &'static [&'static str],
    pub templates: &'static [&'static str],
}

impl TopicModel {
    const fn new(
        id: TopicId,
        keywords: &'static [&'static str],
        entities: &'static [&'static str],
        templates: &'static [&'static str],
    ) -> Self {
        Self { id, enabled: true, keywords, entities, templates }
    }
}

/// The full ten-topic catalog, all topics enabled.
pub(crate) fn catalog() -> Vec<TopicModel> {
    vec![
        TopicModel::new(
            TopicId::News,
            &["news", "today", "latest", "breaking", "update", "report", "article", "story",
                "headline"],
            &["politics", "economy", "technology", "world", "local", "business", "sports",
                "weather"],
            &["{entity} {keyword}", "{keyword} {entity}", "latest {entity} {keyword}",
                "{entity} news today", "breaking {entity} news"],
        ),
        TopicModel::new(
            TopicId::Shopping,
            &["best", "buy", "cheap", "review", "price", "deal", "sale", "discount", "compare",
                "affordable"],
            &["laptop", "phone", "headphones", "camera", "watch", "shoes", "backpack", "desk",
                "chair", "monitor"],
            &["best {entity}", "{entity} {keyword}", "{keyword} {entity} 2024",
                "{entity} reviews", "where to {keyword} {entity}"],
        ),
        TopicModel::new(
            TopicId::Entertainment,
            &["watch", "stream", "download", "review", "rating", "trailer", "episode", "season",
                "cast"],
            &["movie", "show", "series", "documentary", "anime", "game", "music", "podcast",
                "book"],
            &["best {entity} to {keyword}", "{entity} {keyword}", "new {entity} releases",
                "top rated {entity}", "popular {entity}"],
        ),
        TopicModel::new(
            TopicId::Technology,
            &["how to", "tutorial", "guide", "tips", "fix", "install", "setup", "configure",
                "troubleshoot"],
            &["windows", "mac", "linux", "android", "ios", "software", "app", "program", "code",
                "network"],
            &["{keyword} {entity}", "{entity} {keyword}", "best {entity} for",
                "{entity} tutorial", "learn {entity}"],
        ),
        TopicModel::new(
            TopicId::Health,
            &["symptoms", "treatment", "causes", "prevention", "cure", "remedy", "exercise",
                "diet", "healthy"],
            &["headache", "back pain", "sleep", "stress", "nutrition", "fitness", "wellness",
                "mental health"],
            &["{entity} {keyword}", "{keyword} of {entity}", "how to treat {entity}",
                "{entity} remedies", "natural {entity} relief"],
        ),
        TopicModel::new(
            TopicId::Travel,
            &["visit", "vacation", "trip", "hotel", "flight", "things to do", "places", "guide",
                "itinerary"],
            &["paris", "tokyo", "new york", "london", "beach", "mountain", "europe", "asia",
                "restaurant"],
            &["best {keyword} in {entity}", "{entity} travel {keyword}", "{keyword} to {entity}",
                "{entity} tourist attractions", "cheap {keyword} to {entity}"],
        ),
        TopicModel::new(
            TopicId::Food,
            &["recipe", "how to make", "restaurant", "best", "near me", "delivery", "homemade",
                "easy"],
            &["pizza", "pasta", "sushi", "burger", "salad", "dessert", "breakfast", "dinner",
                "coffee", "cake"],
            &["{keyword} {entity}", "{entity} {keyword}", "best {entity} near me",
                "{entity} recipe", "how to make {entity}"],
        ),
        TopicModel::new(
            TopicId::Education,
            &["learn", "course", "tutorial", "how to", "guide", "explained", "for beginners",
                "step by step"],
            &["python", "math", "history", "science", "language", "photography", "guitar",
                "drawing", "writing"],
            &["{keyword} {entity}", "{entity} {keyword}", "online {entity} course",
                "{entity} for beginners", "free {entity} tutorial"],
        ),
        TopicModel::new(
            TopicId::Local,
            &["near me", "nearby", "in", "best", "open now", "hours", "directions",
                "phone number"],
            &["restaurant", "coffee shop", "gym", "library", "park", "hospital", "pharmacy",
                "gas station"],
            &["{entity} {keyword}", "best {entity} near me", "{entity} nearby",
                "{entity} open now", "closest {entity}"],
        ),
        TopicModel::new(
            TopicId::General,
            &["what is", "how to", "why", "when", "where", "who", "define", "meaning",
                "explain"],
            &["weather", "time", "calendar", "calculator", "translate", "convert", "map",
                "directions"],
            &["{keyword} {entity}", "{entity} today", "current {entity}", "{entity} near me",
                "{keyword} a {entity}"],
        ),
    ]
}

/// Opening phrases for long-form queries.
pub(crate) const START_PHRASES: &[&str] = &[
    "how to", "what is", "best", "why", "where", "when", "can i", "should i", "how do i",
];
