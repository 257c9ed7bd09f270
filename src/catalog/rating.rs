use serde::Serialize;

/// Mean star rating over a set of reviews. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    #[serde(rename = "averageRating")]
    pub average: f64,
    #[serde(rename = "reviewCount")]
    pub count: u32,
}

impl RatingSummary {
    pub const EMPTY: RatingSummary = RatingSummary {
        average: 0.0,
        count: 0,
    };

    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0u64, 0u32), |(sum, count), r| (sum + u64::from(r), count + 1));
        Self::from_totals(sum, count)
    }

    /// Build from a SQL `SUM`/`COUNT` pair.
    pub fn from_totals(sum: u64, count: u32) -> Self {
        if count == 0 {
            return Self::EMPTY;
        }
        Self {
            average: sum as f64 / f64::from(count),
            count,
        }
    }

    /// Average rounded to one decimal, e.g. `4.3`.
    pub fn display_average(&self) -> String {
        format!("{:.1}", self.average)
    }

    /// Whole stars to fill when drawing the average.
    pub fn rounded_stars(&self) -> u8 {
        self.average.round().clamp(0.0, 5.0) as u8
    }
}

impl Default for RatingSummary {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Five-star strip with `filled` solid stars.
pub fn star_string(filled: u8) -> String {
    let filled = filled.min(5) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}
