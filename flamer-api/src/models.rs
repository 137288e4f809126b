use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{daily_swipe_counts, likes, profiles, swipes};

// --- Enumerated profile fields (stored as varchar) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    Other,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
            Gender::NonBinary => write!(f, "non-binary"),
            Gender::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "non-binary" => Ok(Gender::NonBinary),
            "other" => Ok(Gender::Other),
            _ => Err(format!("unknown gender: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookingFor {
    Male,
    Female,
    Everyone,
}

impl std::fmt::Display for LookingFor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookingFor::Male => write!(f, "male"),
            LookingFor::Female => write!(f, "female"),
            LookingFor::Everyone => write!(f, "everyone"),
        }
    }
}

impl std::str::FromStr for LookingFor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(LookingFor::Male),
            "female" => Ok(LookingFor::Female),
            "everyone" => Ok(LookingFor::Everyone),
            _ => Err(format!("unknown looking_for value: {s}")),
        }
    }
}

// --- Profile ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub looking_for: String,
    pub about: Option<String>,
    pub location: Option<String>,
    pub max_distance: i32,
    pub photos: serde_json::Value,
    pub premium_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Stored photo references in display order. The column is a JSON
    /// array of strings; anything else is treated as no photos.
    pub fn photo_refs(&self) -> Vec<String> {
        self.photos
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Full row written on profile-form submission. One struct serves
/// insert and conflict-update: `AsChangeset` skips the primary key, and
/// `treat_none_as_null` lets the owner clear `about`/`location`.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = profiles)]
#[diesel(treat_none_as_null = true)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub looking_for: String,
    pub about: Option<String>,
    pub location: Option<String>,
    pub max_distance: i32,
    pub photos: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

// --- Swipe ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = swipes)]
pub struct Swipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub swiped_profile_id: Uuid,
    pub liked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = swipes)]
pub struct NewSwipe {
    pub user_id: Uuid,
    pub swiped_profile_id: Uuid,
    pub liked: bool,
}

// --- Like ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = likes)]
pub struct Like {
    pub id: Uuid,
    pub liker_id: Uuid,
    pub liked_user_id: Uuid,
    pub is_match: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub liker_id: Uuid,
    pub liked_user_id: Uuid,
    pub is_match: bool,
}

// --- DailySwipeCount ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = daily_swipe_counts)]
#[diesel(primary_key(user_id, date))]
pub struct DailySwipeCount {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub count: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = daily_swipe_counts)]
pub struct NewDailySwipeCount {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn gender_round_trips_stored_strings() {
        for g in [Gender::Male, Gender::Female, Gender::NonBinary, Gender::Other] {
            assert_eq!(Gender::from_str(&g.to_string()).unwrap(), g);
        }
        assert!(Gender::from_str("nonbinary").is_err());
    }

    #[test]
    fn looking_for_round_trips_stored_strings() {
        for l in [LookingFor::Male, LookingFor::Female, LookingFor::Everyone] {
            assert_eq!(LookingFor::from_str(&l.to_string()).unwrap(), l);
        }
    }

    fn profile_with_photos(photos: serde_json::Value) -> Profile {
        Profile {
            id: Uuid::nil(),
            name: "Ada".into(),
            age: 30,
            gender: "female".into(),
            looking_for: "everyone".into(),
            about: None,
            location: None,
            max_distance: 25,
            photos,
            premium_until: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn photo_refs_reads_string_array_in_order() {
        let p = profile_with_photos(serde_json::json!(["a/1.jpg", "https://x/2.png"]));
        assert_eq!(p.photo_refs(), vec!["a/1.jpg".to_string(), "https://x/2.png".to_string()]);
    }

    #[test]
    fn photo_refs_tolerates_malformed_column() {
        assert!(profile_with_photos(serde_json::json!(null)).photo_refs().is_empty());
        assert!(profile_with_photos(serde_json::json!({"not": "an array"})).photo_refs().is_empty());
        // non-string entries are skipped, order of the rest preserved
        let p = profile_with_photos(serde_json::json!(["a.jpg", 7, "b.jpg"]));
        assert_eq!(p.photo_refs(), vec!["a.jpg".to_string(), "b.jpg".to_string()]);
    }
}
