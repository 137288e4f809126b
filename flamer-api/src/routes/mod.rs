pub mod capabilities;
pub mod discovery;
pub mod health;
pub mod likes;
pub mod photo;
pub mod plans;
pub mod profile;
pub mod swipes;
