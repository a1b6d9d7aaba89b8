pub mod ai;
pub mod courses;
pub mod health;
pub mod pods;
pub mod recommendations;
pub mod swipes;
pub mod users;
