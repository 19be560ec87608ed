pub mod dashboard;
pub mod engagement;
pub mod geo;
pub mod posts;
pub mod tokens;
