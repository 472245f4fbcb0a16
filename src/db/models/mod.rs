pub mod event_models;
pub mod item_models;
pub mod user_models;
