pub mod brands;
pub mod events;
pub mod items;
pub mod scans;
pub mod statuses;
pub mod users;
