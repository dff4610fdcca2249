pub mod analysis;
pub mod auth;
pub mod chat;
pub mod health;
pub mod metrics;
pub mod reports;
pub mod swagger;
pub mod timeline;
pub mod vitals;
