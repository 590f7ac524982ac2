pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod geohash;
pub mod handlers;
pub mod ingest;
pub mod layers;
pub mod models;
pub mod repositories;
pub mod sources;
pub mod utils;
