pub mod api;
pub mod config;
pub mod crawler;
pub mod data_models;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod merger;
pub mod ranking;
pub mod search;
pub mod serp;
