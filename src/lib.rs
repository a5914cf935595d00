pub mod app;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod images;
pub mod mapper;
pub mod models;
pub mod tmdb;
pub mod watchlist;
