pub mod bot;
pub mod catalog;
pub mod challenge;
pub mod config;
pub mod db;
pub mod errors;
pub mod genai;
pub mod jobs;
pub mod lcapi;
pub mod models;
pub mod roles;
pub mod rotation;
pub mod stats;
