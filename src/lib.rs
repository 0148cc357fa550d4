//! mapsearch - natural-language map search.
//!
//! A query goes to a grounded generative model, `(lat: X, lng: Y)`
//! annotations in the answer become [`models::Place`] markers, and the map
//! viewport follows the results without fighting the user's own panning.

pub mod config;
pub mod geo;
pub mod llm;
pub mod models;
pub mod services;
pub mod storage;
