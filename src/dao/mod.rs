//! Persistence layer: MongoDB connection management, id encoding helpers,
//! collection entities and the typed store facade.

pub mod ids;
pub mod models;
pub mod mongodb;
pub mod storage;
pub mod store;
