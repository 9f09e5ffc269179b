pub mod auction;
pub mod auth;
pub mod bidding;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod event_store;
pub mod handlers;
pub mod message_broker;
pub mod orders;
pub mod payments;
pub mod query;
pub mod realtime;
pub mod reviews;
pub mod routes;
pub mod scheduler;
pub mod state;
pub mod users;
pub mod validation;
