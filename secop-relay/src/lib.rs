//! secop-relay: queries SECOP II open data and scores processes for relevance.
pub mod config;
pub mod domain;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
