#![cfg(not(doctest))]

#[macro_use]
extern crate diesel;

pub mod db;
pub mod messages;
pub mod models;
pub mod schema;
pub mod token;
