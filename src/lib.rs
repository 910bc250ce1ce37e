pub mod config;
pub mod controller;
pub mod encoder;
pub mod feedback;
pub mod gate;
pub mod link;
pub mod mapper;
pub mod messages;
pub mod pad;
pub mod runtime;
pub mod tracker;
