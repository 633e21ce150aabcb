pub mod components;
pub mod model;
pub mod service;
pub mod util;
