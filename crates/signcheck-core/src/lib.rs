pub mod config;
pub mod error;
pub mod geom;
pub mod model;
pub mod path;
pub mod polygon;
pub mod report;
pub mod transform;
