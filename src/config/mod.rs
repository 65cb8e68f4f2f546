#![forbid(unsafe_code)]

//! Configuration (§4.4 C6, §6): loading, the resolved per-rule view, the
//! project ignore file, and the raw on-disk schema.

pub mod ignore_file;
pub mod loader;
pub mod schema;
pub mod view;

pub use loader::load_config;
pub use view::ConfigView;
