//! Player settings: the schema with its defaults, and how they are
//! layered from the config file and the environment.

mod load;
mod schema;

pub use schema::*;

#[cfg(test)]
mod tests;
