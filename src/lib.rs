pub mod cast;
pub mod codec;
pub mod colref;
pub mod connector;
pub mod engine;
pub mod error;
pub mod filter;
pub mod join;
pub mod lexer;
pub mod plan;
pub mod prune;
pub mod resolve;
pub mod rowfilter;
pub mod scan;
pub mod schema;
pub mod shim;
pub mod token;
pub mod uri;
