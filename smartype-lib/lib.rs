use smartstring::{LazyCompact, SmartString};

pub mod catalog;
pub mod compose;
pub mod context;
pub mod engine;
pub mod revert;
pub mod rule;
pub mod selection;
pub mod session;
pub mod settings;
pub mod syntax;
pub mod transaction;

pub type Tendril = SmartString<LazyCompact>;
