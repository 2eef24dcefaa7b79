pub mod curve;
pub mod formulas;
pub mod interactive;
pub mod quote;
pub mod rates;
pub mod setup;
pub mod ui;
