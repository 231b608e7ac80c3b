//! Domain types — bars, price histories, date-indexed series and frames.

pub mod bar;
pub mod frame;
pub mod series;

pub use bar::{Bar, PriceSeries};
pub use frame::Frame;
pub use series::DateSeries;
