//! Domain types for the simulation engine.

pub mod bar;
pub mod equity;
pub mod position;
pub mod timeframe;
pub mod trade;

pub use bar::{Bar, BarError, BarSeries};
pub use equity::EquityPoint;
pub use position::{OpenPosition, Position};
pub use timeframe::{ParseTimeframeError, Timeframe};
pub use trade::{ExitReason, Trade};
