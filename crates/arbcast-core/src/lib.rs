// Library root: fantasy football valuation and arbitration forecasting.
//
// Data flows one way: a player snapshot is valued against replacement level,
// converted to cap dollars, and then fed to the arbitration target analysis,
// budget allocator, and Monte Carlo simulator.

pub mod arbitration;
pub mod config;
pub mod player;
pub mod snapshot;
pub mod valuation;
