// Arbitration: target analysis, budget allocation, Monte Carlo forecasting.

pub mod allocation;
pub mod insights;
pub mod rng;
pub mod simulation;
pub mod targets;
