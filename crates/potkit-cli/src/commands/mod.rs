pub mod check;
pub mod units;
