pub use self::{
    engine::aggregate,
    period::{filter_contracts, parse_period, Period},
};

mod engine;
mod period;
