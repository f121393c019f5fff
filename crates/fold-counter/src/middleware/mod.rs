mod stats;

pub use stats::StatsMiddleware;
