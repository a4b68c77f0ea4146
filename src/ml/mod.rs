//! Model fitting: split → standardize → random forest → metrics.

pub mod forest;
pub mod metrics;
pub mod scaler;
pub mod split;
pub mod trainer;
pub mod tree;
