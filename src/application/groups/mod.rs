//! Metric group declarations, each paired with its collection routine.
//!
//! Distribution traffic and cluster membership groups are not declared.

pub mod cpu_topology;
pub mod internal;
pub mod memory;
pub mod scheduler_topology;
pub mod system_info;
pub mod system_limits;
