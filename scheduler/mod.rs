//! A capacity-share task scheduler: queues get a configured share of
//! cluster slots, idle capacity is lent between queues, and per-user limits
//! keep one user from draining a queue's donated capacity. See
//! `dispatcher::CapacityScheduler` for the entry point.

pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod locality;
pub mod lookup;
pub mod memory;
pub mod order;
pub mod queue;
pub mod registry;
pub mod reservation;
pub mod status;
pub mod task_scheduler;
pub mod traits;
pub mod user_limit;

pub use dispatcher::CapacityScheduler;
pub use ids::{QueueName, SlotKind, UserId};
pub use lookup::TaskLookupResult;
pub use traits::{ClusterStatus, Job, JobRunState, QueueManager, Task, TaskLocality, Worker};
