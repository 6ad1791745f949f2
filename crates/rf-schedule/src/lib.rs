//! `rf-schedule`: the single scheduler queue behind every repeating task.
//!
//! # Crate layout
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`task`]       | `Task`: one agent tick, location sync, or zone refresh |
//! | [`wake_queue`] | `WakeQueue` (`BTreeMap<SimTime, VecDeque<Task>>`)      |
//!
//! # Model
//!
//! Instead of one timer per agent, the orchestrator keeps one queue keyed on
//! each task's next fire time and pops whatever is due.  A task is pending at
//! most once: scheduling it again moves it, and cancelling it is a no-op when
//! it is not pending.  Repetition is the caller's job: after handling a task
//! it schedules the next occurrence.

pub mod task;
pub mod wake_queue;


pub use task::Task;
pub use wake_queue::WakeQueue;
