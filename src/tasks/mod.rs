//! # Task abstractions and caller hooks.
//!
//! This module provides the task-related types:
//! - [`QueueItem`] - bounds for values that can be queued
//! - [`QueueTask`] - executable unit created for an admitted task
//! - [`QueueTaskFactory`] / [`QueueTaskFn`] - how queue tasks are built
//! - [`QueueHooks`] - restriction lookup and removal/completion callbacks
//! - [`Completed`], [`TaskHandle`] - what the completion callback receives

mod hooks;
mod task;
mod task_fn;

pub use hooks::{Completed, QueueHooks, TaskHandle};
pub use task::{QueueItem, QueueTask, QueueTaskFactory, QueueTaskRef};
pub use task_fn::QueueTaskFn;
