pub mod calendar_loop;
pub mod display_loop;
pub mod task_runner;
