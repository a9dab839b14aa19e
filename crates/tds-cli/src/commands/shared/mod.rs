pub mod task_file;
