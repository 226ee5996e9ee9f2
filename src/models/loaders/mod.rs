pub mod toml_loader;

pub use toml_loader::{
    archive_task_file, list_toml_files, load_application_queue, load_application_task, read_toml,
};
