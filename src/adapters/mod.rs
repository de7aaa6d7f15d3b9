pub mod json_file_snapshot;
pub mod memory_snapshot;

pub use json_file_snapshot::JsonFileSnapshotStore;
pub use memory_snapshot::MemorySnapshotStore;
