use serde::Deserialize;

#[derive(Deserialize, Copy, Clone, Eq, PartialEq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    // Memory keeps blobs in an in-process hash table, lost on shutdown
    Memory,
    // Disk keeps one file per blob under storage_path, survives restart
    Disk,
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Memory
    }
}
