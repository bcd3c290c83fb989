//! Evidence uploads: file storage plus metadata rows.

pub mod model;
pub mod routes;
pub mod storage;

pub use model::EvidenceRecord;
pub use storage::EvidenceStorage;
