pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::memory::{MemoryAuditLog, MemoryRegistry, MemoryStatusLog};
pub use crate::adapters::sms::{HttpSmsGateway, NoopSmsGateway};
pub use crate::config::Settings;
pub use crate::core::collision::{check_collisions, run_db_check};
pub use crate::core::import::ImportPipeline;
pub use crate::core::normalize::normalize;
pub use crate::core::service::CheckService;
pub use crate::core::validate::{AnswerTemplates, ValidationEngine};
pub use crate::domain::model::{
    CanonicalSerial, CollisionReport, ImportReport, InvalidSerial, RawInvalidRow, RawRangeRow,
    SerialRange, ValidationOutcome, ValidationStatus, SERIAL_WIDTH,
};
pub use crate::utils::error::{RegistryError, Result};
