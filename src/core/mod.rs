pub mod collision;
pub mod import;
pub mod normalize;
pub mod service;
pub mod validate;

pub use crate::domain::model::{
    CanonicalSerial, CollisionReport, ImportReport, SerialRange, ValidationOutcome,
    ValidationStatus,
};
pub use crate::domain::ports::{AuditLog, RegistryStore, SmsGateway, StatusLog};
pub use crate::utils::error::Result;
