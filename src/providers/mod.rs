// src/providers/mod.rs

pub mod registry;
pub mod traits;

pub use registry::{Capabilities, ProviderRegistry};
pub use traits::{
    CalendarEvent, CalendarProvider, CrmContact, CrmContactFields, CrmContactPage, CrmProvider,
    EmailDetail, EmailEnvelope, EmailPage, EmailProvider,
};
