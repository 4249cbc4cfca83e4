// src/store/mod.rs

pub mod chat_log;
pub mod instructions;
pub mod migration;
pub mod records;
pub mod tasks;

pub use chat_log::{ChatLogStore, ChatTurn};
pub use instructions::{InstructionStore, StandingInstruction, TriggerType};
pub use records::{ContactRecord, EmailRecord, NewContact, RecordStore};
pub use tasks::{TaskRecord, TaskStatus, TaskStore};
