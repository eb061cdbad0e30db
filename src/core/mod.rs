pub mod batch;
pub mod engine;
pub mod pipeline;
pub mod resolver;
pub mod template;

pub use crate::domain::model::{Email, EmailTemplate, Record};
pub use crate::domain::ports::{ConfigProvider, EmailService, Pipeline, Storage};
pub use crate::utils::error::Result;
