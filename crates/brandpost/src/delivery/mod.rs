pub mod hosting;
pub mod webhook;

pub use hosting::{HostingClient, ImageHost};
pub use webhook::{WebhookClient, WebhookPayload, WorkflowWebhook, STATUS_READY};
