//! The public facade composing delivery, polling and correlation.
//!
//! Most applications only need [`WebhookService`], built through
//! [`WebhookServiceBuilder`].

mod builder;
mod facade;


pub use builder::WebhookServiceBuilder;
pub use facade::WebhookService;
