pub mod avatar;
pub mod bindings;
pub mod config;
pub mod content;
pub mod error;
pub mod faq;
pub mod index;
pub mod lifecycle;
pub mod narration;
pub mod navigation;
pub mod page;
pub mod progress;
pub mod text_utils;
pub mod view;

#[cfg(test)]
mod testing;

pub use page::{Effect, PageCommand, PageUpdate, ReaderPage, Timer};
