pub mod content;
pub mod list;
pub mod search_bar;
pub mod status_bar;
