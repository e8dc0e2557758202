pub mod categories;
pub mod forms;
pub mod likes;
pub mod posts;
pub mod slug;
