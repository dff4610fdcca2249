pub mod chat;
pub mod file;
pub mod insight;
pub mod timeline;
pub mod user;
pub mod vitals;

pub use chat::*;
pub use file::*;
pub use insight::*;
pub use timeline::*;
pub use user::*;
pub use vitals::*;
