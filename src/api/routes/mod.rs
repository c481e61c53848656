pub mod health;
pub mod page;
pub mod snapshot;
pub mod stream;
