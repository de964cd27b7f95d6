// Domain models

pub mod athlete;
pub mod chat;
pub mod gym;
pub mod membership;
pub mod review;
pub mod statistics;
pub mod support;
pub mod trainer;
pub mod user;
pub mod visit;

pub use athlete::*;
pub use chat::*;
pub use gym::*;
pub use membership::*;
pub use review::*;
pub use statistics::*;
pub use support::*;
pub use trainer::*;
pub use user::*;
pub use visit::*;
