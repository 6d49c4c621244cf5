// Data model - serde structures mirroring the remote API

pub mod contract;
pub mod market;
pub mod responses;
pub mod ship;
pub mod survey;
pub mod system;
pub mod waypoint;

pub use contract::*;
pub use market::*;
pub use responses::*;
pub use ship::*;
pub use survey::*;
pub use system::*;
pub use waypoint::*;
