pub mod middleware;
pub mod public;
pub mod session;

pub use public::{HttpState, build_router};
