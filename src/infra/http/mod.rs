mod middleware;
mod public;

pub use middleware::{REQUEST_ID_HEADER, Representation, ServedPage};
pub use public::{HttpState, build_router, split_marker};
