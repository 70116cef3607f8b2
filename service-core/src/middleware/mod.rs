pub mod tracing;

pub use self::tracing::{REQUEST_ID_HEADER, request_id_middleware, trace_layer};
