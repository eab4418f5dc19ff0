pub mod interceptor;
pub mod pagination;
pub mod payload_decoder;
pub mod settle;
pub mod submission;

pub use interceptor::{Accumulator, InterceptStats, InterceptorHandle, ResponseInterceptor};
pub use pagination::{Pagination, PaginationDriver, PAGE_INDICATOR_SELECTOR};
pub use payload_decoder::decode_compact;
pub use settle::Settle;
pub use submission::{QuerySubmitter, SUBMIT_SELECTOR};
