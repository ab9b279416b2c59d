pub mod advanced;
pub mod cancel;
pub mod simple;

pub use advanced::search;
pub use cancel::CancellationToken;
pub use simple::simple_search;
