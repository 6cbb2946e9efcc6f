mod error;
pub use error::ExecError;

mod guard;

mod addr;
pub use addr::{resolve_container_addr, resolve_host_addr};

#[cfg(feature = "subprocess")]
pub mod subprocess;

#[cfg(feature = "container")]
pub mod container;

#[cfg(all(test, feature = "subprocess", feature = "container"))]
mod contract_tests;
