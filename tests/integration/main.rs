//! End-to-end tests over the public registry surface.

mod concurrency_test;
mod registry_test;
