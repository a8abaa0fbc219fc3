//! Shared test doubles, end-to-end scenarios and adapter HTTP tests.
