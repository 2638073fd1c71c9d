//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against scripted serial links.  No real serial device is required.

mod acquisition_tests;
mod controller_tests;
mod mock_link;
