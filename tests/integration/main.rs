//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the sequencer against
//! mock adapters on a simulated clock.  No network or radio is touched.

mod discovery_tests;
mod sequencer_tests;
