//! Benchmarks of the OpenScan scan engine.
