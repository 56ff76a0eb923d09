//! End-to-end checks of the discovery pipeline.

#[cfg(test)]
mod discovery;
