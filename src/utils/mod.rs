pub mod error;
pub mod logger;
pub mod monitor;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;
