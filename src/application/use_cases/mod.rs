pub mod analysis;
pub mod prompt_builder;
pub mod response_validator;
pub mod sampler;
pub mod translate;

#[cfg(test)]
pub(crate) mod test_support;
