pub mod accumulator;
pub mod extractor;
pub mod locator;
pub mod pagination;
pub mod pipeline;
pub mod row;

#[cfg(test)]
mod tests;
