pub mod assignments;
pub mod classes;
pub mod news;
pub mod schools;
pub mod solutions;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;
