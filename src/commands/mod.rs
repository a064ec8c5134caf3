pub mod commit;
pub mod handle;
pub mod head_ref;
pub mod messages;
pub mod parse;
pub mod react;
pub mod review;

#[cfg(test)]
pub mod fakes;
