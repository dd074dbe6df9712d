pub mod demo;
pub mod dispatch;
pub mod queue;
pub mod sim;
pub mod viz;

#[cfg(test)]
mod test;
